//! Rule validation limits configuration.

use serde::Deserialize;
use tipwarden_rules::Limits;

/// Caps applied when administrators add or edit rules.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Rules per group, checked on add only (default: 100).
    #[serde(default = "default_max_rules")]
    pub max_rules: usize,
    /// Raw specification length in characters (default: 3000).
    #[serde(default = "default_max_raw_len")]
    pub max_raw_len: usize,
    /// Reply length (default: 1500).
    #[serde(default = "default_max_reply_len")]
    pub max_reply_len: usize,
    /// Reply length for whitespace-preserving specs (default: 4000).
    #[serde(default = "default_max_preserved_reply_len")]
    pub max_preserved_reply_len: usize,
    /// Inline buttons per reply (default: 6).
    #[serde(default = "default_max_buttons")]
    pub max_buttons: usize,
    #[serde(default = "default_destruct_min")]
    pub destruct_min: u32,
    #[serde(default = "default_destruct_max")]
    pub destruct_max: u32,
    /// Destruct seconds when a rule omits the destruct segment (default: 300).
    #[serde(default = "default_destruct")]
    pub default_destruct: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_rules: default_max_rules(),
            max_raw_len: default_max_raw_len(),
            max_reply_len: default_max_reply_len(),
            max_preserved_reply_len: default_max_preserved_reply_len(),
            max_buttons: default_max_buttons(),
            destruct_min: default_destruct_min(),
            destruct_max: default_destruct_max(),
            default_destruct: default_destruct(),
        }
    }
}

impl LimitsConfig {
    /// Limits in the form the rule validator takes.
    pub fn rule_limits(&self) -> Limits {
        Limits {
            max_raw_len: self.max_raw_len,
            max_reply_len: self.max_reply_len,
            max_preserved_reply_len: self.max_preserved_reply_len,
            max_buttons: self.max_buttons,
            destruct: self.destruct_min..=self.destruct_max,
            default_destruct: self.default_destruct,
        }
    }
}

fn default_max_rules() -> usize {
    100
}

fn default_max_raw_len() -> usize {
    3000
}

fn default_max_reply_len() -> usize {
    1500
}

fn default_max_preserved_reply_len() -> usize {
    4000
}

fn default_max_buttons() -> usize {
    6
}

fn default_destruct_min() -> u32 {
    300
}

fn default_destruct_max() -> u32 {
    99999
}

fn default_destruct() -> u32 {
    300
}
