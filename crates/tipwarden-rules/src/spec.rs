//! Raw rule specification parsing and validation.
//!
//! A raw specification is a list of segments separated by a line holding
//! only `+++`:
//!
//! ```text
//! hello||hi          <- trigger words, `||` separated
//! +++
//! Welcome!           <- reply template (may end with button rows)
//! +++
//! include            <- match modes      (default: include)
//! +++
//! reply              <- actions          (default: reply)
//! +++
//! all                <- target           (default: all)
//! +++
//! 300                <- destruct seconds (default: configured)
//! ```

use crate::action::ActionPlan;
use crate::error::ValidationError;
use crate::markup::{Notice, parse_notice};
use crate::mode::MatchModes;
use crate::target::Target;
use std::collections::BTreeSet;
use std::ops::RangeInclusive;

/// Segment separator inside a raw specification.
pub const SEGMENT_SEPARATOR: &str = "\n+++\n";

/// Separator between trigger words in segment 0.
pub const WORD_SEPARATOR: &str = "||";

/// Size and range limits applied during validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    pub max_raw_len: usize,
    pub max_reply_len: usize,
    pub max_preserved_reply_len: usize,
    pub max_buttons: usize,
    pub destruct: RangeInclusive<u32>,
    pub default_destruct: u32,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_raw_len: 3000,
            max_reply_len: 1500,
            max_preserved_reply_len: 4000,
            max_buttons: 6,
            destruct: 300..=99999,
            default_destruct: 300,
        }
    }
}

/// How the reply segment's whitespace is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpecStyle {
    /// Reply is trimmed like every other segment.
    #[default]
    Trimmed,
    /// Reply keeps its inner layout; a larger length cap applies.
    Preserved,
}

/// A validated rule specification, not yet bound to a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSpec {
    pub words: BTreeSet<String>,
    pub notice: Notice,
    pub modes: MatchModes,
    pub actions: ActionPlan,
    pub target: Target,
    pub destruct: u32,
    /// The original specification text, kept for display and audit.
    pub raw: String,
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Split a raw specification into its six segments, filling defaults for
/// missing trailing segments.
fn segments(raw: &str, style: SpecStyle, limits: &Limits) -> Result<Vec<String>, ValidationError> {
    let mut parts: Vec<String> = raw
        .split(SEGMENT_SEPARATOR)
        .filter(|part| !part.trim().is_empty())
        .enumerate()
        .map(|(i, part)| match (i, style) {
            (1, SpecStyle::Preserved) => part.trim_matches('\n').to_string(),
            _ => part.trim().to_string(),
        })
        .collect();

    match parts.len() {
        0 => return Err(ValidationError::MissingField("words")),
        1 => return Err(ValidationError::MissingField("reply")),
        _ => {}
    }

    let defaults = [
        MatchModes::DEFAULT_SEGMENT.to_string(),
        crate::action::Action::DEFAULT_SEGMENT.to_string(),
        Target::DEFAULT_SEGMENT.to_string(),
        limits.default_destruct.to_string(),
    ];
    for (index, default) in defaults.into_iter().enumerate() {
        if parts.len() < index + 3 {
            parts.push(default);
        }
    }

    Ok(parts)
}

fn parse_destruct(segment: &str, limits: &Limits) -> Result<u32, ValidationError> {
    let invalid = || ValidationError::DestructInvalid(segment.to_string());
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    let secs: u32 = segment.parse().map_err(|_| invalid())?;
    if !limits.destruct.contains(&secs) {
        return Err(invalid());
    }
    Ok(secs)
}

/// Validate a raw rule specification.
pub fn validate_rule(
    raw: &str,
    style: SpecStyle,
    limits: &Limits,
) -> Result<RuleSpec, ValidationError> {
    let raw_len = char_len(raw);
    if raw_len > limits.max_raw_len {
        return Err(ValidationError::PayloadTooLarge {
            field: "raw",
            len: raw_len,
            max: limits.max_raw_len,
        });
    }

    let parts = segments(raw, style, limits)?;

    let words: BTreeSet<String> = parts[0]
        .split(WORD_SEPARATOR)
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();
    if words.is_empty() {
        return Err(ValidationError::MissingField("words"));
    }

    let reply = &parts[1];
    let max_reply = match style {
        SpecStyle::Trimmed => limits.max_reply_len,
        SpecStyle::Preserved => limits.max_preserved_reply_len,
    };
    let reply_len = char_len(reply);
    if reply_len > max_reply {
        return Err(ValidationError::PayloadTooLarge {
            field: "reply",
            len: reply_len,
            max: max_reply,
        });
    }
    let notice = parse_notice(reply, limits.max_buttons)?;

    let modes = MatchModes::parse(&parts[2])?;
    let actions = ActionPlan::parse(&parts[3])?;
    let target = Target::parse(&parts[4])?;
    let destruct = parse_destruct(&parts[5], limits)?;

    Ok(RuleSpec {
        words,
        notice,
        modes,
        actions,
        target,
        destruct,
        raw: raw.to_string(),
    })
}
