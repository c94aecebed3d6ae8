//! Core configuration types and loading.

use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use super::limits::LimitsConfig;
use super::timers::TimersConfig;

/// Store path that keeps all state in process memory.
pub const MEMORY_STORE: &str = ":memory:";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Daemon configuration. Every section is optional; an empty file is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Persistence backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Background timer cadences and destruct intervals.
    #[serde(default)]
    pub timers: TimersConfig,
    /// Rule validation limits.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Inbound worker pool.
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Prometheus endpoint.
    #[serde(default)]
    pub metrics: MetricsConfig,
    /// Notice texts applied to groups seen for the first time.
    #[serde(default)]
    pub notices: NoticesConfig,
    /// Regex word lists keyed by category (e.g. `reactive`).
    #[serde(default)]
    pub words: HashMap<String, Vec<String>>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

/// Persistence configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Path to the redb file, or `:memory:`.
    #[serde(default = "default_store_path")]
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

impl StoreConfig {
    pub fn is_memory(&self) -> bool {
        self.path == MEMORY_STORE
    }
}

fn default_store_path() -> String {
    MEMORY_STORE.to_string()
}

/// Inbound worker pool configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkersConfig {
    /// Events processed concurrently (default: 32).
    #[serde(default = "default_max_in_flight")]
    pub max_in_flight: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_in_flight: default_max_in_flight(),
        }
    }
}

fn default_max_in_flight() -> usize {
    32
}

/// Prometheus endpoint configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricsConfig {
    /// HTTP port for `/metrics`; 0 disables the endpoint.
    #[serde(default)]
    pub port: u16,
}

/// Default notice texts. Each may end with `[label](url)` button rows.
/// An empty text disables the notice.
#[derive(Debug, Clone, Deserialize)]
pub struct NoticesConfig {
    #[serde(default)]
    pub welcome: String,
    #[serde(default = "default_offtopic")]
    pub offtopic: String,
    #[serde(default)]
    pub reactive: String,
    /// Default text of the invite-link notice in a newly bound channel.
    #[serde(default = "default_channel_notice")]
    pub channel_notice: String,
    /// Shown in the bound channel while the invite link is closed.
    #[serde(default = "default_channel_closed")]
    pub channel_closed: String,
    /// Label of the invite-link button under the channel notice.
    #[serde(default = "default_channel_button")]
    pub channel_button: String,
}

impl Default for NoticesConfig {
    fn default() -> Self {
        Self {
            welcome: String::new(),
            offtopic: default_offtopic(),
            reactive: String::new(),
            channel_notice: default_channel_notice(),
            channel_closed: default_channel_closed(),
            channel_button: default_channel_button(),
        }
    }
}

fn default_offtopic() -> String {
    "Please keep the discussion on topic.".to_string()
}

fn default_channel_notice() -> String {
    "Join the group through the button below.".to_string()
}

fn default_channel_closed() -> String {
    "Joining is currently closed.".to_string()
}

fn default_channel_button() -> String {
    "Join".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_takes_every_default() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.store.is_memory());
        assert_eq!(config.workers.max_in_flight, 32);
        assert_eq!(config.metrics.port, 0);
        assert_eq!(config.timers.sweep_interval, 60);
        assert_eq!(config.limits.max_rules, 100);
        assert!(config.words.is_empty());
        assert!(config.notices.welcome.is_empty());
    }

    #[test]
    fn sections_override_defaults() {
        let config: Config = toml::from_str(
            r#"
[store]
path = "/var/lib/tipwarden/state.redb"

[metrics]
port = 9100

[notices]
welcome = "Hi $mention_name"

[words]
reactive = ["buy now", "cheap followers"]
"#,
        )
        .unwrap();
        assert!(!config.store.is_memory());
        assert_eq!(config.metrics.port, 9100);
        assert_eq!(config.notices.welcome, "Hi $mention_name");
        assert_eq!(config.words["reactive"].len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = Config::load("/nonexistent/tipwarden.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
