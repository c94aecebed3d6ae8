//! Timer cadences and fixed destruct intervals.
//!
//! All values are seconds. A destruct interval of 0 means the notice is
//! never deleted by the sweep.

use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct TimersConfig {
    /// Sweep and channel-rotation tick (default: 60).
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval: u64,
    /// Keyword-reply dedup ledger reset (default: 600).
    #[serde(default = "default_notify_reset_interval")]
    pub notify_reset_interval: u64,
    /// Daily counter reset (default: 86400).
    #[serde(default = "default_counter_reset_interval")]
    pub counter_reset_interval: u64,
    /// Off-topic notice lifetime (default: 600).
    #[serde(default = "default_offtopic_destruct")]
    pub offtopic_destruct: u64,
    /// Welcome notice lifetime (default: 600).
    #[serde(default = "default_welcome_destruct")]
    pub welcome_destruct: u64,
    /// Reactive notice lifetime (default: 300).
    #[serde(default = "default_reactive_destruct")]
    pub reactive_destruct: u64,
    /// Channel link notice lifetime (default: never).
    #[serde(default)]
    pub channel_link_destruct: u64,
    /// Invite link rotation interval (default: 3600).
    #[serde(default = "default_channel_rotation")]
    pub channel_rotation: u64,
    /// Rule edit lease lifetime (default: 600).
    #[serde(default = "default_edit_lock_ttl")]
    pub edit_lock_ttl: u64,
    /// Pause between the ban and unban of a kick (default: 3).
    #[serde(default = "default_kick_unban_delay")]
    pub kick_unban_delay: u64,
    /// Window in which an identical keyword reply to the same author is
    /// not re-announced (default: 600).
    #[serde(default = "default_notify_window")]
    pub notify_window: u64,
}

impl Default for TimersConfig {
    fn default() -> Self {
        Self {
            sweep_interval: default_sweep_interval(),
            notify_reset_interval: default_notify_reset_interval(),
            counter_reset_interval: default_counter_reset_interval(),
            offtopic_destruct: default_offtopic_destruct(),
            welcome_destruct: default_welcome_destruct(),
            reactive_destruct: default_reactive_destruct(),
            channel_link_destruct: 0,
            channel_rotation: default_channel_rotation(),
            edit_lock_ttl: default_edit_lock_ttl(),
            kick_unban_delay: default_kick_unban_delay(),
            notify_window: default_notify_window(),
        }
    }
}

impl TimersConfig {
    pub fn kick_unban_delay(&self) -> Duration {
        Duration::from_secs(self.kick_unban_delay)
    }
}

fn default_sweep_interval() -> u64 {
    60
}

fn default_notify_reset_interval() -> u64 {
    600
}

fn default_counter_reset_interval() -> u64 {
    86400
}

fn default_offtopic_destruct() -> u64 {
    600
}

fn default_welcome_destruct() -> u64 {
    600
}

fn default_reactive_destruct() -> u64 {
    300
}

fn default_channel_rotation() -> u64 {
    3600
}

fn default_edit_lock_ttl() -> u64 {
    600
}

fn default_kick_unban_delay() -> u64 {
    3
}

fn default_notify_window() -> u64 {
    600
}
