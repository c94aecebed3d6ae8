//! Configuration validation.
//!
//! Validates configuration at startup to catch common errors early.

use super::Config;
use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tipwarden_rules::parse_notice;

/// Validation errors for configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("timers.{0} must be greater than zero")]
    ZeroInterval(&'static str),
    #[error("limits.destruct_min ({min}) must be positive and not above limits.destruct_max ({max})")]
    DestructRange { min: u32, max: u32 },
    #[error("limits.default_destruct ({0}) is outside the destruct range")]
    DefaultDestructOutOfRange(u32),
    #[error("limits.{0} must be greater than zero")]
    ZeroLimit(&'static str),
    #[error("workers.max_in_flight must be greater than zero")]
    NoWorkers,
    #[error("words.{category}: invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        category: String,
        pattern: String,
        reason: String,
    },
    #[error("notices.{name}: {reason}")]
    InvalidNotice { name: &'static str, reason: String },
    #[error("store.path parent directory does not exist: {0}")]
    StorePathInvalid(String),
}

/// Validate a configuration, returning all errors found.
pub fn validate(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let timers = &config.timers;
    for (name, value) in [
        ("sweep_interval", timers.sweep_interval),
        ("notify_reset_interval", timers.notify_reset_interval),
        ("counter_reset_interval", timers.counter_reset_interval),
        ("channel_rotation", timers.channel_rotation),
        ("edit_lock_ttl", timers.edit_lock_ttl),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroInterval(name));
        }
    }

    let limits = &config.limits;
    if limits.destruct_min == 0 || limits.destruct_min > limits.destruct_max {
        errors.push(ValidationError::DestructRange {
            min: limits.destruct_min,
            max: limits.destruct_max,
        });
    } else if !(limits.destruct_min..=limits.destruct_max).contains(&limits.default_destruct) {
        errors.push(ValidationError::DefaultDestructOutOfRange(
            limits.default_destruct,
        ));
    }
    for (name, value) in [
        ("max_rules", limits.max_rules),
        ("max_raw_len", limits.max_raw_len),
        ("max_reply_len", limits.max_reply_len),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroLimit(name));
        }
    }

    if config.workers.max_in_flight == 0 {
        errors.push(ValidationError::NoWorkers);
    }

    for (category, patterns) in &config.words {
        for pattern in patterns {
            if let Err(e) = Regex::new(pattern) {
                errors.push(ValidationError::InvalidPattern {
                    category: category.clone(),
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let notices = &config.notices;
    for (name, text) in [
        ("welcome", &notices.welcome),
        ("offtopic", &notices.offtopic),
        ("reactive", &notices.reactive),
        ("channel_closed", &notices.channel_closed),
    ] {
        if let Err(e) = parse_notice(text, limits.max_buttons) {
            errors.push(ValidationError::InvalidNotice {
                name,
                reason: e.to_string(),
            });
        }
    }

    if !config.store.is_memory() {
        let path = Path::new(&config.store.path);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            errors.push(ValidationError::StorePathInvalid(config.store.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
