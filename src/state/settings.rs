//! Per-group settings.

use crate::config::NoticesConfig;
use serde::{Deserialize, Serialize};
use tipwarden_rules::{Notice, ValidationError, parse_notice};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettings {
    /// Whether the sweep deletes this group's expired notices.
    pub clean: bool,
    /// Rotation sends a new channel notice instead of editing in place.
    pub resend: bool,
    /// Empty text disables the notice.
    pub welcome: Notice,
    pub offtopic: Notice,
    pub reactive: Notice,
    pub channel_closed: String,
    pub channel_button: String,
}

impl GroupSettings {
    /// Settings for a group seen for the first time.
    pub fn from_notices(notices: &NoticesConfig, max_buttons: usize) -> Self {
        let notice = |text: &str| {
            parse_notice(text, max_buttons).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Invalid default notice, using it as plain text");
                Notice::text(text)
            })
        };
        Self {
            clean: true,
            resend: false,
            welcome: notice(&notices.welcome),
            offtopic: notice(&notices.offtopic),
            reactive: notice(&notices.reactive),
            channel_closed: notices.channel_closed.clone(),
            channel_button: notices.channel_button.clone(),
        }
    }
}

impl Default for GroupSettings {
    fn default() -> Self {
        Self::from_notices(&NoticesConfig::default(), usize::MAX)
    }
}

/// A partial settings update from an administrator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SettingsPatch {
    pub clean: Option<bool>,
    pub resend: Option<bool>,
    pub welcome: Option<String>,
    pub offtopic: Option<String>,
    pub reactive: Option<String>,
    pub channel_closed: Option<String>,
    pub channel_button: Option<String>,
}

impl SettingsPatch {
    /// Apply onto `settings`. Nothing changes unless every field is valid.
    pub fn apply(
        &self,
        settings: &mut GroupSettings,
        max_len: usize,
        max_buttons: usize,
    ) -> Result<(), ValidationError> {
        let parse = |text: &Option<String>| -> Result<Option<Notice>, ValidationError> {
            let Some(text) = text else { return Ok(None) };
            let len = text.chars().count();
            if len > max_len {
                return Err(ValidationError::PayloadTooLarge {
                    field: "notice",
                    len,
                    max: max_len,
                });
            }
            parse_notice(text, max_buttons).map(Some)
        };

        let welcome = parse(&self.welcome)?;
        let offtopic = parse(&self.offtopic)?;
        let reactive = parse(&self.reactive)?;

        if let Some(clean) = self.clean {
            settings.clean = clean;
        }
        if let Some(resend) = self.resend {
            settings.resend = resend;
        }
        if let Some(n) = welcome {
            settings.welcome = n;
        }
        if let Some(n) = offtopic {
            settings.offtopic = n;
        }
        if let Some(n) = reactive {
            settings.reactive = n;
        }
        if let Some(text) = &self.channel_closed {
            settings.channel_closed = text.clone();
        }
        if let Some(text) = &self.channel_button {
            settings.channel_button = text.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_cleaning_and_disable_welcome() {
        let settings = GroupSettings::default();
        assert!(settings.clean);
        assert!(!settings.resend);
        assert!(settings.welcome.text.is_empty());
        assert!(!settings.offtopic.text.is_empty());
    }

    #[test]
    fn patch_parses_buttons() {
        let mut settings = GroupSettings::default();
        let patch = SettingsPatch {
            welcome: Some("Hi!\n[Rules](https://example.org/rules)".into()),
            clean: Some(false),
            ..Default::default()
        };
        patch.apply(&mut settings, 4000, 6).unwrap();
        assert!(!settings.clean);
        assert_eq!(settings.welcome.text, "Hi!");
        assert_eq!(settings.welcome.button_count(), 1);
    }

    #[test]
    fn invalid_patch_changes_nothing() {
        let mut settings = GroupSettings::default();
        let before = settings.clone();
        let patch = SettingsPatch {
            clean: Some(false),
            offtopic: Some("x".repeat(50)),
            ..Default::default()
        };
        assert!(patch.apply(&mut settings, 10, 6).is_err());
        assert_eq!(settings, before);
    }
}
