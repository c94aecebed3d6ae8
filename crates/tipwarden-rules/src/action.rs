//! Moderation actions.
//!
//! Action strings such as `ban-300` are decoded exactly once, when a rule is
//! validated. Dispatch works on [`ActionPlan`] and never re-parses text.

use crate::error::ValidationError;
use std::fmt;
use std::time::Duration;

/// Shortest and longest digit count accepted for timed actions.
const TIMED_DIGITS: std::ops::RangeInclusive<usize> = 3..=8;

/// A single decoded action from a rule's action segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Reply,
    Delete,
    Kick,
    /// Ban, permanently when `None`.
    Ban(Option<Duration>),
    /// Revoke send permissions, permanently when `None`.
    Restrict(Option<Duration>),
}

impl Action {
    pub const DEFAULT_SEGMENT: &'static str = "reply";

    /// Decode one action token.
    pub fn parse(token: &str) -> Result<Self, ValidationError> {
        let invalid = || ValidationError::ActionInvalid(token.to_string());

        match token {
            "reply" => return Ok(Action::Reply),
            "delete" => return Ok(Action::Delete),
            "kick" => return Ok(Action::Kick),
            "ban" => return Ok(Action::Ban(None)),
            "restrict" => return Ok(Action::Restrict(None)),
            _ => {}
        }

        let (name, secs) = token.split_once('-').ok_or_else(invalid)?;
        if !TIMED_DIGITS.contains(&secs.len()) || !secs.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let secs: u64 = secs.parse().map_err(|_| invalid())?;
        let span = Some(Duration::from_secs(secs));

        match name {
            "ban" => Ok(Action::Ban(span)),
            "restrict" => Ok(Action::Restrict(span)),
            _ => Err(invalid()),
        }
    }

    /// Whether this action removes or silences the author.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Action::Kick | Action::Ban(_) | Action::Restrict(_))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Reply => f.write_str("reply"),
            Action::Delete => f.write_str("delete"),
            Action::Kick => f.write_str("kick"),
            Action::Ban(None) => f.write_str("ban"),
            Action::Ban(Some(d)) => write!(f, "ban-{}", d.as_secs()),
            Action::Restrict(None) => f.write_str("restrict"),
            Action::Restrict(Some(d)) => write!(f, "restrict-{}", d.as_secs()),
        }
    }
}

/// The single terminal action a rule may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "lowercase"))]
pub enum Terminal {
    Kick,
    Ban { span: Option<Duration> },
    Restrict { span: Option<Duration> },
}

impl Terminal {
    /// Absolute expiry (unix seconds) for timed variants, `None` if permanent.
    pub fn until(&self, now: i64) -> Option<i64> {
        match self {
            Terminal::Kick => None,
            Terminal::Ban { span } | Terminal::Restrict { span } => {
                span.map(|d| now.saturating_add(d.as_secs() as i64))
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Terminal::Kick => "kick",
            Terminal::Ban { .. } => "ban",
            Terminal::Restrict { .. } => "restrict",
        }
    }

    fn as_action(&self) -> Action {
        match *self {
            Terminal::Kick => Action::Kick,
            Terminal::Ban { span } => Action::Ban(span),
            Terminal::Restrict { span } => Action::Restrict(span),
        }
    }
}

/// Resolved action set: independent reply/delete flags plus at most one
/// terminal action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionPlan {
    pub reply: bool,
    pub delete: bool,
    pub terminal: Option<Terminal>,
}

impl ActionPlan {
    /// Parse a whitespace-separated action segment and resolve it.
    pub fn parse(segment: &str) -> Result<Self, ValidationError> {
        let actions = segment
            .split_whitespace()
            .map(Action::parse)
            .collect::<Result<Vec<_>, _>>()?;
        if actions.is_empty() {
            return Err(ValidationError::MissingField("actions"));
        }
        Self::resolve(&actions)
    }

    /// Partition decoded actions, rejecting more than one terminal action.
    pub fn resolve(actions: &[Action]) -> Result<Self, ValidationError> {
        let mut plan = ActionPlan::default();

        for action in actions {
            let terminal = match *action {
                Action::Reply => {
                    plan.reply = true;
                    continue;
                }
                Action::Delete => {
                    plan.delete = true;
                    continue;
                }
                Action::Kick => Terminal::Kick,
                Action::Ban(span) => Terminal::Ban { span },
                Action::Restrict(span) => Terminal::Restrict { span },
            };

            match plan.terminal {
                Some(existing) if existing != terminal => {
                    return Err(ValidationError::ActionConflict(
                        existing.as_action().to_string(),
                        action.to_string(),
                    ));
                }
                _ => plan.terminal = Some(terminal),
            }
        }

        Ok(plan)
    }

    /// Actions in canonical order, for display and audit.
    pub fn actions(&self) -> Vec<Action> {
        let mut out = Vec::with_capacity(3);
        if self.reply {
            out.push(Action::Reply);
        }
        if self.delete {
            out.push(Action::Delete);
        }
        if let Some(terminal) = self.terminal {
            out.push(terminal.as_action());
        }
        out
    }
}

impl fmt::Display for ActionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.actions().iter().map(Action::to_string).collect();
        f.write_str(&parts.join(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_timed_actions_once() {
        assert_eq!(
            Action::parse("ban-300").unwrap(),
            Action::Ban(Some(Duration::from_secs(300)))
        );
        assert_eq!(
            Action::parse("restrict-86400").unwrap(),
            Action::Restrict(Some(Duration::from_secs(86400)))
        );
    }

    #[test]
    fn rejects_malformed_timed_actions() {
        for bad in ["ban-", "ban-12", "ban-123456789", "ban-3o0", "kick-300", "mute", "ban300"] {
            assert!(
                matches!(Action::parse(bad), Err(ValidationError::ActionInvalid(_))),
                "{bad} should be invalid"
            );
        }
    }

    #[test]
    fn kick_and_ban_conflict() {
        let err = ActionPlan::parse("kick ban").unwrap_err();
        assert_eq!(err, ValidationError::ActionConflict("kick".into(), "ban".into()));
    }

    #[test]
    fn permanent_and_timed_ban_conflict() {
        assert!(matches!(
            ActionPlan::parse("ban ban-300"),
            Err(ValidationError::ActionConflict(_, _))
        ));
    }

    #[test]
    fn reply_and_delete_combine_with_one_terminal() {
        let plan = ActionPlan::parse("reply delete restrict-600").unwrap();
        assert!(plan.reply);
        assert!(plan.delete);
        assert_eq!(
            plan.terminal,
            Some(Terminal::Restrict {
                span: Some(Duration::from_secs(600))
            })
        );
        assert_eq!(plan.to_string(), "reply delete restrict-600");
    }

    #[test]
    fn until_is_relative_to_now() {
        let ban = Terminal::Ban {
            span: Some(Duration::from_secs(300)),
        };
        assert_eq!(ban.until(1_000), Some(1_300));
        assert_eq!(Terminal::Kick.until(1_000), None);
        assert_eq!(Terminal::Restrict { span: None }.until(1_000), None);
    }

    #[test]
    fn empty_segment_is_missing() {
        assert_eq!(
            ActionPlan::parse(""),
            Err(ValidationError::MissingField("actions"))
        );
    }
}
