//! Validation errors for raw rule specifications.

use thiserror::Error;

/// Why a raw rule specification was rejected.
///
/// Each variant corresponds to one admin-facing reason; the command surface
/// renders them without ever treating invalid input as exceptional.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("missing field: {0}")]
    MissingField(&'static str),

    #[error("too many rules (limit {0})")]
    TooManyRules(usize),

    #[error("{field} too large: {len} > {max}")]
    PayloadTooLarge {
        field: &'static str,
        len: usize,
        max: usize,
    },

    #[error("invalid match mode: {0}")]
    ModeInvalid(String),

    #[error("match modes include and exact are mutually exclusive")]
    ModeConflict,

    #[error("one of include or exact is required")]
    ModeMissing,

    #[error("invalid action: {0}")]
    ActionInvalid(String),

    #[error("conflicting terminal actions: {0} and {1}")]
    ActionConflict(String, String),

    #[error("invalid target: {0}")]
    TargetInvalid(String),

    #[error("invalid destruct seconds: {0}")]
    DestructInvalid(String),

    #[error("too many buttons: {count} > {max}")]
    ButtonOverflow { count: usize, max: usize },

    #[error("invalid button markup: {0}")]
    MarkupInvalid(String),
}

impl ValidationError {
    /// Static error code for metric labels and admin reports.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingField(_) => "missing_field",
            Self::TooManyRules(_) => "too_many_rules",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::ModeInvalid(_) => "mode_invalid",
            Self::ModeConflict => "mode_conflict",
            Self::ModeMissing => "mode_missing",
            Self::ActionInvalid(_) => "action_invalid",
            Self::ActionConflict(_, _) => "action_conflict",
            Self::TargetInvalid(_) => "target_invalid",
            Self::DestructInvalid(_) => "destruct_invalid",
            Self::ButtonOverflow { .. } => "button_overflow",
            Self::MarkupInvalid(_) => "markup_invalid",
        }
    }
}
