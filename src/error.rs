//! Unified error handling for tipwarden.
//!
//! One enum per concern, each with a static `error_code()` for metric
//! labels. None of these is fatal to the process.

use crate::platform::{ChatId, MessageId, PlatformError, UserId};
use thiserror::Error;
use tipwarden_rules::ValidationError;

// ============================================================================
// Dispatch Errors (platform-facing steps)
// ============================================================================

/// A dispatch step that produced no visible effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("platform rejected {op}: {source}")]
    PlatformRejected {
        op: &'static str,
        #[source]
        source: PlatformError,
    },

    #[error("message {0} already deleted")]
    AlreadyDeleted(MessageId),
}

impl DispatchError {
    /// Wrap a platform failure for operation `op`.
    pub fn rejected(op: &'static str) -> impl FnOnce(PlatformError) -> Self {
        move |source| Self::PlatformRejected { op, source }
    }

    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PlatformRejected { .. } => "platform_rejected",
            Self::AlreadyDeleted(_) => "already_deleted",
        }
    }
}

// ============================================================================
// Lock Errors (rule edit lease)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LockError {
    #[error("rules are currently being edited by {owner}")]
    AlreadyLocked { owner: UserId, until: i64 },
}

impl LockError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyLocked { .. } => "already_locked",
        }
    }
}

// ============================================================================
// Channel Errors (binding transitions)
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    #[error("no channel is bound")]
    NotBound,

    #[error("invite link is closed")]
    Closed,

    #[error("invite link is already open")]
    AlreadyOpen,

    #[error("channel {0} is no longer reachable; binding removed")]
    Unreachable(ChatId),

    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),
}

impl ChannelError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotBound => "not_bound",
            Self::Closed => "closed",
            Self::AlreadyOpen => "already_open",
            Self::Unreachable(_) => "unreachable",
            Self::Platform(_) => "platform",
        }
    }
}

// ============================================================================
// Command Errors (administrator surface)
// ============================================================================

/// Reasons an administrator command was refused. Rendered back to the admin
/// as a structured result, never raised past the command surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("invalid rule: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Locked(#[from] LockError),

    #[error("unknown rule: {0}")]
    UnknownRule(String),

    #[error("user {0} is not an administrator")]
    NotAdmin(UserId),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("invalid pattern: {0}")]
    Pattern(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CommandError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Invalid(e) => e.error_code(),
            Self::Locked(e) => e.error_code(),
            Self::UnknownRule(_) => "unknown_rule",
            Self::NotAdmin(_) => "not_admin",
            Self::Channel(e) => e.error_code(),
            Self::Pattern(_) => "invalid_pattern",
            Self::Dispatch(e) => e.error_code(),
        }
    }
}

impl From<regex::Error> for CommandError {
    fn from(e: regex::Error) -> Self {
        Self::Pattern(e.to_string())
    }
}
