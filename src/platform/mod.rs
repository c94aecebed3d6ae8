//! Chat platform abstraction.
//!
//! The platform client owns its own flood-control and retry policy. Every
//! call returns one of three outcomes: success, a soft failure the caller
//! treats as "no effect" ([`PlatformError::Denied`]), or a hard failure.

use async_trait::async_trait;
use thiserror::Error;
use tipwarden_rules::Notice;

pub mod console;

pub use console::ConsolePlatform;

pub type ChatId = i64;
/// Groups are chats; the id doubles as the chat to post notices in.
pub type GroupId = ChatId;
pub type MessageId = i64;
pub type UserId = i64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    /// The platform refused (missing rights, message already gone, ...).
    #[error("denied: {0}")]
    Denied(String),

    /// The chat can no longer be reached by the bot.
    #[error("chat unreachable")]
    Unreachable,

    #[error("request failed: {0}")]
    Failed(String),
}

impl PlatformError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Denied(_) => "denied",
            Self::Unreachable => "unreachable",
            Self::Failed(_) => "failed",
        }
    }
}

#[async_trait]
pub trait Platform: Send + Sync {
    /// Send a notice, optionally as a reply to `reply_to`. Returns the new id.
    async fn send_message(
        &self,
        chat: ChatId,
        notice: &Notice,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, PlatformError>;

    /// Replace the text and buttons of an existing message.
    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        notice: &Notice,
    ) -> Result<(), PlatformError>;

    async fn delete_messages(
        &self,
        chat: ChatId,
        messages: &[MessageId],
    ) -> Result<(), PlatformError>;

    /// Ban a member, permanently when `until` is `None` (unix seconds).
    async fn ban_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError>;

    async fn unban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError>;

    /// Revoke send permissions, permanently when `until` is `None`.
    async fn restrict_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError>;

    /// Create a fresh invite link for `chat`.
    async fn export_invite_link(&self, chat: ChatId) -> Result<String, PlatformError>;
}
