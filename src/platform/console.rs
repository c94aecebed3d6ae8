//! Platform that prints each requested call as a JSON line.
//!
//! Lets the daemon run end to end without a chat network: an external
//! relay (or a human) reads the calls from stdout.

use super::{ChatId, MessageId, Platform, PlatformError, UserId};
use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicI64, Ordering};
use tipwarden_rules::{Button, Notice};

#[derive(Debug, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
enum Call<'a> {
    SendMessage {
        chat: ChatId,
        message_id: MessageId,
        text: &'a str,
        buttons: &'a [Vec<Button>],
        #[serde(skip_serializing_if = "Option::is_none")]
        reply_to: Option<MessageId>,
    },
    EditMessage {
        chat: ChatId,
        message_id: MessageId,
        text: &'a str,
        buttons: &'a [Vec<Button>],
    },
    DeleteMessages {
        chat: ChatId,
        message_ids: &'a [MessageId],
    },
    BanMember {
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    },
    UnbanMember {
        chat: ChatId,
        user: UserId,
    },
    RestrictMember {
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    },
    ExportInviteLink {
        chat: ChatId,
        link: &'a str,
    },
}

pub struct ConsolePlatform {
    out: Mutex<Box<dyn Write + Send>>,
    next_id: AtomicI64,
}

impl ConsolePlatform {
    pub fn new() -> Self {
        Self::with_writer(Box::new(std::io::stdout()))
    }

    pub fn with_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out: Mutex::new(out),
            next_id: AtomicI64::new(1),
        }
    }

    fn emit(&self, call: &Call<'_>) -> Result<(), PlatformError> {
        let line = serde_json::to_string(call).map_err(|e| PlatformError::Failed(e.to_string()))?;
        let mut out = self.out.lock();
        let written = writeln!(out, "{line}");
        written
            .and_then(|()| out.flush())
            .map_err(|e| PlatformError::Failed(e.to_string()))
    }
}

impl Default for ConsolePlatform {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Platform for ConsolePlatform {
    async fn send_message(
        &self,
        chat: ChatId,
        notice: &Notice,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, PlatformError> {
        let message_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.emit(&Call::SendMessage {
            chat,
            message_id,
            text: &notice.text,
            buttons: &notice.buttons,
            reply_to,
        })?;
        Ok(message_id)
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        notice: &Notice,
    ) -> Result<(), PlatformError> {
        self.emit(&Call::EditMessage {
            chat,
            message_id: message,
            text: &notice.text,
            buttons: &notice.buttons,
        })
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        messages: &[MessageId],
    ) -> Result<(), PlatformError> {
        self.emit(&Call::DeleteMessages {
            chat,
            message_ids: messages,
        })
    }

    async fn ban_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError> {
        self.emit(&Call::BanMember { chat, user, until })
    }

    async fn unban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.emit(&Call::UnbanMember { chat, user })
    }

    async fn restrict_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError> {
        self.emit(&Call::RestrictMember { chat, user, until })
    }

    async fn export_invite_link(&self, chat: ChatId) -> Result<String, PlatformError> {
        let token: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(16)
            .map(char::from)
            .collect();
        let link = format!("https://t.me/+{token}");
        self.emit(&Call::ExportInviteLink { chat, link: &link })?;
        Ok(link)
    }
}
