//! Integration test common infrastructure.
//!
//! A recording [`Platform`] double with injectable failures, plus helpers to
//! build a [`Warden`] around it.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use tipwarden::Warden;
use tipwarden::config::Config;
use tipwarden::platform::{ChatId, GroupId, MessageId, Platform, PlatformError, UserId};
use tipwarden::services::{Author, InboundMessage};
use tipwarden::state::{GroupState, SlotKey};
use tipwarden::store::{MemoryStore, Store};
use tipwarden_rules::Notice;

pub const GROUP: GroupId = -100;
pub const CHANNEL: ChatId = -200;
pub const ADMIN: UserId = 1;
pub const OTHER_ADMIN: UserId = 2;
pub const MEMBER: UserId = 10;

/// Ids handed out by the mock start here, away from test message ids.
pub const FIRST_ID: MessageId = 5000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Send {
        chat: ChatId,
        /// 0 when the send failed.
        message: MessageId,
        text: String,
        buttons: usize,
        reply_to: Option<MessageId>,
    },
    Edit {
        chat: ChatId,
        message: MessageId,
        text: String,
    },
    Delete {
        chat: ChatId,
        messages: Vec<MessageId>,
    },
    Ban {
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    },
    Unban {
        chat: ChatId,
        user: UserId,
    },
    Restrict {
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    },
    Export {
        chat: ChatId,
    },
}

/// Records every call in order; operations can be made to fail by name.
pub struct MockPlatform {
    calls: Mutex<Vec<Call>>,
    next_id: AtomicI64,
    failures: Mutex<HashMap<&'static str, PlatformError>>,
    links: AtomicI64,
}

impl MockPlatform {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            calls: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(FIRST_ID),
            failures: Mutex::new(HashMap::new()),
            links: AtomicI64::new(0),
        })
    }

    /// Make every future `op` call fail with `error`.
    pub fn fail(&self, op: &'static str, error: PlatformError) {
        self.failures.lock().insert(op, error);
    }

    pub fn recover(&self, op: &'static str) {
        self.failures.lock().remove(op);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    /// Every message id a delete was requested for, in order.
    pub fn deleted(&self) -> Vec<MessageId> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Delete { messages, .. } => Some(messages.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Successful sends as `(chat, message, text)`.
    pub fn sent(&self) -> Vec<(ChatId, MessageId, String)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|c| match c {
                Call::Send {
                    chat,
                    message,
                    text,
                    ..
                } if *message != 0 => Some((*chat, *message, text.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn check(&self, op: &'static str) -> Result<(), PlatformError> {
        match self.failures.lock().get(op) {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Platform for MockPlatform {
    async fn send_message(
        &self,
        chat: ChatId,
        notice: &Notice,
        reply_to: Option<MessageId>,
    ) -> Result<MessageId, PlatformError> {
        let result = self
            .check("send_message")
            .map(|()| self.next_id.fetch_add(1, Ordering::SeqCst));
        self.record(Call::Send {
            chat,
            message: *result.as_ref().unwrap_or(&0),
            text: notice.text.clone(),
            buttons: notice.button_count(),
            reply_to,
        });
        result
    }

    async fn edit_message(
        &self,
        chat: ChatId,
        message: MessageId,
        notice: &Notice,
    ) -> Result<(), PlatformError> {
        self.record(Call::Edit {
            chat,
            message,
            text: notice.text.clone(),
        });
        self.check("edit_message")
    }

    async fn delete_messages(
        &self,
        chat: ChatId,
        messages: &[MessageId],
    ) -> Result<(), PlatformError> {
        self.record(Call::Delete {
            chat,
            messages: messages.to_vec(),
        });
        self.check("delete_messages")
    }

    async fn ban_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError> {
        self.record(Call::Ban { chat, user, until });
        self.check("ban_member")
    }

    async fn unban_member(&self, chat: ChatId, user: UserId) -> Result<(), PlatformError> {
        self.record(Call::Unban { chat, user });
        self.check("unban_member")
    }

    async fn restrict_member(
        &self,
        chat: ChatId,
        user: UserId,
        until: Option<i64>,
    ) -> Result<(), PlatformError> {
        self.record(Call::Restrict { chat, user, until });
        self.check("restrict_member")
    }

    async fn export_invite_link(&self, chat: ChatId) -> Result<String, PlatformError> {
        self.record(Call::Export { chat });
        self.check("export_invite_link")?;
        let n = self.links.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://t.me/+link{n}"))
    }
}

/// Default config without the kick pause.
pub fn config() -> Config {
    let mut config = Config::default();
    config.timers.kick_unban_delay = 0;
    config
}

pub fn warden(platform: &Arc<MockPlatform>) -> Warden {
    warden_with(platform, config(), Arc::new(MemoryStore::new()))
}

/// Warden with [`ADMIN`] and [`OTHER_ADMIN`] administering [`GROUP`].
pub fn warden_with(platform: &Arc<MockPlatform>, config: Config, store: Arc<dyn Store>) -> Warden {
    let platform: Arc<dyn Platform> = platform.clone();
    let warden = Warden::new(config, platform, store).expect("valid word lists");
    warden.refresh_admins(GROUP, vec![ADMIN, OTHER_ADMIN]);
    warden
}

pub fn message(id: MessageId, author: UserId, text: &str) -> InboundMessage {
    InboundMessage {
        group: GROUP,
        message_id: id,
        author: Author {
            id: author,
            name: format!("user{author}"),
        },
        text: Some(text.to_string()),
        forwarded_from: None,
        forwarded: false,
    }
}

pub fn group(warden: &Warden) -> Arc<GroupState> {
    warden.registry().get(GROUP).expect("group is tracked")
}

/// Current occupant id of a slot, 0 when empty.
pub fn slot(warden: &Warden, key: SlotKey) -> MessageId {
    group(warden).messages(|m| m.slots.get(&key).message_id)
}

pub fn keyword(key: &str) -> SlotKey {
    SlotKey::Keyword(key.to_string())
}

/// Join raw segments with the rule separator.
pub fn raw(parts: &[&str]) -> String {
    parts.join(tipwarden_rules::SEGMENT_SEPARATOR)
}
