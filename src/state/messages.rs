//! Message-processing state of one group.
//!
//! Everything here is guarded by the group's message lock: the slot table,
//! the keyword-reply dedup ledger, declared message ids and the set of
//! members already welcomed.

use crate::platform::{MessageId, UserId};
use crate::state::slot::{SlotKey, SlotTable};
use std::collections::{HashMap, HashSet};

/// A keyword reply already shown to one author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notified {
    pub payload: String,
    pub message_id: MessageId,
    pub at: i64,
}

#[derive(Debug, Default)]
pub struct MessageState {
    pub slots: SlotTable,
    notified: HashMap<(String, UserId), Notified>,
    declared: HashSet<MessageId>,
    welcomed: HashSet<UserId>,
}

impl MessageState {
    pub fn with_slots(slots: SlotTable) -> Self {
        Self {
            slots,
            ..Self::default()
        }
    }

    /// Record that another component already handled `message`.
    pub fn declare(&mut self, message: MessageId) {
        self.declared.insert(message);
    }

    /// Consume a declaration. True if `message` was declared.
    pub fn take_declared(&mut self, message: MessageId) -> bool {
        self.declared.remove(&message)
    }

    /// Mark `user` welcomed. False if they already were.
    pub fn welcome(&mut self, user: UserId) -> bool {
        self.welcomed.insert(user)
    }

    /// The live reply this author already got for identical content, if any.
    ///
    /// Only counts while the recorded message still occupies the rule's slot
    /// and the notification is younger than `window` seconds.
    pub fn already_notified(
        &self,
        rule: &str,
        author: UserId,
        payload: &str,
        now: i64,
        window: i64,
    ) -> Option<MessageId> {
        let entry = self.notified.get(&(rule.to_string(), author))?;
        let slot = self.slots.get(&SlotKey::Keyword(rule.to_string()));
        let fresh = now.saturating_sub(entry.at) < window;
        (fresh && entry.payload == payload && slot.is_live() && slot.message_id == entry.message_id)
            .then_some(entry.message_id)
    }

    pub fn record_notified(
        &mut self,
        rule: &str,
        author: UserId,
        payload: String,
        message_id: MessageId,
        now: i64,
    ) {
        self.notified.insert(
            (rule.to_string(), author),
            Notified {
                payload,
                message_id,
                at: now,
            },
        );
    }

    /// Periodic reset of the dedup ledger and stale declarations.
    pub fn reset_notifications(&mut self) {
        self.notified.clear();
        self.declared.clear();
    }
}
