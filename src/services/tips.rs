//! Tip slot publishing.
//!
//! Each publish deletes the slot's previous occupant, sends the new notice and
//! records it. The message lock is only held to read or update the slot table,
//! never across a platform call. Two concurrent publishes into one slot both
//! succeed and the loser of the final `occupy` is deleted, so at most one
//! notice stays live per slot.

use crate::error::DispatchError;
use crate::metrics;
use crate::platform::{MessageId, UserId};
use crate::state::{GroupState, SlotKey};
use crate::warden::{Warden, platform_failed};
use serde::Serialize;
use tipwarden_rules::{Notice, TemplateContext, render};
use tracing::debug;

/// Result of publishing a keyword reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "message_id", rename_all = "snake_case")]
pub enum ReplyOutcome {
    Sent(MessageId),
    /// The same author already has this exact reply live in the slot.
    AlreadyNotified(MessageId),
}

/// Render a notice's text, keeping its buttons.
pub fn render_notice(notice: &Notice, ctx: &TemplateContext<'_>) -> Notice {
    Notice {
        text: render(&notice.text, ctx),
        buttons: notice.buttons.clone(),
    }
}

impl Warden {
    /// Publish `notice` into slot `key`, replacing any live occupant.
    pub async fn publish(
        &self,
        group: &GroupState,
        key: SlotKey,
        notice: &Notice,
        anchor: Option<MessageId>,
        now: i64,
    ) -> Result<MessageId, DispatchError> {
        let previous = group.messages(|m| m.slots.get(&key));
        if previous.is_live() {
            self.delete_quietly(group.id, previous.message_id).await;
        }

        let message_id = match self.platform.send_message(group.id, notice, anchor).await {
            Ok(id) => id,
            Err(e) => {
                platform_failed(group.id, "send_message", &e);
                if previous.is_live()
                    && group.messages(|m| m.slots.clear_if(&key, previous.message_id))
                {
                    self.persist_slots(group);
                }
                return Err(DispatchError::rejected("send_message")(e));
            }
        };

        let displaced = group.messages(|m| m.slots.occupy(key.clone(), message_id, now));
        if displaced.is_live() && displaced.message_id != previous.message_id {
            debug!(group = group.id, slot = %key, message = displaced.message_id, "Deleting concurrent occupant");
            self.delete_quietly(group.id, displaced.message_id).await;
        }
        self.persist_slots(group);

        metrics::record_tip(key.kind());
        debug!(group = group.id, slot = %key, message = message_id, "Published tip");
        Ok(message_id)
    }

    /// Publish a rendered keyword reply unless the author already has the
    /// identical reply live within the notify window.
    pub async fn publish_reply(
        &self,
        group: &GroupState,
        rule: &str,
        author: UserId,
        notice: &Notice,
        anchor: Option<MessageId>,
        now: i64,
    ) -> Result<ReplyOutcome, DispatchError> {
        let window = i64::try_from(self.config.timers.notify_window).unwrap_or(i64::MAX);
        if let Some(existing) =
            group.messages(|m| m.already_notified(rule, author, &notice.text, now, window))
        {
            debug!(group = group.id, rule, author, "Reply already live for author");
            return Ok(ReplyOutcome::AlreadyNotified(existing));
        }

        let message_id = self
            .publish(group, SlotKey::Keyword(rule.to_string()), notice, anchor, now)
            .await?;
        group.messages(|m| m.record_notified(rule, author, notice.text.clone(), message_id, now));
        Ok(ReplyOutcome::Sent(message_id))
    }
}
