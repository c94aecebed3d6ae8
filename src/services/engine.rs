//! Inbound message handling: declared pre-check, keyword rules, then the
//! group-wide reactive fallback.

use super::dispatch::DispatchOutcome;
use super::tips::render_notice;
use crate::metrics;
use crate::platform::{GroupId, MessageId, UserId};
use crate::state::{GroupState, SlotKey};
use crate::warden::{Warden, step_failed};
use serde::{Deserialize, Serialize};
use tipwarden_rules::{MessageView, REACTIVE, Role, TemplateContext, match_rules};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
}

/// A group message as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub group: GroupId,
    pub message_id: MessageId,
    pub author: Author,
    /// Text or caption.
    #[serde(default)]
    pub text: Option<String>,
    /// Display name of the original sender when forwarded.
    #[serde(default)]
    pub forwarded_from: Option<String>,
    #[serde(default)]
    pub forwarded: bool,
}

impl InboundMessage {
    fn view(&self, role: Role) -> MessageView<'_> {
        let name = self
            .forwarded_from
            .as_deref()
            .or(Some(self.author.name.as_str()))
            .filter(|n| !n.is_empty());
        MessageView {
            text: self.text.as_deref(),
            name,
            forwarded: self.forwarded || self.forwarded_from.is_some(),
            role,
        }
    }
}

/// How a message was handled; `None` from [`Warden::handle_message`] means
/// nothing applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "handled", rename_all = "snake_case")]
pub enum Handled {
    /// Another component already claimed the message.
    Declared,
    Keyword {
        key: String,
        word: String,
        outcome: DispatchOutcome,
    },
    Reactive {
        pattern: String,
        reply: Option<MessageId>,
    },
}

impl Warden {
    /// Mark a message as already handled so the matcher skips it.
    pub fn mark_declared(&self, group: GroupId, message: MessageId) {
        self.group(group).messages(|m| m.declare(message));
        debug!(group, message, "Message declared");
    }

    pub async fn handle_message(&self, message: &InboundMessage, now: i64) -> Option<Handled> {
        self.screen(message, true, now).await
    }

    /// Declared pre-check, keyword rules, then the reactive fallback. Rule
    /// hits are only counted for regular messages.
    pub(crate) async fn screen(
        &self,
        message: &InboundMessage,
        count_hits: bool,
        now: i64,
    ) -> Option<Handled> {
        let group = self.group(message.group);
        if group.messages(|m| m.take_declared(message.message_id)) {
            debug!(group = group.id, message = message.message_id, "Skipping declared message");
            return Some(Handled::Declared);
        }

        let role = group.role_of(message.author.id);
        let view = message.view(role);
        let matched = group.rules(|rules| {
            let found = match_rules(rules, &view)?;
            let rule = rules.get(&found.key)?.clone();
            Some((found, rule))
        });

        let Some((found, rule)) = matched else {
            return self.react(&group, message, role, now).await;
        };

        if count_hits && group.rules_mut(|rules| rules.record_hit(&found.key)) {
            self.persist_rules(&group);
        }
        metrics::record_rule_match();
        info!(group = group.id, key = %found.key, word = %found.word, author = message.author.id, "Keyword rule matched");

        let outcome = self.dispatch(&group, message, &rule, &found.word, now).await;
        Some(Handled::Keyword {
            key: found.key,
            word: found.word,
            outcome,
        })
    }

    /// Reactive fallback: members only, text messages only.
    async fn react(
        &self,
        group: &GroupState,
        message: &InboundMessage,
        role: Role,
        now: i64,
    ) -> Option<Handled> {
        if role == Role::Admin {
            return None;
        }
        let text = message.text.as_deref()?;
        let pattern = self.words.read().find(REACTIVE, text).map(str::to_owned)?;
        metrics::record_reactive_match();
        debug!(group = group.id, %pattern, "Reactive pattern matched");

        let template = group.settings(|s| s.reactive.clone());
        if template.text.is_empty() {
            return Some(Handled::Reactive {
                pattern,
                reply: None,
            });
        }

        let destruct = u32::try_from(self.config.timers.reactive_destruct)
            .ok()
            .filter(|secs| *secs > 0);
        let ctx = TemplateContext {
            user_id: message.author.id,
            user_name: &message.author.name,
            destruct,
            keyword: Some(&pattern),
        };
        let notice = render_notice(&template, &ctx);
        let reply = match self
            .publish(group, SlotKey::Reactive, &notice, Some(message.message_id), now)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                step_failed(group.id, "reactive", &e);
                None
            }
        };

        Some(Handled::Reactive { pattern, reply })
    }
}
