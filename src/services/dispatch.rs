//! Action dispatch for a matched keyword rule.
//!
//! Steps run in a fixed order (delete, terminal, reply). Each one is
//! independent: a failure is logged and counted, then the next step runs.

use super::engine::InboundMessage;
use super::tips::{ReplyOutcome, render_notice};
use crate::error::DispatchError;
use crate::metrics;
use crate::platform::{ChatId, MessageId, PlatformError, UserId};
use crate::state::GroupState;
use crate::warden::{Warden, step_failed};
use serde::Serialize;
use tipwarden_rules::{KeywordRule, TemplateContext, Terminal};
use tracing::{debug, info};

/// What each dispatch step achieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DispatchOutcome {
    pub deleted: bool,
    /// Kind of terminal action applied, if it succeeded.
    pub terminal: Option<&'static str>,
    pub reply: Option<ReplyOutcome>,
}

impl DispatchOutcome {
    /// Whether a new message became visible in the group.
    pub fn visible(&self) -> bool {
        matches!(self.reply, Some(ReplyOutcome::Sent(_)))
    }
}

impl Warden {
    pub async fn dispatch(
        &self,
        group: &GroupState,
        message: &InboundMessage,
        rule: &KeywordRule,
        word: &str,
        now: i64,
    ) -> DispatchOutcome {
        let mut outcome = DispatchOutcome::default();
        let plan = rule.actions;

        if plan.delete {
            match self.delete_trigger(group.id, message.message_id).await {
                Ok(()) => {
                    metrics::record_action("delete");
                    outcome.deleted = true;
                }
                Err(e) => step_failed(group.id, "delete", &e),
            }
        }

        if let Some(terminal) = plan.terminal {
            match self
                .apply_terminal(group.id, message.author.id, terminal, now)
                .await
            {
                Ok(()) => {
                    metrics::record_action(terminal.kind());
                    info!(group = group.id, user = message.author.id, action = terminal.kind(), rule = %rule.key, "Applied moderation action");
                    outcome.terminal = Some(terminal.kind());
                }
                Err(e) => step_failed(group.id, terminal.kind(), &e),
            }
        }

        if plan.reply {
            let ctx = TemplateContext {
                user_id: message.author.id,
                user_name: &message.author.name,
                destruct: Some(rule.destruct),
                keyword: Some(word),
            };
            let notice = render_notice(&rule.notice, &ctx);
            // A deleted trigger can no longer be replied to.
            let anchor = (!outcome.deleted).then_some(message.message_id);
            match self
                .publish_reply(group, &rule.key, message.author.id, &notice, anchor, now)
                .await
            {
                Ok(reply) => {
                    metrics::record_action("reply");
                    outcome.reply = Some(reply);
                }
                Err(e) => step_failed(group.id, "reply", &e),
            }
        }

        debug!(group = group.id, rule = %rule.key, ?outcome, "Dispatch finished");
        outcome
    }

    async fn delete_trigger(&self, chat: ChatId, message: MessageId) -> Result<(), DispatchError> {
        self.platform
            .delete_messages(chat, &[message])
            .await
            .map_err(|e| match e {
                PlatformError::Denied(_) => DispatchError::AlreadyDeleted(message),
                other => DispatchError::rejected("delete_messages")(other),
            })
    }

    /// Kick stays a ban, a short pause, then an unban.
    async fn apply_terminal(
        &self,
        chat: ChatId,
        user: UserId,
        terminal: Terminal,
        now: i64,
    ) -> Result<(), DispatchError> {
        match terminal {
            Terminal::Kick => {
                self.platform
                    .ban_member(chat, user, None)
                    .await
                    .map_err(DispatchError::rejected("ban_member"))?;
                tokio::time::sleep(self.config.timers.kick_unban_delay()).await;
                self.platform
                    .unban_member(chat, user)
                    .await
                    .map_err(DispatchError::rejected("unban_member"))
            }
            Terminal::Ban { .. } => self
                .platform
                .ban_member(chat, user, terminal.until(now))
                .await
                .map_err(DispatchError::rejected("ban_member")),
            Terminal::Restrict { .. } => self
                .platform
                .restrict_member(chat, user, terminal.until(now))
                .await
                .map_err(DispatchError::rejected("restrict_member")),
        }
    }
}
