//! Fixed-purpose notices: welcome on join and the off-topic reminder.

use super::engine::{Author, Handled, InboundMessage};
use super::tips::render_notice;
use crate::error::CommandError;
use crate::platform::{GroupId, MessageId, UserId};
use crate::state::{GroupState, SlotKey};
use crate::warden::{Warden, step_failed};
use serde::Serialize;
use tipwarden_rules::{TemplateContext, ValidationError};
use tracing::debug;

/// What happened when a member joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JoinOutcome {
    /// Result of testing the member's name against keyword rules.
    pub screened: Option<Handled>,
    pub welcome: Option<MessageId>,
}

fn destruct_secs(secs: u64) -> Option<u32> {
    u32::try_from(secs).ok().filter(|s| *s > 0)
}

impl Warden {
    /// Screen a new member's name against `name` rules, then welcome them
    /// if nothing matched and the join was not declared.
    pub async fn handle_join(
        &self,
        group: GroupId,
        member: &Author,
        message_id: MessageId,
        now: i64,
    ) -> JoinOutcome {
        let join = InboundMessage {
            group,
            message_id,
            author: member.clone(),
            text: None,
            forwarded_from: None,
            forwarded: false,
        };
        let screened = self.screen(&join, false, now).await;

        let welcome = if screened.is_some() {
            None
        } else {
            let state = self.group(group);
            self.welcome(&state, member, message_id, now).await
        };

        JoinOutcome { screened, welcome }
    }

    /// Publish the welcome notice, at most once per member.
    async fn welcome(
        &self,
        state: &GroupState,
        member: &Author,
        anchor: MessageId,
        now: i64,
    ) -> Option<MessageId> {
        let template = state.settings(|s| s.welcome.clone());
        if template.text.is_empty() {
            return None;
        }
        if !state.messages(|m| m.welcome(member.id)) {
            debug!(group = state.id, user = member.id, "Member already welcomed");
            return None;
        }

        let ctx = TemplateContext {
            user_id: member.id,
            user_name: &member.name,
            destruct: destruct_secs(self.config.timers.welcome_destruct),
            keyword: None,
        };
        let notice = render_notice(&template, &ctx);
        match self
            .publish(state, SlotKey::Welcome, &notice, Some(anchor), now)
            .await
        {
            Ok(id) => Some(id),
            Err(e) => {
                step_failed(state.id, "welcome", &e);
                None
            }
        }
    }

    /// Post the off-topic reminder, replacing the previous one.
    pub async fn offtopic(
        &self,
        group: GroupId,
        admin: UserId,
        anchor: Option<MessageId>,
        now: i64,
    ) -> Result<MessageId, CommandError> {
        let state = self.admin_group(group, admin)?;

        let template = state.settings(|s| s.offtopic.clone());
        if template.text.is_empty() {
            return Err(ValidationError::MissingField("offtopic").into());
        }
        let ctx = TemplateContext {
            user_id: admin,
            destruct: destruct_secs(self.config.timers.offtopic_destruct),
            ..TemplateContext::default()
        };
        let notice = render_notice(&template, &ctx);
        Ok(self
            .publish(&state, SlotKey::OffTopic, &notice, anchor, now)
            .await?)
    }
}
