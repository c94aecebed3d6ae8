//! Companion channel binding and invite-link rotation.
//!
//! ```text
//! unbound --bind--> open --close--> closed --open--> open
//!                   open --resend / rotation--> open
//! any bound state --channel unreachable--> unbound
//! ```
//!
//! Every transition holds the group's channel lock for its whole duration,
//! platform calls included. Automatic rotation skips groups whose lock is busy.

use crate::error::{ChannelError, CommandError};
use crate::metrics;
use crate::platform::{ChatId, GroupId, PlatformError, UserId};
use crate::state::{ChannelBinding, GroupState, LinkState, Slot};
use crate::warden::{Warden, platform_failed};
use tipwarden_rules::Notice;
use tracing::{debug, info, warn};

impl Warden {
    /// Bind `channel` to the group and publish the first invite-link notice.
    pub async fn bind_channel(
        &self,
        group: GroupId,
        admin: UserId,
        channel: ChatId,
        notice_text: Option<String>,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;

        let mut slot = state.binding().await;
        if let Some(old) = slot.take()
            && old.link.is_live()
        {
            self.delete_quietly(old.channel, old.link.message_id).await;
        }

        let button = state.settings(|s| s.channel_button.clone());
        let text = notice_text.unwrap_or_else(|| self.config.notices.channel_notice.clone());
        *slot = Some(ChannelBinding::new(channel, text, button));
        info!(group, channel, admin, "Channel bound");

        self.refresh_link(&state, &mut slot, true, now).await?;
        Ok(())
    }

    /// Replace the live notice with the closure message and stop rotating.
    pub async fn close_channel(
        &self,
        group: GroupId,
        admin: UserId,
        reason: String,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;

        let mut slot = state.binding().await;
        let binding = slot.as_mut().ok_or(ChannelError::NotBound)?;
        if !binding.is_open() {
            return Err(ChannelError::Closed.into());
        }

        let closed_text = state.settings(|s| s.channel_closed.clone());
        let notice = ChannelBinding::closed_notice(&closed_text, &reason);
        binding.state = LinkState::Closed { reason };
        binding.invite_link = None;
        info!(group, admin, "Channel link closed");

        let shown = self.show_notice(binding, &notice, false, now).await;
        self.settle(&state, &mut slot, shown).await?;
        Ok(())
    }

    pub async fn open_channel(
        &self,
        group: GroupId,
        admin: UserId,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;

        let mut slot = state.binding().await;
        let binding = slot.as_mut().ok_or(ChannelError::NotBound)?;
        if binding.is_open() {
            return Err(ChannelError::AlreadyOpen.into());
        }
        binding.state = LinkState::Open;
        info!(group, admin, "Channel link opened");

        self.refresh_link(&state, &mut slot, false, now).await?;
        Ok(())
    }

    /// Re-export the invite link, delete the live notice and send a new one.
    pub async fn resend_channel(
        &self,
        group: GroupId,
        admin: UserId,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;

        let mut slot = state.binding().await;
        match slot.as_ref() {
            None => return Err(ChannelError::NotBound.into()),
            Some(binding) if !binding.is_open() => return Err(ChannelError::Closed.into()),
            Some(_) => {}
        }

        self.refresh_link(&state, &mut slot, true, now).await?;
        Ok(())
    }

    /// Change the notice text or button label, updating the live notice.
    pub async fn configure_channel(
        &self,
        group: GroupId,
        admin: UserId,
        text: Option<String>,
        button: Option<String>,
        now: i64,
    ) -> Result<(), CommandError> {
        let state = self.admin_group(group, admin)?;

        let mut slot = state.binding().await;
        let binding = slot.as_mut().ok_or(ChannelError::NotBound)?;
        if let Some(text) = text {
            binding.notice_text = text;
        }
        if let Some(button) = button {
            binding.button_text = button;
        }

        if binding.is_open() && binding.link.is_live() {
            let notice = binding.link_notice();
            let shown = self.show_notice(binding, &notice, false, now).await;
            self.settle(&state, &mut slot, shown).await?;
        } else {
            self.persist_binding(&state, Some(&*binding));
        }
        Ok(())
    }

    /// Rotate every open binding whose interval has elapsed. Returns how many
    /// were republished.
    pub async fn rotate_due(&self, now: i64) -> usize {
        let interval = i64::try_from(self.config.timers.channel_rotation).unwrap_or(i64::MAX);
        let mut rotated = 0;

        for id in self.registry.ids() {
            let Some(state) = self.registry.get(id) else {
                continue;
            };
            let Some(mut slot) = state.try_binding() else {
                debug!(group = id, "Channel transition in progress, skipping rotation");
                continue;
            };
            if !slot.as_ref().is_some_and(|b| b.rotation_due(now, interval)) {
                continue;
            }

            let replace = state.settings(|s| s.resend);
            match self.refresh_link(&state, &mut slot, replace, now).await {
                Ok(()) => rotated += 1,
                Err(e) => warn!(group = id, error = %e, code = e.error_code(), "Link rotation failed"),
            }
        }
        rotated
    }

    /// Export a fresh invite link and show it in the bound channel. With
    /// `replace` the live notice is deleted and a new one sent; otherwise it
    /// is edited in place.
    async fn refresh_link(
        &self,
        state: &GroupState,
        slot: &mut Option<ChannelBinding>,
        replace: bool,
        now: i64,
    ) -> Result<(), ChannelError> {
        let channel = slot.as_ref().map(|b| b.channel).ok_or(ChannelError::NotBound)?;

        let link = match self.platform.export_invite_link(state.id).await {
            Ok(link) => link,
            Err(PlatformError::Unreachable) => {
                self.unbind(state, slot).await;
                return Err(ChannelError::Unreachable(channel));
            }
            Err(e) => {
                platform_failed(state.id, "export_invite_link", &e);
                return Err(e.into());
            }
        };

        let binding = slot.as_mut().ok_or(ChannelError::NotBound)?;
        binding.invite_link = Some(link);
        binding.last_rotation = now;
        let notice = binding.link_notice();

        let shown = self.show_notice(binding, &notice, replace, now).await;
        self.settle(state, slot, shown).await?;
        metrics::record_rotation();
        debug!(group = state.id, channel, "Invite link published");
        Ok(())
    }

    /// Edit the live notice in place, or delete it and send a new one.
    async fn show_notice(
        &self,
        binding: &mut ChannelBinding,
        notice: &Notice,
        replace: bool,
        now: i64,
    ) -> Result<(), PlatformError> {
        let live = binding.link;
        if live.is_live() && !replace {
            match self
                .platform
                .edit_message(binding.channel, live.message_id, notice)
                .await
            {
                Ok(()) => return Ok(()),
                Err(PlatformError::Unreachable) => return Err(PlatformError::Unreachable),
                Err(e) => platform_failed(binding.channel, "edit_message", &e),
            }
        }

        if live.is_live() {
            binding.link = Slot::EMPTY;
            self.delete_quietly(binding.channel, live.message_id).await;
        }
        let message = self
            .platform
            .send_message(binding.channel, notice, None)
            .await?;
        binding.link = Slot::new(message, now);
        Ok(())
    }

    /// Persist the outcome of a notice update, unbinding an unreachable channel.
    async fn settle(
        &self,
        state: &GroupState,
        slot: &mut Option<ChannelBinding>,
        shown: Result<(), PlatformError>,
    ) -> Result<(), ChannelError> {
        match shown {
            Ok(()) => {
                self.persist_binding(state, slot.as_ref());
                Ok(())
            }
            Err(PlatformError::Unreachable) => {
                let channel = slot.as_ref().map_or(0, |b| b.channel);
                self.unbind(state, slot).await;
                Err(ChannelError::Unreachable(channel))
            }
            Err(e) => {
                platform_failed(state.id, "send_message", &e);
                self.persist_binding(state, slot.as_ref());
                Err(e.into())
            }
        }
    }

    async fn unbind(&self, state: &GroupState, slot: &mut Option<ChannelBinding>) {
        let Some(binding) = slot.take() else {
            return;
        };
        if binding.link.is_live() {
            self.delete_quietly(binding.channel, binding.link.message_id).await;
        }
        self.persist_binding(state, None);
        warn!(group = state.id, channel = binding.channel, "Channel unreachable, binding removed");
    }
}
