//! Companion channel binding.
//!
//! ```text
//! unbound --bind--> open --close--> closed --open--> open
//!                    ^ |
//!                    +-+ resend / rotation (state unchanged)
//! ```
//!
//! `None` in the group's binding cell is the unbound state. A failed invite
//! export on an unreachable chat returns the binding to unbound.

use crate::platform::ChatId;
use crate::state::slot::Slot;
use serde::{Deserialize, Serialize};
use tipwarden_rules::{Button, Notice};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkState {
    Open,
    Closed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelBinding {
    pub channel: ChatId,
    pub state: LinkState,
    /// Notice text shown above the invite button.
    pub notice_text: String,
    pub button_text: String,
    pub invite_link: Option<String>,
    /// The one live link notice in the channel.
    pub link: Slot,
    /// Unix seconds of the last successful link publish.
    pub last_rotation: i64,
}

impl ChannelBinding {
    pub fn new(channel: ChatId, notice_text: String, button_text: String) -> Self {
        Self {
            channel,
            state: LinkState::Open,
            notice_text,
            button_text,
            invite_link: None,
            link: Slot::EMPTY,
            last_rotation: 0,
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    pub fn rotation_due(&self, now: i64, interval: i64) -> bool {
        self.is_open() && now.saturating_sub(self.last_rotation) >= interval
    }

    /// The open-state notice: text plus one invite button when a link exists.
    pub fn link_notice(&self) -> Notice {
        let mut notice = Notice::text(self.notice_text.clone());
        if let Some(url) = &self.invite_link {
            notice.buttons.push(vec![Button {
                label: self.button_text.clone(),
                url: url.clone(),
            }]);
        }
        notice
    }

    /// The closed-state notice: no button.
    pub fn closed_notice(closed_text: &str, reason: &str) -> Notice {
        if reason.is_empty() {
            Notice::text(closed_text)
        } else {
            Notice::text(format!("{closed_text}\n{reason}"))
        }
    }
}
