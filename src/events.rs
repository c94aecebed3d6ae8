//! Inbound events for the daemon, one JSON object per line.
//!
//! ```json
//! {"type":"message","group":-100,"message_id":7,"author":{"id":1,"name":"Ann"},"text":"hi there"}
//! {"type":"join","group":-100,"message_id":8,"member":{"id":2,"name":"Bob"}}
//! {"type":"declare","group":-100,"message_id":9}
//! {"type":"admins","group":-100,"admins":[1]}
//! {"type":"command","group":-100,"admin":1,"command":{"op":"add","raw":"hello||hi\n+++\nWelcome!"}}
//! ```

use crate::error::CommandError;
use crate::metrics;
use crate::platform::{ChatId, GroupId, MessageId, UserId};
use crate::services::{Author, EditMode, Handled, InboundMessage, JoinOutcome, RuleView};
use crate::state::{GroupSettings, SettingsPatch};
use crate::warden::Warden;
use serde::{Deserialize, Serialize};
use tipwarden_rules::SpecStyle;
use tracing::debug;

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Message(InboundMessage),
    Join {
        group: GroupId,
        message_id: MessageId,
        member: Author,
    },
    /// Another component already handled this message.
    Declare {
        group: GroupId,
        message_id: MessageId,
    },
    Admins {
        group: GroupId,
        admins: Vec<UserId>,
    },
    Words {
        category: String,
        patterns: Vec<String>,
    },
    /// The bot was removed from the group.
    Leave {
        group: GroupId,
    },
    Command {
        group: GroupId,
        admin: UserId,
        command: Command,
    },
}

/// Administrator commands.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Command {
    Add {
        raw: String,
        /// Keep the reply's whitespace layout.
        #[serde(default)]
        preserve: bool,
    },
    Edit {
        key: String,
        raw: String,
        #[serde(default)]
        preserve: bool,
    },
    Remove {
        key: String,
    },
    Show,
    Release,
    Bind {
        channel: ChatId,
        #[serde(default)]
        text: Option<String>,
    },
    Close {
        #[serde(default)]
        reason: String,
    },
    Open,
    Resend,
    Channel {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        button: Option<String>,
    },
    Offtopic {
        #[serde(default)]
        reply_to: Option<MessageId>,
    },
    Settings(SettingsPatch),
}

impl Command {
    /// Metric label.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Add { .. } => "add",
            Command::Edit { .. } => "edit",
            Command::Remove { .. } => "remove",
            Command::Show => "show",
            Command::Release => "release",
            Command::Bind { .. } => "bind",
            Command::Close { .. } => "close",
            Command::Open => "open",
            Command::Resend => "resend",
            Command::Channel { .. } => "channel",
            Command::Offtopic { .. } => "offtopic",
            Command::Settings(_) => "settings",
        }
    }
}

fn style(preserve: bool) -> SpecStyle {
    if preserve {
        SpecStyle::Preserved
    } else {
        SpecStyle::Trimmed
    }
}

/// Result written back for each event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum Outcome {
    Ignored,
    Handled(Handled),
    Joined(JoinOutcome),
    Done,
    Rule { key: String },
    Rules { rules: Vec<RuleView> },
    Posted { message_id: MessageId },
    Settings(GroupSettings),
    Words { category: String, count: usize },
    Released { released: bool },
    Left { known: bool },
    Rejected { code: &'static str, error: String },
}

impl From<CommandError> for Outcome {
    fn from(e: CommandError) -> Self {
        Outcome::Rejected {
            code: e.error_code(),
            error: e.to_string(),
        }
    }
}

impl Warden {
    pub async fn handle_event(&self, event: Event, now: i64) -> Outcome {
        match event {
            Event::Message(message) => match self.handle_message(&message, now).await {
                Some(handled) => Outcome::Handled(handled),
                None => Outcome::Ignored,
            },
            Event::Join {
                group,
                message_id,
                member,
            } => Outcome::Joined(self.handle_join(group, &member, message_id, now).await),
            Event::Declare { group, message_id } => {
                self.mark_declared(group, message_id);
                Outcome::Done
            }
            Event::Admins { group, admins } => {
                self.refresh_admins(group, admins);
                Outcome::Done
            }
            Event::Words {
                category,
                patterns,
            } => match self.set_words(&category, &patterns) {
                Ok(count) => Outcome::Words { category, count },
                Err(e) => e.into(),
            },
            Event::Leave { group } => Outcome::Left {
                known: self.leave_group(group),
            },
            Event::Command {
                group,
                admin,
                command,
            } => {
                let name = command.name();
                let outcome = self.run_command(group, admin, command, now).await;
                let result = match &outcome {
                    Ok(_) => "ok",
                    Err(e) => e.error_code(),
                };
                metrics::record_command(name, result);
                debug!(group, admin, command = name, result, "Command handled");
                outcome.unwrap_or_else(Outcome::from)
            }
        }
    }

    async fn run_command(
        &self,
        group: GroupId,
        admin: UserId,
        command: Command,
        now: i64,
    ) -> Result<Outcome, CommandError> {
        let outcome = match command {
            Command::Add { raw, preserve } => Outcome::Rule {
                key: self.add_or_edit(group, admin, &raw, style(preserve), EditMode::Add, now)?,
            },
            Command::Edit { key, raw, preserve } => Outcome::Rule {
                key: self.add_or_edit(group, admin, &raw, style(preserve), EditMode::Edit(key), now)?,
            },
            Command::Remove { key } => {
                self.remove_rule(group, admin, &key, now)?;
                Outcome::Done
            }
            Command::Show => Outcome::Rules {
                rules: self.show_rules(group, admin)?,
            },
            Command::Release => Outcome::Released {
                released: self.release_lease(group, admin),
            },
            Command::Bind { channel, text } => {
                self.bind_channel(group, admin, channel, text, now).await?;
                Outcome::Done
            }
            Command::Close { reason } => {
                self.close_channel(group, admin, reason, now).await?;
                Outcome::Done
            }
            Command::Open => {
                self.open_channel(group, admin, now).await?;
                Outcome::Done
            }
            Command::Resend => {
                self.resend_channel(group, admin, now).await?;
                Outcome::Done
            }
            Command::Channel { text, button } => {
                self.configure_channel(group, admin, text, button, now).await?;
                Outcome::Done
            }
            Command::Offtopic { reply_to } => Outcome::Posted {
                message_id: self.offtopic(group, admin, reply_to, now).await?,
            },
            Command::Settings(patch) => {
                Outcome::Settings(self.update_settings(group, admin, &patch)?)
            }
        };
        Ok(outcome)
    }
}
