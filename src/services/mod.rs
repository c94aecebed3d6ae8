//! Warden services.
//!
//! Each submodule adds one concern's operations to [`crate::warden::Warden`]:
//!
//! - [`engine`]: inbound messages, declared pre-check, reactive fallback
//! - [`dispatch`]: delete / terminal / reply steps for a matched rule
//! - [`tips`]: single-occupancy slot publishing and reply dedup
//! - [`sweep`]: destruct expiry and orphan cleanup
//! - [`rules`]: rule administration behind the edit lease
//! - [`channel`]: companion channel binding and link rotation
//! - [`notices`]: welcome and off-topic notices
//! - [`maintenance`]: counter resets, departures, admins, words, settings

pub mod channel;
pub mod dispatch;
pub mod engine;
pub mod maintenance;
pub mod notices;
pub mod rules;
pub mod sweep;
pub mod tips;

pub use dispatch::DispatchOutcome;
pub use engine::{Author, Handled, InboundMessage};
pub use notices::JoinOutcome;
pub use rules::{EditMode, RuleView};
pub use sweep::SweepReport;
pub use tips::{ReplyOutcome, render_notice};
