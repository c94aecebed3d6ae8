//! State management module.
//!
//! Contains the group registry and the per-group state it owns.

pub mod binding;
mod group;
pub mod lease;
mod messages;
mod registry;
mod settings;
pub mod slot;

pub use binding::{ChannelBinding, LinkState};
pub use group::GroupState;
pub use lease::EditLease;
pub use messages::{MessageState, Notified};
pub use registry::Registry;
pub use settings::{GroupSettings, SettingsPatch};
pub use slot::{Expired, Lifetime, Slot, SlotKey, SlotTable};
