//! Persistence layer.
//!
//! Group-keyed blobs, one per entity kind, written explicitly after every
//! mutation. Last writer wins per key; no cross-key transactions.
//!
//! Callers snapshot state under the concern lock, release it, then save.

use crate::platform::GroupId;
use crate::state::{ChannelBinding, GroupSettings, SlotTable};
use thiserror::Error;
use tipwarden_rules::RuleSet;

mod memory;
mod redb;

pub use self::memory::MemoryStore;
pub use self::redb::RedbStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Database(_) => "database",
            Self::Serialization(_) => "serialization",
        }
    }
}

/// Everything persisted for one group. Missing parts load as `None`/empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSnapshot {
    pub id: GroupId,
    pub rules: RuleSet,
    pub slots: SlotTable,
    pub binding: Option<ChannelBinding>,
    pub settings: Option<GroupSettings>,
}

pub trait Store: Send + Sync {
    fn load_all(&self) -> Result<Vec<GroupSnapshot>, StoreError>;

    fn save_rules(&self, group: GroupId, rules: &RuleSet) -> Result<(), StoreError>;

    fn save_slots(&self, group: GroupId, slots: &SlotTable) -> Result<(), StoreError>;

    /// `None` removes the binding.
    fn save_binding(
        &self,
        group: GroupId,
        binding: Option<&ChannelBinding>,
    ) -> Result<(), StoreError>;

    fn save_settings(&self, group: GroupId, settings: &GroupSettings) -> Result<(), StoreError>;

    /// Remove every entity of a group.
    fn delete_group(&self, group: GroupId) -> Result<(), StoreError>;
}
