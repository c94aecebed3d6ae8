//! In-process store for `:memory:` and tests.

use super::{GroupSnapshot, Store, StoreError};
use crate::platform::GroupId;
use crate::state::{ChannelBinding, GroupSettings, SlotTable};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tipwarden_rules::RuleSet;

#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: Mutex<BTreeMap<GroupId, GroupSnapshot>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn update(&self, group: GroupId, f: impl FnOnce(&mut GroupSnapshot)) {
        let mut groups = self.groups.lock();
        let entry = groups.entry(group).or_insert_with(|| GroupSnapshot {
            id: group,
            ..GroupSnapshot::default()
        });
        f(entry);
    }
}

impl Store for MemoryStore {
    fn load_all(&self) -> Result<Vec<GroupSnapshot>, StoreError> {
        Ok(self.groups.lock().values().cloned().collect())
    }

    fn save_rules(&self, group: GroupId, rules: &RuleSet) -> Result<(), StoreError> {
        self.update(group, |g| g.rules = rules.clone());
        Ok(())
    }

    fn save_slots(&self, group: GroupId, slots: &SlotTable) -> Result<(), StoreError> {
        self.update(group, |g| g.slots = slots.clone());
        Ok(())
    }

    fn save_binding(
        &self,
        group: GroupId,
        binding: Option<&ChannelBinding>,
    ) -> Result<(), StoreError> {
        self.update(group, |g| g.binding = binding.cloned());
        Ok(())
    }

    fn save_settings(&self, group: GroupId, settings: &GroupSettings) -> Result<(), StoreError> {
        self.update(group, |g| g.settings = Some(settings.clone()));
        Ok(())
    }

    fn delete_group(&self, group: GroupId) -> Result<(), StoreError> {
        self.groups.lock().remove(&group);
        Ok(())
    }
}
