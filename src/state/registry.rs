//! Group registry.

use crate::platform::GroupId;
use crate::state::group::GroupState;
use dashmap::DashMap;
use std::sync::Arc;

/// All known groups, keyed by id.
#[derive(Debug, Default)]
pub struct Registry {
    groups: DashMap<GroupId, Arc<GroupState>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: GroupId) -> Option<Arc<GroupState>> {
        self.groups.get(&id).map(|g| Arc::clone(g.value()))
    }

    /// Existing group, or a new one built by `init`.
    pub fn get_or_insert_with(
        &self,
        id: GroupId,
        init: impl FnOnce() -> GroupState,
    ) -> Arc<GroupState> {
        Arc::clone(
            self.groups
                .entry(id)
                .or_insert_with(|| Arc::new(init()))
                .value(),
        )
    }

    pub fn insert(&self, group: GroupState) {
        self.groups.insert(group.id, Arc::new(group));
    }

    pub fn remove(&self, id: GroupId) -> Option<Arc<GroupState>> {
        self.groups.remove(&id).map(|(_, g)| g)
    }

    /// Group ids in ascending order, collected without holding shard locks.
    pub fn ids(&self) -> Vec<GroupId> {
        let mut ids: Vec<GroupId> = self.groups.iter().map(|g| *g.key()).collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::settings::GroupSettings;

    #[test]
    fn get_or_insert_creates_once() {
        let registry = Registry::new();
        let a = registry.get_or_insert_with(-5, || GroupState::new(-5, GroupSettings::default()));
        let b = registry.get_or_insert_with(-5, || unreachable!());
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn ids_are_sorted_and_remove_drops() {
        let registry = Registry::new();
        for id in [-1, -3, -2] {
            registry.insert(GroupState::new(id, GroupSettings::default()));
        }
        assert_eq!(registry.ids(), vec![-3, -2, -1]);
        assert!(registry.remove(-2).is_some());
        assert!(registry.get(-2).is_none());
    }
}
