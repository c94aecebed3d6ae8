//! Per-group state aggregate.
//!
//! One lock per concern, never one per group:
//!
//! | Concern            | Lock                                  |
//! |--------------------|---------------------------------------|
//! | message / slots    | `messages` (`parking_lot::Mutex`)     |
//! | rule / config edit | `rules`, `lease`, `settings`          |
//! | channel rotation   | `binding` (`tokio::sync::Mutex`)      |
//! | admin refresh      | `admins` (`parking_lot::RwLock`)      |
//! | store writes       | `retired` (`parking_lot::Mutex`)      |
//!
//! The synchronous locks are only reachable through closure accessors, so a
//! guard can never outlive its critical section or be held across a platform
//! call. The binding lock is async and is held for a whole transition.

use crate::platform::{GroupId, UserId};
use crate::state::binding::ChannelBinding;
use crate::state::lease::EditLease;
use crate::state::messages::MessageState;
use crate::state::settings::GroupSettings;
use crate::state::slot::SlotTable;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use tipwarden_rules::{Role, RuleSet};

pub struct GroupState {
    pub id: GroupId,
    rules: RwLock<RuleSet>,
    lease: Mutex<Option<EditLease>>,
    settings: RwLock<GroupSettings>,
    messages: Mutex<MessageState>,
    admins: RwLock<HashSet<UserId>>,
    binding: tokio::sync::Mutex<Option<ChannelBinding>>,
    /// Set once the bot has left; held across every store write.
    retired: Mutex<bool>,
}

impl GroupState {
    pub fn new(id: GroupId, settings: GroupSettings) -> Self {
        Self::restore(id, RuleSet::new(), SlotTable::new(), None, settings)
    }

    /// Rebuild a group from persisted parts.
    pub fn restore(
        id: GroupId,
        rules: RuleSet,
        slots: SlotTable,
        binding: Option<ChannelBinding>,
        settings: GroupSettings,
    ) -> Self {
        Self {
            id,
            rules: RwLock::new(rules),
            lease: Mutex::new(None),
            settings: RwLock::new(settings),
            messages: Mutex::new(MessageState::with_slots(slots)),
            admins: RwLock::new(HashSet::new()),
            binding: tokio::sync::Mutex::new(binding),
            retired: Mutex::new(false),
        }
    }

    pub fn rules<R>(&self, f: impl FnOnce(&RuleSet) -> R) -> R {
        f(&self.rules.read())
    }

    pub fn rules_mut<R>(&self, f: impl FnOnce(&mut RuleSet) -> R) -> R {
        f(&mut self.rules.write())
    }

    pub fn lease<R>(&self, f: impl FnOnce(&mut Option<EditLease>) -> R) -> R {
        f(&mut self.lease.lock())
    }

    pub fn settings<R>(&self, f: impl FnOnce(&GroupSettings) -> R) -> R {
        f(&self.settings.read())
    }

    pub fn settings_mut<R>(&self, f: impl FnOnce(&mut GroupSettings) -> R) -> R {
        f(&mut self.settings.write())
    }

    pub fn messages<R>(&self, f: impl FnOnce(&mut MessageState) -> R) -> R {
        f(&mut self.messages.lock())
    }

    /// Snapshot of the slot table for persistence.
    pub fn slots_snapshot(&self) -> SlotTable {
        self.messages(|m| m.slots.clone())
    }

    pub fn set_admins(&self, admins: impl IntoIterator<Item = UserId>) {
        *self.admins.write() = admins.into_iter().collect();
    }

    pub fn is_admin(&self, user: UserId) -> bool {
        self.admins.read().contains(&user)
    }

    pub fn role_of(&self, user: UserId) -> Role {
        if self.is_admin(user) {
            Role::Admin
        } else {
            Role::Member
        }
    }

    /// Run a store write unless the group has been retired. Returns `None`
    /// when the write was skipped.
    pub fn while_tracked<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        let retired = self.retired.lock();
        if *retired { None } else { Some(f()) }
    }

    /// Mark the group as left, then run `f` (the store deletion). Writes that
    /// started earlier finish first; later ones are skipped.
    pub fn retire<R>(&self, f: impl FnOnce() -> R) -> R {
        let mut retired = self.retired.lock();
        *retired = true;
        f()
    }

    pub fn is_retired(&self) -> bool {
        *self.retired.lock()
    }

    /// Acquire the channel lock for a whole binding transition.
    pub async fn binding(&self) -> tokio::sync::MutexGuard<'_, Option<ChannelBinding>> {
        self.binding.lock().await
    }

    /// Channel lock without waiting; `None` while a transition is running.
    pub fn try_binding(&self) -> Option<tokio::sync::MutexGuard<'_, Option<ChannelBinding>>> {
        self.binding.try_lock().ok()
    }
}

impl std::fmt::Debug for GroupState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GroupState")
            .field("id", &self.id)
            .field("rules", &self.rules.read().len())
            .finish_non_exhaustive()
    }
}
