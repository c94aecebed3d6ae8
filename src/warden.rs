//! The Warden - central shared state plus the collaborators services use.
//!
//! Services are implemented as `impl Warden` blocks under [`crate::services`].
//! Persistence helpers snapshot state under the concern lock, release it,
//! then write; store failures are logged and never abort the caller.

use crate::config::Config;
use crate::error::{CommandError, DispatchError};
use crate::metrics;
use crate::platform::{ChatId, GroupId, MessageId, Platform, PlatformError, UserId};
use crate::state::{ChannelBinding, GroupSettings, GroupState, Registry};
use crate::store::{Store, StoreError};
use parking_lot::RwLock;
use std::sync::Arc;
use tipwarden_rules::{Limits, WordList, WordLists};
use tracing::{info, warn};

pub struct Warden {
    pub(crate) config: Config,
    pub(crate) registry: Registry,
    pub(crate) platform: Arc<dyn Platform>,
    pub(crate) store: Arc<dyn Store>,
    pub(crate) words: RwLock<WordLists>,
    pub(crate) limits: Limits,
}

impl Warden {
    /// Build a warden with no groups loaded. Fails on an invalid word pattern.
    pub fn new(
        config: Config,
        platform: Arc<dyn Platform>,
        store: Arc<dyn Store>,
    ) -> Result<Self, regex::Error> {
        let mut words = WordLists::new();
        for (category, patterns) in &config.words {
            words.set(category, WordList::compile(patterns)?);
        }
        let limits = config.limits.rule_limits();

        Ok(Self {
            config,
            registry: Registry::new(),
            platform,
            store,
            words: RwLock::new(words),
            limits,
        })
    }

    /// Load every persisted group into the registry.
    pub fn restore(&self) -> Result<usize, StoreError> {
        let snapshots = self.store.load_all()?;
        let count = snapshots.len();
        for snapshot in snapshots {
            let settings = snapshot
                .settings
                .unwrap_or_else(|| self.default_settings());
            self.registry.insert(GroupState::restore(
                snapshot.id,
                snapshot.rules,
                snapshot.slots,
                snapshot.binding,
                settings,
            ));
        }
        metrics::set_groups(self.registry.len());
        info!(count, "Restored groups from store");
        Ok(count)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The group's state, created with default settings on first sight.
    /// Only inbound platform traffic should create groups.
    pub fn group(&self, id: GroupId) -> Arc<GroupState> {
        let mut created = false;
        let group = self.registry.get_or_insert_with(id, || {
            created = true;
            GroupState::new(id, self.default_settings())
        });
        if created {
            metrics::set_groups(self.registry.len());
            info!(group = id, "Tracking new group");
        }
        group
    }

    /// An already tracked group that `admin` administers. Unknown groups
    /// have no administrators, so they are rejected without being created.
    pub(crate) fn admin_group(
        &self,
        id: GroupId,
        admin: UserId,
    ) -> Result<Arc<GroupState>, CommandError> {
        let state = self.registry.get(id).ok_or(CommandError::NotAdmin(admin))?;
        require_admin(&state, admin)?;
        Ok(state)
    }

    pub(crate) fn default_settings(&self) -> GroupSettings {
        GroupSettings::from_notices(&self.config.notices, self.limits.max_buttons)
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    // Writes for a group the bot has left are dropped, so an operation still
    // holding its state cannot bring it back.

    pub(crate) fn persist_rules(&self, group: &GroupState) {
        let rules = group.rules(|r| r.clone());
        if let Some(Err(e)) = group.while_tracked(|| self.store.save_rules(group.id, &rules)) {
            store_failed(group.id, "rules", &e);
        }
    }

    pub(crate) fn persist_slots(&self, group: &GroupState) {
        let slots = group.slots_snapshot();
        if let Some(Err(e)) = group.while_tracked(|| self.store.save_slots(group.id, &slots)) {
            store_failed(group.id, "slots", &e);
        }
    }

    pub(crate) fn persist_settings(&self, group: &GroupState) {
        let settings = group.settings(|s| s.clone());
        if let Some(Err(e)) = group.while_tracked(|| self.store.save_settings(group.id, &settings)) {
            store_failed(group.id, "settings", &e);
        }
    }

    /// Called with the channel lock held; `None` removes the binding.
    pub(crate) fn persist_binding(&self, group: &GroupState, binding: Option<&ChannelBinding>) {
        if let Some(Err(e)) = group.while_tracked(|| self.store.save_binding(group.id, binding)) {
            store_failed(group.id, "binding", &e);
        }
    }

    // ========================================================================
    // Platform helpers
    // ========================================================================

    /// Delete one message, logging instead of failing.
    pub(crate) async fn delete_quietly(&self, chat: ChatId, message: MessageId) -> bool {
        match self.platform.delete_messages(chat, &[message]).await {
            Ok(()) => true,
            Err(e) => {
                platform_failed(chat, "delete_messages", &e);
                false
            }
        }
    }
}

fn require_admin(group: &GroupState, user: UserId) -> Result<(), CommandError> {
    if group.is_admin(user) {
        Ok(())
    } else {
        Err(CommandError::NotAdmin(user))
    }
}

fn store_failed(group: GroupId, entity: &'static str, e: &StoreError) {
    warn!(group, entity, error = %e, code = e.error_code(), "Failed to persist state");
}

/// Log and count a tolerated platform failure.
pub(crate) fn platform_failed(group: GroupId, op: &'static str, e: &PlatformError) {
    metrics::record_platform_failure(op, e.error_code());
    warn!(group, op, error = %e, "Platform call failed");
}

/// Log and count a dispatch step that produced no effect.
pub(crate) fn step_failed(group: GroupId, step: &'static str, e: &DispatchError) {
    match e {
        DispatchError::PlatformRejected { op, source } => {
            metrics::record_platform_failure(op, source.error_code());
        }
        DispatchError::AlreadyDeleted(_) => {
            metrics::record_platform_failure("delete_messages", e.error_code());
        }
    }
    warn!(group, step, error = %e, code = e.error_code(), "Dispatch step had no effect");
}
