//! Periodic resets, group departure and group-level configuration.

use crate::error::CommandError;
use crate::metrics;
use crate::platform::{GroupId, UserId};
use crate::state::{GroupSettings, SettingsPatch};
use crate::warden::Warden;
use tipwarden_rules::WordList;
use tracing::{info, warn};

impl Warden {
    /// Zero every rule's daily counter and every word-list hit counter.
    pub fn reset_counters(&self) {
        for id in self.registry.ids() {
            if let Some(group) = self.registry.get(id) {
                group.rules_mut(|rules| rules.reset_today());
                self.persist_rules(&group);
            }
        }
        self.words.read().reset_hits();
        info!(groups = self.registry.len(), "Daily counters reset");
    }

    /// Forget the keyword-reply dedup ledger and stale declarations.
    pub fn reset_notifications(&self) {
        for id in self.registry.ids() {
            if let Some(group) = self.registry.get(id) {
                group.messages(|m| m.reset_notifications());
            }
        }
    }

    /// Drop every trace of a group the bot has left.
    pub fn leave_group(&self, group: GroupId) -> bool {
        let removed = self.registry.remove(group);
        let known = removed.is_some();
        let deleted = match &removed {
            Some(state) => state.retire(|| self.store.delete_group(group)),
            None => self.store.delete_group(group),
        };
        if let Err(e) = deleted {
            warn!(group, error = %e, code = e.error_code(), "Failed to delete group from store");
        }
        metrics::set_groups(self.registry.len());
        info!(group, known, "Left group");
        known
    }

    /// Replace the group's administrator list.
    pub fn refresh_admins(&self, group: GroupId, admins: Vec<UserId>) {
        let count = admins.len();
        self.group(group).set_admins(admins);
        info!(group, count, "Administrator list refreshed");
    }

    /// Replace one word-list category. Patterns are compiled case-insensitively.
    pub fn set_words(&self, category: &str, patterns: &[String]) -> Result<usize, CommandError> {
        let list = WordList::compile(patterns)?;
        let count = list.len();
        self.words.write().set(category, list);
        info!(category, count, "Word list replaced");
        Ok(count)
    }

    /// Current hit counts of one category, pattern by pattern.
    pub fn word_hits(&self, category: &str) -> Vec<(String, u64)> {
        self.words
            .read()
            .get(category)
            .map(WordList::hits)
            .unwrap_or_default()
    }

    pub fn update_settings(
        &self,
        group: GroupId,
        admin: UserId,
        patch: &SettingsPatch,
    ) -> Result<GroupSettings, CommandError> {
        let state = self.admin_group(group, admin)?;

        let max_len = self.limits.max_reply_len;
        let max_buttons = self.limits.max_buttons;
        let updated = state.settings_mut(|settings| {
            patch.apply(settings, max_len, max_buttons)?;
            Ok::<_, CommandError>(settings.clone())
        })?;

        self.persist_settings(&state);
        info!(group, admin, "Group settings updated");
        Ok(updated)
    }
}
