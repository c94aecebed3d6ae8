//! Periodic destruct sweep.
//!
//! Groups are visited one at a time. Expired slots are cleared under the
//! message lock before their messages are deleted, so each message receives
//! exactly one delete request however many sweeps overlap.

use crate::config::TimersConfig;
use crate::metrics;
use crate::platform::MessageId;
use crate::state::{GroupState, Lifetime, Slot, SlotKey};
use crate::warden::{Warden, platform_failed};
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Groups with cleaning enabled that were visited.
    pub groups: usize,
    pub expired: usize,
    pub orphaned: usize,
}

fn slot_lifetime(key: &SlotKey, destructs: &HashMap<String, u32>, timers: &TimersConfig) -> Lifetime {
    match key {
        SlotKey::Keyword(rule) => destructs
            .get(rule)
            .map_or(Lifetime::Orphaned, |secs| Lifetime::Seconds(i64::from(*secs))),
        SlotKey::OffTopic => Lifetime::from_config(timers.offtopic_destruct),
        SlotKey::Welcome => Lifetime::from_config(timers.welcome_destruct),
        SlotKey::Reactive => Lifetime::from_config(timers.reactive_destruct),
    }
}

impl Warden {
    pub async fn sweep(&self, now: i64) -> SweepReport {
        let mut report = SweepReport::default();

        for id in self.registry.ids() {
            let Some(group) = self.registry.get(id) else {
                continue;
            };
            if !group.settings(|s| s.clean) {
                continue;
            }
            report.groups += 1;

            let (expired, orphaned) = self.sweep_group(&group, now).await;
            report.expired += expired;
            report.orphaned += orphaned;
        }

        metrics::record_cleared("expired", report.expired);
        metrics::record_cleared("orphaned", report.orphaned);
        if report.expired + report.orphaned > 0 {
            debug!(?report, "Sweep finished");
        }
        report
    }

    async fn sweep_group(&self, group: &GroupState, now: i64) -> (usize, usize) {
        let timers = &self.config.timers;

        // Lock order: rules before messages.
        let expired = group.rules(|rules| {
            let destructs: HashMap<String, u32> = rules
                .iter()
                .map(|rule| (rule.key.clone(), rule.destruct))
                .collect();
            group.messages(|m| {
                m.slots
                    .expire(now, |key| slot_lifetime(key, &destructs, timers))
            })
        });

        let orphaned = expired.iter().filter(|e| e.orphaned).count();
        let mut doomed: Vec<MessageId> = expired.iter().map(|e| e.message_id).collect();
        for entry in &expired {
            debug!(group = group.id, slot = %entry.key, message = entry.message_id, orphaned = entry.orphaned, "Slot expired");
        }

        let link_expired = self.expire_link(group, now);
        if let Some(message) = link_expired {
            doomed.push(message);
        }

        if !doomed.is_empty()
            && let Err(e) = self.platform.delete_messages(group.id, &doomed).await
        {
            platform_failed(group.id, "delete_messages", &e);
        }
        if !expired.is_empty() {
            self.persist_slots(group);
        }

        let link = usize::from(link_expired.is_some());
        (expired.len() - orphaned + link, orphaned)
    }

    /// Clear the channel-link slot if it outlived its lifetime. Skipped while a
    /// channel transition holds the lock; the next sweep retries.
    fn expire_link(&self, group: &GroupState, now: i64) -> Option<MessageId> {
        let Lifetime::Seconds(lifetime) =
            Lifetime::from_config(self.config.timers.channel_link_destruct)
        else {
            return None;
        };

        let mut guard = group.try_binding()?;
        let binding = guard.as_mut()?;
        if !binding.link.is_live() || binding.link.age(now) < lifetime {
            return None;
        }

        let message = binding.link.message_id;
        binding.link = Slot::EMPTY;
        self.persist_binding(group, Some(&*binding));
        debug!(group = group.id, message, "Channel link notice expired");
        Some(message)
    }
}
