//! Single-occupancy notice slots.
//!
//! A slot holds at most one live auto-generated message. `message_id == 0`
//! means the slot is empty.

use crate::platform::MessageId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Logical purpose of a slot within a group.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum SlotKey {
    /// Reply slot of one keyword rule.
    Keyword(String),
    OffTopic,
    Welcome,
    Reactive,
}

impl SlotKey {
    /// Metric label.
    pub fn kind(&self) -> &'static str {
        match self {
            SlotKey::Keyword(_) => "keyword",
            SlotKey::OffTopic => "offtopic",
            SlotKey::Welcome => "welcome",
            SlotKey::Reactive => "reactive",
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotKey::Keyword(key) => write!(f, "keyword:{key}"),
            other => f.write_str(other.kind()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Slot {
    pub message_id: MessageId,
    /// Unix seconds when the message was recorded.
    pub created_at: i64,
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        message_id: 0,
        created_at: 0,
    };

    pub fn new(message_id: MessageId, created_at: i64) -> Self {
        Self {
            message_id,
            created_at,
        }
    }

    pub fn is_live(&self) -> bool {
        self.message_id != 0
    }

    pub fn age(&self, now: i64) -> i64 {
        now.saturating_sub(self.created_at)
    }
}

/// How long a slot's message may live.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    Seconds(i64),
    Forever,
    /// The owning rule is gone; expire now regardless of age.
    Orphaned,
}

impl Lifetime {
    /// Seconds from config where 0 means forever.
    pub fn from_config(secs: u64) -> Self {
        match secs {
            0 => Lifetime::Forever,
            s => Lifetime::Seconds(i64::try_from(s).unwrap_or(i64::MAX)),
        }
    }
}

/// A message taken out of a slot by a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expired {
    pub key: SlotKey,
    pub message_id: MessageId,
    pub orphaned: bool,
}

/// All slots of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<(SlotKey, Slot)>", into = "Vec<(SlotKey, Slot)>")]
pub struct SlotTable {
    slots: BTreeMap<SlotKey, Slot>,
}

impl From<Vec<(SlotKey, Slot)>> for SlotTable {
    fn from(entries: Vec<(SlotKey, Slot)>) -> Self {
        Self {
            slots: entries.into_iter().collect(),
        }
    }
}

impl From<SlotTable> for Vec<(SlotKey, Slot)> {
    fn from(table: SlotTable) -> Self {
        table.slots.into_iter().collect()
    }
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current occupant, [`Slot::EMPTY`] if the slot was never used.
    pub fn get(&self, key: &SlotKey) -> Slot {
        self.slots.get(key).copied().unwrap_or(Slot::EMPTY)
    }

    /// Record a new occupant, returning whatever it displaced.
    pub fn occupy(&mut self, key: SlotKey, message_id: MessageId, now: i64) -> Slot {
        self.slots
            .insert(key, Slot::new(message_id, now))
            .unwrap_or(Slot::EMPTY)
    }

    /// Empty the slot only if it still holds `message_id`.
    pub fn clear_if(&mut self, key: &SlotKey, message_id: MessageId) -> bool {
        match self.slots.get_mut(key) {
            Some(slot) if slot.is_live() && slot.message_id == message_id => {
                *slot = Slot::EMPTY;
                true
            }
            _ => false,
        }
    }

    pub fn live(&self) -> impl Iterator<Item = (&SlotKey, &Slot)> {
        self.slots.iter().filter(|(_, slot)| slot.is_live())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Take every message whose lifetime has elapsed.
    ///
    /// Expired slots are reset to empty; orphaned slots are dropped from the
    /// table. Each message is returned at most once.
    pub fn expire<F>(&mut self, now: i64, lifetime: F) -> Vec<Expired>
    where
        F: Fn(&SlotKey) -> Lifetime,
    {
        let mut expired = Vec::new();
        self.slots.retain(|key, slot| {
            let lifetime = lifetime(key);
            let orphaned = lifetime == Lifetime::Orphaned;
            let due = match lifetime {
                Lifetime::Orphaned => true,
                Lifetime::Forever => false,
                Lifetime::Seconds(secs) => slot.age(now) >= secs,
            };
            if due && slot.is_live() {
                expired.push(Expired {
                    key: key.clone(),
                    message_id: slot.message_id,
                    orphaned,
                });
                *slot = Slot::EMPTY;
            }
            !orphaned
        });
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kw(key: &str) -> SlotKey {
        SlotKey::Keyword(key.to_string())
    }

    #[test]
    fn occupy_returns_displaced_occupant() {
        let mut table = SlotTable::new();
        assert_eq!(table.occupy(kw("a"), 10, 100), Slot::EMPTY);
        assert_eq!(table.occupy(kw("a"), 11, 200), Slot::new(10, 100));
        assert_eq!(table.get(&kw("a")), Slot::new(11, 200));
        assert_eq!(table.get(&SlotKey::Welcome), Slot::EMPTY);
    }

    #[test]
    fn clear_if_ignores_newer_occupant() {
        let mut table = SlotTable::new();
        table.occupy(SlotKey::OffTopic, 5, 0);
        assert!(!table.clear_if(&SlotKey::OffTopic, 4));
        assert!(table.clear_if(&SlotKey::OffTopic, 5));
        assert!(!table.get(&SlotKey::OffTopic).is_live());
    }

    #[test]
    fn expire_respects_lifetimes_once() {
        let mut table = SlotTable::new();
        table.occupy(kw("a"), 1, 1000);
        table.occupy(SlotKey::Welcome, 2, 1000);
        let lifetime = |key: &SlotKey| match key {
            SlotKey::Keyword(_) => Lifetime::Seconds(300),
            _ => Lifetime::Forever,
        };

        assert!(table.expire(1299, lifetime).is_empty());
        let expired = table.expire(1300, lifetime);
        assert_eq!(expired.len(), 1);
        assert_eq!(expired[0].message_id, 1);
        assert!(table.expire(5000, lifetime).is_empty());
        assert!(table.get(&SlotKey::Welcome).is_live());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn orphans_are_dropped_regardless_of_age() {
        let mut table = SlotTable::new();
        table.occupy(kw("gone"), 9, 1000);
        table.occupy(kw("idle"), 0, 0);
        let expired = table.expire(1001, |_| Lifetime::Orphaned);
        assert_eq!(
            expired,
            vec![Expired {
                key: kw("gone"),
                message_id: 9,
                orphaned: true
            }]
        );
        assert!(table.is_empty());
    }

    #[test]
    fn table_round_trips_through_json() {
        let mut table = SlotTable::new();
        table.occupy(kw("a"), 3, 7);
        table.occupy(SlotKey::Reactive, 4, 8);
        let json = serde_json::to_string(&table).unwrap();
        let back: SlotTable = serde_json::from_str(&json).unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn lifetime_zero_means_forever() {
        assert_eq!(Lifetime::from_config(0), Lifetime::Forever);
        assert_eq!(Lifetime::from_config(600), Lifetime::Seconds(600));
    }

    mod props {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashSet;

        #[derive(Debug, Clone)]
        enum Op {
            Occupy(u8, i64),
            Sweep(i64),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..4, 0i64..10_000).prop_map(|(k, t)| Op::Occupy(k, t)),
                (0i64..20_000).prop_map(Op::Sweep),
            ]
        }

        fn key(k: u8) -> SlotKey {
            match k {
                0 => SlotKey::OffTopic,
                1 => SlotKey::Welcome,
                n => SlotKey::Keyword(format!("r{n}")),
            }
        }

        proptest! {
            #[test]
            fn each_message_expires_at_most_once(ops in prop::collection::vec(op(), 1..64)) {
                let mut table = SlotTable::new();
                let mut next_id = 1;
                let mut seen = HashSet::new();

                for op in ops {
                    match op {
                        Op::Occupy(k, t) => {
                            table.occupy(key(k), next_id, t);
                            next_id += 1;
                        }
                        Op::Sweep(now) => {
                            for e in table.expire(now, |_| Lifetime::Seconds(300)) {
                                prop_assert!(seen.insert(e.message_id));
                            }
                        }
                    }
                }
                prop_assert!(table.live().count() <= 4);
            }
        }
    }
}
