//! Redb-backed persistence.
//!
//! # Schema
//!
//! ```text
//! RULES:    group_id -> RuleSet (serde_json)
//! SLOTS:    group_id -> SlotTable (serde_json)
//! BINDINGS: group_id -> ChannelBinding (serde_json)
//! SETTINGS: group_id -> GroupSettings (serde_json)
//! ```

use super::{GroupSnapshot, Store, StoreError};
use crate::platform::GroupId;
use crate::state::{ChannelBinding, GroupSettings, SlotTable};
use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::Path;
use tipwarden_rules::RuleSet;
use tracing::{debug, info, warn};

type Table = TableDefinition<'static, i64, &'static [u8]>;

const RULES: Table = TableDefinition::new("rules");
const SLOTS: Table = TableDefinition::new("slots");
const BINDINGS: Table = TableDefinition::new("bindings");
const SETTINGS: Table = TableDefinition::new("settings");

const ALL_TABLES: [Table; 4] = [RULES, SLOTS, BINDINGS, SETTINGS];

macro_rules! database_error {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for StoreError {
                fn from(e: $ty) -> Self {
                    StoreError::Database(e.to_string())
                }
            }
        )*
    };
}

database_error!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

pub struct RedbStore {
    db: Database,
}

impl RedbStore {
    /// Open or create the database file and make sure every table exists.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = Database::create(path.as_ref())?;

        let write_txn = db.begin_write()?;
        for table in ALL_TABLES {
            let _ = write_txn.open_table(table)?;
        }
        write_txn.commit()?;

        info!(path = %path.as_ref().display(), "Redb store initialized");
        Ok(Self { db })
    }

    fn put<T: Serialize>(&self, table: Table, group: GroupId, value: &T) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(value)?;
        let write_txn = self.db.begin_write()?;
        {
            let mut t = write_txn.open_table(table)?;
            t.insert(group, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    fn remove(&self, tables: &[Table], group: GroupId) -> Result<(), StoreError> {
        let write_txn = self.db.begin_write()?;
        for table in tables {
            let mut t = write_txn.open_table(*table)?;
            t.remove(group)?;
        }
        write_txn.commit()?;
        Ok(())
    }

    /// Every decodable row of `table`; undecodable rows are logged and skipped.
    fn scan<T: DeserializeOwned>(&self, table: Table) -> Result<Vec<(GroupId, T)>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let t = read_txn.open_table(table)?;

        let mut rows = Vec::new();
        for item in t.iter()? {
            let (key, value) = item?;
            match serde_json::from_slice::<T>(value.value()) {
                Ok(decoded) => rows.push((key.value(), decoded)),
                Err(e) => {
                    warn!(group = key.value(), error = %e, "Failed to deserialize stored row, skipping");
                }
            }
        }
        Ok(rows)
    }
}

fn snapshot(groups: &mut BTreeMap<GroupId, GroupSnapshot>, id: GroupId) -> &mut GroupSnapshot {
    groups.entry(id).or_insert_with(|| GroupSnapshot {
        id,
        ..GroupSnapshot::default()
    })
}

impl Store for RedbStore {
    fn load_all(&self) -> Result<Vec<GroupSnapshot>, StoreError> {
        let mut groups: BTreeMap<GroupId, GroupSnapshot> = BTreeMap::new();

        for (id, rules) in self.scan::<RuleSet>(RULES)? {
            snapshot(&mut groups, id).rules = rules;
        }
        for (id, slots) in self.scan::<SlotTable>(SLOTS)? {
            snapshot(&mut groups, id).slots = slots;
        }
        for (id, binding) in self.scan::<ChannelBinding>(BINDINGS)? {
            snapshot(&mut groups, id).binding = Some(binding);
        }
        for (id, settings) in self.scan::<GroupSettings>(SETTINGS)? {
            snapshot(&mut groups, id).settings = Some(settings);
        }

        info!(count = groups.len(), "Loaded groups from storage");
        Ok(groups.into_values().collect())
    }

    fn save_rules(&self, group: GroupId, rules: &RuleSet) -> Result<(), StoreError> {
        self.put(RULES, group, rules)?;
        debug!(group, count = rules.len(), "Saved rules");
        Ok(())
    }

    fn save_slots(&self, group: GroupId, slots: &SlotTable) -> Result<(), StoreError> {
        self.put(SLOTS, group, slots)
    }

    fn save_binding(
        &self,
        group: GroupId,
        binding: Option<&ChannelBinding>,
    ) -> Result<(), StoreError> {
        match binding {
            Some(binding) => self.put(BINDINGS, group, binding),
            None => self.remove(&[BINDINGS], group),
        }
    }

    fn save_settings(&self, group: GroupId, settings: &GroupSettings) -> Result<(), StoreError> {
        self.put(SETTINGS, group, settings)
    }

    fn delete_group(&self, group: GroupId) -> Result<(), StoreError> {
        self.remove(&ALL_TABLES, group)?;
        debug!(group, "Deleted group from storage");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::SlotKey;
    use tipwarden_rules::{KeywordRule, Limits, SpecStyle, validate_rule};

    fn rules() -> RuleSet {
        let spec = validate_rule("spam\n+++\nno spam", SpecStyle::Trimmed, &Limits::default())
            .unwrap();
        let mut set = RuleSet::new();
        set.insert(KeywordRule::from_spec("abc123".into(), spec, 1, 100));
        set
    }

    #[test]
    fn state_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.redb");

        {
            let store = RedbStore::open(&path).unwrap();
            let mut slots = SlotTable::new();
            slots.occupy(SlotKey::Keyword("abc123".into()), 77, 1000);
            store.save_rules(-100, &rules()).unwrap();
            store.save_slots(-100, &slots).unwrap();
            store
                .save_binding(-100, Some(&ChannelBinding::new(-200, "t".into(), "b".into())))
                .unwrap();
            store.save_settings(-300, &GroupSettings::default()).unwrap();
        }

        let store = RedbStore::open(&path).unwrap();
        let all = store.load_all().unwrap();
        assert_eq!(all.len(), 2);

        let group = &all[1];
        assert_eq!(group.id, -100);
        assert_eq!(group.rules, rules());
        assert_eq!(
            group.slots.get(&SlotKey::Keyword("abc123".into())).message_id,
            77
        );
        assert_eq!(group.binding.as_ref().map(|b| b.channel), Some(-200));
        assert!(group.settings.is_none());
        assert!(all[0].settings.is_some());
    }

    #[test]
    fn delete_group_removes_every_table() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("s.redb")).unwrap();
        store.save_rules(-1, &rules()).unwrap();
        store.save_settings(-1, &GroupSettings::default()).unwrap();
        store.delete_group(-1).unwrap();
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn saving_no_binding_unbinds() {
        let dir = tempfile::tempdir().unwrap();
        let store = RedbStore::open(dir.path().join("s.redb")).unwrap();
        store
            .save_binding(-1, Some(&ChannelBinding::new(-2, "t".into(), "b".into())))
            .unwrap();
        store.save_binding(-1, None).unwrap();
        let all = store.load_all().unwrap();
        assert!(all.iter().all(|g| g.binding.is_none()));
    }
}
