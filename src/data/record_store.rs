use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::data::record::{Fields, Record, RecordKey};
use crate::error::{GridError, GridResult};

/// Result of applying a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Batch replaced the collection
    Applied { seq: u64, records: usize },
    /// Batch was older than the last applied one and was dropped
    Stale { seq: u64, current: u64 },
}

/// Result of a delete; deleting an absent key is not an error
#[derive(Debug, Clone, PartialEq)]
pub enum DeleteOutcome {
    Removed(Record),
    NotFound(RecordKey),
}

impl DeleteOutcome {
    pub fn is_removed(&self) -> bool {
        matches!(self, DeleteOutcome::Removed(_))
    }
}

/// Owns the canonical record collection.
///
/// Every mutation produces a new snapshot; a snapshot handed out earlier keeps
/// showing the records as they were when it was taken.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Arc<Vec<Record>>,
    last_applied_seq: Option<u64>,
    /// Bumped on every successful mutation, used to invalidate derived views
    revision: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole collection, unless `seq` is older than the last
    /// applied load. Duplicate keys keep their first occurrence.
    pub fn load(&mut self, batch: Vec<Record>, seq: u64) -> LoadOutcome {
        if let Some(current) = self.last_applied_seq {
            if seq < current {
                warn!(
                    "RecordStore: dropping stale load seq={} (last applied {})",
                    seq, current
                );
                return LoadOutcome::Stale { seq, current };
            }
        }

        let mut seen = HashSet::with_capacity(batch.len());
        let mut records = Vec::with_capacity(batch.len());
        for record in batch {
            if seen.insert(record.key) {
                records.push(record);
            } else {
                warn!(
                    "RecordStore: duplicate key {} in load seq={}, keeping first",
                    record.key, seq
                );
            }
        }

        let count = records.len();
        self.records = Arc::new(records);
        self.last_applied_seq = Some(seq);
        self.revision += 1;
        info!("RecordStore: loaded {} records (seq={})", count, seq);
        LoadOutcome::Applied {
            seq,
            records: count,
        }
    }

    /// Merge `fields` onto the record with `key`
    pub fn upsert(&mut self, key: RecordKey, fields: &Fields) -> GridResult<()> {
        let index = self.position(key).ok_or(GridError::NotFound(key))?;

        Arc::make_mut(&mut self.records)[index].merge(fields);
        self.revision += 1;
        debug!(
            "RecordStore: upserted record {} ({} fields)",
            key,
            fields.len()
        );
        Ok(())
    }

    /// Remove the record with `key`. Absent keys are reported, not failed.
    pub fn delete(&mut self, key: RecordKey) -> DeleteOutcome {
        match self.position(key) {
            Some(index) => {
                let removed = Arc::make_mut(&mut self.records).remove(index);
                self.revision += 1;
                debug!("RecordStore: deleted record {}", key);
                DeleteOutcome::Removed(removed)
            }
            None => {
                debug!("RecordStore: delete of missing record {} ignored", key);
                DeleteOutcome::NotFound(key)
            }
        }
    }

    /// Current records in insertion order
    pub fn snapshot(&self) -> Arc<Vec<Record>> {
        Arc::clone(&self.records)
    }

    pub fn get(&self, key: RecordKey) -> Option<&Record> {
        self.records.iter().find(|r| r.key == key)
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.position(key).is_some()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn last_applied_seq(&self) -> Option<u64> {
        self.last_applied_seq
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    fn position(&self, key: RecordKey) -> Option<usize> {
        self.records.iter().position(|r| r.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::record::FieldValue;

    fn people() -> Vec<Record> {
        vec![
            Record::new(1).with_field("name", "Alice"),
            Record::new(2).with_field("name", "Bob"),
        ]
    }

    #[test]
    fn test_load_replaces_collection() {
        let mut store = RecordStore::new();
        assert_eq!(
            store.load(people(), 1),
            LoadOutcome::Applied { seq: 1, records: 2 }
        );
        assert_eq!(store.len(), 2);

        store.load(vec![Record::new(9)], 2);
        assert_eq!(store.len(), 1);
        assert!(store.contains(RecordKey(9)));
    }

    #[test]
    fn test_stale_load_is_dropped() {
        let mut store = RecordStore::new();
        store.load(people(), 2);
        let revision = store.revision();

        let outcome = store.load(vec![Record::new(5)], 1);
        assert_eq!(outcome, LoadOutcome::Stale { seq: 1, current: 2 });
        assert_eq!(store.len(), 2);
        assert_eq!(store.revision(), revision);
        assert_eq!(store.last_applied_seq(), Some(2));
    }

    #[test]
    fn test_duplicate_keys_keep_first() {
        let mut store = RecordStore::new();
        store.load(
            vec![
                Record::new(1).with_field("name", "first"),
                Record::new(1).with_field("name", "second"),
            ],
            1,
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.get(RecordKey(1)).unwrap().get_as_string("name"), "first");
    }

    #[test]
    fn test_upsert_merges_fields() {
        let mut store = RecordStore::new();
        store.load(
            vec![Record::new(1)
                .with_field("name", "Alice")
                .with_field("email", "a@sydney.com")],
            1,
        );

        let mut patch = Fields::new();
        patch.insert("name".to_string(), FieldValue::from("Alicia"));
        store.upsert(RecordKey(1), &patch).unwrap();

        let record = store.get(RecordKey(1)).unwrap();
        assert_eq!(record.get_as_string("name"), "Alicia");
        assert_eq!(record.get_as_string("email"), "a@sydney.com");
    }

    #[test]
    fn test_upsert_missing_key() {
        let mut store = RecordStore::new();
        store.load(people(), 1);
        let before = store.snapshot();

        let result = store.upsert(RecordKey(42), &Fields::new());
        assert_eq!(result, Err(GridError::NotFound(RecordKey(42))));
        assert_eq!(*store.snapshot(), *before);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = RecordStore::new();
        store.load(people(), 1);

        assert!(store.delete(RecordKey(2)).is_removed());
        let after_first = store.snapshot();
        assert_eq!(
            store.delete(RecordKey(2)),
            DeleteOutcome::NotFound(RecordKey(2))
        );
        assert_eq!(*store.snapshot(), *after_first);
    }

    #[test]
    fn test_snapshots_are_immutable() {
        let mut store = RecordStore::new();
        store.load(people(), 1);
        let before = store.snapshot();

        store.delete(RecordKey(1));
        let mut patch = Fields::new();
        patch.insert("name".to_string(), FieldValue::from("Robert"));
        store.upsert(RecordKey(2), &patch).unwrap();

        assert_eq!(before.len(), 2);
        assert_eq!(before[1].get_as_string("name"), "Bob");
        assert_eq!(store.snapshot().len(), 1);
    }
}
