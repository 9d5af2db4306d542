//! Table implementation
//!
//! Partitioned BTreeMap with RwLock for concurrency.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use super::{PutCondition, SortOrder, StorageKey, StoredRecord};

type Partition = BTreeMap<String, StoredRecord>;

/// In-memory table of rows grouped by partition key
///
/// Expired rows stay in the map until purged but are invisible to every
/// read and condition check taking `now`.
pub struct Table {
    partitions: RwLock<BTreeMap<String, Partition>>,
}

impl Table {
    /// Create a new empty Table
    pub fn new() -> Self {
        Self {
            partitions: RwLock::new(BTreeMap::new()),
        }
    }

    /// Get the live row at `key` (read lock)
    pub fn get(&self, key: &StorageKey, now: i64) -> Option<StoredRecord> {
        let partitions = self.partitions.read();
        partitions
            .get(&key.partition)
            .and_then(|rows| rows.get(&key.sort))
            .filter(|record| !record.is_expired(now))
            .cloned()
    }

    /// Up to `limit` live rows of a partition in the requested order (read lock)
    pub fn query(
        &self,
        partition_key: &str,
        order: SortOrder,
        limit: usize,
        now: i64,
    ) -> Vec<StoredRecord> {
        let partitions = self.partitions.read();
        let Some(rows) = partitions.get(partition_key) else {
            return Vec::new();
        };

        let live = |record: &&StoredRecord| !record.is_expired(now);
        match order {
            SortOrder::Ascending => rows.values().filter(live).take(limit).cloned().collect(),
            SortOrder::Descending => rows.values().rev().filter(live).take(limit).cloned().collect(),
        }
    }

    /// Whether a put at `key` guarded by `condition` may proceed
    pub fn satisfies(&self, condition: PutCondition, key: &StorageKey, now: i64) -> bool {
        let partitions = self.partitions.read();
        match condition {
            PutCondition::None => true,
            PutCondition::PartitionNotExists => partitions
                .get(&key.partition)
                .map_or(true, |rows| rows.values().all(|r| r.is_expired(now))),
            PutCondition::KeyNotExists => partitions
                .get(&key.partition)
                .and_then(|rows| rows.get(&key.sort))
                .map_or(true, |r| r.is_expired(now)),
        }
    }

    /// Insert or replace a row (write lock)
    pub fn insert(&self, record: StoredRecord) {
        let mut partitions = self.partitions.write();
        partitions
            .entry(record.partition_key.clone())
            .or_default()
            .insert(record.sort_key.clone(), record);
    }

    /// Remove a row, dropping its partition once empty (write lock)
    pub fn remove(&self, key: &StorageKey) -> Option<StoredRecord> {
        let mut partitions = self.partitions.write();
        let rows = partitions.get_mut(&key.partition)?;
        let removed = rows.remove(&key.sort);
        if rows.is_empty() {
            partitions.remove(&key.partition);
        }
        removed
    }

    /// Keys of every row expired at `now`
    pub fn expired_keys(&self, now: i64) -> Vec<StorageKey> {
        let partitions = self.partitions.read();
        partitions
            .values()
            .flat_map(|rows| rows.values())
            .filter(|r| r.is_expired(now))
            .map(StoredRecord::key)
            .collect()
    }

    /// Snapshot of all live rows in key order
    pub fn live_records(&self, now: i64) -> Vec<StoredRecord> {
        let partitions = self.partitions.read();
        partitions
            .values()
            .flat_map(|rows| rows.values())
            .filter(|r| !r.is_expired(now))
            .cloned()
            .collect()
    }

    /// Total stored rows, expired ones included
    pub fn row_count(&self) -> usize {
        self.partitions.read().values().map(BTreeMap::len).sum()
    }

    pub fn partition_count(&self) -> usize {
        self.partitions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.partitions.read().is_empty()
    }

    /// Clear all rows
    pub fn clear(&self) {
        self.partitions.write().clear();
    }
}

impl Default for Table {
    fn default() -> Self {
        Self::new()
    }
}
