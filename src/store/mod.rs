//! Store Module
//!
//! The key-value store interface the repository writes through, and the
//! in-memory table backing the embedded engine.
//!
//! ## Responsibilities
//! - Conditional put that fails distinguishably on a violated precondition
//! - Point lookup by composite key
//! - Partition query ordered by sort key with a limit
//!
//! ## Data Structure Choice
//! Partition key → BTreeMap of sort key → row, wrapped in RwLock:
//! - Partition existence is a single map probe
//! - Rows within a partition are already sorted for range queries
//! - Many concurrent readers, writers serialized by the engine

mod table;

pub use table::Table;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Composite primary key of a stored row
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StorageKey {
    pub partition: String,
    pub sort: String,
}

impl StorageKey {
    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

/// A row as persisted in the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    #[serde(rename = "PK")]
    pub partition_key: String,

    #[serde(rename = "SK")]
    pub sort_key: String,

    /// Opaque payload, stored and returned unmodified
    pub data: Value,

    #[serde(rename = "createdAt")]
    pub created_at: String,

    /// Expiry time (unix seconds)
    pub ttl: i64,
}

impl StoredRecord {
    pub fn key(&self) -> StorageKey {
        StorageKey::new(self.partition_key.clone(), self.sort_key.clone())
    }

    /// Whether the row has reached its expiry at `now` (unix seconds)
    pub fn is_expired(&self, now: i64) -> bool {
        self.ttl <= now
    }
}

/// Precondition attached to a put
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PutCondition {
    /// Unconditional write
    None,

    /// No live row exists anywhere under the record's partition key
    PartitionNotExists,

    /// No live row exists at the record's exact composite key
    KeyNotExists,
}

/// Order of rows returned by a partition query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// Operations the repository needs from a key-value store.
///
/// Implementations are shared across request threads as
/// `Arc<dyn StoreClient>`.
pub trait StoreClient: Send + Sync {
    /// Insert `record` if `condition` holds.
    ///
    /// Fails with `ItemError::ConditionalCheckFailed` when it does not.
    fn put_conditional(&self, record: StoredRecord, condition: PutCondition) -> Result<()>;

    /// Fetch the row at an exact key
    fn get_by_key(&self, key: &StorageKey) -> Result<Option<StoredRecord>>;

    /// Fetch up to `limit` rows of a partition in sort-key order
    fn query_by_partition(
        &self,
        partition_key: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<StoredRecord>>;
}
