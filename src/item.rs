//! Item model and storage key scheme
//!
//! ## Key Layout
//! ```text
//! PK = "ITEM#" + id
//! SK = "METADATA#" + createdAt     (RFC 3339, UTC, microseconds)
//! ```
//!
//! Every create appends a new row under the item's partition. The sort key
//! timestamp has a fixed width, so lexicographic order is temporal order and
//! the newest row is the last one in the partition.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::store::{StorageKey, StoredRecord};

/// Prefix of every partition key
pub const PARTITION_PREFIX: &str = "ITEM#";

/// Prefix of every sort key written by `create_item`
pub const SORT_PREFIX: &str = "METADATA#";

/// Fixed sort key of the legacy point-lookup schema
pub const LEGACY_SORT_KEY: &str = "METADATA";

/// Lifetime of a row before the store may expire it
pub const ITEM_TTL_DAYS: i64 = 30;

/// Partition key for an item id
pub fn partition_key(id: &str) -> String {
    format!("{}{}", PARTITION_PREFIX, id)
}

/// Sort key for a write at `created_at`
pub fn sort_key(created_at: &DateTime<Utc>) -> String {
    format!("{}{}", SORT_PREFIX, format_timestamp(created_at))
}

/// Render a timestamp the way it is stored
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// A single written item
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub id: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Item {
    /// Build an item written at `now`; expiry is derived, never supplied
    pub fn new(id: impl Into<String>, payload: Value, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            payload,
            created_at: now,
            expires_at: now + Duration::days(ITEM_TTL_DAYS),
        }
    }

    pub fn key(&self) -> StorageKey {
        StorageKey::new(partition_key(&self.id), sort_key(&self.created_at))
    }

    /// Convert into the row stored in the table
    pub fn into_record(self) -> StoredRecord {
        let key = self.key();
        StoredRecord {
            partition_key: key.partition,
            sort_key: key.sort,
            data: self.payload,
            created_at: format_timestamp(&self.created_at),
            ttl: self.expires_at.timestamp(),
        }
    }
}

// =============================================================================
// Clock
// =============================================================================

/// Source of "now" for writes and expiry checks
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to one instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}
