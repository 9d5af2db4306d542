//! WAL Tests
//!
//! - Entry serialization and CRC checks
//! - Writer LSN sequencing and reopen
//! - Recovery from torn tails and corrupted entries

mod recovery_tests;

use itemkv::store::StoredRecord;
use itemkv::wal::Operation;
use serde_json::json;

/// A put operation for a small row under `ITEM#<id>`
pub fn put_op(id: &str, n: u32) -> Operation {
    let record = StoredRecord {
        partition_key: format!("ITEM#{}", id),
        sort_key: format!("METADATA#2026-01-01T00:00:{:02}.000000Z", n % 60),
        data: json!({ "n": n }),
        created_at: format!("2026-01-01T00:00:{:02}.000000Z", n % 60),
        ttl: 1_800_000_000,
    };
    Operation::put(&record).unwrap()
}
