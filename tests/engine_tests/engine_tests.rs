//! Tests for Engine
//!
//! These tests verify:
//! - StoreClient operations (conditional put, point lookup, query)
//! - Crash recovery from WAL
//! - Expiry purge and WAL compaction
//! - Racing conditional puts

use std::sync::Arc;
use std::thread;

use chrono::{TimeZone, Utc};
use itemkv::config::{Config, WalSyncStrategy};
use itemkv::engine::Engine;
use itemkv::item::FixedClock;
use itemkv::store::{PutCondition, SortOrder, StorageKey, StoreClient, StoredRecord};
use itemkv::ItemError;
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

/// 2026-01-01T00:00:00Z
const NOW: i64 = 1_767_225_600;

fn test_config(temp_dir: &TempDir) -> Config {
    Config::builder()
        .data_dir(temp_dir.path())
        .table_name("items")
        .wal_sync_strategy(WalSyncStrategy::EveryWrite) // Sync every write for test reliability
        .build()
}

fn open_at(temp_dir: &TempDir, now: i64) -> Engine {
    let clock = FixedClock(Utc.timestamp_opt(now, 0).unwrap());
    Engine::open_with_clock(test_config(temp_dir), Arc::new(clock)).unwrap()
}

fn setup_temp_engine() -> (TempDir, Engine) {
    let temp_dir = TempDir::new().unwrap();
    let engine = open_at(&temp_dir, NOW);
    (temp_dir, engine)
}

fn row(id: &str, second: u32, ttl: i64) -> StoredRecord {
    let ts = format!("2026-01-01T00:00:{:02}.000000Z", second);
    StoredRecord {
        partition_key: format!("ITEM#{}", id),
        sort_key: format!("METADATA#{}", ts),
        data: json!({ "id": id, "second": second }),
        created_at: ts,
        ttl,
    }
}

fn live(id: &str, second: u32) -> StoredRecord {
    row(id, second, NOW + 30 * 86_400)
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_engine_open_creates_wal_named_after_table() {
    let temp_dir = TempDir::new().unwrap();
    let data_dir = temp_dir.path().join("mydb");

    let config = Config::builder().data_dir(&data_dir).table_name("orders").build();
    let engine = Engine::open(config).unwrap();

    assert!(data_dir.exists());
    assert!(data_dir.join("orders.wal").exists());
    assert_eq!(engine.wal_path(), data_dir.join("orders.wal"));
}

#[test]
fn test_engine_rejects_empty_table_name() {
    let temp_dir = TempDir::new().unwrap();
    let config = Config::builder().data_dir(temp_dir.path()).table_name("  ").build();

    assert!(matches!(Engine::open(config), Err(ItemError::Config(_))));
}

#[test]
fn test_put_and_get_by_key() {
    let (_temp, engine) = setup_temp_engine();
    let record = live("abc", 1);

    engine.put_conditional(record.clone(), PutCondition::None).unwrap();

    assert_eq!(engine.get_by_key(&record.key()).unwrap(), Some(record));
    assert_eq!(engine.get_by_key(&StorageKey::new("ITEM#abc", "METADATA")).unwrap(), None);
}

#[test]
fn test_query_by_partition_latest_first() {
    let (_temp, engine) = setup_temp_engine();
    for s in [2, 5, 1] {
        engine.put_conditional(live("abc", s), PutCondition::KeyNotExists).unwrap();
    }

    let latest = engine.query_by_partition("ITEM#abc", SortOrder::Descending, 1).unwrap();
    assert_eq!(latest.len(), 1);
    assert_eq!(latest[0].data["second"], 5);
}

#[test]
fn test_conditional_put_fails_distinguishably() {
    let (_temp, engine) = setup_temp_engine();
    engine.put_conditional(live("abc", 1), PutCondition::PartitionNotExists).unwrap();

    let err = engine
        .put_conditional(live("abc", 2), PutCondition::PartitionNotExists)
        .unwrap_err();

    match err {
        ItemError::ConditionalCheckFailed { partition_key, .. } => assert_eq!(partition_key, "ITEM#abc"),
        other => panic!("Expected ConditionalCheckFailed, got {:?}", other),
    }
    // Rejected write left nothing behind
    assert_eq!(engine.row_count(), 1);
    assert_eq!(engine.current_lsn(), 1);
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_rows_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_at(&temp_dir, NOW);
        engine.put_conditional(live("a", 1), PutCondition::PartitionNotExists).unwrap();
        engine.put_conditional(live("b", 1), PutCondition::PartitionNotExists).unwrap();
        engine.close().unwrap();
    }

    let engine = open_at(&temp_dir, NOW);
    assert_eq!(engine.row_count(), 2);
    assert_eq!(engine.get_by_key(&live("a", 1).key()).unwrap(), Some(live("a", 1)));
    // Uniqueness still holds after recovery
    assert!(engine.put_conditional(live("a", 2), PutCondition::PartitionNotExists).is_err());
    assert_eq!(engine.current_lsn(), 2);
}

#[test]
fn test_recovery_without_close() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_at(&temp_dir, NOW);
        engine.put_conditional(live("a", 1), PutCondition::None).unwrap();
        // Dropped without close: simulates a crash after the WAL sync
    }

    let engine = open_at(&temp_dir, NOW);
    assert_eq!(engine.row_count(), 1);
}

// =============================================================================
// Expiry Tests
// =============================================================================

#[test]
fn test_expired_rows_hidden_then_purged() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_at(&temp_dir, NOW);
        engine.put_conditional(row("old", 1, NOW + 10), PutCondition::None).unwrap();
        engine.put_conditional(live("new", 1), PutCondition::None).unwrap();
    }

    let engine = open_at(&temp_dir, NOW + 20);
    assert!(engine.query_by_partition("ITEM#old", SortOrder::Descending, 1).unwrap().is_empty());
    assert_eq!(engine.row_count(), 2);

    assert_eq!(engine.purge_expired().unwrap(), 1);
    assert_eq!(engine.row_count(), 1);
    assert_eq!(engine.purge_expired().unwrap(), 0);
    drop(engine);

    // The purge was logged, so replay does not bring the row back
    let engine = open_at(&temp_dir, NOW);
    assert_eq!(engine.row_count(), 1);
    assert!(engine.get_by_key(&row("old", 1, NOW + 10).key()).unwrap().is_none());
}

#[test]
fn test_compact_keeps_only_live_rows() {
    let temp_dir = TempDir::new().unwrap();
    {
        let engine = open_at(&temp_dir, NOW);
        engine.put_conditional(row("old", 1, NOW + 10), PutCondition::None).unwrap();
        for s in 0..5 {
            engine.put_conditional(live("new", s), PutCondition::None).unwrap();
        }
    }

    let engine = open_at(&temp_dir, NOW + 20);
    engine.compact().unwrap();
    assert_eq!(engine.row_count(), 5);
    assert_eq!(engine.current_lsn(), 5);

    engine.put_conditional(live("other", 1), PutCondition::None).unwrap();
    assert_eq!(engine.current_lsn(), 6);
    drop(engine);

    let engine = open_at(&temp_dir, NOW);
    assert_eq!(engine.row_count(), 6);
    assert_eq!(engine.partition_count(), 2);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_racing_conditional_puts_single_winner() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .put_conditional(live("same", i), PutCondition::PartitionNotExists)
                    .is_ok()
            })
        })
        .collect();

    let winners = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|won| *won)
        .count();

    assert_eq!(winners, 1);
    assert_eq!(engine.row_count(), 1);
}

#[test]
fn test_concurrent_reads_during_writes() {
    let (_temp, engine) = setup_temp_engine();
    let engine = Arc::new(engine);

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for s in 0..50 {
                engine.put_conditional(live("w", s), PutCondition::None).unwrap();
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..100 {
                    let rows = engine.query_by_partition("ITEM#w", SortOrder::Descending, 1).unwrap();
                    assert!(rows.len() <= 1);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for r in readers {
        r.join().unwrap();
    }
    assert_eq!(engine.row_count(), 50);
}
