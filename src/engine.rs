//! Engine Module
//!
//! The embedded store engine that backs `StoreClient`.
//!
//! ## Responsibilities
//! - Coordinate WAL and Table
//! - Make conditional puts atomic per key
//! - Hide and purge rows past their ttl
//! - Manage crash recovery on startup

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::{Config, WalSyncStrategy};
use crate::error::{ItemError, Result};
use crate::item::{Clock, SystemClock};
use crate::store::{PutCondition, SortOrder, StorageKey, StoreClient, StoredRecord, Table};
use crate::wal::{Operation, WalRecovery, WalWriter};

/// The embedded storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/expire/compact): Serialized by the WAL mutex
///   - Only ONE write operation at a time
///   - Condition check → WAL append → table insert, all under the mutex,
///     so two racing conditional puts can never both succeed
///
/// - **Reads** (get/query): Never take the WAL mutex
///   - Table uses internal RwLock (many concurrent readers)
///   - No read-your-write guarantee against an in-flight put
pub struct Engine {
    /// Engine configuration
    config: Config,

    /// Location of the table's WAL
    wal_path: PathBuf,

    /// Write-ahead log; holding it serializes writers
    wal: Mutex<WalWriter>,

    /// Rows, internally RwLock'd
    table: Table,

    /// Time source for ttl checks
    clock: Arc<dyn Clock>,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Open/create data directory
    /// 2. Recover from WAL if it exists (torn tail is truncated)
    /// 3. Replay recovered operations into the table
    /// 4. Ready to serve requests
    pub fn open(config: Config) -> Result<Self> {
        Self::open_with_clock(config, Arc::new(SystemClock))
    }

    /// Open with an explicit time source
    pub fn open_with_clock(config: Config, clock: Arc<dyn Clock>) -> Result<Self> {
        if config.table_name.trim().is_empty() {
            return Err(ItemError::Config("table name must not be empty".to_string()));
        }

        fs::create_dir_all(&config.data_dir)?;
        let wal_path = config.wal_path();
        let table = Table::new();

        if wal_path.exists() {
            let (entries, recovery) = WalRecovery::recover(&wal_path)?;

            if recovery.entries_recovered > 0 || recovery.entries_corrupted > 0 {
                tracing::info!(
                    "WAL recovery: {} entries recovered, {} corrupted, last_lsn={}",
                    recovery.entries_recovered,
                    recovery.entries_corrupted,
                    recovery.last_lsn
                );
            }

            for entry in entries {
                match entry.operation {
                    Operation::Expire { partition_key, sort_key } => {
                        table.remove(&StorageKey::new(partition_key, sort_key));
                    }
                    ref put => {
                        if let Some(record) = put.record()? {
                            table.insert(record);
                        }
                    }
                }
            }
        }

        let wal = WalWriter::open(&wal_path, config.wal_sync_strategy)?;

        tracing::debug!(
            "Opened table '{}' with {} rows",
            config.table_name,
            table.row_count()
        );

        Ok(Self {
            config,
            wal_path,
            wal: Mutex::new(wal),
            table,
            clock,
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: &Path) -> Result<Self> {
        Self::open(Config::builder().data_dir(path).build())
    }

    /// Remove every row past its ttl
    ///
    /// Each removal is logged so replay does not resurrect it.
    /// Returns the number of rows removed.
    pub fn purge_expired(&self) -> Result<usize> {
        let mut wal = self.wal.lock();
        let expired = self.table.expired_keys(self.now());

        for key in &expired {
            wal.append(Operation::Expire {
                partition_key: key.partition.clone(),
                sort_key: key.sort.clone(),
            })?;
            self.table.remove(key);
        }

        if !expired.is_empty() {
            tracing::info!("Purged {} expired rows from '{}'", expired.len(), self.config.table_name);
        }
        Ok(expired.len())
    }

    /// Rewrite the WAL so it holds only the live rows
    ///
    /// The new log is written beside the old one and renamed over it.
    pub fn compact(&self) -> Result<()> {
        let mut wal = self.wal.lock();
        let now = self.now();

        let tmp_path = self.wal_path.with_extension("wal.compact");
        if tmp_path.exists() {
            fs::remove_file(&tmp_path)?;
        }

        let live = self.table.live_records(now);
        {
            let mut compacted = WalWriter::open(
                &tmp_path,
                WalSyncStrategy::EveryNEntries { count: usize::MAX },
            )?;
            for record in &live {
                compacted.append(Operation::put(record)?)?;
            }
            compacted.sync()?;
        }

        fs::rename(&tmp_path, &self.wal_path)?;
        *wal = WalWriter::open(&self.wal_path, self.config.wal_sync_strategy)?;

        for key in self.table.expired_keys(now) {
            self.table.remove(&key);
        }

        tracing::info!("Compacted WAL for '{}' to {} rows", self.config.table_name, live.len());
        Ok(())
    }

    /// Close the engine gracefully
    ///
    /// Syncs any buffered WAL entries to disk
    pub fn close(self) -> Result<()> {
        self.wal.lock().sync()
    }

    fn now(&self) -> i64 {
        self.clock.now().timestamp()
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the data directory path
    pub fn data_dir(&self) -> &Path {
        &self.config.data_dir
    }

    /// Get the WAL path
    pub fn wal_path(&self) -> &Path {
        &self.wal_path
    }

    /// Number of stored rows, including expired rows not yet purged
    pub fn row_count(&self) -> usize {
        self.table.row_count()
    }

    /// Number of distinct partitions
    pub fn partition_count(&self) -> usize {
        self.table.partition_count()
    }

    /// LSN of the last WAL entry
    pub fn current_lsn(&self) -> u64 {
        self.wal.lock().current_lsn()
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}

impl StoreClient for Engine {
    fn put_conditional(&self, record: StoredRecord, condition: PutCondition) -> Result<()> {
        let mut wal = self.wal.lock();
        let key = record.key();

        if !self.table.satisfies(condition, &key, self.now()) {
            return Err(ItemError::ConditionalCheckFailed {
                partition_key: key.partition,
                sort_key: key.sort,
            });
        }

        // WAL first, then table
        wal.append(Operation::put(&record)?)?;
        self.table.insert(record);
        Ok(())
    }

    fn get_by_key(&self, key: &StorageKey) -> Result<Option<StoredRecord>> {
        Ok(self.table.get(key, self.now()))
    }

    fn query_by_partition(
        &self,
        partition_key: &str,
        order: SortOrder,
        limit: usize,
    ) -> Result<Vec<StoredRecord>> {
        Ok(self.table.query(partition_key, order, limit, self.now()))
    }
}
