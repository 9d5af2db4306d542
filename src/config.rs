//! Configuration for ItemKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

/// Environment variable holding the table name
pub const TABLE_NAME_ENV: &str = "TABLE_NAME";

/// Table name used when `TABLE_NAME` is unset
pub const DEFAULT_TABLE_NAME: &str = "serverless-table";

/// Main configuration for an ItemKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all data files
    /// Internal structure:
    ///   {data_dir}/
    ///     └── {table_name}.wal   (write-ahead log)
    pub data_dir: PathBuf,

    /// Name of the single logical table
    pub table_name: String,

    // -------------------------------------------------------------------------
    // WAL Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync WAL
    pub wal_sync_strategy: WalSyncStrategy,

    // -------------------------------------------------------------------------
    // Repository Configuration
    // -------------------------------------------------------------------------
    /// Which key a create must be unique on
    pub uniqueness_key: UniquenessKey,

    /// How reads locate the current row for an id
    pub read_strategy: ReadStrategy,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Number of worker threads serving connections
    pub worker_threads: usize,

    /// Connection read timeout (milliseconds, 0 = none)
    pub read_timeout_ms: u64,

    /// Connection write timeout (milliseconds, 0 = none)
    pub write_timeout_ms: u64,

    /// Interval between expired-row sweeps (seconds, 0 = disabled)
    pub ttl_sweep_interval_secs: u64,
}

/// WAL sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalSyncStrategy {
    /// fsync after every write (safest, slowest)
    EveryWrite,

    /// fsync after N uncommitted entries (balanced durability/performance)
    EveryNEntries { count: usize },
}

/// Key on which `create_item` enforces at-most-once insertion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UniquenessKey {
    /// Only the partition component (`ITEM#<id>`). A second create for the
    /// same id is rejected no matter when it happens.
    #[default]
    LogicalId,

    /// The full `PK + SK` composite. Because the sort key carries the write
    /// timestamp, only same-instant duplicates are rejected.
    CompositeKey,
}

/// Read path used by `get_item`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadStrategy {
    /// Query the partition descending, limit 1
    #[default]
    LatestVersion,

    /// Point lookup at the fixed sort key `METADATA`. Rows written by
    /// `create_item` never carry that key, so this only finds rows imported
    /// under the legacy schema.
    PointLookup,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./itemkv_data"),
            table_name: DEFAULT_TABLE_NAME.to_string(),
            wal_sync_strategy: WalSyncStrategy::EveryNEntries { count: 100 },
            uniqueness_key: UniquenessKey::default(),
            read_strategy: ReadStrategy::default(),
            listen_addr: "127.0.0.1:7878".to_string(),
            worker_threads: 16,
            read_timeout_ms: 30_000,
            write_timeout_ms: 5000,
            ttl_sweep_interval_secs: 3600,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Defaults, with the table name taken from `TABLE_NAME` when set
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(name) = std::env::var(TABLE_NAME_ENV) {
            if !name.trim().is_empty() {
                config.table_name = name;
            }
        }
        config
    }

    /// Path of the table's write-ahead log
    pub fn wal_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.wal", self.table_name))
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Start from an existing config (e.g. `Config::from_env()`)
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    /// Set the data directory (root for all storage)
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the table name
    pub fn table_name(mut self, name: impl Into<String>) -> Self {
        self.config.table_name = name.into();
        self
    }

    /// Set the WAL sync strategy
    pub fn wal_sync_strategy(mut self, strategy: WalSyncStrategy) -> Self {
        self.config.wal_sync_strategy = strategy;
        self
    }

    /// Set the uniqueness key used by creates
    pub fn uniqueness_key(mut self, key: UniquenessKey) -> Self {
        self.config.uniqueness_key = key;
        self
    }

    /// Set the read strategy used by gets
    pub fn read_strategy(mut self, strategy: ReadStrategy) -> Self {
        self.config.read_strategy = strategy;
        self
    }

    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the number of connection worker threads
    pub fn worker_threads(mut self, count: usize) -> Self {
        self.config.worker_threads = count;
        self
    }

    /// Set the read timeout (in milliseconds)
    pub fn read_timeout_ms(mut self, ms: u64) -> Self {
        self.config.read_timeout_ms = ms;
        self
    }

    /// Set the write timeout (in milliseconds)
    pub fn write_timeout_ms(mut self, ms: u64) -> Self {
        self.config.write_timeout_ms = ms;
        self
    }

    /// Set the expired-row sweep interval (in seconds)
    pub fn ttl_sweep_interval_secs(mut self, secs: u64) -> Self {
        self.config.ttl_sweep_interval_secs = secs;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
