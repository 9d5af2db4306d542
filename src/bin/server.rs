//! ItemKV Server Binary
//!
//! Opens the store and serves framed requests over TCP.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use itemkv::config::{ConfigBuilder, UniquenessKey};
use itemkv::network::Server;
use itemkv::{Config, Engine, ItemRepository, RequestHandler};
use tracing_subscriber::{fmt, EnvFilter};

/// ItemKV Server
#[derive(Parser, Debug)]
#[command(name = "itemkv-server")]
#[command(about = "Idempotent JSON item store")]
#[command(version)]
struct Args {
    /// Data directory
    #[arg(short, long, default_value = "./itemkv_data")]
    data_dir: String,

    /// Listen address (host:port)
    #[arg(short, long, default_value = "127.0.0.1:7878")]
    listen: String,

    /// Table name (falls back to TABLE_NAME, then the built-in default)
    #[arg(short, long, env = "TABLE_NAME")]
    table: Option<String>,

    /// Connection worker threads
    #[arg(short, long, default_value = "16")]
    workers: usize,

    /// Seconds between expired-row sweeps (0 disables)
    #[arg(long, default_value = "3600")]
    sweep_secs: u64,

    /// Key on which creates are deduplicated
    #[arg(long, value_enum, default_value = "logical-id")]
    uniqueness: Uniqueness,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Uniqueness {
    LogicalId,
    CompositeKey,
}

impl From<Uniqueness> for UniquenessKey {
    fn from(u: Uniqueness) -> Self {
        match u {
            Uniqueness::LogicalId => UniquenessKey::LogicalId,
            Uniqueness::CompositeKey => UniquenessKey::CompositeKey,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,itemkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    let mut builder = ConfigBuilder::from_config(Config::from_env())
        .data_dir(&args.data_dir)
        .listen_addr(&args.listen)
        .worker_threads(args.workers)
        .ttl_sweep_interval_secs(args.sweep_secs)
        .uniqueness_key(args.uniqueness.into());
    if let Some(table) = args.table {
        builder = builder.table_name(table);
    }
    let config = builder.build();

    tracing::info!("ItemKV Server v{}", itemkv::VERSION);
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!("Table: {}", config.table_name);

    // Store handle: built once, shared read-only by every worker
    let engine = match Engine::open(config.clone()) {
        Ok(e) => Arc::new(e),
        Err(e) => {
            tracing::error!("Failed to open engine: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Engine initialized with {} rows", engine.row_count());

    if config.ttl_sweep_interval_secs > 0 {
        spawn_sweeper(Arc::clone(&engine), Duration::from_secs(config.ttl_sweep_interval_secs));
    }

    let repository = ItemRepository::new(engine, &config);
    let handler = Arc::new(RequestHandler::new(repository));

    let server = match Server::bind(config, handler) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to start server: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Periodically purge expired rows and compact the log
fn spawn_sweeper(engine: Arc<Engine>, interval: Duration) {
    let spawned = thread::Builder::new()
        .name("itemkv-ttl-sweeper".to_string())
        .spawn(move || loop {
            thread::sleep(interval);
            match engine.purge_expired() {
                Ok(0) => {}
                Ok(_) => {
                    if let Err(e) = engine.compact() {
                        tracing::error!("WAL compaction failed: {}", e);
                    }
                }
                Err(e) => tracing::error!("Expiry sweep failed: {}", e),
            }
        });

    if let Err(e) = spawned {
        tracing::warn!("Could not start ttl sweeper: {}", e);
    }
}
