//! # ItemKV
//!
//! An idempotent JSON item store with:
//! - Conditional writes keyed on a caller-supplied idempotency key
//! - Append-only versions per id with latest-version reads
//! - Write-Ahead Logging (WAL) for durability and crash recovery
//! - Store-managed expiry (30-day ttl per row)
//! - A framed TCP request dispatcher
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 TCP Server (dispatcher)                      │
//! │              (worker pool, framed JSON)                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Request
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Request Handler                            │
//! │        (body/method validation, error mapping)               │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                   Item Repository                            │
//! │     (idempotent create, latest-version get)                  │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ StoreClient
//!          ┌────────────┴────────────┐
//!          │         Engine          │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │     WAL     │          │    Table    │
//!   │  (Append)   │          │  (RwLock)   │
//!   └─────────────┘          └─────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod item;
pub mod store;
pub mod wal;
pub mod engine;
pub mod repository;
pub mod handler;
pub mod protocol;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{ItemError, Result};
pub use config::Config;
pub use engine::Engine;
pub use handler::RequestHandler;
pub use repository::{CreateOutcome, CreateStatus, GetOutcome, ItemRepository};
pub use store::StoreClient;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of ItemKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
