//! Error types for ItemKV
//!
//! Provides a unified error type for all operations, plus the mapping from
//! error kinds to response status codes used at the handler boundary.

use thiserror::Error;

/// Result type alias using ItemError
pub type Result<T> = std::result::Result<T, ItemError>;

/// Unified error type for ItemKV operations
#[derive(Debug, Error)]
pub enum ItemError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    // -------------------------------------------------------------------------
    // Store Errors
    // -------------------------------------------------------------------------
    /// The precondition of a conditional put did not hold
    #[error("Conditional check failed for {partition_key}/{sort_key}")]
    ConditionalCheckFailed {
        partition_key: String,
        sort_key: String,
    },

    #[error("Store error: {0}")]
    Store(String),

    // -------------------------------------------------------------------------
    // Serialization Errors
    // -------------------------------------------------------------------------
    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Request Errors (client input)
    // -------------------------------------------------------------------------
    #[error("body required")]
    MissingBody,

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    #[error("Network error: {0}")]
    Network(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ItemError {
    /// Whether the error was caused by the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ItemError::MissingBody | ItemError::InvalidPayload(_) | ItemError::MethodNotAllowed(_)
        )
    }

    /// HTTP-equivalent status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            ItemError::MissingBody | ItemError::InvalidPayload(_) => 400,
            ItemError::MethodNotAllowed(_) => 405,
            _ => 500,
        }
    }

    /// Message safe to return to a caller.
    ///
    /// Internal errors collapse to a fixed string; detail stays in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            ItemError::MissingBody => "body required",
            ItemError::InvalidPayload(_) => "invalid payload",
            ItemError::MethodNotAllowed(_) => "method not allowed",
            _ => "internal error",
        }
    }
}

impl From<serde_json::Error> for ItemError {
    fn from(e: serde_json::Error) -> Self {
        ItemError::Serialization(e.to_string())
    }
}

impl From<bincode::Error> for ItemError {
    fn from(e: bincode::Error) -> Self {
        ItemError::Serialization(e.to_string())
    }
}
