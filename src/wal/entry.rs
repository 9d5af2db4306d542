//! WAL Entry definitions
//!
//! Defines the structure of individual WAL log entries.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{ItemError, Result};
use crate::store::StoredRecord;

/// Header size: LSN (8) + CRC (4) + data length (4)
pub const HEADER_SIZE: usize = 16;

/// Upper bound on an entry's data section; larger lengths mean a bad header
pub const MAX_ENTRY_SIZE: usize = 64 * 1024 * 1024;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing
    pub lsn: u64,

    /// The operation to perform
    pub operation: Operation,

    /// Timestamp (unix millis) when entry was created
    pub timestamp: u64,
}

/// Operations that can be logged
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Operation {
    /// Insert a row. `record` is the JSON-encoded `StoredRecord`.
    Put {
        partition_key: String,
        sort_key: String,
        record: Vec<u8>,
    },

    /// Remove a row whose ttl has passed
    Expire {
        partition_key: String,
        sort_key: String,
    },
}

impl Operation {
    /// Build a put operation for a row
    pub fn put(record: &StoredRecord) -> Result<Self> {
        Ok(Operation::Put {
            partition_key: record.partition_key.clone(),
            sort_key: record.sort_key.clone(),
            record: serde_json::to_vec(record)?,
        })
    }

    /// Decode the row carried by a put
    pub fn record(&self) -> Result<Option<StoredRecord>> {
        match self {
            Operation::Put { record, .. } => Ok(Some(serde_json::from_slice(record)?)),
            Operation::Expire { .. } => Ok(None),
        }
    }
}

impl WalEntry {
    /// Create an entry stamped with the current time
    pub fn new(lsn: u64, operation: Operation) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);

        Self {
            lsn,
            operation,
            timestamp,
        }
    }

    /// Serialize to the on-disk format: header + bincode data
    pub fn serialize(&self) -> Result<Vec<u8>> {
        let data = bincode::serialize(self)?;
        let crc = Self::compute_crc(&data);

        let mut bytes = Vec::with_capacity(HEADER_SIZE + data.len());
        bytes.extend_from_slice(&self.lsn.to_be_bytes());
        bytes.extend_from_slice(&crc.to_be_bytes());
        bytes.extend_from_slice(&(data.len() as u32).to_be_bytes());
        bytes.extend_from_slice(&data);
        Ok(bytes)
    }

    /// Deserialize one entry from the start of `bytes`
    pub fn deserialize(bytes: &[u8]) -> Result<Self> {
        let (lsn, crc, len) = Self::decode_header(bytes)?;

        if bytes.len() < HEADER_SIZE + len {
            return Err(ItemError::WalCorruption(format!(
                "Truncated entry: expected {} data bytes, got {}",
                len,
                bytes.len() - HEADER_SIZE
            )));
        }

        let data = &bytes[HEADER_SIZE..HEADER_SIZE + len];
        let actual = Self::compute_crc(data);
        if actual != crc {
            return Err(ItemError::WalCorruption(format!(
                "CRC mismatch at lsn {}: stored {:08x}, computed {:08x}",
                lsn, crc, actual
            )));
        }

        let entry: WalEntry = bincode::deserialize(data)
            .map_err(|e| ItemError::WalCorruption(format!("Undecodable entry: {}", e)))?;

        if entry.lsn != lsn {
            return Err(ItemError::WalCorruption(format!(
                "LSN mismatch: header {}, body {}",
                lsn, entry.lsn
            )));
        }

        Ok(entry)
    }

    /// Parse a header into (lsn, crc, data length)
    pub fn decode_header(bytes: &[u8]) -> Result<(u64, u32, usize)> {
        if bytes.len() < HEADER_SIZE {
            return Err(ItemError::WalCorruption(format!(
                "Incomplete header: expected {} bytes, got {}",
                HEADER_SIZE,
                bytes.len()
            )));
        }

        let mut lsn = [0u8; 8];
        lsn.copy_from_slice(&bytes[0..8]);
        let crc = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
        let len = u32::from_be_bytes([bytes[12], bytes[13], bytes[14], bytes[15]]) as usize;
        if len > MAX_ENTRY_SIZE {
            return Err(ItemError::WalCorruption(format!("Implausible entry length: {}", len)));
        }

        Ok((u64::from_be_bytes(lsn), crc, len))
    }

    fn compute_crc(data: &[u8]) -> u32 {
        crc32fast::hash(data)
    }
}
