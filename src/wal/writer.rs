//! WAL Writer
//!
//! Handles appending entries to the WAL file.
//!
//! An append either lands whole or leaves the file exactly as it was: a failed
//! write or sync truncates the log back to the end of the last good entry. If
//! that truncation itself fails the writer is poisoned and refuses further
//! appends until the log is reopened.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::WalSyncStrategy;
use crate::error::{ItemError, Result};
use super::{Operation, WalEntry, WalRecovery};

/// Writes entries to the WAL file
pub struct WalWriter {
    file: File,
    path: PathBuf,
    current_lsn: u64,
    sync_strategy: WalSyncStrategy,

    /// Entries written since the last fsync
    unsynced: usize,

    /// File length up to the end of the last fully written entry
    valid_len: u64,

    /// Set when a failed append could not be rolled back
    poisoned: bool,
}

impl WalWriter {
    /// Open or create a WAL file, continuing after its last valid LSN
    pub fn open(path: &Path, sync_strategy: WalSyncStrategy) -> Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let valid_len = file.metadata()?.len();

        let current_lsn = if valid_len > 0 {
            WalRecovery::verify(path)?.last_lsn
        } else {
            0
        };

        Ok(Self {
            file,
            path: path.to_path_buf(),
            current_lsn,
            sync_strategy,
            unsynced: 0,
            valid_len,
            poisoned: false,
        })
    }

    /// Append an operation to the WAL, returning its LSN
    ///
    /// On error nothing of the entry remains in the log and the LSN is not
    /// consumed.
    pub fn append(&mut self, operation: Operation) -> Result<u64> {
        if self.poisoned {
            return Err(ItemError::WalWrite(format!(
                "{} is unusable after a failed append; reopen it",
                self.path.display()
            )));
        }

        let lsn = self.current_lsn + 1;
        let bytes = WalEntry::new(lsn, operation).serialize()?;

        let due = match self.sync_strategy {
            WalSyncStrategy::EveryWrite => true,
            WalSyncStrategy::EveryNEntries { count } => self.unsynced + 1 >= count,
        };

        let written = self.file.write_all(&bytes).and_then(|_| {
            if due {
                self.file.sync_data()
            } else {
                Ok(())
            }
        });

        if let Err(e) = written {
            self.rollback(lsn);
            return Err(ItemError::WalWrite(format!("append lsn {}: {}", lsn, e)));
        }

        self.current_lsn = lsn;
        self.valid_len += bytes.len() as u64;
        self.unsynced = if due { 0 } else { self.unsynced + 1 };

        Ok(lsn)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_data()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Get the current LSN
    pub fn current_lsn(&self) -> u64 {
        self.current_lsn
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True once a failed append could not be undone
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Cut the file back to the last good entry after a failed append
    fn rollback(&mut self, lsn: u64) {
        match self.file.set_len(self.valid_len) {
            Ok(()) => {
                tracing::warn!("Rolled back failed WAL append at lsn {}", lsn);
            }
            Err(e) => {
                tracing::error!(
                    "Could not roll back failed WAL append at lsn {}: {}; writer poisoned",
                    lsn,
                    e
                );
                self.poisoned = true;
            }
        }
    }
}
