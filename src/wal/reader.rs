//! WAL Reader
//!
//! Handles reading entries from the WAL file.

use std::fs::File;
use std::io::{BufReader, ErrorKind, Read};
use std::path::Path;

use crate::error::{ItemError, Result};
use super::{WalEntry, HEADER_SIZE};

/// Reads entries from the WAL file
///
/// A torn entry at the end of the file (partial header or data) reads as
/// end-of-log; a complete entry with a bad checksum is an error.
pub struct WalReader {
    reader: BufReader<File>,

    /// Byte offset just past the last entry returned
    position: u64,

    /// Whether reading stopped on a torn entry
    torn: bool,
}

impl WalReader {
    /// Open a WAL file for reading
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Ok(Self {
            reader: BufReader::new(file),
            position: 0,
            torn: false,
        })
    }

    /// Read the next entry from the WAL
    pub fn next_entry(&mut self) -> Result<Option<WalEntry>> {
        if self.torn {
            return Ok(None);
        }

        let mut header = [0u8; HEADER_SIZE];
        let got = self.read_full(&mut header)?;
        if got == 0 {
            return Ok(None);
        }
        if got < HEADER_SIZE {
            self.torn = true;
            return Ok(None);
        }

        let (_, _, len) = WalEntry::decode_header(&header)?;
        let mut bytes = vec![0u8; HEADER_SIZE + len];
        bytes[..HEADER_SIZE].copy_from_slice(&header);
        if self.read_full(&mut bytes[HEADER_SIZE..])? < len {
            self.torn = true;
            return Ok(None);
        }

        let entry = WalEntry::deserialize(&bytes)?;
        self.position += bytes.len() as u64;
        Ok(Some(entry))
    }

    /// Iterate over all valid entries
    pub fn entries(self) -> WalIterator {
        WalIterator {
            reader: self,
            done: false,
        }
    }

    /// Byte offset of the end of the last good entry
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Whether the log ended in a partially written entry
    pub fn has_torn_tail(&self) -> bool {
        self.torn
    }

    /// Fill `buf` as far as the file allows, returning bytes read
    fn read_full(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut filled = 0;
        while filled < buf.len() {
            match self.reader.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(ItemError::Io(e)),
            }
        }
        Ok(filled)
    }
}

/// Iterator over WAL entries
///
/// Yields at most one error, then stops.
pub struct WalIterator {
    reader: WalReader,
    done: bool,
}

impl Iterator for WalIterator {
    type Item = Result<WalEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.next_entry() {
            Ok(Some(entry)) => Some(Ok(entry)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
