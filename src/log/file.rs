//! Log File
//!
//! Owns the on-disk data file: sequential appends, random-offset reads.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::SyncStrategy;
use crate::error::{CaskError, Result};

use super::entry::{Entry, EntryHeader, HEADER_SIZE};
use super::reader::LogIter;

/// Append-only data file
///
/// ## Concurrency:
/// - `append`/`sync`/`truncate` take `&mut self` (the owner serializes writers)
/// - `read_at` takes `&self` and uses positional reads, so any number of
///   readers can share the file without touching a cursor
pub struct LogFile {
    /// Path of the data file
    path: PathBuf,

    /// File handle, opened for read + append
    file: File,

    /// Where the next record lands; equals the file length
    write_offset: u64,

    sync_strategy: SyncStrategy,

    /// Appends since the last fsync
    unsynced: usize,
}

impl LogFile {
    /// Open an existing log or create an empty one
    ///
    /// `write_offset` starts at the current file length.
    pub fn open(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(path)?;

        Self::from_file(path, file, sync_strategy)
    }

    /// Create a fresh, empty log, discarding anything already at `path`
    pub fn create(path: &Path, sync_strategy: SyncStrategy) -> Result<Self> {
        // Truncate first, then reopen in append mode
        OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Self::open(path, sync_strategy)
    }

    /// Open an existing log for inspection only; appends will fail
    pub fn open_read_only(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_file(path, file, SyncStrategy::OsManaged)
    }

    fn from_file(path: &Path, file: File, sync_strategy: SyncStrategy) -> Result<Self> {
        let write_offset = file.metadata()?.len();

        Ok(Self {
            path: path.to_path_buf(),
            file,
            write_offset,
            sync_strategy,
            unsynced: 0,
        })
    }

    /// Append an entry, returning the offset it was written at
    ///
    /// Either the whole record lands or the call fails. A failed write or a
    /// failed sync cuts the file back to the previous `write_offset`, so a
    /// record the caller saw fail is never replayed later.
    pub fn append(&mut self, entry: &Entry) -> Result<u64> {
        let bytes = entry.encode()?;
        let offset = self.write_offset;

        if let Err(e) = self.write_record(&bytes) {
            self.rollback(offset);
            return Err(e);
        }

        Ok(offset)
    }

    fn write_record(&mut self, bytes: &[u8]) -> Result<()> {
        self.file.write_all(bytes)?;
        self.write_offset += bytes.len() as u64;
        self.unsynced += 1;
        self.maybe_sync()
    }

    /// Cut the file back to `offset` after a failed append
    fn rollback(&mut self, offset: u64) {
        match self.file.set_len(offset) {
            Ok(()) => self.write_offset = offset,
            Err(e) => {
                tracing::warn!(
                    path = %self.path.display(),
                    offset,
                    error = %e,
                    "failed to roll back partial append"
                );
                // Appends land at the physical end of the file; follow it
                if let Ok(metadata) = self.file.metadata() {
                    self.write_offset = metadata.len();
                }
            }
        }
    }

    /// Read the whole entry starting at `offset`
    ///
    /// Returns:
    /// - `Ok(Some(entry))`: a complete record
    /// - `Ok(None)`: `offset` is at or past the end of the log
    /// - `Err(TornRecord)`: the record runs past the end of the log
    /// - `Err(CorruptRecord)`: the header is unreadable (e.g. unknown mark)
    pub fn read_at(&self, offset: u64) -> Result<Option<Entry>> {
        let header = match self.read_header_at(offset)? {
            Some(header) => header,
            None => return Ok(None),
        };

        let payload_start = offset + HEADER_SIZE as u64;
        let available = self.write_offset - payload_start;
        if header.payload_len() > available {
            return Err(CaskError::TornRecord {
                offset,
                needed: header.entry_size(),
                available: self.write_offset - offset,
            });
        }

        let mut payload = vec![0u8; header.payload_len() as usize];
        read_exact_at(&self.file, &mut payload, payload_start)?;

        let entry = Entry::from_parts(header, &payload).map_err(|e| at_offset(e, offset))?;
        Ok(Some(entry))
    }

    /// Read only the fixed header at `offset`
    ///
    /// Same end-of-log and torn-record rules as [`read_at`](Self::read_at).
    pub fn read_header_at(&self, offset: u64) -> Result<Option<EntryHeader>> {
        if offset >= self.write_offset {
            return Ok(None);
        }

        let available = self.write_offset - offset;
        if available < HEADER_SIZE as u64 {
            return Err(CaskError::TornRecord {
                offset,
                needed: HEADER_SIZE as u64,
                available,
            });
        }

        let mut header = [0u8; HEADER_SIZE];
        read_exact_at(&self.file, &mut header, offset)?;

        EntryHeader::decode(&header)
            .map(Some)
            .map_err(|e| at_offset(e, offset))
    }

    /// Raw bytes from `offset` to the end of the log
    pub fn read_tail(&self, offset: u64) -> Result<Vec<u8>> {
        let len = self.write_offset.saturating_sub(offset);
        let mut buf = vec![0u8; len as usize];
        read_exact_at(&self.file, &mut buf, offset)?;
        Ok(buf)
    }

    /// Scan every entry from offset 0, in file order
    pub fn iter(&self) -> LogIter<'_> {
        LogIter::new(self)
    }

    /// Force sync to disk
    pub fn sync(&mut self) -> Result<()> {
        self.file.sync_all()?;
        self.unsynced = 0;
        Ok(())
    }

    /// Cut the file back to `len` bytes (used to drop a torn tail)
    pub fn truncate(&mut self, len: u64) -> Result<()> {
        if len > self.write_offset {
            return Err(CaskError::corrupt(
                len,
                format!("cannot truncate log of {} bytes to {}", self.write_offset, len),
            ));
        }

        self.file.set_len(len)?;
        self.file.sync_all()?;
        self.write_offset = len;
        self.unsynced = 0;
        Ok(())
    }

    /// Position of the next append
    pub fn write_offset(&self) -> u64 {
        self.write_offset
    }

    /// Current log length in bytes (same as `write_offset`)
    pub fn len(&self) -> u64 {
        self.write_offset
    }

    pub fn is_empty(&self) -> bool {
        self.write_offset == 0
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn maybe_sync(&mut self) -> Result<()> {
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNEntries { count } => self.unsynced >= count,
            SyncStrategy::OsManaged => false,
        };

        if due {
            self.sync()?;
        }
        Ok(())
    }
}

/// Stamp the real file offset onto a decode error raised against a bare buffer
fn at_offset(err: CaskError, offset: u64) -> CaskError {
    match err {
        CaskError::CorruptRecord { reason, .. } => CaskError::CorruptRecord { offset, reason },
        other => other,
    }
}

#[cfg(unix)]
fn read_exact_at(file: &File, buf: &mut [u8], offset: u64) -> io::Result<()> {
    use std::os::unix::fs::FileExt;
    file.read_exact_at(buf, offset)
}

#[cfg(windows)]
fn read_exact_at(file: &File, mut buf: &mut [u8], mut offset: u64) -> io::Result<()> {
    use std::os::windows::fs::FileExt;

    while !buf.is_empty() {
        match file.seek_read(buf, offset) {
            Ok(0) => return Err(io::ErrorKind::UnexpectedEof.into()),
            Ok(n) => {
                let rest = buf;
                buf = &mut rest[n..];
                offset += n as u64;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
