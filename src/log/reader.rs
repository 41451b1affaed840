//! Log Reader
//!
//! Sequential scan over a log file.

use crate::error::Result;

use super::{Entry, LogFile};

/// Iterator over `(offset, entry)` pairs, starting at offset 0
///
/// Each step advances by the entry's on-disk size. The iterator ends at the
/// end of the log, or right after yielding the first error.
pub struct LogIter<'a> {
    log: &'a LogFile,
    offset: u64,
    done: bool,
}

impl<'a> LogIter<'a> {
    pub(super) fn new(log: &'a LogFile) -> Self {
        Self {
            log,
            offset: 0,
            done: false,
        }
    }

    /// Offset of the next entry to read
    ///
    /// After an error this is the offset of the record that failed, i.e. the
    /// length of the valid prefix of the log.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Iterator for LogIter<'_> {
    type Item = Result<(u64, Entry)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.log.read_at(self.offset) {
            Ok(Some(entry)) => {
                let offset = self.offset;
                self.offset += entry.size();
                Some(Ok((offset, entry)))
            }
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
