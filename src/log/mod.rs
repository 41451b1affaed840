//! Log Module
//!
//! The append-only data file every namespace shares.
//!
//! ## Responsibilities
//! - Encode/decode individual records
//! - Append records and hand back their offsets
//! - Random-offset reads for point lookups
//! - Sequential scans for recovery and merge
//!
//! ## File Format
//! No file header, no checksums: the log is a plain concatenation of
//! records starting at byte 0. All integers are big-endian.
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │ Entry 1                                                      │
//! │ ┌──────────┬──────────┬──────────┬────────┬─────┬─────┬────┐ │
//! │ │KeyLen (4)│ValLen (4)│ NsLen (4)│Mark (2)│ Key │Value│ Ns │ │
//! │ └──────────┴──────────┴──────────┴────────┴─────┴─────┴────┘ │
//! ├──────────────────────────────────────────────────────────────┤
//! │ Entry 2 ...                                                  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//! Mark is 0 for PUT and 1 for DEL. A record occupies exactly
//! `14 + key_len + value_len + ns_len` bytes.

mod entry;
mod file;
mod reader;
mod recovery;

pub use entry::{Entry, EntryHeader, Mark, HEADER_SIZE};
pub use file::LogFile;
pub use reader::LogIter;
pub use recovery::{torn_path, Recovery, RecoveryResult};
