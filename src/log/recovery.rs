//! Log Recovery
//!
//! Rebuilds every namespace's KeyDir by replaying the log from offset 0.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::config::RecoveryMode;
use crate::error::{CaskError, Result};
use crate::keydir::Registry;

use super::{LogFile, Mark};

/// Replays a log into a namespace registry
pub struct Recovery;

/// Result of a recovery pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecoveryResult {
    /// Number of records successfully replayed
    pub records_replayed: u64,

    /// Of which PUT records
    pub puts: u64,

    /// Of which DEL tombstones
    pub deletes: u64,

    /// Distinct namespaces named by the log
    pub namespaces: usize,

    /// Keys still live once replay finished
    pub live_keys: usize,

    /// Length of the well-formed prefix of the log
    pub valid_len: u64,

    /// Whether a torn tail record was found (and, in replay, cut off)
    pub was_truncated: bool,

    /// Bytes past `valid_len` belonging to the torn record
    pub bytes_discarded: u64,

    /// Where replay preserved the discarded bytes, if it cut any
    pub torn_path: Option<PathBuf>,

    /// Well-formed records with an empty key; never indexed
    pub records_skipped: u64,
}

/// Sidecar that receives the bytes a replay cuts off a torn tail
///
/// Every truncation appends to it, so earlier salvages are kept.
pub fn torn_path(data_path: &Path) -> PathBuf {
    let mut name = data_path.as_os_str().to_owned();
    name.push(".torn");
    PathBuf::from(name)
}

impl Recovery {
    /// Replay `log` into `registry`
    ///
    /// This will:
    /// 1. Scan every record in file order
    /// 2. PUT → point the key at the record; DEL → drop the key
    ///    (namespaces are created on first sight, deletes of unknown keys are fine)
    /// 3. On a torn tail: copy the tail into the `.torn` sidecar and truncate
    ///    the file (`TruncateTail`), or fail (`Strict`)
    /// 4. Any other read or decode failure aborts recovery
    ///
    /// Records with an empty key are skipped, never indexed.
    pub fn replay(
        log: &mut LogFile,
        registry: &Registry,
        mode: RecoveryMode,
    ) -> Result<RecoveryResult> {
        let (mut result, failure) = Self::scan(log, registry);

        match failure {
            None => {}
            Some(CaskError::TornRecord { .. }) if mode == RecoveryMode::TruncateTail => {
                result.bytes_discarded = log.len() - result.valid_len;
                result.was_truncated = true;

                // The tail may hold whole records behind a damaged length
                // field; keep a copy before cutting it off
                let sidecar = torn_path(log.path());
                save_tail(log, result.valid_len, &sidecar)?;

                tracing::warn!(
                    path = %log.path().display(),
                    valid_len = result.valid_len,
                    discarded = result.bytes_discarded,
                    saved_to = %sidecar.display(),
                    "truncating torn record at log tail"
                );
                log.truncate(result.valid_len)?;
                result.torn_path = Some(sidecar);
            }
            Some(e) => return Err(e),
        }

        result.live_keys = registry.live_keys();
        Ok(result)
    }

    /// Verify integrity of a log file without modifying it
    ///
    /// Reports what `replay` would do. A torn tail sets `was_truncated`
    /// but the file is left as is.
    pub fn verify(path: &Path) -> Result<RecoveryResult> {
        let log = LogFile::open_read_only(path)?;
        let registry = Registry::new();

        let (mut result, failure) = Self::scan(&log, &registry);

        match failure {
            None => {}
            Some(CaskError::TornRecord { .. }) => {
                result.bytes_discarded = log.len() - result.valid_len;
                result.was_truncated = true;
            }
            Some(e) => return Err(e),
        }

        result.live_keys = registry.live_keys();
        Ok(result)
    }

    /// Apply records until the end of the log or the first failure
    fn scan(log: &LogFile, registry: &Registry) -> (RecoveryResult, Option<CaskError>) {
        let mut result = RecoveryResult::default();
        let mut namespaces = HashSet::new();
        let mut failure = None;

        let mut iter = log.iter();
        for item in iter.by_ref() {
            let (offset, entry) = match item {
                Ok(pair) => pair,
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            };

            if entry.key.is_empty() {
                // e.g. a zero-filled tail left by a crash after the file grew
                tracing::warn!(offset, "skipping record with empty key");
                result.records_skipped += 1;
                continue;
            }

            let keydir = registry.get_or_create(&entry.namespace);
            let mut keydir = keydir.write();
            match entry.mark {
                Mark::Put => {
                    keydir.insert(entry.key, offset);
                    result.puts += 1;
                }
                Mark::Delete => {
                    keydir.remove(&entry.key);
                    result.deletes += 1;
                }
            }

            namespaces.insert(entry.namespace);
            result.records_replayed += 1;
        }

        result.valid_len = iter.offset();
        result.namespaces = namespaces.len();
        (result, failure)
    }
}

/// Append the bytes from `from` to the end of `log` onto `sidecar`, durably
fn save_tail(log: &LogFile, from: u64, sidecar: &Path) -> Result<()> {
    let tail = log.read_tail(from)?;

    let mut file = OpenOptions::new().create(true).append(true).open(sidecar)?;
    file.write_all(&tail)?;
    file.sync_all()?;
    Ok(())
}
