//! Merge (compaction)
//!
//! Rewrites the log with only the records the indexes still point at.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::Path;

use parking_lot::RwLockWriteGuard;

use crate::config::SyncStrategy;
use crate::error::Result;
use crate::keydir::KeyDir;
use crate::log::LogFile;

use super::{closed, Engine};

/// Outcome of a merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Records read from the old log
    pub records_scanned: u64,

    /// Live records copied into the new log
    pub records_kept: u64,

    /// Log size before the merge
    pub bytes_before: u64,

    /// Log size after the merge
    pub bytes_after: u64,
}

impl MergeStats {
    /// Superseded versions and tombstones left behind
    pub fn records_dropped(&self) -> u64 {
        self.records_scanned - self.records_kept
    }

    /// Bytes the merge gave back
    pub fn bytes_reclaimed(&self) -> u64 {
        self.bytes_before.saturating_sub(self.bytes_after)
    }
}

/// A live record's move from the old log to the new one
struct Relocation {
    namespace: Vec<u8>,
    key: Vec<u8>,
    old: u64,
    new: u64,
}

/// Everything written to the temporary log
struct MergePlan {
    relocations: Vec<Relocation>,
    records_scanned: u64,
    merged_len: u64,
}

type LockedKeyDirs<'a> = HashMap<&'a [u8], RwLockWriteGuard<'a, KeyDir>>;

impl Engine {
    /// Compact the log
    ///
    /// A record is live iff its namespace's KeyDir still maps its key to
    /// exactly that record's offset; every superseded version and every
    /// tombstone is dropped. Live records keep their relative order.
    ///
    /// Steps:
    /// 1. Hold the log write lock for the whole merge (no writer can run)
    /// 2. Write-lock every namespace KeyDir
    /// 3. Copy live records into `<data_file>.merge` and fsync it
    /// 4. Release the old handle and rename the merge file over the data file
    /// 5. Point every moved key at its new offset, reopen the log
    ///
    /// If anything fails before the rename, the merge file is discarded and
    /// the old log and indexes stay exactly as they were. The rename itself
    /// is the only step that replaces the data file; an `Err` after it means
    /// the merged log could not be reopened.
    pub fn merge(&self) -> Result<MergeStats> {
        let mut guard = self.inner.log.write();
        let log = guard.as_mut().ok_or_else(closed)?;

        // Step 1: Nothing to reclaim in an empty log
        if log.is_empty() {
            return Ok(MergeStats::default());
        }
        let bytes_before = log.len();

        // Step 2: Lock every namespace for the liveness check and the rewrite
        let buckets = self.inner.registry.snapshot();
        let mut keydirs: LockedKeyDirs<'_> = buckets
            .iter()
            .map(|(name, keydir)| (name.as_slice(), keydir.write()))
            .collect();

        // Step 3: Copy live records into the merge file
        let merge_path = self.inner.config.merge_path();
        let plan = match write_live_records(log, &keydirs, &merge_path) {
            Ok(plan) => plan,
            Err(e) => {
                discard(&merge_path);
                return Err(e);
            }
        };

        // Step 4: Swap files. The old handle must be gone before the rename
        let data_path = &self.inner.data_path;
        let sync_strategy = self.inner.config.sync_strategy;
        *guard = None;

        if let Err(e) = fs::rename(&merge_path, data_path) {
            discard(&merge_path);
            *guard = Some(LogFile::open(data_path, sync_strategy)?);
            return Err(e.into());
        }

        // Step 5: Never trust offsets into the old file again
        for moved in &plan.relocations {
            if let Some(keydir) = keydirs.get_mut(moved.namespace.as_slice()) {
                let relocated = keydir.relocate(&moved.key, moved.old, moved.new);
                debug_assert!(relocated, "live key changed while merge held every lock");
            }
        }

        let log = LogFile::open(data_path, sync_strategy)?;
        let bytes_after = log.len();
        debug_assert_eq!(bytes_after, plan.merged_len);
        *guard = Some(log);

        // The swap already happened; a failed directory sync only leaves the
        // rename's durability up to the OS
        if let Err(e) = sync_dir(&self.inner.config.data_dir) {
            tracing::warn!(
                dir = %self.inner.config.data_dir.display(),
                error = %e,
                "failed to sync data directory after merge"
            );
        }

        let stats = MergeStats {
            records_scanned: plan.records_scanned,
            records_kept: plan.relocations.len() as u64,
            bytes_before,
            bytes_after,
        };

        tracing::info!(
            path = %data_path.display(),
            scanned = stats.records_scanned,
            kept = stats.records_kept,
            bytes_before = stats.bytes_before,
            bytes_after = stats.bytes_after,
            "merge finished"
        );

        Ok(stats)
    }
}

/// Scan `log` and append every live record to a fresh log at `path`
fn write_live_records(
    log: &LogFile,
    keydirs: &LockedKeyDirs<'_>,
    path: &Path,
) -> Result<MergePlan> {
    // One fsync at the end instead of one per record
    let mut merged = LogFile::create(path, SyncStrategy::OsManaged)?;
    let mut relocations = Vec::new();
    let mut records_scanned = 0;

    for item in log.iter() {
        let (offset, entry) = item?;
        records_scanned += 1;

        let live = keydirs
            .get(entry.namespace.as_slice())
            .is_some_and(|keydir| keydir.is_current(&entry.key, offset));
        if !live {
            continue;
        }

        let new = merged.append(&entry)?;
        relocations.push(Relocation {
            namespace: entry.namespace,
            key: entry.key,
            old: offset,
            new,
        });
    }

    merged.sync()?;

    Ok(MergePlan {
        relocations,
        records_scanned,
        merged_len: merged.len(),
    })
}

/// Best-effort removal of the merge file; a missing file is fine
fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "failed to remove merge file");
        }
    }
}

/// Persist the rename itself
#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<()> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<()> {
    Ok(())
}
