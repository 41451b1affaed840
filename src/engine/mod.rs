//! Engine Module
//!
//! The storage engine that ties the log and the namespace indexes together.
//!
//! ## Responsibilities
//! - Open the data file and rebuild every namespace index from it
//! - Hand out bucket (namespace) handles
//! - Serialize appends to the shared log across all namespaces
//! - Compact the log on request (`merge`)
//!
//! Opening the same data file from two processes at once is not supported.

mod bucket;
mod merge;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::Config;
use crate::error::{CaskError, Result};
use crate::keydir::Registry;
use crate::log::{LogFile, Recovery, RecoveryResult};

pub use bucket::Bucket;
pub use merge::MergeStats;

/// The main storage engine
///
/// ## Concurrency Model: Single-Writer / Multiple-Reader (SWMR)
///
/// - **Writes** (put/delete/merge/sync/close): take the `log` write lock
///   - Only ONE writer at a time, across every namespace, so records
///     never interleave in the shared file
///   - Lock order: `log` → registry → namespace KeyDir
///
/// - **Reads** (get): take the `log` read lock, then the KeyDir read lock
///   - Any number of concurrent readers
///   - LogFile reads are positional, no shared cursor
///
/// Cloning an `Engine` is cheap; every clone and every `Bucket` shares the
/// same state.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

struct EngineInner {
    /// Engine configuration
    config: Config,

    /// Full path of the data file
    data_path: PathBuf,

    /// The active log; `None` once the engine is closed
    log: RwLock<Option<LogFile>>,

    /// Namespace name → KeyDir
    registry: Registry,

    /// What the startup replay found
    recovery: RecoveryResult,
}

impl Engine {
    /// Open or create an engine with the given config
    ///
    /// On startup:
    /// 1. Create the data directory if needed
    /// 2. Remove a merge file left behind by an interrupted merge
    /// 3. Open (or create) the data file
    /// 4. Replay it to rebuild every namespace index
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        // Step 1: Create data directory if it doesn't exist
        fs::create_dir_all(&config.data_dir)?;

        let data_path = config.data_path();

        // Step 2: An unfinished merge never replaced the data file, so the
        // data file is still authoritative
        let merge_path = config.merge_path();
        if merge_path.exists() {
            tracing::warn!(path = %merge_path.display(), "removing leftover merge file");
            fs::remove_file(&merge_path)?;
        }

        // Step 3: Open the log
        let mut log = LogFile::open(&data_path, config.sync_strategy)?;

        // Step 4: Rebuild indexes
        let registry = Registry::new();
        let recovery = Recovery::replay(&mut log, &registry, config.recovery_mode)?;

        tracing::info!(
            path = %data_path.display(),
            records = recovery.records_replayed,
            namespaces = recovery.namespaces,
            live_keys = recovery.live_keys,
            log_size = log.len(),
            truncated = recovery.was_truncated,
            "engine opened"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                config,
                data_path,
                log: RwLock::new(Some(log)),
                registry,
                recovery,
            }),
        })
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config with the specified data directory
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let config = Config::builder().data_dir(path.as_ref()).build();
        Self::open(config)
    }

    /// Handle to the namespace `name`, created on first reference
    pub fn bucket(&self, name: impl AsRef<[u8]>) -> Bucket {
        let name = name.as_ref();
        let keydir = self.inner.registry.get_or_create(name);
        Bucket::new(name.to_vec(), keydir, Arc::clone(&self.inner))
    }

    /// Handle to the unnamed namespace, for single-namespace use
    pub fn default_bucket(&self) -> Bucket {
        self.bucket(b"")
    }

    /// Force the log to disk
    pub fn sync(&self) -> Result<()> {
        let mut log = self.inner.log.write();
        let log = log.as_mut().ok_or_else(closed)?;
        log.sync()
    }

    /// Close the engine
    ///
    /// Syncs and releases the data file. Every later operation on this
    /// engine or its buckets fails with `InvalidHandle`, including a
    /// second `close`.
    pub fn close(&self) -> Result<()> {
        let mut guard = self.inner.log.write();
        let log = guard.as_mut().ok_or_else(closed)?;
        log.sync()?;

        let size = log.len();
        *guard = None;

        tracing::info!(path = %self.inner.data_path.display(), log_size = size, "engine closed");
        Ok(())
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    pub fn is_closed(&self) -> bool {
        self.inner.log.read().is_none()
    }

    /// Current length of the data file in bytes
    pub fn log_size(&self) -> Result<u64> {
        let log = self.inner.log.read();
        log.as_ref().map(LogFile::len).ok_or_else(closed)
    }

    /// Names of every namespace seen so far, sorted
    pub fn bucket_names(&self) -> Vec<Vec<u8>> {
        self.inner.registry.names()
    }

    /// Live keys across all namespaces
    pub fn live_keys(&self) -> usize {
        self.inner.registry.live_keys()
    }

    /// Statistics from the replay performed at open
    pub fn recovery_result(&self) -> &RecoveryResult {
        &self.inner.recovery
    }

    /// Full path of the data file
    pub fn data_path(&self) -> &Path {
        &self.inner.data_path
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }
}

fn closed() -> CaskError {
    CaskError::InvalidHandle("engine is closed".to_string())
}
