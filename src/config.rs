//! Configuration for CaskKV
//!
//! Centralized configuration with sensible defaults.

use std::path::PathBuf;

use crate::error::{CaskError, Result};

/// Main configuration for a CaskKV instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Directory holding the data file
    /// Internal structure:
    ///   {data_dir}/
    ///     ├── cask.data        (the shared append-only log)
    ///     └── cask.data.merge  (only while a merge is in flight)
    pub data_dir: PathBuf,

    /// File name of the log inside `data_dir`
    pub data_file: String,

    // -------------------------------------------------------------------------
    // Durability Configuration
    // -------------------------------------------------------------------------
    /// Sync strategy: how often to fsync the log
    pub sync_strategy: SyncStrategy,

    /// What recovery does with a record cut short by a crash
    pub recovery_mode: RecoveryMode,
}

/// Log sync strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStrategy {
    /// fsync after every append (safest, slowest)
    EveryWrite,

    /// fsync after N unsynced appends (balanced durability/performance)
    EveryNEntries { count: usize },

    /// Leave flushing to the OS; fsync only on `sync`, `close` and merge
    OsManaged,
}

/// Handling of a torn record at the tail of the log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryMode {
    /// Cut the torn record off and truncate the file to the last whole record
    TruncateTail,

    /// Refuse to open; the torn record is reported as an error
    Strict,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./caskkv_data"),
            data_file: "cask.data".to_string(),
            sync_strategy: SyncStrategy::EveryNEntries { count: 100 },
            recovery_mode: RecoveryMode::TruncateTail,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Full path of the data file
    pub fn data_path(&self) -> PathBuf {
        self.data_dir.join(&self.data_file)
    }

    /// Full path of the temporary file a merge writes into
    pub fn merge_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.merge", self.data_file))
    }

    /// Full path of the sidecar that keeps bytes cut off a torn tail
    pub fn torn_path(&self) -> PathBuf {
        self.data_dir.join(format!("{}.torn", self.data_file))
    }

    /// Reject configurations that cannot name a file
    pub fn validate(&self) -> Result<()> {
        if self.data_file.is_empty() {
            return Err(CaskError::Config("data_file must not be empty".to_string()));
        }
        if self.data_file.contains(['/', '\\']) {
            return Err(CaskError::Config(format!(
                "data_file must be a bare file name, got {:?}",
                self.data_file
            )));
        }
        if let SyncStrategy::EveryNEntries { count: 0 } = self.sync_strategy {
            return Err(CaskError::Config(
                "EveryNEntries count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the data directory
    pub fn data_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.data_dir = path.into();
        self
    }

    /// Set the data file name
    pub fn data_file(mut self, name: impl Into<String>) -> Self {
        self.config.data_file = name.into();
        self
    }

    /// Set the sync strategy
    pub fn sync_strategy(mut self, strategy: SyncStrategy) -> Self {
        self.config.sync_strategy = strategy;
        self
    }

    /// Set the recovery mode
    pub fn recovery_mode(mut self, mode: RecoveryMode) -> Self {
        self.config.recovery_mode = mode;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
