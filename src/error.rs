//! Error types for CaskKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CaskError
pub type Result<T> = std::result::Result<T, CaskError>;

/// Unified error type for CaskKV operations
#[derive(Debug, Error)]
pub enum CaskError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Log Errors
    // -------------------------------------------------------------------------
    #[error("Corrupt record at offset {offset}: {reason}")]
    CorruptRecord { offset: u64, reason: String },

    /// A record whose bytes run past the end of the log (crash mid-append)
    #[error("Torn record at offset {offset}: needs {needed} bytes, {available} available")]
    TornRecord {
        offset: u64,
        needed: u64,
        available: u64,
    },

    #[error("Entry {field} too large: {len} bytes (max {max})", max = u32::MAX)]
    EntryTooLarge { field: &'static str, len: usize },

    // -------------------------------------------------------------------------
    // Engine Errors
    // -------------------------------------------------------------------------
    #[error("Key not found")]
    KeyNotFound,

    #[error("Invalid handle: {0}")]
    InvalidHandle(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CaskError {
    /// True for both flavours of on-disk damage (corrupt or torn record)
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            CaskError::CorruptRecord { .. } | CaskError::TornRecord { .. }
        )
    }

    pub(crate) fn corrupt(offset: u64, reason: impl Into<String>) -> Self {
        CaskError::CorruptRecord {
            offset,
            reason: reason.into(),
        }
    }
}
