//! # CaskKV
//!
//! An embedded, Bitcask-style key-value store with:
//! - One append-only data file shared by every namespace
//! - An in-memory index (key → offset) per namespace
//! - Crash recovery by replaying the log, with torn-tail handling
//! - Explicit merge to reclaim space from overwritten and deleted keys
//! - Single-writer/multi-reader concurrency model
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Engine / Bucket API                       │
//! │            (Single Writer / Multi Reader)                    │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!          ┌────────────┴────────────┐
//!          │                         │
//!          ▼                         ▼
//!   ┌─────────────┐          ┌─────────────┐
//!   │   LogFile   │◄─────────│   KeyDir    │
//!   │  (Append)   │  offset  │ (per bucket)│
//!   └──────┬──────┘          └──────▲──────┘
//!          │                        │
//!          ▼                        │
//!   ┌─────────────┐                 │
//!   │  Recovery / │─────────────────┘
//!   │    Merge    │   rebuild / relocate
//!   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use caskkv::{CaskError, Engine};
//!
//! let engine = Engine::open_path("./data")?;
//! let users = engine.bucket("users");
//!
//! users.put(b"alice", b"admin")?;
//! assert_eq!(users.get(b"alice")?, b"admin".to_vec());
//!
//! users.delete(b"alice")?;
//! assert!(matches!(users.get(b"alice"), Err(CaskError::KeyNotFound)));
//!
//! engine.merge()?;
//! engine.close()?;
//! # Ok::<(), CaskError>(())
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod log;
pub mod keydir;
pub mod engine;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{CaskError, Result};
pub use config::{Config, RecoveryMode, SyncStrategy};
pub use engine::{Bucket, Engine, MergeStats};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of CaskKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
