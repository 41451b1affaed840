//! KeyDir Module
//!
//! In-memory index over the log, one table per namespace.
//!
//! ## Responsibilities
//! - Map key → offset of its latest PUT record in the current log
//! - Keep one independent table per namespace (bucket)
//! - Create namespaces lazily on first reference
//!
//! ## Invariants
//! - Only PUT offsets are ever stored; a delete removes the key instead of
//!   pointing at its tombstone
//! - The tables are a pure cache: a full replay of the log rebuilds them
//!
//! ## Data Structure Choice
//! HashMap per namespace behind a parking_lot RwLock:
//! - Point lookups only, no ordering needed
//! - Readers share, writers are exclusive

mod registry;
mod table;

pub use registry::{Registry, SharedKeyDir};
pub use table::KeyDir;
