//! Bucket handle
//!
//! Put/Get/Delete scoped to one namespace of the shared log.

use std::fmt;
use std::sync::Arc;

use crate::error::{CaskError, Result};
use crate::keydir::SharedKeyDir;
use crate::log::Entry;

use super::{closed, EngineInner};

/// Handle to one namespace
///
/// Handles are cheap to clone and can be moved across threads. They keep
/// the engine state alive, but once the engine is closed every operation
/// fails with `InvalidHandle`.
#[derive(Clone)]
pub struct Bucket {
    name: Vec<u8>,
    keydir: SharedKeyDir,
    engine: Arc<EngineInner>,
}

impl Bucket {
    pub(super) fn new(name: Vec<u8>, keydir: SharedKeyDir, engine: Arc<EngineInner>) -> Self {
        Self {
            name,
            keydir,
            engine,
        }
    }

    /// Put a key-value pair
    ///
    /// Steps:
    /// 1. Acquire the log write lock (serializes all writers)
    /// 2. Append a PUT record
    /// 3. Point the key at the new record
    ///
    /// An empty key is a no-op.
    pub fn put(&self, key: &[u8], value: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }

        let mut log = self.engine.log.write();
        let log = log.as_mut().ok_or_else(closed)?;

        let offset = log.append(&Entry::put(self.name.as_slice(), key, value))?;
        self.keydir.write().insert(key.to_vec(), offset);

        tracing::debug!(bucket = %self.display_name(), offset, "put");
        Ok(())
    }

    /// Get the value stored under `key`
    ///
    /// Returns `Err(KeyNotFound)` if the key was never written or was
    /// deleted. An empty key yields an empty value.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        if key.is_empty() {
            return Ok(Vec::new());
        }

        // Holding the log read lock keeps merge from moving the record
        let log = self.engine.log.read();
        let log = log.as_ref().ok_or_else(closed)?;

        let offset = self.keydir.read().get(key).ok_or(CaskError::KeyNotFound)?;

        let entry = log.read_at(offset)?.ok_or_else(|| {
            CaskError::corrupt(offset, "indexed offset is past the end of the log")
        })?;

        if entry.is_tombstone() || entry.key != key || entry.namespace != self.name {
            return Err(CaskError::corrupt(
                offset,
                "indexed record does not hold this key's value",
            ));
        }

        Ok(entry.value)
    }

    /// Delete a key
    ///
    /// Steps:
    /// 1. Acquire the log write lock
    /// 2. If the key is live, append a DEL tombstone
    /// 3. Drop the key from the index (the tombstone is never indexed)
    ///
    /// Deleting an absent or empty key succeeds without writing anything.
    pub fn delete(&self, key: &[u8]) -> Result<()> {
        if key.is_empty() {
            return Ok(());
        }

        let mut log = self.engine.log.write();
        let log = log.as_mut().ok_or_else(closed)?;

        let mut keydir = self.keydir.write();
        if !keydir.contains_key(key) {
            return Ok(());
        }

        let offset = log.append(&Entry::delete(self.name.as_slice(), key))?;
        keydir.remove(key);

        tracing::debug!(bucket = %self.display_name(), offset, "delete");
        Ok(())
    }

    /// Whether `key` is currently live in this namespace
    ///
    /// An empty key is never live.
    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        if key.is_empty() {
            return Ok(false);
        }

        let log = self.engine.log.read();
        if log.is_none() {
            return Err(closed());
        }
        Ok(self.keydir.read().contains_key(key))
    }

    /// Number of live keys
    pub fn len(&self) -> usize {
        self.keydir.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.keydir.read().is_empty()
    }

    /// Namespace name
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    fn display_name(&self) -> String {
        String::from_utf8_lossy(&self.name).into_owned()
    }
}

impl fmt::Debug for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bucket")
            .field("name", &self.display_name())
            .field("live_keys", &self.len())
            .finish()
    }
}
