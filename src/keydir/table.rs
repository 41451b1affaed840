//! KeyDir implementation
//!
//! HashMap-based key → offset table for one namespace.

use std::collections::HashMap;

/// Maps each live key of a namespace to the offset of its latest PUT record
///
/// A missing key means "never written, or last written by a delete".
/// The table carries no locking of its own; the engine wraps it in an
/// `RwLock` so every mutation happens under the writer-exclusive section.
#[derive(Debug, Default)]
pub struct KeyDir {
    entries: HashMap<Vec<u8>, u64>,
}

impl KeyDir {
    /// Create a new empty KeyDir
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset of the key's latest record, if the key is live
    pub fn get(&self, key: &[u8]) -> Option<u64> {
        self.entries.get(key).copied()
    }

    /// Point `key` at `offset`, returning the previous offset
    pub fn insert(&mut self, key: Vec<u8>, offset: u64) -> Option<u64> {
        self.entries.insert(key, offset)
    }

    /// Forget `key`, returning the offset it pointed at
    pub fn remove(&mut self, key: &[u8]) -> Option<u64> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.entries.contains_key(key)
    }

    /// True if `key` is indexed at exactly `offset`.
    ///
    /// This is the liveness test merge applies to every scanned record.
    pub fn is_current(&self, key: &[u8], offset: u64) -> bool {
        self.get(key) == Some(offset)
    }

    /// Move `key` from `old` to `new` only if it still points at `old`
    pub fn relocate(&mut self, key: &[u8], old: u64, new: u64) -> bool {
        match self.entries.get_mut(key) {
            Some(current) if *current == old => {
                *current = new;
                true
            }
            _ => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over `(key, offset)` pairs in no particular order
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], u64)> {
        self.entries.iter().map(|(k, &off)| (k.as_slice(), off))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
