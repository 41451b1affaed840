//! Namespace registry
//!
//! Owns one KeyDir per namespace, created on first reference.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::KeyDir;

/// A namespace's index, shared between the registry and its bucket handles
pub type SharedKeyDir = Arc<RwLock<KeyDir>>;

/// Namespace name → KeyDir
///
/// ## Concurrency:
/// - `buckets`: RwLock (lookups share, creation is exclusive)
/// - Each KeyDir has its own RwLock, so namespaces never contend on data
#[derive(Debug, Default)]
pub struct Registry {
    buckets: RwLock<HashMap<Vec<u8>, SharedKeyDir>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// KeyDir for `name`, creating an empty one if this is the first reference
    pub fn get_or_create(&self, name: &[u8]) -> SharedKeyDir {
        if let Some(keydir) = self.buckets.read().get(name) {
            return Arc::clone(keydir);
        }

        // Another thread may have created it between the two locks
        let mut buckets = self.buckets.write();
        Arc::clone(buckets.entry(name.to_vec()).or_default())
    }

    /// KeyDir for `name` if the namespace has been referenced
    pub fn get(&self, name: &[u8]) -> Option<SharedKeyDir> {
        self.buckets.read().get(name).cloned()
    }

    /// All namespaces with their KeyDirs
    pub fn snapshot(&self) -> Vec<(Vec<u8>, SharedKeyDir)> {
        self.buckets
            .read()
            .iter()
            .map(|(name, keydir)| (name.clone(), Arc::clone(keydir)))
            .collect()
    }

    /// Names of every known namespace, sorted
    pub fn names(&self) -> Vec<Vec<u8>> {
        let mut names: Vec<_> = self.buckets.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of known namespaces
    pub fn len(&self) -> usize {
        self.buckets.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.read().is_empty()
    }

    /// Total live keys across every namespace
    pub fn live_keys(&self) -> usize {
        self.buckets.read().values().map(|k| k.read().len()).sum()
    }
}
