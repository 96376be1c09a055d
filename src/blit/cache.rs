//! Append-only owning map used for the program and pipeline caches

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use crate::error::BlitResult;

/// Lazily populated map from a small value key to a shared handle.
/// Entries live as long as the cache; failed builds are not recorded.
pub struct VariantCache<K, V> {
    entries: HashMap<K, Arc<V>>,
}

impl<K: Copy + Eq + Hash, V> VariantCache<K, V> {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).cloned()
    }

    /// Return the cached value for `key`, building and inserting it on a miss
    pub fn get_or_try_insert_with<F>(&mut self, key: K, build: F) -> BlitResult<Arc<V>>
    where
        F: FnOnce() -> BlitResult<V>,
    {
        if let Some(value) = self.entries.get(&key) {
            return Ok(Arc::clone(value));
        }
        let value = Arc::new(build()?);
        self.entries.insert(key, Arc::clone(&value));
        Ok(value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Copy + Eq + Hash, V> Default for VariantCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
