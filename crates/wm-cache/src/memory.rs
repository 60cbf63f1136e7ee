//! In-process cache implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::{CacheError, CacheHook};

/// [`CacheHook`] backed by a process-local map.
///
/// Shared between concurrent renders through an `Arc`. Concurrent writes to
/// the same key resolve last-write-wins.
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().map_or(0, |entries| entries.len())
    }

    /// Whether the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop all entries.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.write() {
            entries.clear();
        }
    }
}

impl CacheHook for MemoryCache {
    fn check_cache(&self, kind: &str, digest: &str) -> Option<String> {
        // A poisoned lock reads as a miss
        let entries = self.entries.read().ok()?;
        entries
            .get(&(kind.to_owned(), digest.to_owned()))
            .cloned()
    }

    fn update_cache(&self, kind: &str, digest: &str, value: &str) -> Result<(), CacheError> {
        let Ok(mut entries) = self.entries.write() else {
            tracing::warn!(kind, digest, "memory cache lock poisoned, dropping write");
            return Ok(());
        };
        entries.insert((kind.to_owned(), digest.to_owned()), value.to_owned());
        Ok(())
    }
}
