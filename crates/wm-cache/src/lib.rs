//! Content-addressed cache hooks for wikimark filters.
//!
//! Filters that perform expensive per-tag transformations (syntax
//! highlighting, diagram rendering) memoize their output through a
//! [`CacheHook`]. Entries are keyed by:
//!
//! - `kind`: a short tag naming the filter or extraction type (e.g. `"code"`)
//! - `digest`: the SHA-1 of the exact substring that was transformed
//!
//! The chain orchestrator never talks to the hook itself; only filters do.
//! Caching is an optimization: a failing backend behaves like a miss.
//!
//! # Implementations
//!
//! - [`NullCache`]: No-op implementation (always misses)
//! - [`MemoryCache`]: Process-local map, shareable across concurrent renders
//! - [`FileCache`]: File-based implementation with version validation
//!
//! # Example
//!
//! ```
//! use wm_cache::{CacheHook, NullCache, digest};
//!
//! let cache = NullCache;
//! let id = digest("fn main() {}");
//! cache.update_cache("code", &id, "<pre>..</pre>").unwrap();
//! assert_eq!(cache.check_cache("code", &id), None); // NullCache always misses
//! ```

mod file;
mod memory;

pub use file::FileCache;
pub use memory::MemoryCache;

use sha1::{Digest, Sha1};

/// Error raised by a cache backend.
///
/// Never fatal to a render: callers log it and carry on.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Backend I/O failure.
    #[error("cache I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Kind or digest cannot be used as a storage key.
    #[error("invalid cache key {kind}/{digest}")]
    InvalidKey {
        /// Entry kind.
        kind: String,
        /// Entry digest.
        digest: String,
    },
}

/// Hook consulted by filters to reuse formatted output of extracted data.
///
/// For a given `(kind, digest)` pair the stored value must be a
/// deterministic transformation of the substring that hashed to `digest`.
/// Implementations must be safe to call from concurrent renders; racing
/// writes to the same key are harmless because they carry the same value.
pub trait CacheHook: Send + Sync {
    /// Look up the formatted value of extracted tag data.
    ///
    /// Returns `None` on miss or when the backend cannot be read.
    ///
    /// # Arguments
    ///
    /// * `kind` - Type of data being extracted (e.g., "code")
    /// * `digest` - SHA-1 hex digest of the original extracted data
    fn check_cache(&self, kind: &str, digest: &str) -> Option<String>;

    /// Store the formatted value of extracted tag data.
    ///
    /// Overwrites any previous entry for the same key.
    fn update_cache(&self, kind: &str, digest: &str, value: &str) -> Result<(), CacheError>;
}

/// No-op [`CacheHook`] that never stores or retrieves data.
///
/// Every lookup misses; every update succeeds without doing anything.
/// Used when caching is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCache;

impl CacheHook for NullCache {
    fn check_cache(&self, _kind: &str, _digest: &str) -> Option<String> {
        None
    }

    fn update_cache(&self, _kind: &str, _digest: &str, _value: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Compute the cache digest of a substring: lowercase hex SHA-1.
///
/// The digest depends only on `content`, so keys are stable across renders
/// and independent of the surrounding document.
#[must_use]
pub fn digest(content: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}
