//! File-based cache implementation.
//!
//! [`FileCache`] stores each entry as a file on disk: one subdirectory per
//! kind, one file per digest, the file content being the cached value.
//!
//! Writes go to a uniquely named temporary file that is then renamed over
//! the entry, so a concurrent reader sees either the old or the new value,
//! never a partial one.
//!
//! On construction, [`FileCache`] validates a `VERSION` file in the cache root.
//! If the version mismatches or is missing, the entire cache directory is wiped
//! and recreated. Filters change their output between releases, so stale
//! entries from previous builds must never be served.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::{CacheError, CacheHook};

/// Suffix counter for temporary files.
static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// File-based [`CacheHook`] rooted at a directory on disk.
///
/// Directory layout:
/// ```text
/// {root}/
/// +-- VERSION            # contains the cache version string
/// +-- code/              # kind "code"
/// |   +-- 3f786850e3...  # entry, named by digest
/// +-- diagram/
///     +-- ...
/// ```
#[derive(Debug)]
pub struct FileCache {
    root: PathBuf,
}

impl FileCache {
    /// Create a new file-based cache at `root`, validating the cache version.
    ///
    /// If the `VERSION` file inside `root` does not match `version`, the entire
    /// cache directory is removed and recreated with the new version. Errors
    /// during validation are logged but never fatal.
    #[must_use]
    pub fn new(root: PathBuf, version: &str) -> Self {
        validate_version(&root, version);
        Self { root }
    }

    /// Cache root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn entry_path(&self, kind: &str, digest: &str) -> Option<PathBuf> {
        (is_key_segment(kind) && is_key_segment(digest))
            .then(|| self.root.join(kind).join(digest))
    }
}

impl CacheHook for FileCache {
    fn check_cache(&self, kind: &str, digest: &str) -> Option<String> {
        let path = self.entry_path(kind, digest)?;
        fs::read_to_string(path).ok()
    }

    fn update_cache(&self, kind: &str, digest: &str, value: &str) -> Result<(), CacheError> {
        let path = self
            .entry_path(kind, digest)
            .ok_or_else(|| CacheError::InvalidKey {
                kind: kind.to_owned(),
                digest: digest.to_owned(),
            })?;
        let dir = self.root.join(kind);
        fs::create_dir_all(&dir)?;

        let tmp = dir.join(format!(
            ".{digest}.{}.{}.tmp",
            std::process::id(),
            TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
        ));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }
}

/// A kind or digest must be a single, non-hidden path segment.
fn is_key_segment(segment: &str) -> bool {
    !segment.is_empty()
        && !segment.starts_with('.')
        && segment
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b'.')
}

/// Validate the cache version, wiping the directory on mismatch.
fn validate_version(root: &Path, version: &str) {
    let version_file = root.join("VERSION");

    match fs::read_to_string(&version_file) {
        Ok(stored) if stored == version => {
            tracing::debug!("cache version matches: {version}");
            return;
        }
        Ok(stored) => {
            tracing::info!(
                "cache version mismatch (stored={stored}, current={version}), wiping cache"
            );
        }
        Err(_) => {
            tracing::info!("no cache VERSION file found, initializing cache");
        }
    }

    if root.exists()
        && let Err(e) = fs::remove_dir_all(root)
    {
        tracing::warn!("failed to remove cache directory: {e}");
    }
    if let Err(e) = fs::create_dir_all(root) {
        tracing::warn!("failed to create cache directory: {e}");
        return;
    }
    if let Err(e) = fs::write(&version_file, version) {
        tracing::warn!("failed to write cache VERSION file: {e}");
    }
}
