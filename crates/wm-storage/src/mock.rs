//! Mock storage implementation for testing.
//!
//! Provides [`MockStorage`] for unit testing without filesystem access.

use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use crate::storage::{Storage, StorageError, WikiFile};

/// Backend identifier for error messages.
const BACKEND: &str = "Mock";

/// Mock storage for testing.
///
/// Stores file contents in memory, optionally per version, and records
/// every lookup so tests can assert which paths were requested.
///
/// # Example
///
/// ```ignore
/// use wm_storage::{MockStorage, Storage};
///
/// let storage = MockStorage::new()
///     .with_file("Home.md", "# Home")
///     .with_version("Home.md", "v1", "# Old home");
///
/// assert_eq!(storage.file("Home.md", Some("v1")).unwrap().content, "# Old home");
/// ```
#[derive(Debug, Default)]
pub struct MockStorage {
    /// Latest contents by path.
    latest: RwLock<HashMap<String, String>>,
    /// Historical contents by (path, version).
    versions: RwLock<HashMap<(String, String), String>>,
    /// Every `(path, version)` passed to [`Storage::file`].
    lookups: Mutex<Vec<(String, Option<String>)>>,
}

impl MockStorage {
    /// Create a new empty mock storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the latest content for a path.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_file(self, path: impl Into<String>, content: impl Into<String>) -> Self {
        self.latest
            .write()
            .unwrap()
            .insert(path.into(), content.into());
        self
    }

    /// Add content for a path at a specific version.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn with_version(
        self,
        path: impl Into<String>,
        version: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        self.versions
            .write()
            .unwrap()
            .insert((path.into(), version.into()), content.into());
        self
    }

    /// All lookups performed so far, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn lookups(&self) -> Vec<(String, Option<String>)> {
        self.lookups.lock().unwrap().clone()
    }
}

impl Storage for MockStorage {
    fn file(&self, path: &str, version: Option<&str>) -> Result<WikiFile, StorageError> {
        if let Ok(mut lookups) = self.lookups.lock() {
            lookups.push((path.to_owned(), version.map(ToOwned::to_owned)));
        }

        let content = match version {
            Some(v) => self
                .versions
                .read()
                .ok()
                .and_then(|m| m.get(&(path.to_owned(), v.to_owned())).cloned()),
            None => self.latest.read().ok().and_then(|m| m.get(path).cloned()),
        };

        content
            .map(|content| WikiFile {
                path: path.to_owned(),
                version: version.map(ToOwned::to_owned),
                content,
            })
            .ok_or_else(|| StorageError::not_found(path).with_backend(BACKEND))
    }
}
