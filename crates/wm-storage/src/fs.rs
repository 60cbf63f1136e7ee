//! Filesystem storage implementation.
//!
//! Provides [`FsStorage`] for reading wiki files from a working directory.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::storage::{Storage, StorageError, StorageErrorKind, WikiFile};

/// Backend identifier for error messages.
const BACKEND: &str = "Fs";

/// Filesystem storage rooted at a wiki directory.
///
/// The working tree has no history: requests for a specific version are
/// served from the current file and reported with `version: None`.
///
/// # Example
///
/// ```ignore
/// use std::path::PathBuf;
/// use wm_storage::{FsStorage, Storage};
///
/// let storage = FsStorage::new(PathBuf::from("wiki"));
/// let file = storage.file("Home.md", None)?;
/// ```
#[derive(Debug)]
pub struct FsStorage {
    /// Root directory of the wiki.
    root: PathBuf,
}

impl FsStorage {
    /// Create a new filesystem storage.
    #[must_use]
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory of the wiki.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Validate that a path stays inside the wiki root.
    ///
    /// Rejects parent directory components (`..`) and absolute paths
    /// (e.g., `../../../etc/passwd`).
    fn validate_path(path: &Path) -> Result<(), StorageError> {
        let escapes = path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));

        if escapes || path.as_os_str().is_empty() {
            return Err(StorageError::new(StorageErrorKind::InvalidPath)
                .with_path(path)
                .with_backend(BACKEND));
        }
        Ok(())
    }
}

impl Storage for FsStorage {
    fn file(&self, path: &str, version: Option<&str>) -> Result<WikiFile, StorageError> {
        let rel = Path::new(path);
        Self::validate_path(rel)?;

        if let Some(version) = version {
            tracing::debug!(path, version, "filesystem storage has no history, reading working tree");
        }

        let full = self.root.join(rel);
        let content = fs::read_to_string(&full)
            .map_err(|e| StorageError::io(e, Some(rel.to_path_buf())).with_backend(BACKEND))?;

        Ok(WikiFile {
            path: path.to_owned(),
            version: None,
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn storage_with(files: &[(&str, &str)]) -> (TempDir, FsStorage) {
        let tmp = TempDir::new().unwrap();
        for (path, content) in files {
            let full = tmp.path().join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(full, content).unwrap();
        }
        let storage = FsStorage::new(tmp.path().to_path_buf());
        (tmp, storage)
    }

    #[test]
    fn test_read_root_file() {
        let (_tmp, storage) = storage_with(&[("Home.md", "# Home")]);

        let file = storage.file("Home.md", None).unwrap();
        assert_eq!(
            file,
            WikiFile {
                path: "Home.md".to_owned(),
                version: None,
                content: "# Home".to_owned(),
            }
        );
    }

    #[test]
    fn test_read_nested_file() {
        let (_tmp, storage) = storage_with(&[("docs/setup.md", "Setup")]);

        let file = storage.file("docs/setup.md", None).unwrap();
        assert_eq!(file.content, "Setup");
        assert_eq!(file.name(), "setup.md");
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let (_tmp, storage) = storage_with(&[]);

        let err = storage.file("missing.md", None).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.backend, Some("Fs"));
        assert!(!storage.exists("missing.md", None));
    }

    #[test]
    fn test_version_reads_working_tree() {
        let (_tmp, storage) = storage_with(&[("Home.md", "current")]);

        let file = storage.file("Home.md", Some("abc123")).unwrap();
        assert_eq!(file.content, "current");
        assert_eq!(file.version, None);
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let (_tmp, storage) = storage_with(&[]);

        let err = storage.file("../etc/passwd", None).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_rejects_nested_traversal() {
        let (_tmp, storage) = storage_with(&[]);

        let err = storage.file("docs/../../secret", None).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_rejects_absolute_path() {
        let (_tmp, storage) = storage_with(&[]);

        let err = storage.file("/etc/passwd", None).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }

    #[test]
    fn test_rejects_empty_path() {
        let (_tmp, storage) = storage_with(&[]);

        let err = storage.file("", None).unwrap_err();
        assert_eq!(err.kind(), StorageErrorKind::InvalidPath);
    }
}
