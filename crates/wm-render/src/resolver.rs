//! File lookup relative to the page being rendered.

use std::fmt;
use std::sync::Arc;

use wm_storage::{Storage, StorageError, WikiFile};

/// Resolves file references from inside a page.
///
/// Bound to the directory and version of the rendering page, so relative
/// references and version-less lookups see the same snapshot as the page.
#[derive(Clone)]
pub struct FileResolver {
    storage: Arc<dyn Storage>,
    dir: String,
    version: Option<String>,
}

impl fmt::Debug for FileResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileResolver")
            .field("dir", &self.dir)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

impl FileResolver {
    /// Create a resolver for a page living in `dir` (`"."` for the root).
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>, dir: impl Into<String>, version: Option<String>) -> Self {
        let dir = dir.into();
        let dir = if dir.is_empty() { ".".to_owned() } else { dir };
        Self {
            storage,
            dir,
            version,
        }
    }

    /// Create a resolver for the page stored at `page_path`.
    ///
    /// ```
    /// # use std::sync::Arc;
    /// # use wm_render::FileResolver;
    /// # use wm_storage::FsStorage;
    /// let storage = Arc::new(FsStorage::new("wiki".into()));
    /// assert_eq!(FileResolver::for_page(storage.clone(), "Home.md", None).dir(), ".");
    /// assert_eq!(FileResolver::for_page(storage, "docs/setup.md", None).dir(), "docs");
    /// ```
    #[must_use]
    pub fn for_page(storage: Arc<dyn Storage>, page_path: &str, version: Option<String>) -> Self {
        let page_path = page_path.trim_start_matches('/');
        let dir = page_path.rsplit_once('/').map_or(".", |(dir, _)| dir);
        Self::new(storage, dir, version)
    }

    /// Resolver for the file stored at `path`, keeping storage and version.
    ///
    /// Used to resolve references made from inside an included file.
    #[must_use]
    pub fn for_file(&self, path: &str) -> Self {
        Self::for_page(Arc::clone(&self.storage), path, self.version.clone())
    }

    /// Directory of the page (`"."` at the wiki root).
    #[must_use]
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Version of the page.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    /// Wiki path a reference points to.
    ///
    /// A leading `/` makes the reference absolute within the wiki and the
    /// page directory is ignored. Otherwise the reference is joined onto the
    /// page directory, unless the page sits at the root.
    #[must_use]
    pub fn path_for(&self, name: &str) -> String {
        if let Some(absolute) = name.strip_prefix('/') {
            return absolute.to_owned();
        }
        if self.dir == "." {
            name.to_owned()
        } else {
            format!("{}/{name}", self.dir.trim_end_matches('/'))
        }
    }

    /// Find the file `name` refers to.
    ///
    /// `version` defaults to the page's own version.
    ///
    /// # Errors
    ///
    /// A missing file is `Ok(None)`; any other storage failure is returned
    /// for the calling filter to handle.
    pub fn resolve(
        &self,
        name: &str,
        version: Option<&str>,
    ) -> Result<Option<WikiFile>, StorageError> {
        let path = self.path_for(name);
        let version = version.or(self.version.as_deref());

        match self.storage.file(&path, version) {
            Ok(file) => Ok(Some(file)),
            Err(e) if e.is_not_found() => {
                tracing::debug!(%path, ?version, "file reference not found");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}
