//! Per-render state shared by the filters of one chain.

use std::collections::BTreeMap;
use std::sync::Arc;

use wm_cache::{CacheHook, NullCache};

use crate::convert::{Converter, MarkdownConverter};
use crate::resolver::FileResolver;
use crate::sanitize::Sanitizer;

/// Default limit for nested includes.
pub const DEFAULT_INCLUDE_LEVELS: usize = 10;

/// Page metadata accumulated by filters (e.g. YAML front matter).
pub type Metadata = BTreeMap<String, serde_yaml::Value>;

/// Which sanitizer a render applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SanitizeMode {
    /// No sanitizer configured.
    #[default]
    None,
    /// Regular page view.
    Standard,
    /// History and diff views (links get `rel="nofollow"`).
    History,
}

/// Table of contents entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    /// Heading level (1-6).
    pub level: u8,
    /// Heading text.
    pub title: String,
    /// Anchor id.
    pub id: String,
}

/// Table of contents collected during a render.
pub type Toc = Vec<TocEntry>;

/// Caller-facing render options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Use the history sanitizer (adds `rel="nofollow"` to links).
    pub no_follow: bool,
    /// Target encoding for the output, if the caller needs one.
    pub encoding: Option<String>,
    /// Remaining levels of nested includes.
    pub include_levels: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            no_follow: false,
            encoding: None,
            include_levels: DEFAULT_INCLUDE_LEVELS,
        }
    }
}

impl RenderOptions {
    /// Set the no-follow flag.
    #[must_use]
    pub fn with_no_follow(mut self, no_follow: bool) -> Self {
        self.no_follow = no_follow;
        self
    }

    /// Set the target encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: impl Into<String>) -> Self {
        self.encoding = Some(encoding.into());
        self
    }

    /// Set the include depth limit.
    #[must_use]
    pub fn with_include_levels(mut self, levels: usize) -> Self {
        self.include_levels = levels;
        self
    }
}

/// State of a single render.
///
/// Created at the start of one render call and dropped at its end; never
/// shared between renders. Filters read configuration through accessors and
/// may only write the accumulators: [`toc`](Self::toc_mut) and
/// [`metadata`](Self::metadata_mut).
pub struct RenderContext {
    source: String,
    sanitize: SanitizeMode,
    sanitizer: Option<Arc<dyn Sanitizer>>,
    converter: Arc<dyn Converter>,
    encoding: Option<String>,
    include_levels: usize,
    files: FileResolver,
    cache: Arc<dyn CacheHook>,
    toc: Option<Toc>,
    metadata: Option<Metadata>,
}

impl RenderContext {
    /// Create a context for `source`, resolving files through `files`.
    ///
    /// Defaults: no sanitizer, Markdown converter, no-op cache, include
    /// depth [`DEFAULT_INCLUDE_LEVELS`].
    #[must_use]
    pub fn new(source: impl Into<String>, files: FileResolver) -> Self {
        Self {
            source: source.into(),
            sanitize: SanitizeMode::None,
            sanitizer: None,
            converter: Arc::new(MarkdownConverter::default()),
            encoding: None,
            include_levels: DEFAULT_INCLUDE_LEVELS,
            files,
            cache: Arc::new(NullCache),
            toc: None,
            metadata: None,
        }
    }

    /// Apply caller options (encoding and include depth).
    ///
    /// The sanitizer is chosen separately with
    /// [`with_sanitizer`](Self::with_sanitizer).
    #[must_use]
    pub fn with_options(mut self, options: &RenderOptions) -> Self {
        self.encoding.clone_from(&options.encoding);
        self.include_levels = options.include_levels;
        self
    }

    /// Select the sanitizer for this render.
    #[must_use]
    pub fn with_sanitizer(mut self, mode: SanitizeMode, sanitizer: Arc<dyn Sanitizer>) -> Self {
        if mode == SanitizeMode::None {
            self.sanitizer = None;
        } else {
            self.sanitizer = Some(sanitizer);
        }
        self.sanitize = mode;
        self
    }

    /// Set the markup converter for the page format.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Set the cache hook filters consult.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheHook>) -> Self {
        self.cache = cache;
        self
    }

    /// Original page source. Never modified by the chain.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Sanitizer mode selected for this render.
    #[must_use]
    pub fn sanitize_mode(&self) -> SanitizeMode {
        self.sanitize
    }

    /// Sanitizer to apply, if any.
    #[must_use]
    pub fn sanitizer(&self) -> Option<&dyn Sanitizer> {
        self.sanitizer.as_deref()
    }

    /// Markup converter for the page format.
    #[must_use]
    pub fn converter(&self) -> &dyn Converter {
        self.converter.as_ref()
    }

    /// Target output encoding requested by the caller.
    #[must_use]
    pub fn encoding(&self) -> Option<&str> {
        self.encoding.as_deref()
    }

    /// Remaining include depth; zero means "do not expand further".
    #[must_use]
    pub fn include_levels(&self) -> usize {
        self.include_levels
    }

    /// Directory of the page being rendered (`"."` at the wiki root).
    #[must_use]
    pub fn dir(&self) -> &str {
        self.files.dir()
    }

    /// Version the page is rendered at.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.files.version()
    }

    /// File resolver bound to the page's directory and version.
    #[must_use]
    pub fn files(&self) -> &FileResolver {
        &self.files
    }

    /// Cache hook for memoizing per-tag transformations.
    #[must_use]
    pub fn cache(&self) -> &dyn CacheHook {
        self.cache.as_ref()
    }

    /// Table of contents collected so far.
    #[must_use]
    pub fn toc(&self) -> Option<&Toc> {
        self.toc.as_ref()
    }

    /// Mutable table of contents, created empty on first access.
    pub fn toc_mut(&mut self) -> &mut Toc {
        self.toc.get_or_insert_with(Vec::new)
    }

    /// Metadata collected so far.
    #[must_use]
    pub fn metadata(&self) -> Option<&Metadata> {
        self.metadata.as_ref()
    }

    /// Mutable metadata, created empty on first access.
    pub fn metadata_mut(&mut self) -> &mut Metadata {
        self.metadata.get_or_insert_with(Metadata::new)
    }

    /// Consume the context, returning the accumulated TOC and metadata.
    #[must_use]
    pub fn into_accumulators(self) -> (Option<Toc>, Option<Metadata>) {
        (self.toc, self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use wm_storage::MockStorage;

    use super::*;
    use crate::sanitize::PassThroughSanitizer;

    fn context(source: &str) -> RenderContext {
        let files = FileResolver::new(Arc::new(MockStorage::new()), "docs", Some("v1".into()));
        RenderContext::new(source, files)
    }

    #[test]
    fn test_defaults() {
        let ctx = context("text");
        assert_eq!(ctx.source(), "text");
        assert_eq!(ctx.sanitize_mode(), SanitizeMode::None);
        assert!(ctx.sanitizer().is_none());
        assert_eq!(ctx.encoding(), None);
        assert_eq!(ctx.include_levels(), 10);
        assert_eq!(ctx.dir(), "docs");
        assert_eq!(ctx.version(), Some("v1"));
        assert!(ctx.toc().is_none());
        assert!(ctx.metadata().is_none());
    }

    #[test]
    fn test_with_options() {
        let options = RenderOptions::default()
            .with_encoding("ISO-8859-1")
            .with_include_levels(3);
        let ctx = context("").with_options(&options);

        assert_eq!(ctx.encoding(), Some("ISO-8859-1"));
        assert_eq!(ctx.include_levels(), 3);
    }

    #[test]
    fn test_sanitizer_selection() {
        let ctx = context("").with_sanitizer(SanitizeMode::History, Arc::new(PassThroughSanitizer));
        assert_eq!(ctx.sanitize_mode(), SanitizeMode::History);
        assert!(ctx.sanitizer().is_some());

        let ctx = context("").with_sanitizer(SanitizeMode::None, Arc::new(PassThroughSanitizer));
        assert!(ctx.sanitizer().is_none());
    }

    #[test]
    fn test_accumulators() {
        let mut ctx = context("");
        ctx.toc_mut().push(TocEntry {
            level: 1,
            title: "Intro".to_owned(),
            id: "intro".to_owned(),
        });
        ctx.metadata_mut()
            .insert("title".to_owned(), serde_yaml::Value::from("Home"));

        let (toc, metadata) = ctx.into_accumulators();
        assert_eq!(toc.unwrap().len(), 1);
        assert_eq!(
            metadata.unwrap().get("title"),
            Some(&serde_yaml::Value::from("Home"))
        );
    }
}
