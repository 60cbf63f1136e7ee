//! Page formats.
//!
//! A format ties a markup converter to the ordered list of filters that
//! render it, plus the file extensions it claims. Formats live in an
//! explicit [`FormatRegistry`] owned by the caller.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex::Regex;

use crate::convert::{Converter, MarkdownConverter};
use crate::filter::FilterFactory;
use crate::filters::{DEFAULT_FILTERS, builtin_filter};

/// Identifier of the built-in Markdown format.
pub const MARKDOWN: &str = "markdown";

/// A page format.
#[derive(Clone)]
pub struct FormatSpec {
    name: String,
    extensions: Vec<String>,
    /// Overrides exact extension matching when set.
    pattern: Option<Regex>,
    converter: Arc<dyn Converter>,
    filters: Vec<FilterFactory>,
}

impl fmt::Debug for FormatSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatSpec")
            .field("name", &self.name)
            .field("extensions", &self.extensions)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("filters", &self.filters.len())
            .finish_non_exhaustive()
    }
}

impl FormatSpec {
    /// Format named `name` claiming `extensions`, with the Markdown
    /// converter and no filters.
    #[must_use]
    pub fn new<S: AsRef<str>>(name: impl Into<String>, extensions: &[S]) -> Self {
        Self {
            name: name.into(),
            extensions: extensions
                .iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_owned())
                .collect(),
            pattern: None,
            converter: Arc::new(MarkdownConverter::default()),
            filters: Vec::new(),
        }
    }

    /// Match extensions against `pattern` instead of the extension list.
    #[must_use]
    pub fn with_pattern(mut self, pattern: Regex) -> Self {
        self.pattern = Some(pattern);
        self
    }

    /// Set the markup converter.
    #[must_use]
    pub fn with_converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = converter;
        self
    }

    /// Append a filter to the chain.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterFactory) -> Self {
        self.filters.push(filter);
        self
    }

    /// Replace the whole filter chain.
    #[must_use]
    pub fn with_filters(mut self, filters: Vec<FilterFactory>) -> Self {
        self.filters = filters;
        self
    }

    /// Human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Extensions the format was registered with.
    #[must_use]
    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    /// Whether the format claims `extension` (without the dot).
    #[must_use]
    pub fn matches(&self, extension: &str) -> bool {
        match &self.pattern {
            Some(pattern) => pattern.is_match(extension),
            None => self.extensions.iter().any(|ext| ext == extension),
        }
    }

    /// Markup converter.
    #[must_use]
    pub fn converter(&self) -> Arc<dyn Converter> {
        Arc::clone(&self.converter)
    }

    /// Filter factories in chain order.
    #[must_use]
    pub fn filters(&self) -> &[FilterFactory] {
        &self.filters
    }

    /// The built-in Markdown format.
    #[must_use]
    pub fn markdown() -> Self {
        let filters = DEFAULT_FILTERS.iter().filter_map(|name| builtin_filter(name)).collect();
        Self::new("Markdown", &["md", "markdown", "mdown"]).with_filters(filters)
    }
}

/// Formats by identifier.
#[derive(Debug, Clone, Default)]
pub struct FormatRegistry {
    formats: BTreeMap<String, FormatSpec>,
}

impl FormatRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the built-in Markdown format.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(MARKDOWN, FormatSpec::markdown());
        registry
    }

    /// Register `spec` under `id`, returning the format it replaces.
    pub fn register(&mut self, id: impl Into<String>, spec: FormatSpec) -> Option<FormatSpec> {
        self.formats.insert(id.into(), spec)
    }

    /// Format registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&FormatSpec> {
        self.formats.get(id)
    }

    /// Identifier of the format claiming the extension of `path`.
    ///
    /// Formats are tried in identifier order; the first match wins.
    #[must_use]
    pub fn detect(&self, path: &str) -> Option<&str> {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        let (_, extension) = file_name.rsplit_once('.')?;
        self.formats
            .iter()
            .find(|(_, spec)| spec.matches(extension))
            .map(|(id, _)| id.as_str())
    }

    /// Registered identifiers in order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.formats.keys().map(String::as_str)
    }

    /// Registered formats in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormatSpec)> {
        self.formats.iter().map(|(id, spec)| (id.as_str(), spec))
    }

    /// Number of formats.
    #[must_use]
    pub fn len(&self) -> usize {
        self.formats.len()
    }

    /// Whether no format is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }
}
