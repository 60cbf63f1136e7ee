//! Bidirectional filter-chain renderer for wiki pages.
//!
//! A page is rendered by passing its source through an ordered chain of
//! [`Filter`]s twice:
//!
//! - **extract**, in declared order: each filter swaps the syntax it owns
//!   for [`Placeholder`] tokens so later filters cannot touch it;
//! - **process**, in exactly the reverse order: each filter puts its final
//!   content back in place of its tokens.
//!
//! A filter that extracts first therefore restores last, after every other
//! filter (including markup conversion and sanitization) has run.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use wm_render::{Page, RenderOptions, Wiki};
//! use wm_storage::FsStorage;
//!
//! let wiki = Wiki::new(Arc::new(FsStorage::new("wiki".into())));
//! let page = Page::new("Home.md", "markdown", "Hello **world**");
//!
//! let result = wiki.render(&page, &RenderOptions::default()).unwrap();
//! assert_eq!(result.html, "<p>Hello <strong>world</strong></p>");
//! ```

mod chain;
mod context;
mod convert;
mod error;
mod filter;
pub mod filters;
mod format;
mod highlight;
mod placeholder;
mod resolver;
mod sanitize;
mod wiki;

pub use chain::{FilterChain, strip_empty_paragraphs};
pub use context::{
    DEFAULT_INCLUDE_LEVELS, Metadata, RenderContext, RenderOptions, SanitizeMode, Toc, TocEntry,
};
pub use convert::{Converter, MarkdownConverter};
pub use error::{FilterError, Phase, RenderError};
pub use filter::{Filter, FilterFactory, factory};
pub use filters::{
    CodeFilter, IncludeFilter, MarkupFilter, MetadataFilter, SanitizeFilter, TocFilter,
    builtin_filter,
};
pub use format::{FormatRegistry, FormatSpec, MARKDOWN};
pub use highlight::{Highlighter, PlainHighlighter, escape_html};
pub use placeholder::{Placeholder, Stash};
pub use resolver::FileResolver;
pub use sanitize::{PassThroughSanitizer, Sanitizer, Sanitizers};
pub use wiki::{Page, RenderResult, Wiki};
