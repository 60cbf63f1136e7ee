//! Markup-to-HTML converter seam.

use pulldown_cmark::{Options, Parser, html};

use crate::error::FilterError;

/// Converts a page's source markup into HTML.
///
/// Selected per document format and invoked by the `markup` filter.
pub trait Converter: Send + Sync {
    /// Convert `source` to an HTML fragment.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Convert`] when the input is rejected.
    fn convert(&self, source: &str) -> Result<String, FilterError>;
}

/// Markdown converter backed by `pulldown-cmark`.
///
/// GitHub Flavored Markdown (tables, strikethrough, task lists) is enabled
/// by default.
#[derive(Debug, Clone, Copy)]
pub struct MarkdownConverter {
    gfm: bool,
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self { gfm: true }
    }
}

impl MarkdownConverter {
    /// Enable or disable GitHub Flavored Markdown features.
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    pub(crate) fn options(self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl Converter for MarkdownConverter {
    fn convert(&self, source: &str) -> Result<String, FilterError> {
        let parser = Parser::new_ext(source, self.options());
        let mut output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut output, parser);
        // pulldown-cmark ends every block with a newline
        let trimmed = output.trim_end().len();
        output.truncate(trimmed);
        Ok(output)
    }
}
