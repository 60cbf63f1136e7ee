//! Syntax highlighter seam.

use crate::error::FilterError;

/// Renders a code block to HTML.
pub trait Highlighter: Send + Sync {
    /// Render `code` written in `language` (if known) as an HTML block.
    ///
    /// # Errors
    ///
    /// Returns a [`FilterError`] if the highlighter fails.
    fn highlight(&self, language: Option<&str>, code: &str) -> Result<String, FilterError>;
}

/// [`Highlighter`] that escapes code into `<pre><code>` without colouring.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, language: Option<&str>, code: &str) -> Result<String, FilterError> {
        let class = language
            .map(|lang| format!(" class=\"language-{}\"", escape_html(lang)))
            .unwrap_or_default();
        Ok(format!("<pre><code{class}>{}</code></pre>", escape_html(code)))
    }
}

/// Escape HTML special characters.
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}
