//! Table of contents filter.
//!
//! Gives every heading of the converted page an anchor id, records the
//! headings in the render's table of contents and replaces `[[_TOC_]]`
//! tags with a linked list of them. Tags inside code are left alone.

use std::collections::HashMap;
use std::fmt::Write;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use scraper::Html;

use super::scan::{code_ranges, in_ranges};
use crate::context::{RenderContext, TocEntry};
use crate::error::FilterError;
use crate::filter::Filter;
use crate::highlight::escape_html;
use crate::placeholder::Stash;

/// Tag replaced with the rendered table of contents.
pub const TOC_TAG: &str = "[[_TOC_]]";

static HEADING_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<h([1-6])>(.*?)</h[1-6]>").unwrap());

/// Anchors headings and renders `[[_TOC_]]` tags.
///
/// Must be declared before the `markup` filter so that it processes the
/// converted HTML.
pub struct TocFilter {
    tags: Stash<()>,
}

impl TocFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self {
            tags: Stash::block("toc"),
        }
    }
}

impl Filter for TocFilter {
    fn name(&self) -> &str {
        "toc"
    }

    fn extract(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
        if !text.contains(TOC_TAG) {
            return Ok(text);
        }

        let code = code_ranges(&text);
        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for (start, tag) in text.match_indices(TOC_TAG) {
            if in_ranges(&code, start) {
                continue;
            }
            output.push_str(&text[last..start]);
            // Every tag renders the same list, so they share one id
            output.push_str(&self.tags.insert_with_id("0", ()));
            last = start + tag.len();
        }
        output.push_str(&text[last..]);

        Ok(output)
    }

    fn process(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let mut slugs = Slugs::default();
        let mut entries = Vec::new();

        let html = HEADING_PATTERN
            .replace_all(&text, |caps: &Captures| {
                let level = &caps[1];
                let inner = &caps[2];
                let title = heading_text(inner);
                let id = slugs.unique(&title);
                let html = format!("<h{level} id=\"{id}\">{inner}</h{level}>");
                entries.push(TocEntry {
                    level: level.parse().unwrap_or(1),
                    title,
                    id,
                });
                html
            })
            .into_owned();

        let list = render_list(&entries);
        if !entries.is_empty() {
            tracing::trace!(headings = entries.len(), "collected table of contents");
            ctx.toc_mut().extend(entries);
        }

        self.tags
            .restore(html, |_, ()| Ok::<_, FilterError>(list.clone()))
    }
}

/// Plain text of a heading's inner HTML, entities decoded.
fn heading_text(inner: &str) -> String {
    let fragment = Html::parse_fragment(inner);
    fragment.root_element().text().collect::<String>().trim().to_owned()
}

fn render_list(entries: &[TocEntry]) -> String {
    if entries.is_empty() {
        return String::new();
    }

    let mut html = String::from("<div class=\"toc\"><ul>");
    for entry in entries {
        write!(
            html,
            "<li class=\"toc-h{}\"><a href=\"#{}\">{}</a></li>",
            entry.level,
            entry.id,
            escape_html(&entry.title)
        )
        .unwrap();
    }
    html.push_str("</ul></div>");
    html
}

/// Hands out unique anchor ids.
#[derive(Default)]
struct Slugs {
    seen: HashMap<String, usize>,
}

impl Slugs {
    fn unique(&mut self, title: &str) -> String {
        let mut slug = slugify(title);
        if slug.is_empty() {
            slug.push_str("section");
        }

        let count = self.seen.entry(slug.clone()).or_insert(0);
        let id = if *count == 0 {
            slug
        } else {
            format!("{slug}-{count}")
        };
        *count += 1;
        id
    }
}

/// Convert text to a URL-safe slug.
///
/// Lowercases ASCII alphanumerics, collapses whitespace, dashes and
/// underscores into single dashes, and drops everything else.
fn slugify(text: &str) -> String {
    let mut result = String::new();
    let mut last_was_dash = true;

    for c in text.trim().chars() {
        if c.is_ascii_alphanumeric() {
            result.push(c.to_ascii_lowercase());
            last_was_dash = false;
        } else if !last_was_dash && (c.is_whitespace() || c == '-' || c == '_') {
            result.push('-');
            last_was_dash = true;
        }
    }

    if result.ends_with('-') {
        result.pop();
    }
    result
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pretty_assertions::assert_eq;
    use wm_storage::MockStorage;

    use super::*;
    use crate::chain::FilterChain;
    use crate::filter::factory;
    use crate::filters::MarkupFilter;
    use crate::resolver::FileResolver;

    fn render(source: &str) -> (String, RenderContext) {
        let files = FileResolver::new(Arc::new(MockStorage::new()), ".", None);
        let mut ctx = RenderContext::new(source, files);
        let chain = FilterChain::build(&[factory(TocFilter::new), factory(MarkupFilter::new)], &ctx);
        let html = chain.render(&mut ctx).unwrap();
        (html, ctx)
    }

    #[test]
    fn test_headings_get_ids_and_toc_entries() {
        let (html, ctx) = render("# Install\n\n## On *Linux*\n\ntext");

        assert_eq!(
            html,
            "<h1 id=\"install\">Install</h1>\n<h2 id=\"on-linux\">On <em>Linux</em></h2>\n<p>text</p>"
        );
        assert_eq!(
            ctx.toc().unwrap(),
            &vec![
                TocEntry {
                    level: 1,
                    title: "Install".to_owned(),
                    id: "install".to_owned(),
                },
                TocEntry {
                    level: 2,
                    title: "On Linux".to_owned(),
                    id: "on-linux".to_owned(),
                },
            ]
        );
    }

    #[test]
    fn test_toc_tag_renders_list() {
        let (html, _) = render("[[_TOC_]]\n\n# A & B\n");

        assert_eq!(
            html,
            "<div class=\"toc\"><ul><li class=\"toc-h1\"><a href=\"#a-b\">A &amp; B</a></li></ul></div>\n<h1 id=\"a-b\">A &amp; B</h1>"
        );
    }

    #[test]
    fn test_duplicate_headings_get_suffixes() {
        let (html, _) = render("## Notes\n\n## Notes\n\n## Notes\n");

        assert_eq!(
            html,
            "<h2 id=\"notes\">Notes</h2>\n<h2 id=\"notes-1\">Notes</h2>\n<h2 id=\"notes-2\">Notes</h2>"
        );
    }

    #[test]
    fn test_no_headings_leaves_toc_unset() {
        let (html, ctx) = render("[[_TOC_]]\n\nplain");

        assert_eq!(html, "\n<p>plain</p>");
        assert!(ctx.toc().is_none());
    }

    #[test]
    fn test_tag_in_code_span_is_literal() {
        let (html, ctx) = render("Use `[[_TOC_]]` to add a toc.\n\n# H\n");

        assert_eq!(
            html,
            "<p>Use <code>[[_TOC_]]</code> to add a toc.</p>\n<h1 id=\"h\">H</h1>"
        );
        assert_eq!(ctx.toc().map(Vec::len), Some(1));
    }

    #[test]
    fn test_tag_in_code_block_is_literal() {
        let (html, _) = render("    [[_TOC_]]\n\n[[_TOC_]]\n\n# H\n");

        assert_eq!(
            html,
            "<pre><code>[[_TOC_]]\n</code></pre>\n\
             <div class=\"toc\"><ul><li class=\"toc-h1\"><a href=\"#h\">H</a></li></ul></div>\n\
             <h1 id=\"h\">H</h1>"
        );
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello World"), "hello-world");
        assert_eq!(slugify("What's New?"), "whats-new");
        assert_eq!(slugify("  snake_case  "), "snake-case");
        assert_eq!(slugify("???"), "");
    }

    #[test]
    fn test_symbol_only_heading_gets_fallback_id() {
        let mut slugs = Slugs::default();
        assert_eq!(slugs.unique("???"), "section");
        assert_eq!(slugs.unique("!!!"), "section-1");
    }
}
