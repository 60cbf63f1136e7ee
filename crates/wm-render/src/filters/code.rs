//! Fenced code block filter.
//!
//! Pulls fenced code blocks out before any other filter can touch their
//! content, and puts highlighted HTML back at the very end of the reverse
//! pass. Highlighting is memoized through the cache hook under the kind
//! [`CODE_KIND`], keyed by the digest of the block's language and code.
//!
//! Only the block's content is swapped for a token; its fences stay in the
//! source, so the block keeps its place inside lists and block quotes.

use std::sync::Arc;

use wm_cache::digest;

use super::scan::{FencedBlock, fenced_blocks};
use crate::context::RenderContext;
use crate::error::FilterError;
use crate::filter::{Filter, FilterFactory, factory};
use crate::highlight::{Highlighter, PlainHighlighter};
use crate::placeholder::Stash;

/// Cache kind for highlighted code blocks.
pub const CODE_KIND: &str = "code";

/// A code block taken out of the document.
#[derive(Debug)]
struct CodeBlock {
    language: Option<String>,
    code: String,
    /// Highlighted HTML found in the cache during extraction.
    cached: Option<String>,
}

/// Extracts fenced code blocks and restores them highlighted.
pub struct CodeFilter {
    highlighter: Arc<dyn Highlighter>,
    stash: Stash<CodeBlock>,
}

impl CodeFilter {
    /// Code filter with the plain (escaping only) highlighter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self::with_highlighter(Arc::new(PlainHighlighter))
    }

    /// Code filter with a custom highlighter.
    #[must_use]
    pub fn with_highlighter(highlighter: Arc<dyn Highlighter>) -> Self {
        Self {
            highlighter,
            // The converter renders the emptied block around the token
            stash: Stash::wrapped(CODE_KIND, "<pre><code>", "\n</code></pre>"),
        }
    }

    /// Factory for code filters sharing `highlighter`.
    #[must_use]
    pub fn factory(highlighter: Arc<dyn Highlighter>) -> FilterFactory {
        factory(move |_ctx| Self::with_highlighter(Arc::clone(&highlighter)))
    }

    fn stash_block(&mut self, block: FencedBlock, ctx: &RenderContext) -> String {
        let language = block.language.as_deref().unwrap_or_default();
        let id = digest(&format!("{language}.{}", block.code));
        let cached = ctx.cache().check_cache(CODE_KIND, &id);
        if cached.is_some() {
            tracing::trace!(digest = %id, "code block cache hit");
        }
        self.stash.insert_with_id(
            &id,
            CodeBlock {
                language: block.language,
                code: block.code,
                cached,
            },
        )
    }
}

impl Filter for CodeFilter {
    fn name(&self) -> &str {
        "code"
    }

    fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let blocks = fenced_blocks(&text);
        if blocks.is_empty() {
            return Ok(text);
        }

        let mut output = String::with_capacity(text.len());
        let mut last = 0;
        for block in blocks {
            let range = block.range.clone();
            let raw = &text[range.clone()];
            output.push_str(&text[last..range.start]);

            let token = self.stash_block(block, ctx);
            output.push_str(&emptied_block(&text[..range.start], raw, &token));
            last = range.end;
        }
        output.push_str(&text[last..]);

        Ok(output)
    }

    fn process(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let cache = ctx.cache();
        self.stash.restore(text, |id, block| {
            if let Some(html) = block.cached {
                return Ok(html);
            }
            let html = self
                .highlighter
                .highlight(block.language.as_deref(), &block.code)?;
            if let Err(e) = cache.update_cache(CODE_KIND, id, &html) {
                tracing::warn!(digest = id, "discarding code cache write: {e}");
            }
            Ok(html)
        })
    }
}

/// The fenced block `raw` with its content replaced by `token`.
///
/// `before` is the source up to the block. Continuation lines repeat the
/// container prefix of the opening line, with list markers turned into
/// spaces, so the block stays inside the same container. The info string is
/// dropped so the converter emits a bare `<pre><code>`.
fn emptied_block(before: &str, raw: &str, token: &str) -> String {
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let indent = raw.len() - raw.trim_start_matches(' ').len();
    let prefix: String = before[line_start..]
        .chars()
        .chain(raw[..indent].chars())
        .map(|c| if c == '>' || c == '\t' { c } else { ' ' })
        .collect();

    let body = &raw[indent..];
    let fence_char = if body.starts_with('~') { '~' } else { '`' };
    let fence_len = body.chars().take_while(|&c| c == fence_char).count().max(3);
    let fence = fence_char.to_string().repeat(fence_len);

    let mut block = format!("{}{fence}\n{prefix}{token}\n{prefix}{fence}", &raw[..indent]);
    if raw.ends_with('\n') {
        block.push('\n');
    }
    block
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use pretty_assertions::assert_eq;
    use wm_cache::{CacheError, CacheHook, MemoryCache};
    use wm_storage::MockStorage;

    use super::*;
    use crate::chain::FilterChain;
    use crate::convert::{Converter, MarkdownConverter};
    use crate::filters::MarkupFilter;
    use crate::resolver::FileResolver;

    /// Counts highlight calls.
    #[derive(Default)]
    struct CountingHighlighter {
        calls: AtomicUsize,
    }

    impl Highlighter for CountingHighlighter {
        fn highlight(&self, language: Option<&str>, code: &str) -> Result<String, FilterError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            PlainHighlighter.highlight(language, code)
        }
    }

    /// Memory cache that records every hook call.
    #[derive(Default)]
    struct SpyCache {
        inner: MemoryCache,
        checks: Mutex<Vec<(String, String)>>,
        updates: Mutex<Vec<(String, String)>>,
    }

    impl CacheHook for SpyCache {
        fn check_cache(&self, kind: &str, digest: &str) -> Option<String> {
            self.checks
                .lock()
                .unwrap()
                .push((kind.to_owned(), digest.to_owned()));
            self.inner.check_cache(kind, digest)
        }

        fn update_cache(&self, kind: &str, digest: &str, value: &str) -> Result<(), CacheError> {
            self.updates
                .lock()
                .unwrap()
                .push((kind.to_owned(), digest.to_owned()));
            self.inner.update_cache(kind, digest, value)
        }
    }

    /// Cache whose writes always fail.
    struct ReadOnlyCache;

    impl CacheHook for ReadOnlyCache {
        fn check_cache(&self, _kind: &str, _digest: &str) -> Option<String> {
            None
        }

        fn update_cache(&self, _kind: &str, _digest: &str, _value: &str) -> Result<(), CacheError> {
            Err(std::io::Error::other("read-only").into())
        }
    }

    fn render(source: &str, cache: Arc<dyn CacheHook>, highlighter: Arc<dyn Highlighter>) -> String {
        let files = FileResolver::new(Arc::new(MockStorage::new()), ".", None);
        let mut ctx = RenderContext::new(source, files).with_cache(cache);
        let factories = [
            CodeFilter::factory(highlighter),
            crate::filter::factory(MarkupFilter::new),
        ];
        FilterChain::build(&factories, &ctx).render(&mut ctx).unwrap()
    }

    const PAGE: &str = "Intro\n\n```rust\nfn main() { 1 < 2; }\n```\n\nOutro\n";

    #[test]
    fn test_code_block_is_highlighted_outside_paragraphs() {
        let html = render(PAGE, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(
            html,
            "<p>Intro</p>\n<pre><code class=\"language-rust\">fn main() { 1 &lt; 2; }\n</code></pre>\n<p>Outro</p>"
        );
    }

    #[test]
    fn test_code_content_is_shielded_from_markup() {
        let source = "```\n**not bold**\n```\n";
        let html = render(source, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(html, "<pre><code>**not bold**\n</code></pre>");
    }

    #[test]
    fn test_second_render_hits_cache() {
        let cache = Arc::new(SpyCache::default());
        let highlighter = Arc::new(CountingHighlighter::default());

        let first = render(
            PAGE,
            Arc::clone(&cache) as Arc<dyn CacheHook>,
            Arc::clone(&highlighter) as Arc<dyn Highlighter>,
        );
        let second = render(
            PAGE,
            Arc::clone(&cache) as Arc<dyn CacheHook>,
            Arc::clone(&highlighter) as Arc<dyn Highlighter>,
        );

        assert_eq!(first, second);
        assert_eq!(highlighter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.checks.lock().unwrap().len(), 2);
        assert_eq!(cache.updates.lock().unwrap().len(), 1);

        let (kind, id) = cache.updates.lock().unwrap()[0].clone();
        assert_eq!(kind, CODE_KIND);
        assert_eq!(id, digest("rust.fn main() { 1 < 2; }\n"));
    }

    #[test]
    fn test_identical_blocks_highlight_once() {
        let source = "```\nx\n```\n\ntext\n\n```\nx\n```\n";
        let highlighter = Arc::new(CountingHighlighter::default());

        let html = render(
            source,
            Arc::new(MemoryCache::new()),
            Arc::clone(&highlighter) as Arc<dyn Highlighter>,
        );

        assert_eq!(highlighter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(html.matches("<pre><code>x\n</code></pre>").count(), 2);
    }

    #[test]
    fn test_failed_cache_write_does_not_fail_render() {
        let html = render(PAGE, Arc::new(ReadOnlyCache), Arc::new(PlainHighlighter));
        assert!(html.contains("language-rust"));
    }

    #[test]
    fn test_tilde_fence_and_longer_closer() {
        let source = "~~~python\nprint(1)\n~~~~\n";
        let html = render(source, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(
            html,
            "<pre><code class=\"language-python\">print(1)\n</code></pre>"
        );
    }

    #[test]
    fn test_unclosed_fence_runs_to_end_of_document() {
        let source = "a\n```\nstill open\n";
        let html = render(source, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(html, "<p>a</p>\n<pre><code>still open\n</code></pre>");
    }

    #[test]
    fn test_fence_in_list_item_stays_in_item() {
        let source = "- item\n\n  ```\n  code\n  ```\n- next\n";
        let html = render(source, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(html, MarkdownConverter::default().convert(source).unwrap());
        assert!(html.contains("<pre><code>code\n</code></pre>\n</li>"));
    }

    #[test]
    fn test_fence_in_block_quote() {
        let source = "> quoted\n>\n> ```sh\n> ls -l\n> ```\n";
        let html = render(source, Arc::new(MemoryCache::new()), Arc::new(PlainHighlighter));
        assert_eq!(html, MarkdownConverter::default().convert(source).unwrap());
    }

    #[test]
    fn test_fence_inside_indented_code_is_literal() {
        let source = "Para\n\n    ```\n    **x**\n    ```\n";
        let highlighter = Arc::new(CountingHighlighter::default());

        let html = render(
            source,
            Arc::new(MemoryCache::new()),
            Arc::clone(&highlighter) as Arc<dyn Highlighter>,
        );

        assert_eq!(html, "<p>Para</p>\n<pre><code>```\n**x**\n```\n</code></pre>");
        assert_eq!(highlighter.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_emptied_block_keeps_container_prefix() {
        assert_eq!(
            emptied_block("", "```rust\nfn f() {}\n```\n", "T"),
            "```\nT\n```\n"
        );
        assert_eq!(
            emptied_block("text\n- ", "~~~~\n  x\n  ~~~~", "T"),
            "~~~~\n  T\n  ~~~~"
        );
        assert_eq!(
            emptied_block("> ", "```\n> x\n> ```\n", "T"),
            "```\n> T\n> ```\n"
        );
    }
}
