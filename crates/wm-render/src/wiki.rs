//! Render entry point.

use std::fmt;
use std::sync::Arc;

use scraper::Html;
use wm_cache::{CacheHook, NullCache};
use wm_storage::{Storage, WikiFile};

use crate::chain::FilterChain;
use crate::context::{Metadata, RenderContext, RenderOptions, Toc};
use crate::error::RenderError;
use crate::format::FormatRegistry;
use crate::resolver::FileResolver;
use crate::sanitize::Sanitizers;

/// A page to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Wiki path of the page (e.g. `docs/setup.md`).
    pub path: String,
    /// Format identifier in the wiki's [`FormatRegistry`].
    pub format: String,
    /// Page source.
    pub text: String,
    /// Version the page was read at.
    pub version: Option<String>,
}

impl Page {
    /// Page at `path` in `format`.
    #[must_use]
    pub fn new(path: impl Into<String>, format: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            format: format.into(),
            text: text.into(),
            version: None,
        }
    }

    /// Page read from storage.
    #[must_use]
    pub fn from_file(file: WikiFile, format: impl Into<String>) -> Self {
        Self {
            path: file.path,
            format: format.into(),
            text: file.content,
            version: file.version,
        }
    }

    /// Set the version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Output of a render.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderResult {
    /// Rendered HTML.
    pub html: String,
    /// Table of contents, if a filter collected one.
    pub toc: Option<Toc>,
    /// Page metadata, if a filter collected any.
    pub metadata: Option<Metadata>,
    /// Encoding the caller asked the HTML to be delivered in.
    pub encoding: Option<String>,
}

/// A wiki: storage, formats, cache and sanitizers shared by every render.
///
/// `render` takes `&self` and builds fresh per-render state, so one `Wiki`
/// can serve concurrent renders from many threads.
#[derive(Clone)]
pub struct Wiki {
    storage: Arc<dyn Storage>,
    cache: Arc<dyn CacheHook>,
    formats: FormatRegistry,
    sanitizers: Sanitizers,
}

impl fmt::Debug for Wiki {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wiki")
            .field("formats", &self.formats.ids().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl Wiki {
    /// Wiki over `storage` with the default formats, no cache and no
    /// sanitizers.
    #[must_use]
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            storage,
            cache: Arc::new(NullCache),
            formats: FormatRegistry::with_defaults(),
            sanitizers: Sanitizers::none(),
        }
    }

    /// Set the cache hook.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheHook>) -> Self {
        self.cache = cache;
        self
    }

    /// Replace the format registry.
    #[must_use]
    pub fn with_formats(mut self, formats: FormatRegistry) -> Self {
        self.formats = formats;
        self
    }

    /// Set the sanitizers.
    #[must_use]
    pub fn with_sanitizers(mut self, sanitizers: Sanitizers) -> Self {
        self.sanitizers = sanitizers;
        self
    }

    /// Backing storage.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    /// Registered formats.
    #[must_use]
    pub fn formats(&self) -> &FormatRegistry {
        &self.formats
    }

    /// Render `page`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::UnknownFormat`] if the page format is not
    /// registered and [`RenderError::Filter`] if a filter fails.
    pub fn render(&self, page: &Page, options: &RenderOptions) -> Result<RenderResult, RenderError> {
        self.run(page, options, None)
    }

    /// Render `page`, showing the intermediate document to `callback`.
    ///
    /// See [`FilterChain::render_with`].
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn render_with(
        &self,
        page: &Page,
        options: &RenderOptions,
        callback: &mut dyn FnMut(&Html),
    ) -> Result<RenderResult, RenderError> {
        self.run(page, options, Some(callback))
    }

    fn run(
        &self,
        page: &Page,
        options: &RenderOptions,
        callback: Option<&mut dyn FnMut(&Html)>,
    ) -> Result<RenderResult, RenderError> {
        let format = self
            .formats
            .get(&page.format)
            .ok_or_else(|| RenderError::UnknownFormat(page.format.clone()))?;

        let files = FileResolver::for_page(Arc::clone(&self.storage), &page.path, page.version.clone());
        let mut ctx = RenderContext::new(page.text.as_str(), files)
            .with_options(options)
            .with_converter(format.converter())
            .with_cache(Arc::clone(&self.cache));
        if let Some((mode, sanitizer)) = self.sanitizers.select(options.no_follow) {
            ctx = ctx.with_sanitizer(mode, sanitizer);
        }

        let chain = FilterChain::build(format.filters(), &ctx);
        tracing::debug!(
            page = %page.path,
            format = %page.format,
            filters = chain.len(),
            "rendering page"
        );

        let html = match callback {
            Some(callback) => chain.render_with(&mut ctx, callback)?,
            None => chain.render(&mut ctx)?,
        };
        let encoding = ctx.encoding().map(ToOwned::to_owned);
        let (toc, metadata) = ctx.into_accumulators();

        Ok(RenderResult {
            html,
            toc,
            metadata,
            encoding,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::thread;

    use pretty_assertions::assert_eq;
    use serde_yaml::Value;
    use wm_cache::MemoryCache;
    use wm_storage::MockStorage;

    use super::*;
    use crate::context::{SanitizeMode, TocEntry};
    use crate::error::FilterError;
    use crate::filter::{Filter, factory};
    use crate::filters::MarkupFilter;
    use crate::format::{FormatSpec, MARKDOWN};
    use crate::sanitize::Sanitizer;

    fn wiki() -> Wiki {
        Wiki::new(Arc::new(MockStorage::new()))
    }

    /// Wraps the HTML in a marker naming the sanitizer.
    struct Marking(&'static str);

    impl Sanitizer for Marking {
        fn sanitize(&self, html: &str) -> String {
            format!("[{}]{html}", self.0)
        }
    }

    /// Records the context it sees in extract.
    struct Recorder {
        seen: Arc<Mutex<Vec<String>>>,
    }

    impl Filter for Recorder {
        fn name(&self) -> &str {
            "recorder"
        }

        fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
            self.seen.lock().unwrap().push(format!(
                "dir={} version={:?} levels={} sanitize={:?}",
                ctx.dir(),
                ctx.version(),
                ctx.include_levels(),
                ctx.sanitize_mode()
            ));
            Ok(text)
        }

        fn process(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
            Ok(text)
        }
    }

    #[test]
    fn test_hello_world() {
        let page = Page::new("Home.md", MARKDOWN, "Hello **world**");
        let result = wiki().render(&page, &RenderOptions::default()).unwrap();

        assert_eq!(result.html, "<p>Hello <strong>world</strong></p>");
        assert_eq!(result.toc, None);
        assert_eq!(result.metadata, None);
        assert_eq!(result.encoding, None);
    }

    #[test]
    fn test_requested_encoding_is_reported() {
        let page = Page::new("Home.md", MARKDOWN, "Café");
        let options = RenderOptions::default().with_encoding("ISO-8859-1");

        let result = wiki().render(&page, &options).unwrap();
        assert_eq!(result.html, "<p>Café</p>");
        assert_eq!(result.encoding.as_deref(), Some("ISO-8859-1"));
    }

    #[test]
    fn test_full_markdown_chain() {
        let source = "---\ntitle: Setup\n---\n# Setup\n\n```sh\ncargo run <args>\n```\n";
        let page = Page::new("docs/setup.md", MARKDOWN, source);

        let result = wiki().render(&page, &RenderOptions::default()).unwrap();

        assert_eq!(
            result.html,
            "<h1 id=\"setup\">Setup</h1>\n<pre><code class=\"language-sh\">cargo run &lt;args&gt;\n</code></pre>"
        );
        assert_eq!(
            result.toc,
            Some(vec![TocEntry {
                level: 1,
                title: "Setup".to_owned(),
                id: "setup".to_owned(),
            }])
        );
        assert_eq!(
            result.metadata.unwrap().get("title"),
            Some(&Value::from("Setup"))
        );
    }

    #[test]
    fn test_included_headings_join_toc() {
        let storage = Arc::new(MockStorage::new().with_file("docs/part.md", "## Part\n\ntext"));
        let page = Page::new(
            "docs/setup.md",
            MARKDOWN,
            "[[_TOC_]]\n\n# Setup\n\n[[include:part.md]]\n",
        );

        let result = Wiki::new(storage)
            .render(&page, &RenderOptions::default())
            .unwrap();

        assert_eq!(
            result.html,
            "<div class=\"toc\"><ul><li class=\"toc-h1\"><a href=\"#setup\">Setup</a></li>\
             <li class=\"toc-h2\"><a href=\"#part\">Part</a></li></ul></div>\n\
             <h1 id=\"setup\">Setup</h1>\n<h2 id=\"part\">Part</h2>\n<p>text</p>"
        );
        assert_eq!(result.toc.map(|toc| toc.len()), Some(2));
    }

    #[test]
    fn test_unknown_format() {
        let page = Page::new("Home.rst", "rst", "text");
        let err = wiki().render(&page, &RenderOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::UnknownFormat(id) if id == "rst"));
    }

    #[test]
    fn test_context_is_built_from_page_and_options() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let recorder_seen = Arc::clone(&seen);
        let spec = FormatSpec::new("Recorder", &["rec"])
            .with_filter(Arc::new(move |_ctx: &RenderContext| {
                Box::new(Recorder {
                    seen: Arc::clone(&recorder_seen),
                }) as Box<dyn Filter>
            }));
        let mut formats = FormatRegistry::new();
        formats.register("recorder", spec);
        let wiki = wiki().with_formats(formats);

        let page = Page::new("docs/a/page.rec", "recorder", "x").with_version("v2");
        let options = RenderOptions::default().with_include_levels(3);
        wiki.render(&page, &options).unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec!["dir=docs/a version=Some(\"v2\") levels=3 sanitize=None"]
        );
    }

    #[test]
    fn test_no_follow_selects_history_sanitizer() {
        let wiki = wiki().with_sanitizers(Sanitizers::new(
            Arc::new(Marking("standard")),
            Arc::new(Marking("history")),
        ));
        let page = Page::new("Home.md", MARKDOWN, "text");

        let standard = wiki.render(&page, &RenderOptions::default()).unwrap();
        let history = wiki
            .render(&page, &RenderOptions::default().with_no_follow(true))
            .unwrap();

        assert_eq!(standard.html, "[standard]<p>text</p>");
        assert_eq!(history.html, "[history]<p>text</p>");
    }

    #[test]
    fn test_code_is_reinserted_after_sanitizing() {
        let wiki = wiki().with_sanitizers(Sanitizers::new(
            Arc::new(Marking("s")),
            Arc::new(Marking("h")),
        ));
        let page = Page::new("Home.md", MARKDOWN, "```\n<b>\n```\n");

        let result = wiki.render(&page, &RenderOptions::default()).unwrap();
        assert_eq!(result.html, "[s]<pre><code>&lt;b&gt;\n</code></pre>");
    }

    #[test]
    fn test_render_with_callback() {
        let formats = {
            let mut formats = FormatRegistry::new();
            formats.register(
                MARKDOWN,
                FormatSpec::new("Markdown", &["md"]).with_filter(factory(MarkupFilter::new)),
            );
            formats
        };
        let page = Page::new("Home.md", MARKDOWN, "# Title");

        let mut headings = Vec::new();
        let result = wiki()
            .with_formats(formats)
            .render_with(&page, &RenderOptions::default(), &mut |doc: &Html| {
                let selector = scraper::Selector::parse("h1").unwrap();
                headings.extend(doc.select(&selector).map(|h| h.text().collect::<String>()));
            })
            .unwrap();

        assert_eq!(headings, vec!["Title".to_owned()]);
        assert_eq!(result.html, "<h1>Title</h1>");
    }

    #[test]
    fn test_page_from_file() {
        let file = WikiFile {
            path: "docs/a.md".to_owned(),
            version: Some("abc".to_owned()),
            content: "body".to_owned(),
        };
        let page = Page::from_file(file, MARKDOWN);
        assert_eq!(
            page,
            Page::new("docs/a.md", MARKDOWN, "body").with_version("abc")
        );
    }

    #[test]
    fn test_concurrent_renders_share_cache() {
        let cache = Arc::new(MemoryCache::new());
        let wiki = Arc::new(wiki().with_cache(Arc::clone(&cache) as Arc<dyn CacheHook>));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let wiki = Arc::clone(&wiki);
                thread::spawn(move || {
                    let source = format!("Page {i}\n\n```\nshared\n```\n");
                    let page = Page::new(format!("p{i}.md"), MARKDOWN, source);
                    wiki.render(&page, &RenderOptions::default()).unwrap().html
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(
                handle.join().unwrap(),
                format!("<p>Page {i}</p>\n<pre><code>shared\n</code></pre>")
            );
        }
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_wiki_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Wiki>();
        assert_send_sync::<SanitizeMode>();
    }
}
