//! Chain orchestrator.
//!
//! Drives the two passes of a render:
//!
//! ```text
//! source ──► F1.extract ──► F2.extract ──► … ──► Fn.extract ──┐
//!                                                            │ (callback)
//! result ◄── cleanup ◄── F1.process ◄── … ◄── Fn.process ◄───┘
//! ```
//!
//! The reverse pass mirrors the forward pass exactly, so a filter extracted
//! early (e.g. code blocks) shields its content from every later filter and
//! reinserts it after all of them have processed.

use scraper::Html;

use crate::context::RenderContext;
use crate::error::{Phase, RenderError};
use crate::filter::{Filter, FilterFactory};

/// Artifact left behind when a filter empties a paragraph.
const EMPTY_PARAGRAPH: &str = "<p></p>";

/// The filters of one render, in declared order.
///
/// Consumed by [`render`](Self::render): filters keep per-render state
/// between passes and are never reused.
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
}

impl FilterChain {
    /// Chain over already constructed filters.
    #[must_use]
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Self { filters }
    }

    /// Instantiate `factories` against `ctx`.
    #[must_use]
    pub fn build(factories: &[FilterFactory], ctx: &RenderContext) -> Self {
        Self::new(factories.iter().map(|factory| factory(ctx)).collect())
    }

    /// Number of filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.filters.len()
    }

    /// Whether the chain has no filters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Filter names in declared order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.filters.iter().map(|f| f.name())
    }

    /// Render the context's source through the chain.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::Filter`] for the first filter that fails; no
    /// filter runs after it in either pass.
    pub fn render(self, ctx: &mut RenderContext) -> Result<String, RenderError> {
        self.run(ctx, None)
    }

    /// Render, showing the intermediate document to `callback`.
    ///
    /// After the forward pass the buffer holds HTML with placeholder tokens.
    /// It is parsed as a fragment and handed to `callback` before the
    /// reverse pass starts; the callback cannot change the output.
    ///
    /// # Errors
    ///
    /// Same as [`render`](Self::render).
    pub fn render_with(
        self,
        ctx: &mut RenderContext,
        callback: &mut dyn FnMut(&Html),
    ) -> Result<String, RenderError> {
        self.run(ctx, Some(callback))
    }

    fn run(
        mut self,
        ctx: &mut RenderContext,
        callback: Option<&mut dyn FnMut(&Html)>,
    ) -> Result<String, RenderError> {
        tracing::debug!(filters = self.filters.len(), "rendering through filter chain");

        let mut data = ctx.source().to_owned();

        for filter in &mut self.filters {
            tracing::trace!(filter = filter.name(), "extract");
            data = filter
                .extract(data, ctx)
                .map_err(|source| RenderError::Filter {
                    filter: filter.name().to_owned(),
                    phase: Phase::Extract,
                    source,
                })?;
        }

        if let Some(callback) = callback {
            let fragment = Html::parse_fragment(&data);
            callback(&fragment);
        }

        for filter in self.filters.iter_mut().rev() {
            tracing::trace!(filter = filter.name(), "process");
            data = filter
                .process(data, ctx)
                .map_err(|source| RenderError::Filter {
                    filter: filter.name().to_owned(),
                    phase: Phase::Process,
                    source,
                })?;
        }

        Ok(strip_empty_paragraphs(&data))
    }
}

/// Remove `<p></p>` artifacts left by filter and converter interplay.
#[must_use]
pub fn strip_empty_paragraphs(html: &str) -> String {
    if html.contains(EMPTY_PARAGRAPH) {
        html.replace(EMPTY_PARAGRAPH, "")
    } else {
        html.to_owned()
    }
}
