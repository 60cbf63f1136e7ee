//! Markup conversion filter.

use crate::context::RenderContext;
use crate::error::FilterError;
use crate::filter::Filter;

/// Converts the page's markup to HTML with the format's converter.
///
/// Conversion happens at the end of the forward pass, so every filter
/// declared before it sees raw markup and every token it left behind passes
/// through the converter. The reverse pass leaves the HTML alone.
#[derive(Debug, Default)]
pub struct MarkupFilter;

impl MarkupFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self
    }
}

impl Filter for MarkupFilter {
    fn name(&self) -> &str {
        "markup"
    }

    fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        ctx.converter().convert(&text)
    }

    fn process(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
        Ok(text)
    }
}
