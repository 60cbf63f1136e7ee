//! Sanitization filter.

use crate::context::RenderContext;
use crate::error::FilterError;
use crate::filter::Filter;

/// Runs the render's sanitizer over the HTML during the reverse pass.
///
/// Declared before the filters whose output is trusted (e.g. highlighted
/// code), so their content is reinserted after sanitization. Does nothing
/// when the render has no sanitizer.
#[derive(Debug, Default)]
pub struct SanitizeFilter;

impl SanitizeFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self
    }
}

impl Filter for SanitizeFilter {
    fn name(&self) -> &str {
        "sanitize"
    }

    fn extract(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
        Ok(text)
    }

    fn process(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        match ctx.sanitizer() {
            Some(sanitizer) => Ok(sanitizer.sanitize(&text)),
            None => Ok(text),
        }
    }
}
