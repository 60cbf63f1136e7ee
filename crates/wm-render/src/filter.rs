//! Filter contract.
//!
//! A filter takes part in both passes of the chain:
//!
//! 1. **Extract** (forward pass): find the syntax it owns, stash it away and
//!    leave a [`Placeholder`](crate::Placeholder) token in the text.
//! 2. **Process** (reverse pass): replace its own tokens with final content.
//!
//! Filters are built per render by a [`FilterFactory`] and may keep state
//! between the two passes.

use std::sync::Arc;

use crate::context::RenderContext;
use crate::error::FilterError;

/// A bidirectional text filter.
///
/// # Example
///
/// ```
/// use wm_render::{Filter, FilterError, RenderContext};
///
/// struct Shout;
///
/// impl Filter for Shout {
///     fn name(&self) -> &str { "shout" }
///
///     fn extract(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
///         Ok(text)
///     }
///
///     fn process(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
///         Ok(text.to_uppercase())
///     }
/// }
/// ```
pub trait Filter {
    /// Identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Forward pass: replace recognized syntax with placeholder tokens.
    fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError>;

    /// Reverse pass: substitute final content for this filter's tokens.
    fn process(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError>;
}

/// Builds a filter bound to one render's context.
pub type FilterFactory = Arc<dyn Fn(&RenderContext) -> Box<dyn Filter> + Send + Sync>;

/// Wrap a constructor closure into a [`FilterFactory`].
///
/// ```
/// use wm_render::{CodeFilter, factory};
///
/// let code = factory(CodeFilter::new);
/// ```
pub fn factory<F, T>(build: F) -> FilterFactory
where
    F: Fn(&RenderContext) -> T + Send + Sync + 'static,
    T: Filter + 'static,
{
    Arc::new(move |ctx| Box::new(build(ctx)))
}
