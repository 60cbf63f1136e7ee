//! Sanitizer seam.
//!
//! HTML sanitization is supplied by the embedding application. A wiki holds
//! two sanitizers: one for regular page views and one for history and diff
//! views, picked per render by [`RenderOptions::no_follow`](crate::RenderOptions).

use std::sync::Arc;

use crate::context::SanitizeMode;

/// Cleans rendered HTML.
pub trait Sanitizer: Send + Sync {
    /// Return a sanitized copy of `html`.
    fn sanitize(&self, html: &str) -> String;
}

/// [`Sanitizer`] that returns its input unchanged.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassThroughSanitizer;

impl Sanitizer for PassThroughSanitizer {
    fn sanitize(&self, html: &str) -> String {
        html.to_owned()
    }
}

/// The pair of sanitizers a wiki renders with.
#[derive(Clone, Default)]
pub struct Sanitizers {
    standard: Option<Arc<dyn Sanitizer>>,
    history: Option<Arc<dyn Sanitizer>>,
}

impl Sanitizers {
    /// No sanitization at all.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Sanitizers for regular and history views.
    #[must_use]
    pub fn new(standard: Arc<dyn Sanitizer>, history: Arc<dyn Sanitizer>) -> Self {
        Self {
            standard: Some(standard),
            history: Some(history),
        }
    }

    /// Pick the sanitizer for a render.
    ///
    /// `no_follow` selects the history sanitizer. Returns
    /// [`SanitizeMode::None`] when the wiki has no sanitizer for that view.
    #[must_use]
    pub fn select(&self, no_follow: bool) -> Option<(SanitizeMode, Arc<dyn Sanitizer>)> {
        if no_follow {
            self.history
                .as_ref()
                .map(|s| (SanitizeMode::History, Arc::clone(s)))
        } else {
            self.standard
                .as_ref()
                .map(|s| (SanitizeMode::Standard, Arc::clone(s)))
        }
    }
}
