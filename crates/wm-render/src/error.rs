//! Render and filter error types.

use std::fmt;

use wm_storage::StorageError;

/// Pass of the filter chain a filter was running in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Forward pass (`Filter::extract`).
    Extract,
    /// Reverse pass (`Filter::process`).
    Process,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extract => f.write_str("extract"),
            Self::Process => f.write_str("process"),
        }
    }
}

/// Error raised by a single filter.
#[derive(Debug, thiserror::Error)]
pub enum FilterError {
    /// The filter could not parse the syntax it recognizes.
    #[error("syntax error: {0}")]
    Syntax(String),
    /// The markup converter rejected its input.
    #[error("conversion failed: {0}")]
    Convert(String),
    /// A file lookup failed for a reason other than "not found".
    #[error(transparent)]
    Storage(#[from] StorageError),
    /// Any other filter-specific failure.
    #[error(transparent)]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

/// Rendering failure.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// A filter failed; the render was aborted at that point.
    #[error("filter `{filter}` failed during {phase}: {source}")]
    Filter {
        /// Name of the failing filter.
        filter: String,
        /// Pass the filter was running in.
        phase: Phase,
        /// Underlying filter error.
        #[source]
        source: FilterError,
    },
    /// No format is registered under the requested identifier.
    #[error("no format registered for `{0}`")]
    UnknownFormat(String),
}

impl RenderError {
    /// Name of the filter that aborted the render, if any.
    #[must_use]
    pub fn filter_name(&self) -> Option<&str> {
        match self {
            Self::Filter { filter, .. } => Some(filter),
            Self::UnknownFormat(_) => None,
        }
    }
}
