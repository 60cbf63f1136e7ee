//! YAML front matter filter.
//!
//! A page may open with a YAML block fenced by `---` lines:
//!
//! ```text
//! ---
//! title: Setup
//! tags: [install, linux]
//! ---
//! # Setup
//! ```
//!
//! The block is removed from the text and its keys are merged into the
//! render's metadata. The closing fence may also be `...`.

use crate::context::{Metadata, RenderContext};
use crate::error::FilterError;
use crate::filter::Filter;

const FENCE: &str = "---";
const END_FENCE: &str = "...";

/// Moves YAML front matter into the render metadata.
#[derive(Debug, Default)]
pub struct MetadataFilter;

impl MetadataFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self
    }
}

impl Filter for MetadataFilter {
    fn name(&self) -> &str {
        "metadata"
    }

    fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        let Some((yaml, body)) = split_front_matter(&text) else {
            return Ok(text);
        };

        if !yaml.trim().is_empty() {
            let parsed: Metadata = serde_yaml::from_str(yaml)
                .map_err(|e| FilterError::Syntax(format!("invalid front matter: {e}")))?;
            tracing::debug!(keys = parsed.len(), "parsed front matter");
            ctx.metadata_mut().extend(parsed);
        }

        Ok(body.to_owned())
    }

    fn process(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
        Ok(text)
    }
}

/// Split `text` into front matter YAML and the remaining body.
///
/// Returns `None` when the text does not open with a fence or the fence is
/// never closed.
pub(crate) fn split_front_matter(text: &str) -> Option<(&str, &str)> {
    let mut lines = text.split_inclusive('\n');
    let first = lines.next()?;
    if first.trim_end() != FENCE {
        return None;
    }

    let yaml_start = first.len();
    let mut offset = yaml_start;
    for line in lines {
        let trimmed = line.trim_end();
        if trimmed == FENCE || trimmed == END_FENCE {
            return Some((&text[yaml_start..offset], &text[offset + line.len()..]));
        }
        offset += line.len();
    }
    None
}
