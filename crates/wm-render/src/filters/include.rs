//! Page include filter.
//!
//! `[[include:path]]` is replaced with the raw source of another wiki file
//! before any other filter sees the text, so the included markup is
//! rendered as part of the including page. Paths resolve relative to the
//! including file; a leading `/` makes them wiki-absolute.
//!
//! Includes nest up to the render's include depth. A missing file or an
//! exhausted depth leaves an inline notice in place of the directive.
//! Directives inside code blocks and code spans are left alone.

use std::sync::LazyLock;

use regex::Regex;

use super::metadata::split_front_matter;
use super::scan::{code_ranges, in_ranges};
use crate::context::RenderContext;
use crate::error::FilterError;
use crate::filter::Filter;
use crate::highlight::escape_html;
use crate::placeholder::Stash;
use crate::resolver::FileResolver;

static INCLUDE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[include:([^\]\n]+)\]\]").unwrap());

/// Inlines included wiki files.
///
/// Should be declared right after `metadata` so included text passes
/// through every later filter.
pub struct IncludeFilter {
    notices: Stash<String>,
}

impl IncludeFilter {
    /// Create the filter.
    #[must_use]
    pub fn new(_ctx: &RenderContext) -> Self {
        Self {
            notices: Stash::inline("include"),
        }
    }

    fn expand(
        &mut self,
        text: &str,
        files: &FileResolver,
        levels: usize,
    ) -> Result<String, FilterError> {
        let code = code_ranges(text);
        let mut output = String::with_capacity(text.len());
        let mut last = 0;

        for caps in INCLUDE_PATTERN.captures_iter(text) {
            let (Some(directive), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if in_ranges(&code, directive.start()) {
                continue;
            }
            output.push_str(&text[last..directive.start()]);
            last = directive.end();

            let name = name.as_str().trim();
            let Some(remaining) = levels.checked_sub(1) else {
                tracing::warn!(name, "include depth exhausted");
                let notice = format!("Too many levels of included pages, will not include `{name}`");
                output.push_str(&self.notices.insert(notice));
                continue;
            };

            let Some(file) = files.resolve(name, None)? else {
                let notice = format!("Cannot include `{name}`: page does not exist");
                output.push_str(&self.notices.insert(notice));
                continue;
            };

            tracing::debug!(path = %file.path, remaining, "including file");
            let body = split_front_matter(&file.content).map_or(file.content.as_str(), |(_, body)| body);
            let nested = files.for_file(&file.path);
            output.push_str(&self.expand(body, &nested, remaining)?);
        }

        output.push_str(&text[last..]);
        Ok(output)
    }
}

impl Filter for IncludeFilter {
    fn name(&self) -> &str {
        "include"
    }

    fn extract(&mut self, text: String, ctx: &mut RenderContext) -> Result<String, FilterError> {
        if !INCLUDE_PATTERN.is_match(&text) {
            return Ok(text);
        }
        let levels = ctx.include_levels();
        self.expand(&text, ctx.files(), levels)
    }

    fn process(&mut self, text: String, _ctx: &mut RenderContext) -> Result<String, FilterError> {
        self.notices.restore(text, |_, notice| {
            Ok(format!(
                "<span class=\"include-error\">{}</span>",
                escape_html(&notice)
            ))
        })
    }
}
