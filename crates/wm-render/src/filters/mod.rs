//! Built-in filters.
//!
//! | Name       | Extract                         | Process                     |
//! |------------|---------------------------------|-----------------------------|
//! | `metadata` | front matter into metadata      | -                           |
//! | `include`  | `[[include:..]]` to file source | notices for failed includes |
//! | `code`     | fenced code blocks to tokens    | highlighted code (cached)   |
//! | `toc`      | `[[_TOC_]]` to tokens           | heading ids, TOC list       |
//! | `sanitize` | -                               | sanitizer over the HTML     |
//! | `markup`   | markup to HTML                  | -                           |

mod code;
mod include;
mod markup;
mod metadata;
mod sanitize;
mod scan;
mod toc;

pub use code::{CODE_KIND, CodeFilter};
pub use include::IncludeFilter;
pub use markup::MarkupFilter;
pub use metadata::MetadataFilter;
pub use sanitize::SanitizeFilter;
pub use toc::{TOC_TAG, TocFilter};

use crate::filter::{FilterFactory, factory};

/// Names accepted by [`builtin_filter`].
pub const BUILTIN_FILTERS: &[&str] = &["metadata", "include", "code", "toc", "sanitize", "markup"];

/// Default filter order for Markdown pages.
pub const DEFAULT_FILTERS: &[&str] = &["metadata", "include", "code", "toc", "sanitize", "markup"];

/// Factory for the built-in filter called `name`.
#[must_use]
pub fn builtin_filter(name: &str) -> Option<FilterFactory> {
    match name {
        "metadata" => Some(factory(MetadataFilter::new)),
        "include" => Some(factory(IncludeFilter::new)),
        "code" => Some(factory(CodeFilter::new)),
        "toc" => Some(factory(TocFilter::new)),
        "sanitize" => Some(factory(SanitizeFilter::new)),
        "markup" => Some(factory(MarkupFilter::new)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use wm_storage::MockStorage;

    use super::*;
    use crate::context::RenderContext;
    use crate::resolver::FileResolver;

    #[test]
    fn test_every_builtin_name_resolves() {
        let ctx = RenderContext::new("", FileResolver::new(Arc::new(MockStorage::new()), ".", None));
        for name in BUILTIN_FILTERS {
            let factory = builtin_filter(name).unwrap();
            assert_eq!(factory(&ctx).name(), *name);
        }
    }

    #[test]
    fn test_unknown_name() {
        assert!(builtin_filter("emoji").is_none());
    }
}
