//! CLI command implementations.

pub(crate) mod formats;
pub(crate) mod render;

pub(crate) use formats::FormatsArgs;
pub(crate) use render::RenderArgs;

use wm_config::Config;
use wm_render::{FormatRegistry, FormatSpec, builtin_filter};

use crate::error::CliError;

/// Build the format registry declared in `config`.
///
/// Filter names are looked up among the built-in filters; an unknown name
/// is an error.
pub(crate) fn format_registry(config: &Config) -> Result<FormatRegistry, CliError> {
    let mut registry = FormatRegistry::new();
    for (id, format) in &config.formats {
        let filters = format
            .filters
            .iter()
            .map(|name| {
                builtin_filter(name).ok_or_else(|| {
                    CliError::Validation(format!("formats.{id}: unknown filter `{name}`"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        registry.register(
            id.clone(),
            FormatSpec::new(&format.name, &format.extensions).with_filters(filters),
        );
    }
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use pretty_assertions::assert_eq;

    use super::*;

    fn config(toml: &str) -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wikimark.toml");
        std::fs::write(&path, toml).unwrap();
        Config::load(Some(Path::new(&path)), None).unwrap()
    }

    #[test]
    fn test_default_config_registers_markdown() {
        let registry = format_registry(&config("")).unwrap();

        assert_eq!(registry.ids().collect::<Vec<_>>(), vec!["markdown"]);
        assert_eq!(registry.get("markdown").unwrap().filters().len(), 6);
        assert_eq!(registry.detect("Home.mdown"), Some("markdown"));
    }

    #[test]
    fn test_default_config_uses_default_filter_chain() {
        let config = config("");
        assert_eq!(
            config.formats["markdown"].filters,
            wm_render::filters::DEFAULT_FILTERS
        );
    }

    #[test]
    fn test_unknown_filter_is_rejected() {
        let config = config(
            r#"
[formats.notes]
name = "Notes"
extensions = ["note"]
filters = ["markup", "emoji"]
"#,
        );

        let err = format_registry(&config).unwrap_err();
        assert_eq!(err.to_string(), "formats.notes: unknown filter `emoji`");
    }
}
