//! `wm formats` command implementation.

use std::path::PathBuf;

use clap::Args;
use wm_config::Config;
use wm_render::builtin_filter;

use crate::error::CliError;
use crate::output::Output;

/// Arguments for the formats command.
#[derive(Args)]
pub(crate) struct FormatsArgs {
    /// Path to configuration file (default: auto-discover wikimark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,
}

impl FormatsArgs {
    /// Execute the formats command.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be loaded.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let config = Config::load(self.config.as_deref(), None)?;

        output.config_source(config.config_path.as_deref());
        for (id, format) in &config.formats {
            output.format(id, format, &unknown_filters(&format.filters));
        }

        Ok(())
    }
}

/// Names in `filters` that are not built-in filters.
fn unknown_filters(filters: &[String]) -> Vec<&str> {
    filters
        .iter()
        .map(String::as_str)
        .filter(|name| builtin_filter(name).is_none())
        .collect()
}
