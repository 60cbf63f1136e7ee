//! Console reporting for wikimark commands.
//!
//! Everything here goes to stderr; stdout carries only rendered pages.

use std::path::Path;

use console::{Style, Term};
use wm_config::FormatConfig;

use crate::error::CliError;

/// Styled stderr reporter.
pub(crate) struct Output {
    term: Term,
    warn: Style,
    fail: Style,
    heading: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            warn: Style::new().yellow(),
            fail: Style::new().red(),
            heading: Style::new().cyan().bold(),
        }
    }

    fn line(&self, text: &str) {
        let _ = self.term.write_line(text);
    }

    /// Report where the configuration came from.
    pub(crate) fn config_source(&self, path: Option<&Path>) {
        match path {
            Some(path) => self.line(&format!("Config: {}", path.display())),
            None => self.line("Config: defaults (no wikimark.toml found)"),
        }
    }

    /// Report one markup format and its filter chain.
    pub(crate) fn format(&self, id: &str, format: &FormatConfig, unknown: &[&str]) {
        let heading = format!("{id} ({})", format.name);
        self.line(&self.heading.apply_to(heading).to_string());
        for detail in format_details(format) {
            self.line(&detail);
        }
        if !unknown.is_empty() {
            let warning = format!("  unknown filters: {}", unknown.join(", "));
            self.line(&self.warn.apply_to(warning).to_string());
        }
    }

    /// Warn that the page had characters the output encoding cannot hold.
    pub(crate) fn lossy_encoding(&self, label: &str) {
        let warning = lossy_message(label);
        self.line(&self.warn.apply_to(warning).to_string());
    }

    /// Report the error that ended the command.
    pub(crate) fn failure(&self, err: &CliError) {
        self.line(&self.fail.apply_to(format!("Error: {err}")).to_string());
    }
}

/// Indented detail lines listed under a format heading.
fn format_details(format: &FormatConfig) -> [String; 2] {
    [
        format!("  extensions: {}", format.extensions.join(", ")),
        format!("  filters:    {}", format.filters.join(" -> ")),
    ]
}

fn lossy_message(label: &str) -> String {
    format!("Some characters cannot be represented in {label}; written as character references")
}
