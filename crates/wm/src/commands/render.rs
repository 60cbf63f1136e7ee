//! `wm render` command implementation.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Args;
use wm_cache::{CacheHook, FileCache, NullCache};
use wm_config::{CliSettings, Config};
use wm_render::{Page, RenderOptions, Wiki};
use wm_storage::{FsStorage, Storage};

use super::format_registry;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the render command.
#[derive(Args)]
pub(crate) struct RenderArgs {
    /// Wiki path of the page, relative to the source directory.
    page: String,

    /// Path to configuration file (default: auto-discover wikimark.toml).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Wiki source directory (overrides config).
    #[arg(short, long)]
    source_dir: Option<PathBuf>,

    /// Format identifier (default: detected from the page extension).
    #[arg(short, long)]
    format: Option<String>,

    /// Render with the history sanitizer.
    #[arg(long)]
    no_follow: bool,

    /// Output encoding label, e.g. ISO-8859-1 (overrides config).
    #[arg(short, long, env = "WM_ENCODING")]
    encoding: Option<String>,

    /// Maximum depth of nested includes (overrides config).
    #[arg(long)]
    include_levels: Option<usize>,

    /// Disable caching.
    #[arg(long)]
    no_cache: bool,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,
}

impl RenderArgs {
    /// Execute the render command.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration, lookup, rendering or output fails.
    pub(crate) fn execute(self, version: &str) -> Result<(), CliError> {
        let cli_settings = CliSettings {
            source_dir: self.source_dir.clone(),
            cache_enabled: self.no_cache.then_some(false),
            no_follow: self.no_follow.then_some(true),
            encoding: self.encoding.clone(),
            include_levels: self.include_levels,
        };
        let config = Config::load(self.config.as_deref(), Some(&cli_settings))?;

        let bytes = self.render(&config, version)?;

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.write_all(b"\n")?;
        stdout.flush()?;
        Ok(())
    }

    /// Render the page and encode it for output.
    fn render(&self, config: &Config, version: &str) -> Result<Vec<u8>, CliError> {
        let output = Output::new();
        let source_dir = &config.wiki_resolved.source_dir;
        tracing::info!(source_dir = %source_dir.display(), page = %self.page, "rendering");

        let storage: Arc<dyn Storage> = Arc::new(FsStorage::new(source_dir.clone()));
        let cache: Arc<dyn CacheHook> = if config.cache.enabled {
            ensure_project_dir(&config.wiki_resolved.project_dir)?;
            Arc::new(FileCache::new(config.wiki_resolved.cache_dir(), version))
        } else {
            Arc::new(NullCache)
        };
        let wiki = Wiki::new(Arc::clone(&storage))
            .with_cache(cache)
            .with_formats(format_registry(config)?);

        let format = match &self.format {
            Some(format) => format.clone(),
            None => wiki
                .formats()
                .detect(&self.page)
                .map(ToOwned::to_owned)
                .ok_or_else(|| {
                    CliError::Validation(format!(
                        "cannot detect format of `{}`; pass --format",
                        self.page
                    ))
                })?,
        };

        let file = storage.file(self.page.trim_start_matches('/'), None)?;
        let page = Page::from_file(file, format);

        let mut options = RenderOptions::default()
            .with_no_follow(config.render.no_follow)
            .with_include_levels(config.render.include_levels);
        if let Some(encoding) = &config.render.encoding {
            options = options.with_encoding(encoding.clone());
        }

        let result = wiki.render(&page, &options)?;
        if let Some(metadata) = &result.metadata {
            tracing::info!(keys = metadata.len(), "page metadata");
        }

        match result.encoding.as_deref() {
            Some(label) => {
                let (bytes, lossy) = encode(&result.html, label)?;
                if lossy {
                    output.lossy_encoding(label);
                }
                Ok(bytes)
            }
            None => Ok(result.html.into_bytes()),
        }
    }
}

/// Transcode `html` to the encoding named by `label`.
///
/// Returns the bytes and whether unmappable characters had to be replaced
/// with numeric character references.
fn encode(html: &str, label: &str) -> Result<(Vec<u8>, bool), CliError> {
    let encoding = encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| CliError::Validation(format!("unknown encoding `{label}`")))?;
    let (bytes, used, lossy) = encoding.encode(html);
    if used != encoding {
        tracing::debug!(requested = encoding.name(), used = used.name(), "output encoding substituted");
    }
    Ok((bytes.into_owned(), lossy))
}

/// Ensure the `.wikimark/` project directory exists with a `.gitignore`.
fn ensure_project_dir(project_dir: &Path) -> Result<(), CliError> {
    std::fs::create_dir_all(project_dir)?;

    let gitignore_path = project_dir.join(".gitignore");
    if !gitignore_path.exists() {
        let _ = std::fs::write(&gitignore_path, "# Automatically created by wikimark\n*\n");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wm_storage::StorageErrorKind;

    use super::*;

    fn args(page: &str) -> RenderArgs {
        RenderArgs {
            page: page.to_owned(),
            config: None,
            source_dir: None,
            format: None,
            no_follow: false,
            encoding: None,
            include_levels: None,
            no_cache: false,
            verbose: false,
        }
    }

    /// Project with a config file and a `wiki/` directory holding `pages`.
    fn project(config: &str, pages: &[(&str, &str)]) -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("wikimark.toml");
        std::fs::write(&config_path, config).unwrap();
        for (path, content) in pages {
            let full = dir.path().join("wiki").join(path);
            std::fs::create_dir_all(full.parent().unwrap()).unwrap();
            std::fs::write(full, content).unwrap();
        }
        let config = Config::load(Some(&config_path), None).unwrap();
        (dir, config)
    }

    #[test]
    fn test_render_markdown_page() {
        let (_dir, config) = project("", &[("docs/Home.md", "Hello **world**")]);

        let bytes = args("docs/Home.md").render(&config, "test").unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "<p>Hello <strong>world</strong></p>"
        );
    }

    #[test]
    fn test_render_resolves_includes_from_disk() {
        let (_dir, config) = project(
            "",
            &[
                ("docs/Home.md", "# Home\n\n[[include:parts/usage.md]]\n"),
                ("docs/parts/usage.md", "## Usage\n\nRun it."),
            ],
        );

        let bytes = args("docs/Home.md").render(&config, "test").unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "<h1 id=\"home\">Home</h1>\n<h2 id=\"usage\">Usage</h2>\n<p>Run it.</p>"
        );
    }

    #[test]
    fn test_render_populates_file_cache() {
        let (dir, config) = project("", &[("Home.md", "```rust\nfn main() {}\n```\n")]);

        args("Home.md").render(&config, "test").unwrap();

        let code_dir = dir.path().join(".wikimark/cache/code");
        assert_eq!(std::fs::read_dir(code_dir).unwrap().count(), 1);
        assert!(dir.path().join(".wikimark/.gitignore").exists());
    }

    #[test]
    fn test_disabled_cache_writes_nothing() {
        let (dir, config) = project(
            "[cache]\nenabled = false\n",
            &[("Home.md", "```\nx\n```\n")],
        );

        args("Home.md").render(&config, "test").unwrap();
        assert!(!dir.path().join(".wikimark").exists());
    }

    #[test]
    fn test_explicit_format_overrides_detection() {
        let (_dir, config) = project("", &[("README", "*hi*")]);

        let err = args("README").render(&config, "test").unwrap_err();
        assert!(matches!(err, CliError::Validation(_)));

        let mut with_format = args("README");
        with_format.format = Some("markdown".to_owned());
        let bytes = with_format.render(&config, "test").unwrap();
        assert_eq!(bytes, b"<p><em>hi</em></p>");
    }

    #[test]
    fn test_missing_page() {
        let (_dir, config) = project("", &[]);

        let err = args("Nope.md").render(&config, "test").unwrap_err();
        assert!(matches!(err, CliError::Storage(e) if e.kind() == StorageErrorKind::NotFound));
    }

    #[test]
    fn test_configured_encoding_transcodes_output() {
        let (_dir, config) = project(
            "[render]\nencoding = \"ISO-8859-1\"\n",
            &[("Cafe.md", "Café")],
        );

        let bytes = args("Cafe.md").render(&config, "test").unwrap();
        assert_eq!(bytes, b"<p>Caf\xe9</p>");
    }

    #[test]
    fn test_encode_unmappable_characters() {
        let (bytes, lossy) = encode("\u{2603}", "ascii").unwrap();
        assert!(lossy);
        assert_eq!(bytes, b"&#9731;");
    }

    #[test]
    fn test_encode_unknown_label() {
        let err = encode("x", "klingon").unwrap_err();
        assert_eq!(err.to_string(), "unknown encoding `klingon`");
    }
}
