//! Configuration management for wikimark.
//!
//! Parses `wikimark.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `wiki.source_dir`
//! - `render.encoding`

mod expand;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override wiki source directory.
    pub source_dir: Option<PathBuf>,
    /// Override cache enabled flag.
    pub cache_enabled: Option<bool>,
    /// Override the no-follow flag.
    pub no_follow: Option<bool>,
    /// Override output encoding.
    pub encoding: Option<String>,
    /// Override include depth.
    pub include_levels: Option<usize>,
}

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "wikimark.toml";

/// Directory for wikimark data next to the config file.
const PROJECT_DIRNAME: &str = ".wikimark";

/// Upper bound for `render.include_levels`.
const MAX_INCLUDE_LEVELS: usize = 100;

/// Application configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Wiki configuration (paths are relative strings from TOML).
    wiki: WikiConfigRaw,
    /// Render defaults.
    pub render: RenderConfig,
    /// Cache configuration.
    pub cache: CacheConfig,
    /// Page formats by identifier.
    pub formats: BTreeMap<String, FormatConfig>,

    /// Resolved wiki configuration (set after loading).
    #[serde(skip)]
    pub wiki_resolved: WikiConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::default_with_base(Path::new("."))
    }
}

/// Raw wiki configuration as parsed from TOML.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct WikiConfigRaw {
    source_dir: Option<String>,
}

/// Resolved wiki configuration with absolute paths.
#[derive(Debug, Default)]
pub struct WikiConfig {
    /// Directory holding the wiki pages.
    pub source_dir: PathBuf,
    /// Project directory for wikimark data (`.wikimark/`).
    pub project_dir: PathBuf,
}

impl WikiConfig {
    /// Cache directory path (`.wikimark/cache/`).
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        self.project_dir.join("cache")
    }
}

/// Render defaults.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RenderConfig {
    /// Nested include depth.
    pub include_levels: usize,
    /// Render with the history sanitizer.
    pub no_follow: bool,
    /// Output encoding label (e.g. `ISO-8859-1`).
    pub encoding: Option<String>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            include_levels: 10,
            no_follow: false,
            encoding: None,
        }
    }
}

/// Cache configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Whether rendered fragments are cached on disk.
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// A page format.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct FormatConfig {
    /// Human-readable name.
    pub name: String,
    /// File extensions, without the dot.
    pub extensions: Vec<String>,
    /// Filter names in chain order.
    pub filters: Vec<String>,
}

/// Formats used when the config file has no `[formats]` section.
fn default_formats() -> BTreeMap<String, FormatConfig> {
    BTreeMap::from([(
        "markdown".to_owned(),
        FormatConfig {
            name: "Markdown".to_owned(),
            extensions: vec!["md".to_owned(), "markdown".to_owned(), "mdown".to_owned()],
            filters: ["metadata", "include", "code", "toc", "sanitize", "markup"]
                .map(ToOwned::to_owned)
                .to_vec(),
        },
    )])
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`render.encoding`").
        field: String,
        /// Error message (e.g., "${`WIKI_ENCODING`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Extensions are matched literally against file names.
fn is_valid_extension(ext: &str) -> bool {
    !ext.is_empty()
        && ext
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `wikimark.toml` in current directory and parents.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default_with_cwd()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
            config.validate()?;
        }

        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(source_dir) = &settings.source_dir {
            self.wiki_resolved.source_dir.clone_from(source_dir);
        }
        if let Some(cache_enabled) = settings.cache_enabled {
            self.cache.enabled = cache_enabled;
        }
        if let Some(no_follow) = settings.no_follow {
            self.render.no_follow = no_follow;
        }
        if let Some(encoding) = &settings.encoding {
            self.render.encoding = Some(encoding.clone());
        }
        if let Some(include_levels) = settings.include_levels {
            self.render.include_levels = include_levels;
        }
    }

    /// Search for config file in current directory and parents.
    fn discover_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;
        Self::discover_from(&current)
    }

    /// Search for config file in `start` and its parents.
    fn discover_from(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Create default config with paths relative to current working directory.
    fn default_with_cwd() -> Self {
        let cwd = std::env::current_dir().unwrap_or_default();
        Self::default_with_base(&cwd)
    }

    /// Create default config with paths relative to given base directory.
    fn default_with_base(base: &Path) -> Self {
        Self {
            wiki: WikiConfigRaw::default(),
            render: RenderConfig::default(),
            cache: CacheConfig::default(),
            formats: default_formats(),
            wiki_resolved: WikiConfig {
                source_dir: base.join("wiki"),
                project_dir: base.join(PROJECT_DIRNAME),
            },
            config_path: None,
        }
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    /// Parse TOML, filling in the default formats when none are declared.
    fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(content)?;
        if config.formats.is_empty() {
            config.formats = default_formats();
        }
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file and after CLI settings
    /// are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_render()?;
        self.validate_formats()?;
        Ok(())
    }

    /// Validate render configuration.
    fn validate_render(&self) -> Result<(), ConfigError> {
        if self.render.include_levels > MAX_INCLUDE_LEVELS {
            return Err(ConfigError::Validation(format!(
                "render.include_levels cannot exceed {MAX_INCLUDE_LEVELS}"
            )));
        }
        if let Some(encoding) = &self.render.encoding {
            require_non_empty(encoding, "render.encoding")?;
        }
        Ok(())
    }

    /// Validate format declarations.
    fn validate_formats(&self) -> Result<(), ConfigError> {
        for (id, format) in &self.formats {
            require_non_empty(&format.name, &format!("formats.{id}.name"))?;
            if format.extensions.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "formats.{id}.extensions cannot be empty"
                )));
            }
            if let Some(bad) = format
                .extensions
                .iter()
                .find(|ext| !is_valid_extension(ext.trim_start_matches('.')))
            {
                return Err(ConfigError::Validation(format!(
                    "formats.{id}.extensions has invalid extension `{bad}`"
                )));
            }
            if format.filters.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "formats.{id}.filters cannot be empty"
                )));
            }
        }
        Ok(())
    }

    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(ref source_dir) = self.wiki.source_dir {
            self.wiki.source_dir = Some(expand::expand_env(source_dir, "wiki.source_dir")?);
        }
        if let Some(ref encoding) = self.render.encoding {
            self.render.encoding = Some(expand::expand_env(encoding, "render.encoding")?);
        }
        Ok(())
    }

    /// Resolve relative paths to absolute paths based on config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        self.wiki_resolved = WikiConfig {
            source_dir: config_dir.join(self.wiki.source_dir.as_deref().unwrap_or("wiki")),
            project_dir: config_dir.join(PROJECT_DIRNAME),
        };
    }
}
