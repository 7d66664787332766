//! Site configuration management for `blog.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # Configuration section definitions
//! ├── types/         # ConfigError, ConfigDiagnostics, FieldPath
//! ├── util.rs        # find_config_file
//! └── mod.rs         # BlogConfig (this file)
//! ```
//!
//! # Sections
//!
//! | Section      | Purpose                                        |
//! |--------------|------------------------------------------------|
//! | `[site]`     | Author, title suffix, UTC offset, covers       |
//! | `[paths]`    | Blog, images, drafts, index page, template     |
//! | `[serve]`    | Editor backend (interface, port, workers)      |
//! | `[post]`     | Title length and excerpt limits                |
//! | `[toc]`      | Table of contents label and collapse state     |
//! | `[markdown]` | Markdown extensions                            |
//! | `[cover]`    | Cover image size and template                  |
//! | `[reduce]`   | Class names used to read posts back            |
//!
//! A missing `blog.toml` is not an error: every section has defaults and the
//! working directory becomes the site root.

pub mod section;
pub mod types;
mod util;

use util::find_config_file;

pub use section::{
    CoverConfig, PathsConfig, PostConfig, ReduceConfig, ServeConfig, SiteConfig, TocConfig,
};
pub use types::{ConfigDiagnostics, ConfigError, FieldPath};

use crate::{
    cli::{Cli, Commands},
    content::MarkdownOptions,
    debug, log,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing blog.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlogConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Site root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub post: PostConfig,

    #[serde(default)]
    pub toc: TocConfig,

    #[serde(default)]
    pub markdown: MarkdownOptions,

    #[serde(default)]
    pub cover: CoverConfig,

    #[serde(default)]
    pub reduce: ReduceConfig,
}

impl BlogConfig {
    /// Load configuration from CLI arguments.
    ///
    /// Searches upward from cwd for the config file. The site root is the
    /// config file's parent directory, or cwd when there is no config file.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, config_path) = match find_config_file(&cli.config) {
            Some(path) => (Self::from_path(&path)?, path),
            None => {
                debug!("config"; "{} not found, using defaults", cli.config.display());
                (Self::default(), cwd.join(&cli.config))
            }
        };

        // Validate raw paths before normalization
        config.validate_paths()?;

        config.config_path = config_path;
        config.finalize(cli, &cwd);
        config.validate()?;

        Ok(config)
    }

    /// Finalize configuration after loading.
    fn finalize(&mut self, cli: &Cli, cwd: &Path) {
        let root = if self.config_path.exists() {
            self.config_path
                .parent()
                .map_or_else(|| cwd.to_path_buf(), Path::to_path_buf)
        } else {
            cwd.to_path_buf()
        };

        self.set_root(&root);
        self.normalize_paths();
        self.apply_command_options(cli);
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;

        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.root = path.to_path_buf();
    }

    /// Get path relative to the site root
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Commands::Serve { interface, port } = &cli.command {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
        }
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self) {
        let root = crate::utils::path::normalize_path(&self.root);
        self.set_root(&root);
        self.config_path = crate::utils::path::normalize_path(&self.config_path);
        self.paths.normalize(&root);
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Pre-validate paths before normalization.
    ///
    /// Must run before `finalize()`: afterwards every path is absolute.
    fn validate_paths(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();
        self.paths.validate_paths(&mut diag);
        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }

    /// Validate configuration, collecting all errors at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.site.validate(&mut diag);
        self.serve.validate(&mut diag);
        self.post.validate(&mut diag);
        self.cover.validate(&mut diag);

        if let Some(template) = &self.paths.template
            && !template.is_file()
        {
            diag.error_with_hint(
                FieldPath::new("paths.template"),
                format!("`{}` does not exist", self.root_relative(template).display()),
                "remove the field to use the built-in post template",
            );
        }

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config, panicking on unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(content: &str) -> BlogConfig {
    let (parsed, ignored) = BlogConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Defaults rooted at `root`, with every path resolved.
#[cfg(test)]
pub fn test_config_at(root: &Path) -> BlogConfig {
    let mut config = BlogConfig::default();
    config.set_root(root);
    config.paths.normalize(root);
    config
}

// ============================================================================
// tests
// ============================================================================
