//! Site configuration management for `quire.toml`.
//!
//! # Sections
//!
//! | Section        | Purpose                                        |
//! |----------------|------------------------------------------------|
//! | `[base]`       | Site metadata (title, url, languages, params)  |
//! | `[build]`      | Directories, theme, URL style, taxonomies      |
//! | `[build.rss]`  | Built-in feed template                         |
//!
//! # Example
//!
//! ```toml
//! [base]
//! title = "My Blog"
//! url = "https://example.com/"
//!
//! [base.params]
//! Description = "Notes"
//!
//! [build]
//! theme = "hyde"
//!
//! [build.rss]
//! enable = true
//! ```

mod base;
mod build;
pub mod defaults;
mod error;

pub use base::BaseConfig;
pub use build::{BuildConfig, RssConfig};
pub use error::ConfigError;

use crate::{cli::Cli, utils::value::toml_table_to_json};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing quire.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Basic site information
    #[serde(default)]
    pub base: BaseConfig,

    /// Build settings
    #[serde(default)]
    pub build: BuildConfig,
}

impl SiteConfig {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: SiteConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;
        let mut config = Self::from_str(&content)?;
        config.config_path = path.to_path_buf();
        Ok(config)
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        self.build.root.as_deref().unwrap_or(Path::new("./"))
    }

    /// Set the root directory path
    pub fn set_root(&mut self, path: &Path) {
        self.build.root = Some(path.to_path_buf())
    }

    /// Theme layout directory, if a theme is configured.
    pub fn theme_layouts(&self) -> Option<PathBuf> {
        self.build
            .theme
            .as_ref()
            .map(|theme| self.build.themes.join(theme).join("layouts"))
    }

    /// Site params with keys lower-cased at every level.
    pub fn params(&self) -> serde_json::Map<String, serde_json::Value> {
        toml_table_to_json(&self.base.params, true)
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        let root = cli
            .root
            .as_ref()
            .cloned()
            .unwrap_or_else(|| self.get_root().to_owned());

        Self::update_option(&mut self.build.content, cli.content.as_ref());
        Self::update_option(&mut self.build.output, cli.output.as_ref());

        if let Some(args) = cli.build_args() {
            self.build.drafts |= args.drafts;
            self.build.clean |= args.clean;
            Self::update_option(&mut self.build.minify, args.minify.as_ref());
            if args.theme.is_some() {
                self.build.theme = args.theme.clone();
            }
            if args.base_url.is_some() {
                self.base.url = args.base_url.clone();
            }
        }

        self.config_path = Self::normalize_path(&root.join(&cli.config));
        self.update_path_with_root(&root);
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Update all paths relative to root directory and normalize to absolute paths
    pub fn update_path_with_root(&mut self, root: &Path) {
        let root = Self::normalize_path(root);
        self.set_root(&root);

        self.build.content = Self::normalize_path(&root.join(&self.build.content));
        self.build.layouts = Self::normalize_path(&root.join(&self.build.layouts));
        self.build.themes = Self::normalize_path(&root.join(&self.build.themes));
        self.build.output = Self::normalize_path(&root.join(&self.build.output));
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration before a build
    pub fn validate(&self) -> Result<()> {
        if let Some(base_url) = &self.base.url
            && !base_url.starts_with("http")
        {
            bail!(ConfigError::Validation(
                "[base.url] must start with http:// or https://".into()
            ));
        }

        if let Some(theme_layouts) = self.theme_layouts() {
            let theme_dir = theme_layouts.parent().unwrap_or(&theme_layouts);
            if !theme_dir.is_dir() {
                bail!(ConfigError::Validation(format!(
                    "[build.theme] directory not found: {}",
                    theme_dir.display()
                )));
            }
        }

        if self.build.home_pages == 0 {
            bail!(ConfigError::Validation(
                "[build.home_pages] must be at least 1".into()
            ));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{BuildArgs, Commands};
    use serde_json::json;

    #[test]
    fn test_from_str() {
        let config = SiteConfig::from_str(
            r#"
            [base]
            title = "My Blog"
            author = "Test Author"
        "#,
        )
        .unwrap();

        assert_eq!(config.base.title, "My Blog");
        assert_eq!(config.base.author, "Test Author");
    }

    #[test]
    fn test_from_str_invalid_toml() {
        assert!(SiteConfig::from_str("[base\ntitle = \"x\"").is_err());
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = SiteConfig::from_path(Path::new("/nonexistent/quire.toml")).unwrap_err();
        assert!(err.to_string().contains("IO error"));
    }

    #[test]
    fn test_get_root_default() {
        let config = SiteConfig::default();
        assert_eq!(config.get_root(), Path::new("./"));
    }

    #[test]
    fn test_params_keys_lowercased() {
        let config = SiteConfig::from_str(
            r#"
            [base.params]
            Author = "Alice"
            [base.params.Social]
            GitHub = "alice"
        "#,
        )
        .unwrap();

        assert_eq!(
            serde_json::Value::Object(config.params()),
            json!({"author": "Alice", "social": {"github": "alice"}})
        );
    }

    #[test]
    fn test_update_with_cli_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        let cli = Cli {
            root: Some(dir.path().to_path_buf()),
            output: Some(PathBuf::from("dist")),
            content: None,
            config: PathBuf::from("quire.toml"),
            command: Some(Commands::Build {
                build_args: BuildArgs {
                    clean: true,
                    drafts: true,
                    minify: Some(true),
                    theme: Some("hyde".into()),
                    base_url: Some("https://ci.example.org/".into()),
                },
            }),
        };

        config.update_with_cli(&cli);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(config.get_root(), root);
        assert_eq!(config.build.output, root.join("dist"));
        assert_eq!(config.build.content, root.join("content"));
        assert!(config.build.drafts);
        assert!(config.build.clean);
        assert!(config.build.minify);
        assert_eq!(config.build.theme.as_deref(), Some("hyde"));
        assert_eq!(config.base.url.as_deref(), Some("https://ci.example.org/"));
    }

    #[test]
    fn test_validate_rejects_non_http_url() {
        let mut config = SiteConfig::default();
        config.base.url = Some("ftp://example.org".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must start with http"));
    }

    #[test]
    fn test_validate_rejects_missing_theme() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = SiteConfig::default();
        config.build.theme = Some("missing".into());
        config.update_path_with_root(dir.path());
        assert!(config.validate().is_err());

        std::fs::create_dir_all(dir.path().join("themes/missing")).unwrap();
        assert!(config.validate().is_ok());
    }
}
