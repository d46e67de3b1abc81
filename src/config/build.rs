//! `[build]` section configuration.
//!
//! Directory layout, theme selection, URL style, taxonomies and feeds.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, path::PathBuf};

/// `[build]` section in quire.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"
/// layouts = "layouts"
/// output = "public"
/// theme = "hyde"
/// ugly_urls = false
///
/// [build.taxonomies]
/// tag = "tags"
/// series = "series"
///
/// [build.rss]
/// enable = true
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory.
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Template directory of the project.
    #[serde(default = "defaults::build::layouts")]
    #[educe(Default = defaults::build::layouts())]
    pub layouts: PathBuf,

    /// Directory holding installed themes.
    #[serde(default = "defaults::build::themes")]
    #[educe(Default = defaults::build::themes())]
    pub themes: PathBuf,

    /// Theme name; its `layouts/` are registered under `theme/`.
    #[serde(default = "defaults::build::theme")]
    #[educe(Default = defaults::build::theme())]
    pub theme: Option<String>,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Include pages marked `draft = true`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub drafts: bool,

    /// Write `name.html` instead of `name/index.html`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub ugly_urls: bool,

    /// Minify HTML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Remove the output directory before writing.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Taxonomies, singular → plural.
    #[serde(default = "defaults::build::taxonomies")]
    #[educe(Default = defaults::build::taxonomies())]
    pub taxonomies: BTreeMap<String, String>,

    /// Number of pages handed to the home page template.
    #[serde(default = "defaults::build::home_pages")]
    #[educe(Default = defaults::build::home_pages())]
    pub home_pages: usize,

    /// Feed settings.
    #[serde(default)]
    pub rss: RssConfig,
}

/// `[build.rss]` section.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RssConfig {
    /// Register the built-in feed template, so list pages emit feeds even
    /// when neither project nor theme provides `rss.xml`.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = defaults::r#false())]
    pub enable: bool,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;
    use std::path::PathBuf;

    #[test]
    fn test_build_config_defaults() {
        let config: SiteConfig = toml::from_str("").unwrap();

        assert_eq!(config.build.content, PathBuf::from("content"));
        assert_eq!(config.build.layouts, PathBuf::from("layouts"));
        assert_eq!(config.build.output, PathBuf::from("public"));
        assert_eq!(config.build.theme, None);
        assert!(!config.build.drafts);
        assert!(!config.build.ugly_urls);
        assert!(!config.build.rss.enable);
        assert_eq!(config.build.home_pages, 9);
        assert_eq!(config.build.taxonomies.get("tag").map(String::as_str), Some("tags"));
        assert_eq!(
            config.build.taxonomies.get("category").map(String::as_str),
            Some("categories")
        );
    }

    #[test]
    fn test_build_config_custom_taxonomies_replace_defaults() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build.taxonomies]
            series = "series"
        "#,
        )
        .unwrap();

        assert_eq!(config.build.taxonomies.len(), 1);
        assert_eq!(config.build.taxonomies["series"], "series");
    }

    #[test]
    fn test_build_config_rss_and_theme() {
        let config: SiteConfig = toml::from_str(
            r#"
            [build]
            theme = "hyde"
            ugly_urls = true
            [build.rss]
            enable = true
        "#,
        )
        .unwrap();

        assert_eq!(config.build.theme.as_deref(), Some("hyde"));
        assert!(config.build.ugly_urls);
        assert!(config.build.rss.enable);
    }
}
