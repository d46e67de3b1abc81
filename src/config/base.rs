//! `[base]` section configuration.
//!
//! Site identity: title, base URL, languages and site-wide params.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[base]` section in quire.toml - basic site metadata.
///
/// # Example
/// ```toml
/// [base]
/// title = "My Blog"
/// url = "https://myblog.com/"
/// language = "en"
/// languages = ["en", "fr"]
///
/// [base.params]
/// Author = "Alice"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct BaseConfig {
    /// Site title.
    #[serde(default)]
    pub title: String,

    /// Author name exposed to templates as `.Site.Author`.
    #[serde(default = "defaults::base::author")]
    #[educe(Default = defaults::base::author())]
    pub author: String,

    /// Base URL for absolute links and permalinks.
    #[serde(default = "defaults::base::url")]
    #[educe(Default = defaults::base::url())]
    pub url: Option<String>,

    /// Active language of this build.
    #[serde(default = "defaults::base::language")]
    #[educe(Default = defaults::base::language())]
    pub language: String,

    /// Language codes recognised as content filename suffixes
    /// (`about.fr.md`). The active language is always included.
    #[serde(default)]
    pub languages: Vec<String>,

    /// Site params (`.Site.Params`); keys are matched case-insensitively.
    #[serde(default)]
    pub params: toml::Table,
}

impl BaseConfig {
    /// Known languages, active language first.
    pub fn all_languages(&self) -> Vec<String> {
        let mut langs = vec![self.language.clone()];
        for lang in &self.languages {
            if !langs.contains(lang) {
                langs.push(lang.clone());
            }
        }
        langs
    }
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_base_config_full() {
        let config = r#"
            [base]
            title = "Quire"
            url = "https://quire.example.org/"
            language = "fr"
            languages = ["en", "fr"]
            author = "Alice"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.base.title, "Quire");
        assert_eq!(config.base.url.as_deref(), Some("https://quire.example.org/"));
        assert_eq!(config.base.language, "fr");
        assert_eq!(config.base.all_languages(), vec!["fr", "en"]);
        assert_eq!(config.base.author, "Alice");
    }

    #[test]
    fn test_base_config_defaults() {
        let config: SiteConfig = toml::from_str("[base]\ntitle = \"T\"").unwrap();

        assert_eq!(config.base.language, "en");
        assert_eq!(config.base.url, None);
        assert!(config.base.author.is_empty());
        assert!(config.base.params.is_empty());
    }

    #[test]
    fn test_unknown_field_rejection() {
        let config = r#"
            [base]
            title = "Test"
            unknown_field = "should_fail"
        "#;
        let err = toml::from_str::<SiteConfig>(config).unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }
}
