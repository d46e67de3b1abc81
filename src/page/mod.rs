//! Pages and the page graph.
//!
//! A [`Page`] is one content unit: a markdown file materialized for a
//! language, or an index page (home, section, taxonomy) created by the build.
//! Pages are shared as `Arc<Page>`; identity comparisons use `Arc::ptr_eq`.

mod collections;
pub mod front_matter;
mod index;
mod resource;
pub mod source;

pub use collections::{PageGraph, sort_pages};
pub use index::{Lookup, RefError, ReferenceIndex};
pub use resource::ResourceCache;

use crate::layout::LayoutIdentifier;
use crate::utils::path;
use chrono::{DateTime, FixedOffset};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::{collections::BTreeSet, path::PathBuf};

/// Coarse classification of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Kind {
    Home,
    Section,
    /// Pages of one taxonomy term, e.g. `/tags/rust`.
    Taxonomy,
    /// List of all terms of a taxonomy, e.g. `/tags`.
    TaxonomyTerm,
    Page,
    Unknown,
}

impl Kind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Home => "home",
            Self::Section => "section",
            Self::Taxonomy => "taxonomy",
            Self::TaxonomyTerm => "taxonomyTerm",
            Self::Page => "page",
            Self::Unknown => "unknown",
        }
    }

    /// Home, section and taxonomy pages.
    pub const fn is_index(self) -> bool {
        matches!(
            self,
            Self::Home | Self::Section | Self::Taxonomy | Self::TaxonomyTerm
        )
    }
}

/// Naming of the source file backing a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    /// Slash-joined path relative to the content root, e.g. `blog/post.fr.md`.
    pub path: String,
    /// File name, e.g. `post.fr.md`.
    pub logical_name: String,
    /// File name without extension and language suffix, e.g. `post`.
    pub base_name: String,
}

impl FileInfo {
    /// Directory of the file relative to the content root, without trailing slash.
    pub fn dir(&self) -> &str {
        path::split(&self.path).0.trim_end_matches('/')
    }

    pub fn is_bundle_index(&self) -> bool {
        self.base_name == "index"
    }

    pub fn is_section_index(&self) -> bool {
        self.base_name == "_index"
    }
}

/// A file shipped alongside a bundle page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    /// Location on disk.
    pub source: PathBuf,
    /// `/`-joined path, e.g. `blog/trip/photo.jpg`. Relative to the content
    /// root when discovered, to the publish root once the page has a target.
    pub rel_path: String,
}

/// The taxonomy an index page belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyRef {
    pub singular: String,
    pub plural: String,
    /// Set for [`Kind::Taxonomy`] pages: (term key, display name).
    pub term: Option<(String, String)>,
}

/// Title and links of a neighbouring page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageLink {
    pub title: String,
    pub permalink: String,
    pub rel_permalink: String,
}

#[derive(Debug)]
pub struct Page {
    pub kind: Kind,
    /// Path-like section sequence, e.g. `["blog", "2024"]`.
    pub sections: Vec<String>,
    pub file: Option<FileInfo>,
    pub lang: String,
    pub title: String,
    pub date: Option<DateTime<FixedOffset>>,
    pub draft: bool,
    pub weight: Option<i64>,
    pub slug: Option<String>,
    pub url: Option<String>,
    pub layout: String,
    /// Content type path used for layout lookup.
    pub content_type: String,
    pub headless: bool,
    /// Front matter, keys lower-cased.
    pub params: Map<String, Value>,
    /// Markdown body after front matter.
    pub raw_content: String,
    /// Names of shortcodes used in `raw_content`.
    pub shortcodes: BTreeSet<String>,
    pub resources: Vec<Resource>,
    pub taxonomy: Option<TaxonomyRef>,
    /// Output path relative to the publish root, e.g. `blog/post/index.html`.
    pub target_path: String,
    pub rel_permalink: String,
    pub permalink: String,
    pub prev: Option<PageLink>,
    pub next: Option<PageLink>,
    /// Rendered HTML; rewritten by the shortcode and URL phases.
    content: RwLock<String>,
}

impl Page {
    pub fn new(kind: Kind, lang: &str) -> Self {
        Self {
            kind,
            sections: Vec::new(),
            file: None,
            lang: lang.to_owned(),
            title: String::new(),
            date: None,
            draft: false,
            weight: None,
            slug: None,
            url: None,
            layout: String::new(),
            content_type: String::new(),
            headless: false,
            params: Map::new(),
            raw_content: String::new(),
            shortcodes: BTreeSet::new(),
            resources: Vec::new(),
            taxonomy: None,
            target_path: String::new(),
            rel_permalink: String::new(),
            permalink: String::new(),
            prev: None,
            next: None,
            content: RwLock::new(String::new()),
        }
    }

    /// `/` + source path, or empty for pages without a backing file.
    pub fn source_ref(&self) -> String {
        self.file
            .as_ref()
            .map(|file| format!("/{}", file.path))
            .unwrap_or_default()
    }

    /// First section, or empty for root-level pages.
    pub fn section(&self) -> &str {
        self.sections.first().map_or("", String::as_str)
    }

    pub fn content(&self) -> String {
        self.content.read().clone()
    }

    pub fn set_content(&self, html: String) {
        *self.content.write() = html;
    }

    pub fn link(&self) -> PageLink {
        PageLink {
            title: self.title.clone(),
            permalink: self.permalink.clone(),
            rel_permalink: self.rel_permalink.clone(),
        }
    }
}

impl LayoutIdentifier for Page {
    fn page_type(&self) -> &str {
        &self.content_type
    }

    fn page_section(&self) -> &str {
        match &self.taxonomy {
            Some(taxonomy) => &taxonomy.singular,
            None => self.section(),
        }
    }

    fn page_kind(&self) -> &str {
        self.kind.as_str()
    }

    fn page_layout(&self) -> &str {
        &self.layout
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Regular page backed by `path` (relative to the content root).
    pub(crate) fn page_at(path: &str, lang: &str) -> Page {
        let (dir, name) = path::split(path);
        let stem = name.split('.').next().unwrap_or(name);
        let mut page = Page::new(Kind::Page, lang);
        page.sections = dir
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        page.title = stem.to_owned();
        page.file = Some(FileInfo {
            path: path.to_owned(),
            logical_name: name.to_owned(),
            base_name: stem.to_owned(),
        });
        page
    }

    #[test]
    fn test_kind_strings() {
        assert_eq!(Kind::TaxonomyTerm.as_str(), "taxonomyTerm");
        assert!(Kind::Home.is_index());
        assert!(!Kind::Page.is_index());
        assert!(!Kind::Unknown.is_index());
    }

    #[test]
    fn test_source_ref() {
        assert_eq!(page_at("blog/post.md", "en").source_ref(), "/blog/post.md");
        assert_eq!(Page::new(Kind::Home, "en").source_ref(), "");
    }

    #[test]
    fn test_file_info_dir() {
        let page = page_at("blog/trip/index.md", "en");
        let file = page.file.as_ref().unwrap();
        assert_eq!(file.dir(), "blog/trip");
        assert!(file.is_bundle_index());
        assert_eq!(page_at("root.md", "en").file.unwrap().dir(), "");
    }

    #[test]
    fn test_layout_identifier_for_taxonomy_uses_singular() {
        let mut page = Page::new(Kind::Taxonomy, "en");
        page.sections = vec!["tags".into(), "rust".into()];
        page.taxonomy = Some(TaxonomyRef {
            singular: "tag".into(),
            plural: "tags".into(),
            term: Some(("rust".into(), "Rust".into())),
        });
        assert_eq!(page.page_section(), "tag");
        assert_eq!(page.page_kind(), "taxonomy");
    }

    #[test]
    fn test_content_is_replaceable_through_shared_ref() {
        let page = std::sync::Arc::new(page_at("a.md", "en"));
        page.set_content("<p>x</p>".into());
        assert_eq!(page.content(), "<p>x</p>");
    }
}
