//! Output paths and permalinks.
//!
//! | Page                          | Pretty                    | Ugly               |
//! |-------------------------------|---------------------------|--------------------|
//! | `blog/post.md`                | `blog/post/index.html`    | `blog/post.html`   |
//! | `blog/post.md`, `slug = "p"`  | `blog/p/index.html`       | `blog/p.html`      |
//! | `blog/post.md`, `url = "/x/"` | `x/index.html`            | `x/index.html`     |
//! | both `slug` and `url` set     | as for `slug`             | as for `slug`      |
//! | `blog/trip/index.md` (bundle) | `blog/trip/index.html`    | same               |
//! | home                          | `index.html`              | same               |
//! | section `blog`                | `blog/index.html`         | same               |
//! | term `tags/rust`              | `tags/rust/index.html`    | `tags/rust.html`   |
//! | taxonomy `tags`               | `tags/index.html`         | same               |
//!
//! Pages of a language other than the active one are placed under `<lang>/`.

use crate::page::{Kind, Page};
use crate::utils::path;

const INDEX_FILE: &str = "index.html";

/// Output path of `page`, relative to the publish root.
pub fn target_path(page: &Page, active_lang: &str, ugly: bool) -> String {
    let target = match page.kind {
        Kind::Page => regular_target(page, ugly),
        Kind::Taxonomy if ugly => format!("{}.html", path::join(&page.sections)),
        Kind::Home | Kind::Section | Kind::Taxonomy | Kind::TaxonomyTerm => {
            path::join(&[path::join(&page.sections).as_str(), INDEX_FILE])
        }
        Kind::Unknown => String::new(),
    };

    if page.lang == active_lang || target.is_empty() {
        target
    } else {
        path::join(&[page.lang.as_str(), target.as_str()])
    }
}

fn regular_target(page: &Page, ugly: bool) -> String {
    let Some(file) = &page.file else {
        return String::new();
    };

    let dir = file.dir();
    if let Some(slug) = page.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        return if ugly {
            path::join(&[dir, format!("{slug}.html").as_str()])
        } else {
            path::join(&[dir, slug, INDEX_FILE])
        };
    }

    if let Some(url) = page.url.as_deref().map(str::trim).filter(|u| u.len() > 2) {
        let url = url.trim_start_matches('/');
        return if url.ends_with('/') {
            format!("{url}{INDEX_FILE}")
        } else {
            url.to_owned()
        };
    }

    if file.is_bundle_index() {
        return path::join(&[dir, INDEX_FILE]);
    }

    if ugly {
        path::join(&[dir, format!("{}.html", file.base_name).as_str()])
    } else {
        path::join(&[dir, file.base_name.as_str(), INDEX_FILE])
    }
}

/// `/` + target with a trailing `index.html` removed.
pub fn rel_permalink(target: &str) -> String {
    let trimmed = target.strip_suffix(INDEX_FILE).unwrap_or(target);
    format!("/{trimmed}")
}

/// Absolute URL for a root-relative link; the link itself without a base URL.
pub fn permalink(base_url: Option<&str>, rel: &str) -> String {
    match base_url {
        Some(base) => format!("{}/{}", base.trim_end_matches('/'), rel.trim_start_matches('/')),
        None => rel.to_owned(),
    }
}

/// Feed path next to an HTML target: `blog/index.html` → `blog/index.xml`.
pub fn feed_path(target: &str) -> String {
    match target.strip_suffix(".html") {
        Some(stem) => format!("{stem}.xml"),
        None => format!("{target}.xml"),
    }
}

/// Output path for a bundle resource: its path below the bundle directory,
/// placed next to the page's output.
pub fn resource_target(page_target: &str, bundle_dir: &str, resource_path: &str) -> String {
    let inner = if bundle_dir.is_empty() {
        resource_path
    } else {
        resource_path
            .strip_prefix(bundle_dir)
            .map_or(resource_path, |rest| rest.trim_start_matches('/'))
    };
    let out_dir = path::split(page_target).0;
    path::join(&[out_dir, inner])
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::page_at;

    fn target(page: &Page, ugly: bool) -> String {
        target_path(page, "en", ugly)
    }

    #[test]
    fn test_regular_page_targets() {
        let page = page_at("blog/post.md", "en");
        assert_eq!(target(&page, false), "blog/post/index.html");
        assert_eq!(target(&page, true), "blog/post.html");
        assert_eq!(target(&page_at("about.md", "en"), false), "about/index.html");
    }

    #[test]
    fn test_slug_and_url() {
        let mut page = page_at("blog/post.md", "en");
        page.slug = Some("hello".into());
        assert_eq!(target(&page, false), "blog/hello/index.html");
        assert_eq!(target(&page, true), "blog/hello.html");

        page.slug = None;
        page.url = Some("/custom/path/".into());
        assert_eq!(target(&page, false), "custom/path/index.html");
        page.url = Some("/feed.json".into());
        assert_eq!(target(&page, false), "feed.json");
    }

    #[test]
    fn test_slug_wins_over_url() {
        let mut page = page_at("blog/post.md", "en");
        page.slug = Some("hello".into());
        page.url = Some("/custom/".into());
        assert_eq!(target(&page, false), "blog/hello/index.html");
        assert_eq!(target(&page, true), "blog/hello.html");
    }

    #[test]
    fn test_bundle_target() {
        assert_eq!(target(&page_at("blog/trip/index.md", "en"), true), "blog/trip/index.html");
    }

    #[test]
    fn test_index_page_targets() {
        let home = Page::new(Kind::Home, "en");
        assert_eq!(target(&home, false), "index.html");

        let mut section = Page::new(Kind::Section, "en");
        section.sections = vec!["blog".into()];
        assert_eq!(target(&section, true), "blog/index.html");

        let mut term = Page::new(Kind::Taxonomy, "en");
        term.sections = vec!["tags".into(), "rust".into()];
        assert_eq!(target(&term, false), "tags/rust/index.html");
        assert_eq!(target(&term, true), "tags/rust.html");

        let mut terms = Page::new(Kind::TaxonomyTerm, "en");
        terms.sections = vec!["tags".into()];
        assert_eq!(target(&terms, false), "tags/index.html");
    }

    #[test]
    fn test_other_language_prefixed() {
        assert_eq!(target_path(&page_at("a.md", "fr"), "en", false), "fr/a/index.html");
    }

    #[test]
    fn test_links() {
        assert_eq!(rel_permalink("blog/post/index.html"), "/blog/post/");
        assert_eq!(rel_permalink("index.html"), "/");
        assert_eq!(rel_permalink("blog/post.html"), "/blog/post.html");
        assert_eq!(permalink(Some("https://x.org/"), "/blog/"), "https://x.org/blog/");
        assert_eq!(permalink(Some("https://x.org"), "/"), "https://x.org/");
        assert_eq!(permalink(None, "/blog/"), "/blog/");
    }

    #[test]
    fn test_feed_path() {
        assert_eq!(feed_path("index.html"), "index.xml");
        assert_eq!(feed_path("tags/rust.html"), "tags/rust.xml");
    }

    #[test]
    fn test_resource_target() {
        assert_eq!(
            resource_target("blog/trip/index.html", "blog/trip", "blog/trip/img/a.jpg"),
            "blog/trip/img/a.jpg"
        );
        assert_eq!(
            resource_target("blog/t/index.html", "blog/trip", "blog/trip/a.jpg"),
            "blog/t/a.jpg"
        );
    }
}
