//! Rendering of one unit: a page to HTML and, when a feed template exists,
//! to a feed next to it.

use super::{BuildError, context, paths};
use crate::layout::OutputFormat;
use crate::page::Page;
use crate::template::Templates;
use serde_json::{Map, Value, json};
use std::sync::Arc;

pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"yes\" ?>\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Html,
    Feed,
}

/// A rendered file waiting for the write phase.
#[derive(Debug, Clone)]
pub struct Artifact {
    /// Output-relative, `/`-joined.
    pub path: String,
    pub kind: ArtifactKind,
    pub bytes: Vec<u8>,
}

pub struct Renderer<'a> {
    templates: &'a Templates,
    site: &'a Value,
    base_url: Option<&'a str>,
}

impl<'a> Renderer<'a> {
    pub fn new(templates: &'a Templates, site: &'a Value, base_url: Option<&'a str>) -> Self {
        Self {
            templates,
            site,
            base_url,
        }
    }

    /// Render `page` listing `pages`.
    ///
    /// A missing HTML template fails the unit when `required`, otherwise the
    /// page is skipped. A missing feed template only skips the feed.
    pub fn render(
        &self,
        page: &Page,
        pages: &[Arc<Page>],
        mut extra: Map<String, Value>,
        required: bool,
    ) -> Result<Vec<Artifact>, BuildError> {
        let feeds = self.templates.feed_layouts(page);
        let feed = self.templates.first_existing(&feeds);
        let feed_path = paths::feed_path(&page.target_path);
        if feed.is_some() {
            let link = paths::permalink(self.base_url, &format!("/{feed_path}"));
            extra.insert("RSSLink".into(), json!(link));
        }

        let data = context::page_value(page, self.site, pages, extra);
        let mut artifacts = Vec::with_capacity(2);

        let candidates = self.templates.layouts(page, OutputFormat::HTML);
        match self.templates.first_existing(&candidates) {
            Some(name) => artifacts.push(Artifact {
                path: page.target_path.clone(),
                kind: ArtifactKind::Html,
                bytes: self.execute(page, name, &data)?.into_bytes(),
            }),
            None if required => {
                return Err(BuildError::TemplateMissing {
                    unit: unit_name(page),
                    candidates,
                });
            }
            None => {}
        }

        if let Some(name) = feed {
            let xml = self.execute(page, name, &data)?;
            artifacts.push(Artifact {
                path: feed_path,
                kind: ArtifactKind::Feed,
                bytes: format!("{XML_HEADER}{xml}").into_bytes(),
            });
        }

        Ok(artifacts)
    }

    fn execute(&self, page: &Page, name: &str, data: &Value) -> Result<String, BuildError> {
        self.templates
            .execute(name, data)
            .map_err(|source| BuildError::Render {
                unit: unit_name(page),
                source,
            })
    }
}

/// How a page is named in errors: its source path, or kind and link for
/// generated pages.
pub fn unit_name(page: &Page) -> String {
    let source = page.source_ref();
    if source.is_empty() {
        format!("{} {}", page.kind.as_str(), page.rel_permalink)
    } else {
        source
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::LayoutHandler;
    use crate::page::{Kind, tests::page_at};
    use crate::template::TemplateFile;
    use quire_template::FuncMap;

    fn templates(files: &[(&str, &str)]) -> Templates {
        let source: Vec<TemplateFile> = files.iter().map(|(n, t)| TemplateFile::new(n, t)).collect();
        let mut templates = Templates::new(LayoutHandler::new(false), FuncMap::builtins());
        templates.load(&source).unwrap();
        templates
    }

    fn section() -> Page {
        let mut page = Page::new(Kind::Section, "en");
        page.sections = vec!["blog".into()];
        page.title = "Blog".into();
        page.content_type = "blog".into();
        page.target_path = "blog/index.html".into();
        page.rel_permalink = "/blog/".into();
        page
    }

    #[test]
    fn test_render_with_feed() {
        let t = templates(&[
            ("_default/list.html", "{{ .Title }}:{{ range .Pages }}{{ .Title }}{{ end }}|{{ .RSSLink }}"),
            ("_default/rss.xml", "<rss>{{ len .Pages }}</rss>"),
        ]);
        let site = json!({"Title": "S"});
        let renderer = Renderer::new(&t, &site, Some("https://x.org/"));
        let pages = vec![Arc::new(page_at("blog/a.md", "en"))];

        let artifacts = renderer.render(&section(), &pages, Map::new(), true).unwrap();
        assert_eq!(artifacts.len(), 2);
        assert_eq!(artifacts[0].path, "blog/index.html");
        assert_eq!(
            String::from_utf8_lossy(&artifacts[0].bytes),
            "Blog:a|https://x.org/blog/index.xml"
        );
        assert_eq!(artifacts[1].kind, ArtifactKind::Feed);
        assert_eq!(artifacts[1].path, "blog/index.xml");
        assert_eq!(
            String::from_utf8_lossy(&artifacts[1].bytes),
            format!("{XML_HEADER}<rss>1</rss>")
        );
    }

    #[test]
    fn test_missing_template_reports_candidates() {
        let t = templates(&[]);
        let site = json!({});
        let renderer = Renderer::new(&t, &site, None);

        let err = renderer.render(&section(), &[], Map::new(), true).unwrap_err();
        let BuildError::TemplateMissing { unit, candidates } = err else {
            panic!("expected a missing template");
        };
        assert_eq!(unit, "section /blog/");
        assert!(candidates.contains(&"_default/list.html".to_owned()));

        let none = renderer.render(&section(), &[], Map::new(), false).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_execution_error_names_unit() {
        let t = templates(&[("_default/single.html", "{{ nosuchfunc }}")]);
        let site = json!({});
        let renderer = Renderer::new(&t, &site, None);
        let mut page = page_at("blog/a.md", "en");
        page.content_type = "blog".into();

        let err = renderer.render(&page, &[], Map::new(), true).unwrap_err();
        assert!(matches!(&err, BuildError::Render { unit, .. } if unit == "/blog/a.md"));
    }
}
