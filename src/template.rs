//! Site templates: discovery, registration and cascade lookup.
//!
//! Templates are registered under their path relative to the layout root
//! (`_default/single.html`); theme templates get the `theme/` prefix.
//! Built-in templates live under `_internal/`.

use crate::diagnostic::FileError;
use crate::layout::{INTERNAL_PREFIX, LayoutHandler, LayoutIdentifier, OutputFormat, THEME_PREFIX};
use crate::utils::walk;
use quire_template::{ExecError, FuncMap, TemplateSet};
use serde_json::Value;
use std::{
    fs, io,
    path::{Path, PathBuf},
};

/// Built-in feed, used when `[build.rss] enable` is set and no project or
/// theme feed template exists.
const INTERNAL_RSS: &str = r#"<rss version="2.0" xmlns:atom="http://www.w3.org/2005/Atom">
  <channel>
    <title>{{ with .Title }}{{ . }} on {{ end }}{{ .Site.Title }}</title>
    <link>{{ .Permalink }}</link>
    <description>Recent content {{ with .Title }}in {{ . }} {{ end }}on {{ .Site.Title }}</description>
    <language>{{ .Site.Language.Lang }}</language>
    {{- with .Site.Author }}
    <managingEditor>{{ . }}</managingEditor>
    {{- end }}
    <atom:link href="{{ .RSSLink }}" rel="self" type="application/rss+xml" />
    {{- range .Pages }}
    <item>
      <title>{{ .Title | html }}</title>
      <link>{{ .Permalink }}</link>
      {{- with .RSSDate }}
      <pubDate>{{ . }}</pubDate>
      {{- end }}
      <guid>{{ .Permalink }}</guid>
      <description>{{ .Content | html }}</description>
    </item>
    {{- end }}
  </channel>
</rss>
"#;

const INTERNAL_SHORTCODES: &[(&str, &str)] = &[
    ("ref", "{{ ref .Page (index .Params 0) }}"),
    ("relref", "{{ relref .Page (index .Params 0) }}"),
];

/// One template file to register.
#[derive(Debug, Clone)]
pub struct TemplateFile {
    /// Registered name, e.g. `_default/single.html` or `theme/index.html`.
    pub name: String,
    /// Path shown in diagnostics.
    pub origin: String,
    pub text: String,
}

impl TemplateFile {
    pub fn new(name: &str, text: &str) -> Self {
        Self {
            name: name.to_owned(),
            origin: name.to_owned(),
            text: text.to_owned(),
        }
    }
}

pub trait TemplateSource {
    fn template_files(&self) -> io::Result<Vec<TemplateFile>>;
}

impl TemplateSource for Vec<TemplateFile> {
    fn template_files(&self) -> io::Result<Vec<TemplateFile>> {
        Ok(self.clone())
    }
}

/// Reads the project layout dir and, if set, the theme's layout dir.
#[derive(Debug, Clone)]
pub struct FsTemplateSource {
    layouts: PathBuf,
    theme_layouts: Option<PathBuf>,
}

impl FsTemplateSource {
    pub fn new(layouts: &Path, theme_layouts: Option<&Path>) -> Self {
        Self {
            layouts: layouts.to_path_buf(),
            theme_layouts: theme_layouts.map(Path::to_path_buf),
        }
    }

    fn read_dir(root: &Path, prefix: &str, out: &mut Vec<TemplateFile>) -> io::Result<()> {
        for file in walk::collect_all_files(root) {
            let Some(rel) = walk::relative_slash_path(root, &file) else {
                continue;
            };
            out.push(TemplateFile {
                name: format!("{prefix}{rel}"),
                origin: file.display().to_string(),
                text: fs::read_to_string(&file)?,
            });
        }
        Ok(())
    }
}

impl TemplateSource for FsTemplateSource {
    fn template_files(&self) -> io::Result<Vec<TemplateFile>> {
        let mut files = Vec::new();
        Self::read_dir(&self.layouts, "", &mut files)?;
        if let Some(theme) = &self.theme_layouts {
            Self::read_dir(theme, THEME_PREFIX, &mut files)?;
        }
        Ok(files)
    }
}

// ============================================================================
// Registered templates
// ============================================================================

/// Parsed templates plus the cascade resolver used to pick among them.
#[derive(Debug)]
pub struct Templates {
    set: TemplateSet,
    handler: LayoutHandler,
}

impl Templates {
    pub fn new(handler: LayoutHandler, funcs: FuncMap) -> Self {
        Self {
            set: TemplateSet::with_funcs(funcs),
            handler,
        }
    }

    pub const fn handler(&self) -> LayoutHandler {
        self.handler
    }

    pub fn funcs_mut(&mut self) -> &mut FuncMap {
        self.set.funcs_mut()
    }

    /// Parse and register every file of `source`. Returns the file count.
    pub fn load(&mut self, source: &dyn TemplateSource) -> Result<usize, FileError> {
        let files = source
            .template_files()
            .map_err(|err| FileError::new("layouts", err.to_string()))?;
        for file in &files {
            self.add(file)?;
        }
        Ok(files.len())
    }

    pub fn add(&mut self, file: &TemplateFile) -> Result<(), FileError> {
        self.set
            .parse(&file.name, &file.text)
            .map_err(|err| FileError::new(&file.origin, err.message).at_offset(&file.text, err.offset))
    }

    /// Register the built-in feed template.
    pub fn add_internal_rss(&mut self) -> Result<(), FileError> {
        self.add(&TemplateFile::new(&format!("{INTERNAL_PREFIX}_default/rss.xml"), INTERNAL_RSS))
    }

    /// Register the built-in `ref` and `relref` shortcodes.
    pub fn add_internal_shortcodes(&mut self) -> Result<(), FileError> {
        for (name, text) in INTERNAL_SHORTCODES {
            self.add(&TemplateFile::new(&format!("{INTERNAL_PREFIX}shortcodes/{name}.html"), text))?;
        }
        Ok(())
    }

    /// Lower-case parameter lookups across every registered template.
    pub fn normalize(&mut self) {
        self.set.normalize();
    }

    pub fn contains(&self, name: &str) -> bool {
        self.set.contains(name)
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// First registered name among `candidates`.
    pub fn first_existing<'a>(&self, candidates: &'a [String]) -> Option<&'a str> {
        candidates
            .iter()
            .map(String::as_str)
            .find(|name| self.set.contains(name))
    }

    /// Candidates for rendering `id` as `format`.
    pub fn layouts(&self, id: &dyn LayoutIdentifier, format: OutputFormat) -> Vec<String> {
        self.handler.resolve(id, "", format)
    }

    pub fn feed_layouts(&self, id: &dyn LayoutIdentifier) -> Vec<String> {
        self.handler.feed(id)
    }

    /// Candidates for a shortcode template.
    pub fn shortcode_layouts(&self, name: &str) -> Vec<String> {
        self.handler.band(vec![
            format!("shortcodes/{name}.html"),
            format!("{INTERNAL_PREFIX}shortcodes/{name}.html"),
        ])
    }

    pub fn execute(&self, name: &str, data: &Value) -> Result<String, ExecError> {
        self.set.execute(name, data)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templates(files: &[(&str, &str)], theme: bool) -> Templates {
        let source: Vec<TemplateFile> = files.iter().map(|(n, t)| TemplateFile::new(n, t)).collect();
        let mut templates = Templates::new(LayoutHandler::new(theme), FuncMap::builtins());
        templates.load(&source).unwrap();
        templates
    }

    #[test]
    fn test_fs_source_prefixes_theme() {
        let dir = tempfile::tempdir().unwrap();
        let layouts = dir.path().join("layouts");
        let theme = dir.path().join("themes/plain/layouts");
        fs::create_dir_all(layouts.join("_default")).unwrap();
        fs::create_dir_all(&theme).unwrap();
        fs::write(layouts.join("_default/single.html"), "s").unwrap();
        fs::write(theme.join("index.html"), "i").unwrap();

        let files = FsTemplateSource::new(&layouts, Some(&theme)).template_files().unwrap();
        let names: Vec<&str> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["_default/single.html", "theme/index.html"]);
    }

    #[test]
    fn test_project_template_wins_over_theme() {
        let t = templates(&[("theme/_default/single.html", "theme"), ("_default/single.html", "own")], true);
        let candidates = vec!["_default/single.html".to_owned(), "theme/_default/single.html".to_owned()];
        assert_eq!(t.first_existing(&candidates), Some("_default/single.html"));
    }

    #[test]
    fn test_parse_error_is_positioned() {
        let source = vec![TemplateFile::new("_default/list.html", "<ul>\n{{ range .Pages }}\n")];
        let mut t = Templates::new(LayoutHandler::new(false), FuncMap::builtins());
        let err = t.load(&source).unwrap_err();
        assert_eq!(err.position.filename, "_default/list.html");
        assert_eq!(err.file_type, "html");
    }

    #[test]
    fn test_normalize_makes_params_case_insensitive() {
        let mut t = templates(&[("p.html", "{{ $p := .Params }}{{ $p.MyKey }}")], false);
        t.normalize();
        let out = t.execute("p.html", &json!({"Params": {"mykey": "v"}})).unwrap();
        assert_eq!(out, "v");
    }

    #[test]
    fn test_internal_rss_renders() {
        let mut t = templates(&[], false);
        t.add_internal_rss().unwrap();
        let data = json!({
            "Title": "Blog",
            "Permalink": "https://x.org/blog/",
            "RSSLink": "https://x.org/blog/index.xml",
            "Site": {"Title": "X", "Language": {"Lang": "en"}, "Author": ""},
            "Pages": [{"Title": "A & B", "Permalink": "https://x.org/a/", "RSSDate": "", "Content": "<p>x</p>"}],
        });
        let out = t.execute("_internal/_default/rss.xml", &data).unwrap();
        assert!(out.contains("<title>Blog on X</title>"));
        assert!(out.contains("<title>A &amp; B</title>"));
        assert!(out.contains("&lt;p&gt;x&lt;/p&gt;"));
        assert!(!out.contains("managingEditor"));
        assert!(!out.contains("pubDate"));
    }

    #[test]
    fn test_shortcode_layouts_banded() {
        let t = templates(&[], true);
        assert_eq!(
            t.shortcode_layouts("figure"),
            vec![
                "shortcodes/figure.html",
                "theme/shortcodes/figure.html",
                "_internal/shortcodes/figure.html",
            ]
        );
    }
}
