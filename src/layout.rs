//! Layout cascade: which templates may render a piece of content.
//!
//! [`LayoutHandler::resolve`] maps a content descriptor and an output format to
//! an ordered candidate list, most specific first. Callers pick the first
//! candidate that is a registered template.
//!
//! With a theme, the list is rearranged into three bands: project templates,
//! the same names under `theme/`, then `_internal/` templates.

use crate::utils::path;

/// Prefix of built-in templates; never theme-prefixed.
pub const INTERNAL_PREFIX: &str = "_internal/";
/// Prefix under which theme templates are registered.
pub const THEME_PREFIX: &str = "theme/";

const LAYOUTS_HOME: &str = "index.NAME.SUFFIX index.SUFFIX _default/list.NAME.SUFFIX _default/list.SUFFIX";

const LAYOUTS_SECTION: &str = "
section/SECTION.NAME.SUFFIX section/SECTION.SUFFIX
SECTION/list.NAME.SUFFIX SECTION/list.SUFFIX
_default/section.NAME.SUFFIX _default/section.SUFFIX
_default/list.NAME.SUFFIX _default/list.SUFFIX
indexes/SECTION.NAME.SUFFIX indexes/SECTION.SUFFIX
_default/indexes.NAME.SUFFIX _default/indexes.SUFFIX
";

const LAYOUTS_TAXONOMY: &str = "
taxonomy/SECTION.NAME.SUFFIX taxonomy/SECTION.SUFFIX
indexes/SECTION.NAME.SUFFIX indexes/SECTION.SUFFIX
_default/taxonomy.NAME.SUFFIX _default/taxonomy.SUFFIX
_default/list.NAME.SUFFIX _default/list.SUFFIX
";

const LAYOUTS_TAXONOMY_TERM: &str = "
taxonomy/SECTION.terms.NAME.SUFFIX taxonomy/SECTION.terms.SUFFIX
_default/terms.NAME.SUFFIX _default/terms.SUFFIX
indexes/indexes.NAME.SUFFIX indexes/indexes.SUFFIX
";

/// Read-only descriptor of the content being rendered.
pub trait LayoutIdentifier {
    /// Slash-separated content type path, e.g. `post/sub`.
    fn page_type(&self) -> &str;
    fn page_section(&self) -> &str;
    /// `home`, `section`, `taxonomy`, `taxonomyTerm` or `page`.
    fn page_kind(&self) -> &str;
    /// Declared layout; empty when unset.
    fn page_layout(&self) -> &str;
}

/// An output format: display name plus media type suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputFormat {
    pub name: &'static str,
    pub suffix: &'static str,
}

impl OutputFormat {
    pub const HTML: Self = Self {
        name: "HTML",
        suffix: "html",
    };
    pub const RSS: Self = Self {
        name: "RSS",
        suffix: "xml",
    };
}

/// Resolves layout cascades; its only state is whether a theme is present.
#[derive(Debug, Clone, Copy, Default)]
pub struct LayoutHandler {
    has_theme: bool,
}

impl LayoutHandler {
    pub const fn new(has_theme: bool) -> Self {
        Self { has_theme }
    }

    pub const fn has_theme(&self) -> bool {
        self.has_theme
    }

    /// Candidate template names for `id` in `format`. A non-empty
    /// `layout_override` wins over the identifier's own layout.
    pub fn resolve(&self, id: &dyn LayoutIdentifier, layout_override: &str, format: OutputFormat) -> Vec<String> {
        let layout = if layout_override.is_empty() {
            id.page_layout()
        } else {
            layout_override
        };

        let layouts = match id.page_kind() {
            "home" => resolve_template(LAYOUTS_HOME, id, format),
            "section" => resolve_template(LAYOUTS_SECTION, id, format),
            "taxonomy" => resolve_template(LAYOUTS_TAXONOMY, id, format),
            "taxonomyTerm" => resolve_template(LAYOUTS_TAXONOMY_TERM, id, format),
            "page" => regular_page_layouts(id.page_type(), layout, format),
            _ => Vec::new(),
        };

        self.band(layouts)
    }

    /// Feed template candidates for a list-like page; empty for regular pages.
    pub fn feed(&self, id: &dyn LayoutIdentifier) -> Vec<String> {
        let section = id.page_section();
        let layouts: Vec<String> = match id.page_kind() {
            "home" => vec!["rss.xml".into(), "_default/rss.xml".into()],
            "section" => vec![
                format!("section/{section}.rss.xml"),
                "_default/rss.xml".into(),
                "rss.xml".into(),
            ],
            "taxonomy" => vec![
                format!("taxonomy/{section}.rss.xml"),
                "_default/rss.xml".into(),
                "rss.xml".into(),
            ],
            _ => return Vec::new(),
        };
        let internal = format!("{INTERNAL_PREFIX}_default/rss.xml");
        self.band(layouts.into_iter().chain([internal]).collect())
    }

    /// Apply theme banding to an arbitrary candidate list.
    pub fn band(&self, layouts: Vec<String>) -> Vec<String> {
        if !self.has_theme {
            return layouts;
        }

        let (internal, own): (Vec<String>, Vec<String>) =
            layouts.into_iter().partition(|t| t.starts_with(INTERNAL_PREFIX));

        let themed: Vec<String> = own.iter().map(|t| format!("{THEME_PREFIX}{t}")).collect();
        own.into_iter().chain(themed).chain(internal).collect()
    }
}

fn resolve_template(table: &str, id: &dyn LayoutIdentifier, format: OutputFormat) -> Vec<String> {
    let name = format.name.to_lowercase();
    table
        .split_whitespace()
        .map(|entry| {
            entry
                .replace("SUFFIX", format.suffix)
                .replace("NAME", &name)
                .replace("SECTION", id.page_section())
        })
        .collect()
}

fn regular_page_layouts(types: &str, layout: &str, format: OutputFormat) -> Vec<String> {
    let layout = if layout.is_empty() { "single" } else { layout };
    let suffix = format.suffix;
    let name = format.name.to_lowercase();

    let mut layouts = Vec::new();

    if !types.is_empty() {
        let parts: Vec<&str> = types.split('/').collect();
        for i in 0..parts.len() {
            let search = path::join(&parts[..parts.len() - i]).to_lowercase();
            layouts.push(format!("{search}/{layout}.{name}.{suffix}"));
            layouts.push(format!("{search}/{layout}.{suffix}"));
        }
    }

    layouts.push(format!("_default/{layout}.{name}.{suffix}"));
    layouts.push(format!("_default/{layout}.{suffix}"));
    layouts
}

// ============================================================================
// Tests
// ============================================================================
