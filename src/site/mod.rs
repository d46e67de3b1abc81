//! Build orchestration.
//!
//! A [`Site`] drives one build through a fixed sequence of [`Phase`]s:
//!
//! ```text
//! Initialize → TemplatePrepare → PageMaterialize → LinkPages → BuildMetadata
//!   → ShortcodeExpand → AbsoluteUrlRewrite
//!   → RenderIndexes → RenderLists → RenderPages → RenderHome → Write
//! ```
//!
//! Phases never run backwards. Each one is timed; the first error aborts the
//! remaining phases. Pages are rendered in parallel only after the page
//! graph is frozen behind an `Arc` and its reference index has been built.

mod absurl;
mod context;
mod paths;
mod render;
mod shortcode;
mod taxonomy;
pub mod writer;

pub use render::{Artifact, ArtifactKind, XML_HEADER};
pub use taxonomy::{Taxonomy, Term};
pub use writer::{FsSink, MemorySink, Sink};

use crate::config::SiteConfig;
use crate::diagnostic::FileError;
use crate::layout::LayoutHandler;
use crate::logger::{PhaseTimer, ProgressBars};
use crate::page::{
    Kind, Page, PageGraph, RefError, Resource, TaxonomyRef, front_matter,
    source::{ContentFile, ContentSource},
    sort_pages,
};
use crate::template::{TemplateSource, Templates};
use crate::utils::{minify::minify_html, value::string_list};
use crate::log;
use quire_template::{ExecError, FuncError, FuncMap};
use rayon::prelude::*;
use render::Renderer;
use serde_json::{Map, Value, json};
use shortcode::Expander;
use std::{collections::BTreeMap, io, path::PathBuf, sync::Arc};
use thiserror::Error;

/// Descriptions shorter than this are reported by `check`.
const MIN_DESCRIPTION_LEN: usize = 60;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("no pages found in `{}`", .dir.display())]
    NoContentFound { dir: PathBuf },

    #[error("no template found for {unit}, tried: {}", .candidates.join(", "))]
    TemplateMissing { unit: String, candidates: Vec<String> },

    #[error("failed to render {unit}")]
    Render {
        unit: String,
        #[source]
        source: ExecError,
    },

    #[error(transparent)]
    Reference(#[from] RefError),

    #[error("{page}: {message}")]
    Shortcode { page: String, message: String },

    #[error("template error\n{0}")]
    Template(FileError),

    #[error("front matter error\n{0}")]
    FrontMatter(FileError),

    #[error("IO error at `{}`", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// ============================================================================
// Phases
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Phase {
    Initialize,
    TemplatePrepare,
    PageMaterialize,
    LinkPages,
    BuildMetadata,
    ShortcodeExpand,
    AbsoluteUrlRewrite,
    RenderIndexes,
    RenderLists,
    RenderPages,
    RenderHome,
    Write,
}

impl Phase {
    pub const ALL: [Self; 12] = [
        Self::Initialize,
        Self::TemplatePrepare,
        Self::PageMaterialize,
        Self::LinkPages,
        Self::BuildMetadata,
        Self::ShortcodeExpand,
        Self::AbsoluteUrlRewrite,
        Self::RenderIndexes,
        Self::RenderLists,
        Self::RenderPages,
        Self::RenderHome,
        Self::Write,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Initialize => "initialize",
            Self::TemplatePrepare => "prepare templates",
            Self::PageMaterialize => "materialize pages",
            Self::LinkPages => "link pages",
            Self::BuildMetadata => "build metadata",
            Self::ShortcodeExpand => "expand shortcodes",
            Self::AbsoluteUrlRewrite => "absolutize urls",
            Self::RenderIndexes => "render indexes",
            Self::RenderLists => "render lists",
            Self::RenderPages => "render pages",
            Self::RenderHome => "render home",
            Self::Write => "write",
        }
    }
}

/// Outcome of a finished build or check.
#[derive(Debug)]
pub struct BuildReport {
    pub graph: Arc<PageGraph>,
    /// Rendered HTML and feed files.
    pub artifacts: Vec<String>,
    /// Bundle resources copied to the sink.
    pub resources: usize,
    /// Completed phases, in order.
    pub phases: Vec<&'static str>,
    pub elapsed_ms: u128,
}

// ============================================================================
// Site
// ============================================================================

pub struct Site<'a> {
    config: &'a SiteConfig,
    content: &'a dyn ContentSource,
    layouts: &'a dyn TemplateSource,

    phase: Option<Phase>,
    timer: PhaseTimer,

    files: Vec<ContentFile>,
    templates: Templates,
    /// Pages between materialization and metadata, before they are shared.
    materialized: Vec<Page>,
    graph: Arc<PageGraph>,
    taxonomies: Vec<Taxonomy>,
    sections: BTreeMap<String, Vec<Arc<Page>>>,
    site_value: Value,
    artifacts: Vec<Artifact>,
    resources: usize,
}

impl<'a> Site<'a> {
    pub fn new(config: &'a SiteConfig, content: &'a dyn ContentSource, layouts: &'a dyn TemplateSource) -> Self {
        let lang = &config.base.language;
        Self {
            config,
            content,
            layouts,
            phase: None,
            timer: PhaseTimer::new(),
            files: Vec::new(),
            templates: Templates::new(LayoutHandler::default(), FuncMap::new()),
            materialized: Vec::new(),
            graph: Arc::new(PageGraph::new(lang)),
            taxonomies: Vec::new(),
            sections: BTreeMap::new(),
            site_value: Value::Null,
            artifacts: Vec::new(),
            resources: 0,
        }
    }

    /// Run every phase, sending output to `sink`.
    pub fn build(mut self, sink: &dyn Sink) -> Result<BuildReport, BuildError> {
        self.process()?;
        self.render()?;
        self.write(sink)?;
        Ok(self.report())
    }

    /// Run every phase except writing, then report content problems.
    pub fn check(mut self) -> Result<BuildReport, BuildError> {
        self.process()?;
        self.render()?;
        self.analyze();
        Ok(self.report())
    }

    pub fn phase(&self) -> Option<Phase> {
        self.phase
    }

    fn finish(&mut self, phase: Phase) {
        debug_assert!(self.phase < Some(phase), "phase {phase:?} out of order");
        self.phase = Some(phase);
        self.timer.step(phase.name());
    }

    fn lang(&self) -> &str {
        &self.config.base.language
    }

    fn base_url(&self) -> Option<&str> {
        self.config.base.url.as_deref().filter(|url| !url.is_empty())
    }

    fn report(self) -> BuildReport {
        log!("build"; "{} pages created", self.graph.pages().len());
        if let Some((phase, ms)) = self.timer.slowest() {
            log!("build"; "slowest phase: {phase} ({ms}ms)");
        }
        for taxonomy in &self.taxonomies {
            log!("build"; "{} {} created", taxonomy.terms.len(), taxonomy.plural);
        }
        BuildReport {
            phases: self.timer.steps(),
            elapsed_ms: self.timer.total_ms(),
            artifacts: self.artifacts.iter().map(|a| a.path.clone()).collect(),
            resources: self.resources,
            graph: self.graph,
        }
    }

    // ------------------------------------------------------------------------
    // Processing
    // ------------------------------------------------------------------------

    fn process(&mut self) -> Result<(), BuildError> {
        self.initialize()?;
        self.prepare_templates()?;
        self.materialize_pages()?;
        self.link_pages();
        self.build_metadata()?;
        self.expand_shortcodes()?;
        self.absolutize_urls();
        Ok(())
    }

    fn initialize(&mut self) -> Result<(), BuildError> {
        self.files = self
            .content
            .content_files()
            .map_err(|source| BuildError::Io {
                path: self.config.build.content.clone(),
                source,
            })?;
        log!("build"; "found {} content files", self.files.len());
        self.finish(Phase::Initialize);
        Ok(())
    }

    fn prepare_templates(&mut self) -> Result<(), BuildError> {
        let handler = LayoutHandler::new(self.config.build.theme.is_some());
        let mut templates = Templates::new(handler, FuncMap::builtins());
        let count = templates.load(self.layouts).map_err(BuildError::Template)?;
        templates.add_internal_shortcodes().map_err(BuildError::Template)?;
        if self.config.build.rss.enable {
            templates.add_internal_rss().map_err(BuildError::Template)?;
        }
        templates.normalize();
        log!("build"; "loaded {count} templates");

        self.templates = templates;
        self.finish(Phase::TemplatePrepare);
        Ok(())
    }

    fn materialize_pages(&mut self) -> Result<(), BuildError> {
        let mut pages = Vec::with_capacity(self.files.len());
        for file in &self.files {
            if let Some(page) = self.materialize(file)? {
                pages.push(page);
            }
        }
        sort_pages(&mut pages);
        self.materialized = pages;
        self.finish(Phase::PageMaterialize);
        Ok(())
    }

    /// One page from one content file; `None` for a skipped draft.
    fn materialize(&self, file: &ContentFile) -> Result<Option<Page>, BuildError> {
        let text = String::from_utf8_lossy(&file.bytes);
        let (front, body) = front_matter::parse(&file.info.path, &text).map_err(BuildError::FrontMatter)?;
        if front.draft && !self.config.build.drafts {
            return Ok(None);
        }

        let sections: Vec<String> = file
            .info
            .dir()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        let kind = match (file.info.is_section_index(), sections.is_empty()) {
            (true, true) => Kind::Home,
            (true, false) => Kind::Section,
            (false, _) => Kind::Page,
        };

        let mut page = Page::new(kind, &file.lang);
        page.title = match (front.title, kind) {
            (Some(title), _) => title,
            (None, Kind::Home) => self.config.base.title.clone(),
            (None, Kind::Section) => taxonomy::title_case(sections.last().map_or("", String::as_str)),
            (None, _) => String::new(),
        };
        page.content_type = front
            .content_type
            .or_else(|| sections.first().cloned())
            .unwrap_or_else(|| "page".to_owned());
        page.sections = sections;
        page.date = front.date;
        page.draft = front.draft;
        page.weight = front.weight;
        page.slug = front.slug;
        page.url = front.url;
        page.layout = front.layout.unwrap_or_default();
        page.headless = front.headless;
        page.params = front.params;
        page.shortcodes = shortcode::shortcode_names(&body);
        page.raw_content = body;
        page.file = Some(file.info.clone());

        if !page.headless {
            self.assign_paths(&mut page);
        }

        let bundle_dir = file.info.dir();
        page.resources = file
            .resources
            .iter()
            .map(|resource| Resource {
                source: resource.source.clone(),
                rel_path: if page.headless {
                    resource.rel_path.clone()
                } else {
                    paths::resource_target(&page.target_path, bundle_dir, &resource.rel_path)
                },
            })
            .collect();

        Ok(Some(page))
    }

    fn assign_paths(&self, page: &mut Page) {
        page.target_path = paths::target_path(page, self.lang(), self.config.build.ugly_urls);
        page.rel_permalink = paths::rel_permalink(&page.target_path);
        page.permalink = paths::permalink(self.base_url(), &page.rel_permalink);
    }

    /// Prev/next between neighbouring rendered regular pages, in sort order.
    fn link_pages(&mut self) {
        let lang = self.config.base.language.clone();
        let linked: Vec<usize> = self
            .materialized
            .iter()
            .enumerate()
            .filter(|(_, p)| p.kind == Kind::Page && p.lang == lang && !p.headless)
            .map(|(i, _)| i)
            .collect();

        for pair in linked.windows(2) {
            let (first, second) = (pair[0], pair[1]);
            let next = self.materialized[second].link();
            let prev = self.materialized[first].link();
            self.materialized[first].next = Some(next);
            self.materialized[second].prev = Some(prev);
        }
        self.finish(Phase::LinkPages);
    }

    fn build_metadata(&mut self) -> Result<(), BuildError> {
        if self.materialized.is_empty() {
            return Err(BuildError::NoContentFound {
                dir: self.config.build.content.clone(),
            });
        }

        let mut graph = PageGraph::new(self.lang());
        for page in std::mem::take(&mut self.materialized) {
            graph.add_page(Arc::new(page));
        }
        graph.refresh_page_caches();

        let regular = graph.regular_pages().to_vec();
        self.taxonomies = taxonomy::collect_taxonomies(&self.config.build.taxonomies, &regular);
        self.sections = taxonomy::collect_sections(&regular);

        for page in self.missing_index_pages(&graph) {
            graph.add_page(Arc::new(page));
        }
        graph.refresh_page_caches();

        let graph = Arc::new(graph);
        let funcs = self.templates.funcs_mut();
        funcs.insert("ref", reference_func(Arc::clone(&graph), true));
        funcs.insert("relref", reference_func(Arc::clone(&graph), false));

        // Readers run in parallel from here on; never let them race the build.
        let index = graph.reference_index();
        log!("build"; "indexed {} references", index.len());

        self.graph = graph;
        self.finish(Phase::BuildMetadata);
        Ok(())
    }

    /// Home, section, taxonomy and term pages without a backing `_index` file.
    fn missing_index_pages(&self, graph: &PageGraph) -> Vec<Page> {
        let exists = |sections: &[&str]| {
            graph
                .index_pages()
                .iter()
                .any(|p| p.sections.iter().map(String::as_str).eq(sections.iter().copied()))
        };
        let newest = |pages: &[Arc<Page>]| pages.iter().filter_map(|p| p.date).max();
        let mut created = Vec::new();

        if !exists(&[]) {
            let mut home = Page::new(Kind::Home, self.lang());
            home.title = self.config.base.title.clone();
            home.date = newest(graph.regular_pages());
            created.push(home);
        }

        for (name, pages) in &self.sections {
            if exists(&[name.as_str()]) {
                continue;
            }
            let mut section = Page::new(Kind::Section, self.lang());
            section.sections = vec![name.clone()];
            section.title = taxonomy::title_case(name);
            section.content_type = name.clone();
            section.date = newest(pages);
            created.push(section);
        }

        for taxonomy in &self.taxonomies {
            let plural = taxonomy.plural.as_str();
            if !exists(&[plural]) {
                let mut terms = Page::new(Kind::TaxonomyTerm, self.lang());
                terms.sections = vec![taxonomy.plural.clone()];
                terms.title = taxonomy::title_case(plural);
                terms.content_type = taxonomy.plural.clone();
                terms.taxonomy = Some(TaxonomyRef {
                    singular: taxonomy.singular.clone(),
                    plural: taxonomy.plural.clone(),
                    term: None,
                });
                created.push(terms);
            }

            for (key, term) in &taxonomy.terms {
                if exists(&[plural, key.as_str()]) {
                    continue;
                }
                let mut page = Page::new(Kind::Taxonomy, self.lang());
                page.sections = vec![taxonomy.plural.clone(), key.clone()];
                page.title = taxonomy::title_case(&term.name);
                page.content_type = taxonomy.plural.clone();
                page.date = newest(&term.pages);
                page.taxonomy = Some(TaxonomyRef {
                    singular: taxonomy.singular.clone(),
                    plural: taxonomy.plural.clone(),
                    term: Some((key.clone(), term.name.clone())),
                });
                created.push(page);
            }
        }

        for page in &mut created {
            self.assign_paths(page);
        }
        created
    }

    /// Shortcodes and markdown for every page of the active language.
    fn expand_shortcodes(&mut self) -> Result<(), BuildError> {
        let site = Value::Object(context::site_base(self.config));
        let templates = &self.templates;
        let lang = self.lang();

        self.graph
            .raw_all_pages()
            .par_iter()
            .filter(|page| page.file.is_some() && page.lang == lang)
            .try_for_each(|page| {
                let data = Value::Object(context::summary(page));
                let html = Expander::new(templates, &data, &site)
                    .render(&page.raw_content)
                    .map_err(|message| BuildError::Shortcode {
                        page: page.source_ref(),
                        message,
                    })?;
                page.set_content(html);
                Ok::<_, BuildError>(())
            })?;

        self.finish(Phase::ShortcodeExpand);
        Ok(())
    }

    fn absolutize_urls(&mut self) {
        if let Some(base) = self.base_url() {
            self.graph
                .raw_all_pages()
                .par_iter()
                .filter(|page| page.file.is_some())
                .for_each(|page| page.set_content(absurl::absolutize(&page.content(), base)));
        }
        self.finish(Phase::AbsoluteUrlRewrite);
    }

    // ------------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------------

    fn render(&mut self) -> Result<(), BuildError> {
        self.site_value = context::site_value(
            self.config,
            &self.taxonomies,
            &self.sections,
            self.graph.regular_pages(),
        );

        self.render_indexes()?;
        self.render_lists()?;
        self.render_pages()?;
        self.render_home()?;
        Ok(())
    }

    fn renderer(&self) -> Renderer<'_> {
        Renderer::new(&self.templates, &self.site_value, self.base_url())
    }

    /// Taxonomy term pages and the term lists of each taxonomy.
    fn render_indexes(&mut self) -> Result<(), BuildError> {
        let mut artifacts = Vec::new();
        {
            let renderer = self.renderer();
            for page in self.graph.find_pages_by_kind(Kind::Taxonomy) {
                let Some(taxonomy) = self.taxonomy_of(&page) else {
                    continue;
                };
                let term = page
                    .taxonomy
                    .as_ref()
                    .and_then(|t| t.term.as_ref())
                    .and_then(|(key, _)| taxonomy.terms.get(key));
                let pages = term.map(|t| t.pages.clone()).unwrap_or_default();
                let extra = Map::from_iter([
                    ("Singular".to_owned(), json!(taxonomy.singular)),
                    ("Plural".to_owned(), json!(taxonomy.plural)),
                    ("Term".to_owned(), json!(term.map(|t| t.name.as_str()).unwrap_or(page.title.as_str()))),
                ]);
                artifacts.extend(renderer.render(&page, &pages, extra, true)?);
            }

            for page in self.graph.find_pages_by_kind(Kind::TaxonomyTerm) {
                let Some(taxonomy) = self.taxonomy_of(&page) else {
                    continue;
                };
                let extra = Map::from_iter([
                    ("Singular".to_owned(), json!(taxonomy.singular)),
                    ("Plural".to_owned(), json!(taxonomy.plural)),
                    ("Terms".to_owned(), self.terms_value(taxonomy)),
                ]);
                artifacts.extend(renderer.render(&page, &[], extra, false)?);
            }
        }
        self.artifacts.extend(artifacts);
        self.finish(Phase::RenderIndexes);
        Ok(())
    }

    fn taxonomy_of(&self, page: &Page) -> Option<&Taxonomy> {
        let plural = &page.taxonomy.as_ref()?.plural;
        self.taxonomies.iter().find(|t| &t.plural == plural)
    }

    fn terms_value(&self, taxonomy: &Taxonomy) -> Value {
        let terms = taxonomy
            .ordered_terms()
            .into_iter()
            .map(|(key, term)| {
                let page = self.graph.get_page(Kind::Taxonomy, &[taxonomy.plural.as_str(), key]);
                json!({
                    "Name": term.name,
                    "Key": key,
                    "Count": term.pages.len(),
                    "Permalink": page.as_ref().map(|p| p.permalink.clone()).unwrap_or_default(),
                    "RelPermalink": page.as_ref().map(|p| p.rel_permalink.clone()).unwrap_or_default(),
                    "Pages": context::summaries(&term.pages),
                })
            })
            .collect();
        Value::Array(terms)
    }

    fn render_lists(&mut self) -> Result<(), BuildError> {
        let mut artifacts = Vec::new();
        {
            let renderer = self.renderer();
            for page in self.graph.find_pages_by_kind(Kind::Section) {
                let mut pages: Vec<Arc<Page>> = self
                    .graph
                    .regular_pages()
                    .iter()
                    .filter(|p| p.sections.starts_with(&page.sections))
                    .cloned()
                    .collect();
                sort_pages(&mut pages);
                artifacts.extend(renderer.render(&page, &pages, Map::new(), true)?);
            }
        }
        self.artifacts.extend(artifacts);
        self.finish(Phase::RenderLists);
        Ok(())
    }

    fn render_pages(&mut self) -> Result<(), BuildError> {
        let pages = self.graph.regular_pages();
        let progress = ProgressBars::new_filtered(&[("pages", pages.len())]);

        let rendered: Vec<Vec<Artifact>> = {
            let renderer = self.renderer();
            pages
                .par_iter()
                .map(|page| {
                    let artifacts = renderer.render(page, &[], Map::new(), true);
                    if let Some(progress) = &progress {
                        progress.inc_by_name("pages");
                    }
                    artifacts
                })
                .collect::<Result<_, _>>()?
        };
        drop(progress);

        self.artifacts.extend(rendered.into_iter().flatten());
        self.finish(Phase::RenderPages);
        Ok(())
    }

    fn render_home(&mut self) -> Result<(), BuildError> {
        let mut artifacts = Vec::new();
        if let Some(home) = self.graph.find_first_page_by_kind(Kind::Home) {
            let mut pages = self.graph.regular_pages().to_vec();
            sort_pages(&mut pages);
            pages.truncate(self.config.build.home_pages);
            artifacts = self.renderer().render(&home, &pages, Map::new(), true)?;
        }
        self.artifacts.extend(artifacts);
        self.finish(Phase::RenderHome);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Output
    // ------------------------------------------------------------------------

    fn write(&mut self, sink: &dyn Sink) -> Result<(), BuildError> {
        let minify = self.config.build.minify;

        let feeds = self.artifacts.iter().filter(|a| a.kind == ArtifactKind::Feed).count();
        let progress = ProgressBars::new_filtered(&[("html", self.artifacts.len() - feeds), ("feeds", feeds)]);

        self.artifacts.par_iter().try_for_each(|artifact| {
            let (bytes, counter) = match artifact.kind {
                ArtifactKind::Html => (minify_html(&artifact.bytes, minify), "html"),
                ArtifactKind::Feed => (artifact.bytes.as_slice().into(), "feeds"),
            };
            sink.write(&artifact.path, &bytes).map_err(io_error(&artifact.path))?;
            if let Some(progress) = &progress {
                progress.inc_by_name(counter);
            }
            Ok::<_, BuildError>(())
        })?;
        drop(progress);

        let cache = self.graph.resources();
        let mut resources = 0;
        for page in self.graph.pages() {
            for resource in &page.resources {
                let bytes = cache
                    .get_or_load(&resource.rel_path, &resource.source)
                    .map_err(io_error(&resource.source))?;
                sink.write(&resource.rel_path, &bytes).map_err(io_error(&resource.rel_path))?;
                resources += 1;
            }
        }
        self.resources = resources;

        log!("build"; "wrote {} files", self.artifacts.len() + resources);
        self.finish(Phase::Write);
        Ok(())
    }

    /// Report pages whose description is missing or short.
    fn analyze(&self) {
        for page in self.graph.regular_pages() {
            let description = page
                .params
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or_default();
            if description.chars().count() < MIN_DESCRIPTION_LEN {
                log!("check"; "{}: description shorter than {MIN_DESCRIPTION_LEN} characters", page.source_ref());
            }
        }
        for taxonomy in &self.taxonomies {
            let mut terms: Vec<&str> = taxonomy.terms.values().map(|t| t.name.as_str()).collect();
            terms.sort_unstable();
            log!("check"; "{}: {}", taxonomy.plural, terms.join(", "));
        }
    }

}

/// Resolve `reference` in a built graph, as `ref` does in templates.
pub fn resolve_reference(graph: &PageGraph, context: Option<&Page>, reference: &str) -> Result<Arc<Page>, BuildError> {
    Ok(graph.get_page_new(context, reference)?)
}

fn io_error(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> BuildError {
    let path = path.into();
    move |source| BuildError::Io { path, source }
}

/// Template function resolving a page reference to its permalink
/// (`absolute`) or relative permalink. Called as `ref .Page "post.md"`; the
/// first argument supplies `.Sections` and `.SourceRef` as resolution context.
fn reference_func(
    graph: Arc<PageGraph>,
    absolute: bool,
) -> impl Fn(&[Value]) -> Result<Value, FuncError> + Send + Sync + 'static {
    move |args: &[Value]| {
        let [context, Value::String(reference)] = args else {
            return Err("expected a page and a reference string".into());
        };
        let sections = context.get("Sections").map(string_list).unwrap_or_default();
        let source_ref = context
            .get("SourceRef")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned();
        let resolving = (!sections.is_empty() || !source_ref.is_empty()).then_some((sections.as_slice(), source_ref));

        let page = graph
            .resolve_ref(resolving, reference)
            .map_err(|err| FuncError(err.to_string()))?;
        let link = if absolute { &page.permalink } else { &page.rel_permalink };
        Ok(Value::String(link.clone()))
    }
}

// ============================================================================
// Tests
// ============================================================================
