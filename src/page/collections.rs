//! The page graph: the raw page sequence, its derived views and the lazily
//! built reference index.
//!
//! Views are recomputed by [`PageGraph::refresh_page_caches`], which must run
//! after any add/remove/replace before the graph is queried again. The
//! reference index is built on the first lookup after a refresh and then
//! shared read-only until the next refresh.

use super::{Kind, Page, RefError, ReferenceIndex, ResourceCache};
use crate::utils::path;
use parking_lot::RwLock;
use std::{borrow::Borrow, cmp::Ordering, sync::Arc};

#[derive(Debug)]
pub struct PageGraph {
    /// Active language of this build.
    lang: String,

    /// Every page of every language, headless included. Source of truth.
    raw_all_pages: Vec<Arc<Page>>,

    /// Active language, headless excluded.
    pages: Vec<Arc<Page>>,
    /// All languages, headless excluded.
    all_pages: Vec<Arc<Page>>,
    /// Active language, non-regular pages.
    index_pages: Vec<Arc<Page>>,
    /// Active language, regular pages.
    regular_pages: Vec<Arc<Page>>,
    /// All languages, regular pages.
    all_regular_pages: Vec<Arc<Page>>,
    /// Addressable pages without standalone output.
    headless_pages: Vec<Arc<Page>>,

    /// `None` until first lookup after a refresh.
    index: RwLock<Option<Arc<ReferenceIndex>>>,

    resources: ResourceCache,
}

impl PageGraph {
    pub fn new(lang: &str) -> Self {
        Self {
            lang: lang.to_owned(),
            raw_all_pages: Vec::new(),
            pages: Vec::new(),
            all_pages: Vec::new(),
            index_pages: Vec::new(),
            regular_pages: Vec::new(),
            all_regular_pages: Vec::new(),
            headless_pages: Vec::new(),
            index: RwLock::new(None),
            resources: ResourceCache::new(),
        }
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    pub fn add_page(&mut self, page: Arc<Page>) {
        self.raw_all_pages.push(page);
    }

    /// Remove the page backed by `filename` (path relative to the content
    /// root), dropping its cached resources.
    pub fn remove_page_filename(&mut self, filename: &str) {
        let position = self.raw_all_pages.iter().position(|page| {
            page.file
                .as_ref()
                .is_some_and(|file| file.path == filename)
        });
        if let Some(i) = position {
            let page = self.raw_all_pages.remove(i);
            self.clear_resource_cache_for_page(&page);
        }
    }

    /// Remove `page` by identity, dropping its cached resources.
    pub fn remove_page(&mut self, page: &Arc<Page>) {
        if let Some(i) = self.raw_all_pages.iter().position(|p| Arc::ptr_eq(p, page)) {
            let page = self.raw_all_pages.remove(i);
            self.clear_resource_cache_for_page(&page);
        }
    }

    /// Remove any page with the same source file (or the same identity for
    /// file-less pages), then add `page`.
    pub fn replace_page(&mut self, page: Arc<Page>) {
        match &page.file {
            Some(file) => self.remove_page_filename(&file.path),
            None => self.remove_page(&page),
        }
        self.add_page(page);
    }

    /// Drop every cached resource under the page's output directory, or under
    /// its bundle directory when the page has no output.
    fn clear_resource_cache_for_page(&self, page: &Page) {
        if page.resources.is_empty() {
            return;
        }
        let dir = if page.target_path.is_empty() {
            page.file.as_ref().map_or("", |file| file.dir())
        } else {
            path::split(&page.target_path).0.trim_end_matches('/')
        };
        if dir.is_empty() {
            for resource in &page.resources {
                self.resources.delete_by_prefix(&resource.rel_path);
            }
        } else {
            self.resources.delete_by_prefix(&format!("{dir}/"));
        }
    }

    /// Recompute every view from the raw sequence and reset the reference
    /// index to be rebuilt on next lookup.
    pub fn refresh_page_caches(&mut self) {
        let lang = self.lang.as_str();
        let visible = || self.raw_all_pages.iter().filter(|p| !p.headless);

        self.all_pages = visible().cloned().collect();
        self.pages = visible().filter(|p| p.lang == lang).cloned().collect();
        self.index_pages = self
            .pages
            .iter()
            .filter(|p| p.kind != Kind::Page)
            .cloned()
            .collect();
        self.regular_pages = self
            .pages
            .iter()
            .filter(|p| p.kind == Kind::Page)
            .cloned()
            .collect();
        self.all_regular_pages = self
            .all_pages
            .iter()
            .filter(|p| p.kind == Kind::Page)
            .cloned()
            .collect();
        self.headless_pages = self
            .raw_all_pages
            .iter()
            .filter(|p| p.headless)
            .cloned()
            .collect();

        *self.index.get_mut() = None;
    }

    // ------------------------------------------------------------------------
    // Reference index
    // ------------------------------------------------------------------------

    /// The reference index, building it if this is the first lookup since the
    /// last refresh. Readers never observe a partially built index.
    pub fn reference_index(&self) -> Arc<ReferenceIndex> {
        // Fast path: read lock only
        if let Some(index) = self.index.read().as_ref() {
            return Arc::clone(index);
        }

        let mut slot = self.index.write();
        // Double-check after acquiring write lock
        if let Some(index) = slot.as_ref() {
            return Arc::clone(index);
        }

        let candidates = self.all_regular_pages.iter().chain(&self.headless_pages);
        let index = Arc::new(ReferenceIndex::build(&self.lang, candidates, &self.index_pages));
        *slot = Some(Arc::clone(&index));
        index
    }

    pub fn is_index_built(&self) -> bool {
        self.index.read().is_some()
    }

    /// Resolve `reference`, optionally relative to `context`.
    ///
    /// Tried in order, first hit wins:
    /// 1. `reference` verbatim, if it starts with `/`
    /// 2. the context page's sections joined with `reference`
    /// 3. `/` + `reference`, if it does not start with `/`
    /// 4. `reference` without its leading `/`
    pub fn get_page_new(&self, context: Option<&Page>, reference: &str) -> Result<Arc<Page>, RefError> {
        self.resolve_ref(
            context.map(|page| (page.sections.as_slice(), page.source_ref())),
            reference,
        )
    }

    /// Like [`get_page_new`](Self::get_page_new), with the context given as
    /// its sections and source ref.
    pub fn resolve_ref(&self, context: Option<(&[String], String)>, reference: &str) -> Result<Arc<Page>, RefError> {
        let index = self.reference_index();
        let mut ambiguous = false;
        let mut attempt = |key: &str| match index.resolve(key) {
            Ok(found) => found,
            Err(_) => {
                ambiguous = true;
                None
            }
        };

        let absolute = reference.starts_with('/');

        if absolute && let Some(page) = attempt(reference) {
            return Ok(page);
        }

        if let Some((sections, _)) = &context {
            let relative = path::join(&["/", sections.join("/").as_str(), reference]);
            if let Some(page) = attempt(&relative) {
                return Ok(page);
            }
        }

        if !absolute && let Some(page) = attempt(&format!("/{reference}")) {
            return Ok(page);
        }

        let bare = reference.strip_prefix('/').unwrap_or(reference);
        if let Some(page) = attempt(bare) {
            return Ok(page);
        }

        if ambiguous {
            return Err(RefError::Ambiguous {
                reference: reference.to_owned(),
            });
        }
        Err(RefError::NotFound {
            reference: reference.to_owned(),
            context: context.map(|(_, source_ref)| source_ref),
        })
    }

    /// Old-style lookup: the page of `kind` at `/` + joined `sections`.
    pub fn get_page(&self, kind: Kind, sections: &[&str]) -> Option<Arc<Page>> {
        let reference = format!("/{}", path::join(sections));
        self.get_page_new(None, &reference)
            .ok()
            .filter(|page| page.kind == kind)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Active-language pages of `kind`.
    pub fn find_pages_by_kind(&self, kind: Kind) -> Vec<Arc<Page>> {
        self.pages.iter().filter(|p| p.kind == kind).cloned().collect()
    }

    pub fn find_first_page_by_kind(&self, kind: Kind) -> Option<Arc<Page>> {
        self.pages.iter().find(|p| p.kind == kind).cloned()
    }

    /// Pages (any language, headless included) whose content uses `shortcode`.
    pub fn find_pages_by_shortcode(&self, shortcode: &str) -> Vec<Arc<Page>> {
        self.raw_all_pages
            .iter()
            .filter(|p| p.shortcodes.contains(shortcode))
            .cloned()
            .collect()
    }

    pub fn raw_all_pages(&self) -> &[Arc<Page>] {
        &self.raw_all_pages
    }

    pub fn pages(&self) -> &[Arc<Page>] {
        &self.pages
    }

    pub fn all_pages(&self) -> &[Arc<Page>] {
        &self.all_pages
    }

    pub fn index_pages(&self) -> &[Arc<Page>] {
        &self.index_pages
    }

    pub fn regular_pages(&self) -> &[Arc<Page>] {
        &self.regular_pages
    }

    pub fn all_regular_pages(&self) -> &[Arc<Page>] {
        &self.all_regular_pages
    }

    pub fn headless_pages(&self) -> &[Arc<Page>] {
        &self.headless_pages
    }

    pub fn resources(&self) -> &ResourceCache {
        &self.resources
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Default page order: weight ascending (unset last), date newest first
/// (dated before undated), then title and source path.
pub fn sort_pages<P: Borrow<Page>>(pages: &mut [P]) {
    pages.sort_by(|a, b| compare_pages(a.borrow(), b.borrow()));
}

fn compare_pages(a: &Page, b: &Page) -> Ordering {
    let by_weight = match (a.weight, b.weight) {
        (Some(wa), Some(wb)) => wa.cmp(&wb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    let by_date = match (a.date, b.date) {
        (Some(da), Some(db)) => db.cmp(&da),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_weight
        .then(by_date)
        .then_with(|| a.title.cmp(&b.title))
        .then_with(|| a.source_ref().cmp(&b.source_ref()))
}

// ============================================================================
// Tests
// ============================================================================
