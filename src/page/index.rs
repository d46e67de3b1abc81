//! Reference index: lookup keys → page, or an ambiguity marker.
//!
//! Keys registered per page:
//!
//! | Key                          | Pages                                 |
//! |------------------------------|---------------------------------------|
//! | `/<lang>/<source path>`      | regular + headless, every language    |
//! | `/<source path>`             | regular + headless, active language   |
//! | logical name (`post.md`)     | regular + headless, active language   |
//! | base name (`post`)           | ... or dir and dir name for `index`   |
//! | `<dir>/<base name>`          | regular + headless, active language   |
//! | `/<source path>`, `/<sections>` | index pages                        |
//!
//! The first page registered under a key owns it; a different page under the
//! same key turns it into [`Lookup::Ambiguous`] for good.

use super::Page;
use crate::utils::path;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// Result of a key lookup.
#[derive(Debug, Clone)]
pub enum Lookup {
    Resolved(Arc<Page>),
    /// More than one distinct page registered this key.
    Ambiguous,
}

/// Reference resolution failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefError {
    #[error("page reference {reference:?} is ambiguous")]
    Ambiguous { reference: String },

    #[error("{}", not_found_message(.reference, .context.as_deref()))]
    NotFound {
        reference: String,
        /// Source ref of the page the reference was resolved against.
        context: Option<String>,
    },
}

fn not_found_message(reference: &str, context: Option<&str>) -> String {
    match context {
        Some(context) => format!("failed to resolve page {reference:?} relative to page {context:?}"),
        None => format!("failed to resolve page {reference:?}"),
    }
}

#[derive(Debug, Default)]
pub struct ReferenceIndex {
    entries: FxHashMap<String, Lookup>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the full index.
    ///
    /// `candidates` are regular and headless pages of every language;
    /// `index_pages` are the active language's home/section/taxonomy pages.
    pub fn build<'a>(
        active_lang: &str,
        candidates: impl IntoIterator<Item = &'a Arc<Page>>,
        index_pages: impl IntoIterator<Item = &'a Arc<Page>>,
    ) -> Self {
        let mut index = Self::new();

        for page in candidates {
            let source_ref = page.source_ref();

            // cross-language reference
            index.insert(&path::join(&[format!("/{}", page.lang), source_ref.clone()]), page);

            if page.lang != active_lang {
                continue;
            }

            index.insert(&source_ref, page);

            let Some(file) = &page.file else {
                continue;
            };
            index.insert(&file.logical_name, page);

            let dir = path::split(&source_ref).0.trim_end_matches('/');
            if file.base_name == "index" {
                index.insert(dir, page);
                index.insert(path::base(dir), page);
            } else {
                index.insert(&file.base_name, page);
            }

            index.insert(&path::join(&[dir, file.base_name.as_str()]), page);
        }

        for page in index_pages {
            index.insert(&page.source_ref(), page);
            index.insert(&format!("/{}", path::join(&page.sections)), page);
        }

        index
    }

    /// Register `page` under `key`. Empty and `.` keys are ignored.
    pub fn insert(&mut self, key: &str, page: &Arc<Page>) {
        if key.is_empty() || key == "." {
            return;
        }
        let conflict = match self.entries.get(key) {
            None => {
                self.entries
                    .insert(key.to_owned(), Lookup::Resolved(Arc::clone(page)));
                return;
            }
            Some(Lookup::Resolved(existing)) => !Arc::ptr_eq(existing, page),
            Some(Lookup::Ambiguous) => false,
        };
        if conflict {
            self.entries.insert(key.to_owned(), Lookup::Ambiguous);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Lookup> {
        self.entries.get(key)
    }

    /// Resolve `key`: `Ok(None)` when absent, an error when ambiguous.
    pub fn resolve(&self, key: &str) -> Result<Option<Arc<Page>>, RefError> {
        match self.entries.get(key) {
            None => Ok(None),
            Some(Lookup::Resolved(page)) => Ok(Some(Arc::clone(page))),
            Some(Lookup::Ambiguous) => Err(RefError::Ambiguous {
                reference: key.to_owned(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

// ============================================================================
// Tests
// ============================================================================
