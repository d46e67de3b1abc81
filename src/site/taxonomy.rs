//! Taxonomy and section groupings.

use crate::page::{Page, sort_pages};
use crate::utils::value::string_list;
use quire_template::urlize;
use std::{collections::BTreeMap, sync::Arc};

/// Pages grouped under one term.
#[derive(Debug, Clone)]
pub struct Term {
    /// Display name as first written in front matter.
    pub name: String,
    pub pages: Vec<Arc<Page>>,
}

/// One classification axis, e.g. `tag` / `tags`.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    pub singular: String,
    pub plural: String,
    /// Keyed by the urlized term.
    pub terms: BTreeMap<String, Term>,
}

impl Taxonomy {
    /// Terms by page count descending, then key.
    pub fn ordered_terms(&self) -> Vec<(&str, &Term)> {
        let mut terms: Vec<(&str, &Term)> = self.terms.iter().map(|(k, t)| (k.as_str(), t)).collect();
        terms.sort_by(|a, b| b.1.pages.len().cmp(&a.1.pages.len()).then(a.0.cmp(b.0)));
        terms
    }
}

/// Group `pages` by each configured taxonomy (`singular → plural`), reading
/// terms from the page param named by the plural. Term pages are sorted.
pub fn collect_taxonomies(config: &BTreeMap<String, String>, pages: &[Arc<Page>]) -> Vec<Taxonomy> {
    config
        .iter()
        .map(|(singular, plural)| {
            let mut terms: BTreeMap<String, Term> = BTreeMap::new();
            for page in pages {
                let Some(value) = page.params.get(plural.as_str()) else {
                    continue;
                };
                for name in string_list(value) {
                    let key = urlize(&name);
                    if key.is_empty() {
                        continue;
                    }
                    let term = terms.entry(key).or_insert_with(|| Term {
                        name: name.clone(),
                        pages: Vec::new(),
                    });
                    if !term.pages.iter().any(|p| Arc::ptr_eq(p, page)) {
                        term.pages.push(Arc::clone(page));
                    }
                }
            }
            for term in terms.values_mut() {
                sort_pages(&mut term.pages);
            }
            Taxonomy {
                singular: singular.clone(),
                plural: plural.clone(),
                terms,
            }
        })
        .collect()
}

/// Group `pages` by first section; root-level pages are left out.
pub fn collect_sections(pages: &[Arc<Page>]) -> BTreeMap<String, Vec<Arc<Page>>> {
    let mut sections: BTreeMap<String, Vec<Arc<Page>>> = BTreeMap::new();
    for page in pages {
        let section = page.section();
        if !section.is_empty() {
            sections.entry(section.to_owned()).or_default().push(Arc::clone(page));
        }
    }
    for pages in sections.values_mut() {
        sort_pages(pages);
    }
    sections
}

/// Upper-case the first letter of every word.
pub fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::tests::page_at;
    use serde_json::json;

    fn tagged(path: &str, tags: serde_json::Value) -> Arc<Page> {
        let mut page = page_at(path, "en");
        page.params.insert("tags".into(), tags);
        Arc::new(page)
    }

    fn config() -> BTreeMap<String, String> {
        BTreeMap::from([("tag".to_owned(), "tags".to_owned())])
    }

    #[test]
    fn test_collect_taxonomies_groups_by_urlized_term() {
        let pages = vec![
            tagged("a.md", json!(["Rust Lang", "web"])),
            tagged("b.md", json!("rust lang")),
            tagged("c.md", json!(["web", "web"])),
        ];
        let taxonomies = collect_taxonomies(&config(), &pages);
        assert_eq!(taxonomies.len(), 1);

        let tags = &taxonomies[0];
        assert_eq!(tags.singular, "tag");
        let keys: Vec<&str> = tags.terms.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["rust-lang", "web"]);
        assert_eq!(tags.terms["rust-lang"].name, "Rust Lang");
        assert_eq!(tags.terms["rust-lang"].pages.len(), 2);
        // duplicate term on one page counted once
        assert_eq!(tags.terms["web"].pages.len(), 2);
    }

    #[test]
    fn test_ordered_terms() {
        let pages = vec![
            tagged("a.md", json!(["b", "a"])),
            tagged("b.md", json!(["b"])),
            tagged("c.md", json!(["c"])),
        ];
        let taxonomies = collect_taxonomies(&config(), &pages);
        let order: Vec<&str> = taxonomies[0].ordered_terms().iter().map(|(k, _)| *k).collect();
        assert_eq!(order, vec!["b", "a", "c"]);
    }

    #[test]
    fn test_collect_sections() {
        let pages: Vec<Arc<Page>> = ["blog/b.md", "blog/a.md", "docs/x/y.md", "root.md"]
            .iter()
            .map(|p| Arc::new(page_at(p, "en")))
            .collect();
        let sections = collect_sections(&pages);
        let keys: Vec<&str> = sections.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["blog", "docs"]);
        assert_eq!(sections["blog"][0].source_ref(), "/blog/a.md");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("rust lang"), "Rust Lang");
        assert_eq!(title_case("blog"), "Blog");
        assert_eq!(title_case(""), "");
    }
}
