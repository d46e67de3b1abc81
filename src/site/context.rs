//! Template data: pages and the site as JSON values.
//!
//! Field names follow template conventions (`.Title`, `.Site.Params`).
//! Nested page lists carry page summaries without `.Site` or `.Pages`.

use super::taxonomy::Taxonomy;
use crate::config::SiteConfig;
use crate::page::{Page, PageLink};
use serde_json::{Map, Value, json};
use std::{collections::BTreeMap, sync::Arc};

/// Site fields available before rendering: config-derived only.
pub fn site_base(config: &SiteConfig) -> Map<String, Value> {
    let params = Value::Object(config.params());
    let mut site = Map::new();
    site.insert("Title".into(), json!(config.base.title));
    site.insert("BaseURL".into(), json!(config.base.url.clone().unwrap_or_default()));
    site.insert("Author".into(), json!(config.base.author));
    site.insert(
        "Language".into(),
        json!({"Lang": config.base.language, "Params": params}),
    );
    site.insert("Params".into(), params);
    site
}

/// Full site object: base fields plus groupings of rendered pages.
pub fn site_value(
    config: &SiteConfig,
    taxonomies: &[Taxonomy],
    sections: &BTreeMap<String, Vec<Arc<Page>>>,
    regular_pages: &[Arc<Page>],
) -> Value {
    let mut site = site_base(config);

    let taxonomies: Map<String, Value> = taxonomies
        .iter()
        .map(|taxonomy| {
            let terms: Map<String, Value> = taxonomy
                .terms
                .iter()
                .map(|(key, term)| (key.clone(), summaries(&term.pages)))
                .collect();
            (taxonomy.plural.clone(), Value::Object(terms))
        })
        .collect();
    let sections: Map<String, Value> = sections
        .iter()
        .map(|(name, pages)| (name.clone(), summaries(pages)))
        .collect();

    site.insert("Taxonomies".into(), Value::Object(taxonomies));
    site.insert("Sections".into(), Value::Object(sections));
    site.insert("Pages".into(), summaries(regular_pages));
    site.insert(
        "LastChange".into(),
        json!(regular_pages.iter().filter_map(|p| p.date).max().map(|d| d.to_rfc3339())),
    );
    Value::Object(site)
}

pub fn summaries(pages: &[Arc<Page>]) -> Value {
    Value::Array(pages.iter().map(|p| Value::Object(summary(p))).collect())
}

/// Page fields without `.Site` and `.Pages`.
pub fn summary(page: &Page) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("Title".into(), json!(page.title));
    map.insert("Kind".into(), json!(page.kind.as_str()));
    map.insert("Type".into(), json!(page.content_type));
    map.insert("Section".into(), json!(page.section()));
    map.insert("Sections".into(), json!(page.sections));
    map.insert("Lang".into(), json!(page.lang));
    map.insert("Draft".into(), json!(page.draft));
    map.insert("Weight".into(), json!(page.weight));
    map.insert(
        "Date".into(),
        json!(page.date.map(|d| d.to_rfc3339()).unwrap_or_default()),
    );
    map.insert(
        "RSSDate".into(),
        json!(page.date.map(|d| d.to_rfc2822()).unwrap_or_default()),
    );
    map.insert("Params".into(), Value::Object(page.params.clone()));
    map.insert("Content".into(), json!(page.content()));
    map.insert("Permalink".into(), json!(page.permalink));
    map.insert("RelPermalink".into(), json!(page.rel_permalink));
    map.insert("SourceRef".into(), json!(page.source_ref()));
    map.insert("Prev".into(), link(page.prev.as_ref()));
    map.insert("Next".into(), link(page.next.as_ref()));
    map
}

fn link(link: Option<&PageLink>) -> Value {
    match link {
        Some(link) => json!({
            "Title": link.title,
            "Permalink": link.permalink,
            "RelPermalink": link.rel_permalink,
        }),
        None => Value::Null,
    }
}

/// Dot for rendering `page`: summary plus `.Site`, `.Pages` and `extra`.
pub fn page_value(page: &Page, site: &Value, pages: &[Arc<Page>], extra: Map<String, Value>) -> Value {
    let mut map = summary(page);
    map.insert("Site".into(), site.clone());
    map.insert("Pages".into(), summaries(pages));
    map.extend(extra);
    Value::Object(map)
}

// ============================================================================
// Tests
// ============================================================================
