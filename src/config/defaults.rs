//! Default values for configuration fields.
//!
//! These functions are used by serde for default deserialization.

// ============================================================================
// Common Defaults
// ============================================================================

pub fn r#false() -> bool {
    false
}

// ============================================================================
// [base] Section Defaults
// ============================================================================

pub mod base {
    pub fn url() -> Option<String> {
        None
    }

    pub fn author() -> String {
        String::new()
    }

    pub fn language() -> String {
        "en".into()
    }
}

// ============================================================================
// [build] Section Defaults
// ============================================================================

pub mod build {
    use std::{collections::BTreeMap, path::PathBuf};

    pub fn root() -> Option<PathBuf> {
        None
    }

    pub fn content() -> PathBuf {
        "content".into()
    }

    pub fn layouts() -> PathBuf {
        "layouts".into()
    }

    pub fn themes() -> PathBuf {
        "themes".into()
    }

    pub fn theme() -> Option<String> {
        None
    }

    pub fn output() -> PathBuf {
        "public".into()
    }

    /// singular → plural
    pub fn taxonomies() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("category".into(), "categories".into()),
            ("tag".into(), "tags".into()),
        ])
    }

    pub fn home_pages() -> usize {
        9
    }
}
