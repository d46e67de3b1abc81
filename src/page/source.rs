//! Content discovery.
//!
//! A [`ContentSource`] yields every content file with its naming already
//! derived from filename conventions; the build never walks directories
//! itself. [`FsContentSource`] reads a content root on disk.

use super::{FileInfo, Resource};
use crate::utils::{path, walk};
use std::{
    io,
    path::{Path, PathBuf},
};

/// Extensions treated as page content.
const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// One discovered content file.
#[derive(Debug, Clone)]
pub struct ContentFile {
    pub info: FileInfo,
    pub lang: String,
    pub bytes: Vec<u8>,
    /// Bundle resources, set for `index` files only.
    pub resources: Vec<Resource>,
}

impl ContentFile {
    /// Build from a slash path relative to the content root.
    pub fn new(rel_path: &str, bytes: impl Into<Vec<u8>>, default_lang: &str, languages: &[String]) -> Self {
        let (info, lang) = file_info(rel_path, languages);
        Self {
            info,
            lang: lang.unwrap_or_else(|| default_lang.to_owned()),
            bytes: bytes.into(),
            resources: Vec::new(),
        }
    }
}

pub trait ContentSource {
    fn content_files(&self) -> io::Result<Vec<ContentFile>>;
}

impl ContentSource for Vec<ContentFile> {
    fn content_files(&self) -> io::Result<Vec<ContentFile>> {
        Ok(self.clone())
    }
}

/// Whether `name` has a content extension.
pub fn is_content_file(name: &str) -> bool {
    name.rsplit_once('.')
        .is_some_and(|(_, ext)| CONTENT_EXTENSIONS.contains(&ext))
}

/// Derive file naming from a slash path relative to the content root.
///
/// `blog/post.fr.md` with `fr` among `languages` gives base name `post` and
/// language `fr`; an unknown suffix stays part of the base name.
pub fn file_info(rel_path: &str, languages: &[String]) -> (FileInfo, Option<String>) {
    let logical_name = path::base(rel_path).to_owned();
    let stem = path::strip_ext(&logical_name);

    let (base_name, lang) = match stem.rsplit_once('.') {
        Some((base, suffix)) if languages.iter().any(|l| l == suffix) => (base, Some(suffix.to_owned())),
        _ => (stem, None),
    };

    let info = FileInfo {
        path: rel_path.to_owned(),
        base_name: base_name.to_owned(),
        logical_name: logical_name.clone(),
    };
    (info, lang)
}

// ============================================================================
// Filesystem source
// ============================================================================

#[derive(Debug, Clone)]
pub struct FsContentSource {
    root: PathBuf,
    default_lang: String,
    languages: Vec<String>,
}

impl FsContentSource {
    pub fn new(root: &Path, default_lang: &str, languages: &[String]) -> Self {
        Self {
            root: root.to_path_buf(),
            default_lang: default_lang.to_owned(),
            languages: languages.to_vec(),
        }
    }
}

impl ContentSource for FsContentSource {
    fn content_files(&self) -> io::Result<Vec<ContentFile>> {
        let files: Vec<(String, PathBuf)> = walk::collect_all_files(&self.root)
            .into_iter()
            .filter_map(|file| Some((walk::relative_slash_path(&self.root, &file)?, file)))
            .collect();

        let mut content = Vec::new();
        let mut others = Vec::new();
        for (rel_path, file) in files {
            if is_content_file(&rel_path) {
                let bytes = std::fs::read(&file)?;
                content.push(ContentFile::new(&rel_path, bytes, &self.default_lang, &self.languages));
            } else {
                others.push((rel_path, file));
            }
        }

        // Attach non-content files to the nearest enclosing bundle
        for (rel_path, source) in others {
            let owner = content
                .iter_mut()
                .filter(|c| c.info.is_bundle_index())
                .filter(|c| {
                    let dir = c.info.dir();
                    dir.is_empty() || rel_path.starts_with(&format!("{dir}/"))
                })
                .max_by_key(|c| c.info.dir().len());

            if let Some(owner) = owner {
                owner.resources.push(Resource {
                    source,
                    rel_path,
                });
            }
        }

        Ok(content)
    }
}

// ============================================================================
// Tests
// ============================================================================
