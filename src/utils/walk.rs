//! Directory traversal.

use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

/// Files to ignore during directory traversal
const IGNORED_FILES: &[&str] = &[".DS_Store"];

/// Collect all files under `dir` recursively, in file name order.
/// A missing directory yields an empty list.
pub fn collect_all_files(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// `path` relative to `root`, `/`-joined. `None` if outside `root` or not UTF-8.
pub fn relative_slash_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts = relative
        .components()
        .map(|component| match component {
            Component::Normal(part) => part.to_str(),
            _ => None,
        })
        .collect::<Option<Vec<&str>>>()?;
    Some(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_collect_all_files_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("b/z.md"), "").unwrap();
        fs::write(dir.path().join("a.md"), "").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();

        let files: Vec<String> = collect_all_files(dir.path())
            .iter()
            .filter_map(|p| relative_slash_path(dir.path(), p))
            .collect();
        assert_eq!(files, vec!["a.md", "b/z.md"]);
    }

    #[test]
    fn test_collect_missing_dir() {
        assert!(collect_all_files(Path::new("/nonexistent/quire")).is_empty());
    }

    #[test]
    fn test_relative_slash_path_outside_root() {
        assert_eq!(relative_slash_path(Path::new("/a"), Path::new("/b/c")), None);
        assert_eq!(
            relative_slash_path(Path::new("/a"), Path::new("/a/b/c.md")).as_deref(),
            Some("b/c.md")
        );
    }
}
