//! Rendering sinks: where finished artifacts go.
//!
//! Paths handed to a [`Sink`] are `/`-joined and relative to the publish root.

use parking_lot::Mutex;
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

pub trait Sink: Send + Sync {
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()>;
}

/// Writes below a directory on disk.
#[derive(Debug, Clone)]
pub struct FsSink {
    root: PathBuf,
}

impl FsSink {
    /// Sink rooted at `root`, created if missing. With `clean`, any existing
    /// contents are removed first.
    pub fn new(root: &Path, clean: bool) -> io::Result<Self> {
        if clean && root.exists() {
            fs::remove_dir_all(root)?;
        }
        fs::create_dir_all(root)?;
        Ok(Self {
            root: root.to_path_buf(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Sink for FsSink {
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        let dest = path
            .split('/')
            .filter(|part| !part.is_empty() && *part != "." && *part != "..")
            .fold(self.root.clone(), |dest, part| dest.join(part));
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, bytes)
    }
}

/// Keeps artifacts in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }

    /// Content of `path` as text, lossily decoded.
    pub fn text(&self, path: &str) -> Option<String> {
        self.get(path).map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Written paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        self.files.lock().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.files.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.lock().is_empty()
    }
}

impl Sink for MemorySink {
    fn write(&self, path: &str, bytes: &[u8]) -> io::Result<()> {
        self.files.lock().insert(path.to_owned(), bytes.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fs_sink_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(&dir.path().join("public"), false).unwrap();
        sink.write("blog/post/index.html", b"<p>x</p>").unwrap();

        let written = fs::read_to_string(dir.path().join("public/blog/post/index.html")).unwrap();
        assert_eq!(written, "<p>x</p>");
    }

    #[test]
    fn test_fs_sink_clean_removes_stale_files() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("public");
        fs::create_dir_all(&root).unwrap();
        fs::write(root.join("stale.html"), "old").unwrap();

        FsSink::new(&root, false).unwrap();
        assert!(root.join("stale.html").exists());

        FsSink::new(&root, true).unwrap();
        assert!(!root.join("stale.html").exists());
        assert!(root.is_dir());
    }

    #[test]
    fn test_fs_sink_stays_inside_root() {
        let dir = tempfile::tempdir().unwrap();
        let sink = FsSink::new(&dir.path().join("public"), false).unwrap();
        sink.write("../escape.html", b"x").unwrap();
        assert!(dir.path().join("public/escape.html").exists());
        assert!(!dir.path().join("escape.html").exists());
    }

    #[test]
    fn test_memory_sink() {
        let sink = MemorySink::new();
        sink.write("b.html", b"b").unwrap();
        sink.write("a.html", b"a").unwrap();
        assert_eq!(sink.paths(), vec!["a.html", "b.html"]);
        assert_eq!(sink.text("a.html").as_deref(), Some("a"));
        assert!(sink.get("c.html").is_none());
    }
}
