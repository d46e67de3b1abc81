//! Cache of page resource bytes, keyed by output-relative path.
//!
//! Bytes are read from disk on first access. Removing a page drops every entry
//! under its output directory, so a re-added page never sees stale data.

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::{fs, io, path::Path, sync::Arc};

#[derive(Debug, Default)]
pub struct ResourceCache {
    entries: RwLock<FxHashMap<String, Arc<Vec<u8>>>>,
}

impl ResourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached bytes for `key`, loading them from `source` on a miss.
    pub fn get_or_load(&self, key: &str, source: &Path) -> io::Result<Arc<Vec<u8>>> {
        // Fast path: read lock only
        if let Some(bytes) = self.entries.read().get(key) {
            return Ok(Arc::clone(bytes));
        }

        let mut entries = self.entries.write();
        // Double-check after acquiring write lock
        if let Some(bytes) = entries.get(key) {
            return Ok(Arc::clone(bytes));
        }
        let bytes = Arc::new(fs::read(source)?);
        entries.insert(key.to_owned(), Arc::clone(&bytes));
        Ok(bytes)
    }

    /// Store bytes directly.
    pub fn insert(&self, key: &str, bytes: Vec<u8>) {
        self.entries.write().insert(key.to_owned(), Arc::new(bytes));
    }

    pub fn get(&self, key: &str) -> Option<Arc<Vec<u8>>> {
        self.entries.read().get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.read().contains_key(key)
    }

    /// Drop every entry whose key starts with `prefix`.
    pub fn delete_by_prefix(&self, prefix: &str) {
        self.entries.write().retain(|key, _| !key.starts_with(prefix));
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_or_load_reads_once() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("photo.jpg");
        fs::write(&file, b"v1").unwrap();

        let cache = ResourceCache::new();
        assert_eq!(*cache.get_or_load("blog/trip/photo.jpg", &file).unwrap(), b"v1");

        // served from cache even though the file changed
        fs::write(&file, b"v2").unwrap();
        assert_eq!(*cache.get_or_load("blog/trip/photo.jpg", &file).unwrap(), b"v1");
    }

    #[test]
    fn test_get_or_load_missing_file() {
        let cache = ResourceCache::new();
        assert!(cache.get_or_load("x", Path::new("/nonexistent/file")).is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_delete_by_prefix() {
        let cache = ResourceCache::new();
        cache.insert("blog/trip/a.jpg", vec![1]);
        cache.insert("blog/trip/b.jpg", vec![2]);
        cache.insert("blog/other/c.jpg", vec![3]);

        cache.delete_by_prefix("blog/trip");

        assert!(!cache.contains("blog/trip/a.jpg"));
        assert!(!cache.contains("blog/trip/b.jpg"));
        assert!(cache.contains("blog/other/c.jpg"));
        assert_eq!(cache.len(), 1);
    }
}
