//! Parameter-keyed result cache
//!
//! Two-level: document path → (content hash, results by parameter hash).
//! A content-hash mismatch drops every result of that document.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::fingerprint::{ContentHash, ParamHash};

/// Cached results of one document
#[derive(Debug)]
pub struct CacheEntry<T> {
    pub content: ContentHash,
    results: HashMap<ParamHash, Arc<T>>,
    /// Most recently stored result
    latest: Option<Arc<T>>,
}

impl<T> CacheEntry<T> {
    fn new(content: ContentHash) -> Self {
        Self {
            content,
            results: HashMap::new(),
            latest: None,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug)]
pub struct ResultCache<T> {
    documents: HashMap<PathBuf, CacheEntry<T>>,
    stats: CacheStats,
}

impl<T> Default for ResultCache<T> {
    fn default() -> Self {
        Self {
            documents: HashMap::new(),
            stats: CacheStats::default(),
        }
    }
}

impl<T> ResultCache<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached result for `(content, key)`; a content mismatch evicts the
    /// document's stale results.
    pub fn lookup(&mut self, path: &Path, content: &ContentHash, key: &ParamHash) -> Option<Arc<T>> {
        let found = match self.documents.get_mut(path) {
            Some(entry) if &entry.content == content => entry.results.get(key).cloned(),
            Some(entry) => {
                tracing::debug!(path = %path.display(), "content changed, dropping cached results");
                entry.results.clear();
                entry.latest = None;
                entry.content = content.clone();
                None
            }
            None => None,
        };

        match found {
            Some(value) => {
                self.stats.hits += 1;
                tracing::debug!(path = %path.display(), params = %key, "cache hit");
                Some(value)
            }
            None => {
                self.stats.misses += 1;
                tracing::debug!(path = %path.display(), params = %key, "cache miss");
                None
            }
        }
    }

    pub fn store(&mut self, path: &Path, content: &ContentHash, key: ParamHash, value: Arc<T>) {
        let entry = self
            .documents
            .entry(path.to_path_buf())
            .or_insert_with(|| CacheEntry::new(content.clone()));
        if &entry.content != content {
            entry.results.clear();
            entry.content = content.clone();
        }
        entry.latest = Some(Arc::clone(&value));
        entry.results.insert(key, value);
    }

    pub fn latest(&self, path: &Path) -> Option<Arc<T>> {
        self.documents.get(path).and_then(|e| e.latest.clone())
    }

    pub fn content(&self, path: &Path) -> Option<&ContentHash> {
        self.documents.get(path).map(|e| &e.content)
    }

    pub fn entry(&self, path: &Path) -> Option<&CacheEntry<T>> {
        self.documents.get(path)
    }

    /// Drop all results of `path`, keeping its content hash
    pub fn invalidate(&mut self, path: &Path) {
        if let Some(entry) = self.documents.get_mut(path) {
            entry.results.clear();
            entry.latest = None;
        }
    }

    pub fn remove(&mut self, path: &Path) -> bool {
        self.documents.remove(path).is_some()
    }

    pub fn clear(&mut self) {
        self.documents.clear();
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}
