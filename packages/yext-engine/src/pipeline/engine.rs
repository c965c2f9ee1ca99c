//! Engine - public resolution surface
//!
//! # Usage
//! ```ignore
//! use yext_engine::{Engine, EngineOptions, Params};
//!
//! let engine = Engine::new(EngineOptions::new("./config"))?;
//! let doc = engine.resolve("app.yaml", Params::new())?;
//! for diagnostic in doc.diagnostics() {
//!     eprintln!("{}", diagnostic);
//! }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::document::Document;
use super::path_guard::PathGuard;
use super::session::Session;
use super::source::{DocumentSource, FsSource};
use crate::config::{EngineOptions, IgnorePrivate, Validatable};
use crate::errors::{Result, YextError};
use crate::features::cache::{CacheStats, ResultCache};
use crate::features::dependency::DependencyGraph;
use crate::features::resolver::ResolvedDocument;
use crate::features::tags::TagRegistry;
use crate::shared::models::Params;

/// Everything guarded by the engine lock
#[derive(Default)]
pub(crate) struct EngineState {
    pub(crate) documents: HashMap<PathBuf, Arc<Document>>,
    pub(crate) graph: DependencyGraph,
    pub(crate) cache: ResultCache<ResolvedDocument>,
    /// Latest result of every entry document
    pub(crate) results: BTreeMap<PathBuf, Arc<ResolvedDocument>>,
}

impl EngineState {
    /// Drop documents and results of paths no longer in the graph
    fn evict(&mut self, paths: &[PathBuf]) {
        for path in paths {
            self.documents.remove(path);
            self.cache.remove(path);
            self.results.remove(path);
        }
    }
}

struct EngineInner {
    options: EngineOptions,
    guard: PathGuard,
    source: Arc<dyn DocumentSource>,
    tags: TagRegistry,
    state: Mutex<EngineState>,
}

/// Cheap to clone; clones share documents, graph and cache.
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    pub fn new(options: EngineOptions) -> Result<Self> {
        Self::with_tags(options, TagRegistry::new())
    }

    pub fn with_tags(options: EngineOptions, tags: TagRegistry) -> Result<Self> {
        Self::with_source(options, tags, Arc::new(FsSource))
    }

    pub fn with_source(
        options: EngineOptions,
        tags: TagRegistry,
        source: Arc<dyn DocumentSource>,
    ) -> Result<Self> {
        options.validate()?;
        let guard = PathGuard::new(&options, source.as_ref())?;

        let mut options = options;
        if let IgnorePrivate::Paths(paths) = &options.ignore_private {
            let canonical = paths
                .iter()
                .map(|p| source.canonicalize(p).unwrap_or_else(|_| p.clone()))
                .collect();
            options.ignore_private = IgnorePrivate::Paths(canonical);
        }

        tracing::info!(
            sandbox = ?guard.sandbox(),
            tags = tags.len(),
            "engine created"
        );

        Ok(Self {
            inner: Arc::new(EngineInner {
                options,
                guard,
                source,
                tags,
                state: Mutex::new(EngineState::default()),
            }),
        })
    }

    pub fn options(&self) -> &EngineOptions {
        &self.inner.options
    }

    /// Relative paths are taken relative to the sandbox root
    fn absolute(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.inner.options.sandbox.join(path)
        }
    }

    /// Canonical form of `path` if it exists, its absolute form otherwise
    pub fn canonical(&self, path: impl AsRef<Path>) -> PathBuf {
        let path = path.as_ref();
        let absolute = self.absolute(path);
        self.inner
            .source
            .canonicalize(&absolute)
            .unwrap_or(absolute)
    }

    /// Resolve an entry document.
    ///
    /// Fails only when the entry's own path is invalid or unreadable;
    /// everything else is reported through the result's diagnostics. The
    /// same content and effective parameters return the cached `Arc`.
    pub fn resolve(&self, path: impl AsRef<Path>, params: Params) -> Result<Arc<ResolvedDocument>> {
        let inner = &*self.inner;
        let path = inner
            .guard
            .check(&self.absolute(path.as_ref()), inner.source.as_ref())?;

        let started = Instant::now();
        let mut state = inner.state.lock();
        let result = {
            let mut session = Session::new(
                &mut state,
                &inner.options,
                &inner.guard,
                inner.source.as_ref(),
                &inner.tags,
            );
            session.resolve_entry(&path, params)?
        };
        state.results.insert(path.clone(), Arc::clone(&result));

        tracing::debug!(
            path = %path.display(),
            errors = result.errors.len(),
            import_errors = result.import_errors.len(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "resolved entry"
        );
        Ok(result)
    }

    /// [`resolve`](Self::resolve) on tokio's blocking pool
    pub async fn resolve_async(&self, path: impl Into<PathBuf>, params: Params) -> Result<Arc<ResolvedDocument>> {
        let engine = self.clone();
        let path = path.into();
        tokio::task::spawn_blocking(move || engine.resolve(&path, params))
            .await
            .map_err(|e| YextError::Join(e.to_string()))?
    }

    /// Resolve in-memory text as if it were stored at `virtual_path`.
    ///
    /// The text itself is never cached; imports are resolved relative to
    /// the virtual path's directory and cached as usual.
    pub fn resolve_str(&self, source: &str, virtual_path: impl AsRef<Path>, params: Params) -> ResolvedDocument {
        let inner = &*self.inner;
        let path = self.absolute(virtual_path.as_ref());
        let mut state = inner.state.lock();
        let mut session = Session::new(
            &mut state,
            &inner.options,
            &inner.guard,
            inner.source.as_ref(),
            &inner.tags,
        );
        session.resolve_virtual(&path, source.to_string(), params)
    }

    /// Latest result of an entry document
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<ResolvedDocument>> {
        let key = self.canonical(path);
        self.inner.state.lock().results.get(&key).cloned()
    }

    /// Latest results of all entry documents
    pub fn get_all(&self) -> BTreeMap<PathBuf, Arc<ResolvedDocument>> {
        self.inner.state.lock().results.clone()
    }

    pub fn entries(&self) -> Vec<PathBuf> {
        self.inner.state.lock().graph.entries()
    }

    /// Forget `path`: its entry registration, document, cached results and
    /// (unless still imported) its graph node. Dependents lose their cached
    /// results. Returns every path evicted, sorted.
    pub fn delete(&self, path: impl AsRef<Path>) -> Vec<PathBuf> {
        let key = self.canonical(path);
        let mut state = self.inner.state.lock();

        state.graph.remove_entry(&key);
        let dependents = state.graph.dependents_transitive(&key);
        for dependent in &dependents {
            state.cache.invalidate(dependent);
        }

        let mut evicted = Vec::new();
        if dependents.is_empty() && state.graph.remove(&key) {
            evicted.push(key.clone());
        }
        state.evict(std::slice::from_ref(&key));
        evicted.extend(state.graph.purge());
        state.evict(&evicted);
        evicted.sort();
        evicted.dedup();

        tracing::info!(path = %key.display(), evicted = evicted.len(), "deleted document");
        evicted
    }

    /// Forget every entry and everything they reach
    pub fn delete_all(&self) -> Vec<PathBuf> {
        let mut state = self.inner.state.lock();
        for entry in state.graph.entries() {
            state.graph.remove_entry(&entry);
        }
        let evicted = state.graph.purge();
        state.evict(&evicted);
        state.results.clear();
        tracing::info!(evicted = evicted.len(), "deleted all documents");
        evicted
    }

    /// Drop the loaded document at `path` and the cached results of it and
    /// its dependents. Returns the affected entries: `path` itself if it is
    /// one, plus every entry depending on it.
    pub fn invalidate(&self, path: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        let key = self.canonical(path);
        let mut state = self.inner.state.lock();

        state.documents.remove(&key);
        state.cache.remove(&key);
        let mut affected = BTreeSet::new();
        for dependent in state.graph.dependents_transitive(&key) {
            state.cache.invalidate(&dependent);
            if state.graph.is_entry(&dependent) {
                affected.insert(dependent);
            }
        }
        if state.graph.is_entry(&key) {
            affected.insert(key.clone());
        }

        tracing::debug!(path = %key.display(), affected = affected.len(), "invalidated document");
        affected
    }

    /// Evict every document unreachable from an entry
    pub fn purge(&self) -> Vec<PathBuf> {
        let mut state = self.inner.state.lock();
        let purged = state.graph.purge();
        state.evict(&purged);
        purged
    }

    /// Transitive imports of `path`
    pub fn dependencies(&self, path: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        let key = self.canonical(path);
        self.inner.state.lock().graph.dependencies_transitive(&key)
    }

    /// Transitive importers of `path`
    pub fn dependents(&self, path: impl AsRef<Path>) -> BTreeSet<PathBuf> {
        let key = self.canonical(path);
        self.inner.state.lock().graph.dependents_transitive(&key)
    }

    /// Entries plus everything they import
    pub fn reachable(&self) -> BTreeSet<PathBuf> {
        let state = self.inner.state.lock();
        let mut paths = BTreeSet::new();
        for entry in state.graph.entries() {
            paths.extend(state.graph.dependencies_transitive(&entry));
            paths.insert(entry);
        }
        paths
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.inner.state.lock().cache.stats()
    }

    /// Drop all state
    pub fn teardown(&self) {
        let mut state = self.inner.state.lock();
        *state = EngineState::default();
        tracing::info!("engine torn down");
    }
}
