//! One top-level resolution
//!
//! A session borrows the engine state for the duration of one entry
//! resolution. It is the [`ImportHost`] of every document resolved in it,
//! so nested imports share the same graph, cache and verification set.

use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::document::Document;
use super::engine::EngineState;
use super::path_guard::PathGuard;
use super::source::DocumentSource;
use crate::config::EngineOptions;
use crate::errors::{Result, YextError};
use crate::features::cache::{ContentHash, ParamHash};
use crate::features::resolver::{resolve_document, ImportHost, ResolveInput, ResolvedDocument};
use crate::features::tags::TagRegistry;
use crate::shared::models::{Diagnostic, Params};

pub struct Session<'a> {
    state: &'a mut EngineState,
    options: &'a EngineOptions,
    guard: &'a PathGuard,
    source: &'a dyn DocumentSource,
    tags: &'a TagRegistry,
    /// Documents whose content was compared with the source in this session
    verified: HashSet<PathBuf>,
    /// In-memory document resolved by `resolve_virtual`; never a graph node
    virtual_path: Option<PathBuf>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(
        state: &'a mut EngineState,
        options: &'a EngineOptions,
        guard: &'a PathGuard,
        source: &'a dyn DocumentSource,
        tags: &'a TagRegistry,
    ) -> Self {
        Self {
            state,
            options,
            guard,
            source,
            tags,
            verified: HashSet::new(),
            virtual_path: None,
        }
    }

    /// Resolve an entry document (already validated by the path guard).
    pub fn resolve_entry(&mut self, path: &Path, params: Params) -> Result<Arc<ResolvedDocument>> {
        let result = self.resolve_path(path, params, true)?;
        self.state.graph.add_entry(path);
        Ok(result)
    }

    /// Resolve in-memory text as if it lived at `path`. Nothing about the
    /// document itself is cached; its imports are.
    pub fn resolve_virtual(&mut self, path: &Path, source: String, params: Params) -> ResolvedDocument {
        self.virtual_path = Some(path.to_path_buf());
        let document = Document::from_source(path, source);
        let filter_private = !self.options.ignore_private.skips(path, true);
        let result = self.run_resolver(&document, &params, filter_private);
        self.virtual_path = None;
        result
    }

    fn resolve_path(&mut self, path: &Path, params: Params, is_entry: bool) -> Result<Arc<ResolvedDocument>> {
        self.refresh(path)?;
        self.refresh_dependencies(path);

        let document = self
            .state
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| YextError::NotFound(path.to_path_buf()))?;

        let filter_private = !self.options.ignore_private.skips(path, is_entry);
        let key = ParamHash::compute(&params, filter_private);
        if let Some(hit) = self.state.cache.lookup(path, &document.content, &key) {
            return Ok(hit);
        }

        let result = Arc::new(self.run_resolver(&document, &params, filter_private));
        if result.has_cycle() {
            tracing::debug!(path = %path.display(), "result involves an import cycle, not cached");
        } else {
            self.state
                .cache
                .store(path, &document.content, key, Arc::clone(&result));
        }
        Ok(result)
    }

    fn run_resolver(&mut self, document: &Document, params: &Params, filter_private: bool) -> ResolvedDocument {
        let tags = self.tags;
        let ignore_tags = self.options.ignore_tags;
        resolve_document(
            ResolveInput {
                path: &document.path,
                source: &document.source,
                tree: &document.tree,
                directives: &document.directives,
                diagnostics: &document.diagnostics,
                params,
                tags,
                ignore_tags,
                filter_private,
            },
            self,
        )
    }

    /// Load `path`, or reload it if its content changed since it was last
    /// loaded. Returns whether a new document was built.
    ///
    /// On change the document's results and those of every transitive
    /// dependent are dropped, and its outgoing import edges are cleared.
    fn refresh(&mut self, path: &Path) -> Result<bool> {
        if !self.verified.insert(path.to_path_buf()) {
            return Ok(false);
        }

        let text = match self.source.read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                self.state.documents.remove(path);
                self.state.cache.remove(path);
                return Err(match e.kind() {
                    io::ErrorKind::NotFound => YextError::NotFound(path.to_path_buf()),
                    _ => YextError::Io(e),
                });
            }
        };

        let content = ContentHash::compute(&text);
        if let Some(existing) = self.state.documents.get(path) {
            if existing.content == content {
                return Ok(false);
            }
        }

        let document = Document::parse(path, text, content);
        let replaced = self
            .state
            .documents
            .insert(path.to_path_buf(), Arc::new(document))
            .is_some();
        self.state.graph.add_document(path);

        if replaced {
            self.state.graph.clear_dependencies(path);
            self.state.cache.invalidate(path);
            let dependents = self.state.graph.dependents_transitive(path);
            for dependent in &dependents {
                self.state.cache.invalidate(dependent);
            }
            tracing::info!(
                path = %path.display(),
                dependents = dependents.len(),
                "document changed, cached results dropped"
            );
        }
        Ok(true)
    }

    /// Re-check every recorded dependency of `path`; a changed or missing
    /// one drops the cached results of `path` through `refresh`.
    fn refresh_dependencies(&mut self, path: &Path) {
        for dependency in self.state.graph.dependencies_transitive(path) {
            if let Err(e) = self.refresh(&dependency) {
                tracing::debug!(path = %dependency.display(), error = %e, "dependency unavailable");
                self.state.cache.invalidate(path);
                for dependent in self.state.graph.dependents_transitive(&dependency) {
                    self.state.cache.invalidate(&dependent);
                }
            }
        }
    }
}

impl ImportHost for Session<'_> {
    fn resolve_import(
        &mut self,
        from: &Path,
        target: &str,
        params: Params,
    ) -> std::result::Result<Arc<ResolvedDocument>, Diagnostic> {
        let base = from.parent().unwrap_or_else(|| Path::new("."));
        let canonical = self
            .guard
            .check(&base.join(target), self.source)
            .map_err(|e| Diagnostic::from_error(from, &e))?;

        if self.virtual_path.as_deref() != Some(from) {
            if let Err(cycle) = self.state.graph.bind(from, &canonical) {
                tracing::warn!(from = %from.display(), to = %canonical.display(), "import cycle");
                return Err(Diagnostic::cycle(from, cycle));
            }
        }

        self.resolve_path(&canonical, params, false)
            .map_err(|e| Diagnostic::from_error(from, &e))
    }
}
