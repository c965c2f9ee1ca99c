//! Loaded document

use std::path::{Path, PathBuf};

use crate::features::cache::ContentHash;
use crate::features::directives::{process_directives, DirectiveTable};
use crate::features::syntax::{load_tree, SyntaxTree};
use crate::shared::models::Diagnostic;

/// One source file: text, hash, syntax tree and directive table.
///
/// Immutable once built; a change on disk replaces the whole document.
#[derive(Debug)]
pub struct Document {
    pub path: PathBuf,
    pub source: String,
    pub content: ContentHash,
    pub tree: SyntaxTree,
    pub directives: DirectiveTable,
    /// Directive and parse diagnostics
    pub diagnostics: Vec<Diagnostic>,
}

impl Document {
    pub fn parse(path: &Path, source: String, content: ContentHash) -> Self {
        let processed = process_directives(path, &source);
        let (tree, parse_diagnostics) = load_tree(path, &processed.body);

        let filename = processed.table.filename.clone();
        let mut diagnostics = processed.table.diagnostics.clone();
        diagnostics.extend(
            parse_diagnostics
                .into_iter()
                .map(|d| d.with_filename(filename.as_deref())),
        );

        tracing::debug!(
            path = %path.display(),
            nodes = tree.len(),
            imports = processed.table.imports.len(),
            diagnostics = diagnostics.len(),
            "parsed document"
        );

        Self {
            path: path.to_path_buf(),
            source,
            content,
            tree,
            directives: processed.table,
            diagnostics,
        }
    }

    pub fn from_source(path: &Path, source: String) -> Self {
        let content = ContentHash::compute(&source);
        Self::parse(path, source, content)
    }
}
