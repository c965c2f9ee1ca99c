//! Resolution result

use std::path::PathBuf;

use serde::Serialize;

use crate::shared::models::{Diagnostic, Value};

/// One resolved document under one parameter binding
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedDocument {
    pub path: PathBuf,
    /// Logical name from `%FILENAME`
    pub filename: Option<String>,
    /// Output value, private fields removed
    pub value: Value,
    /// Complete value, used for `$import.<alias>.<path>` traversal
    pub full: Value,
    /// Diagnostics of this document
    pub errors: Vec<Diagnostic>,
    /// Diagnostics raised while resolving its imports
    pub import_errors: Vec<Diagnostic>,
}

impl ResolvedDocument {
    pub fn has_errors(&self) -> bool {
        self.diagnostics().any(|d| d.is_error())
    }

    pub fn has_cycle(&self) -> bool {
        self.diagnostics().any(|d| d.is_cycle())
    }

    /// Local diagnostics followed by imported ones
    pub fn diagnostics(&self) -> impl Iterator<Item = &Diagnostic> {
        self.errors.iter().chain(self.import_errors.iter())
    }
}
