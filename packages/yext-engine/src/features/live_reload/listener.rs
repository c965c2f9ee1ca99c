//! Reload notifications

use std::path::Path;

use crate::shared::models::{Diagnostic, Value};

/// Receives the outcome of every reload. Called on the coordinator's worker
/// thread, never while the engine lock is held.
pub trait ReloadListener: Send + Sync {
    /// New value of an entry document; `None` once the entry is gone.
    fn on_update(&self, path: &Path, value: Option<&Value>);

    /// A rebuilt entry carried errors and the last good value was kept.
    fn on_warning(&self, path: &Path, diagnostics: &[Diagnostic]) {
        tracing::warn!(
            path = %path.display(),
            errors = diagnostics.len(),
            "reload produced errors, keeping last good value"
        );
    }
}
