//! Import host port
//!
//! The resolver never loads documents itself; `$import` expressions ask the
//! host to run the whole pipeline on the target.

use std::path::Path;
use std::sync::Arc;

use super::output::ResolvedDocument;
use crate::shared::models::{Diagnostic, Params};

pub trait ImportHost {
    /// Resolve `target` (as written in `%IMPORT`, relative to `from`'s
    /// directory) with the merged import parameters.
    ///
    /// Path, sandbox and cycle problems are returned as a diagnostic for the
    /// importing document.
    fn resolve_import(
        &mut self,
        from: &Path,
        target: &str,
        params: Params,
    ) -> Result<Arc<ResolvedDocument>, Diagnostic>;
}
