//! Error types for yext-engine
//!
//! Fatal errors only. Problems found while resolving a document body are
//! collected as [`Diagnostic`](crate::shared::models::Diagnostic)s instead.

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::features::file_watcher::WatchError;
use crate::shared::models::diagnostic::render_cycle;

/// Main error type for yext-engine operations
#[derive(Debug, Error)]
pub enum YextError {
    /// Path escapes the sandbox root
    #[error("path is outside the sandbox: {}", .0.display())]
    OutsideSandbox(PathBuf),

    /// Path does not carry a `.yaml`/`.yml` extension
    #[error("not a YAML document (expected .yaml or .yml): {}", .0.display())]
    InvalidExtension(PathBuf),

    /// Document does not exist
    #[error("document not found: {}", .0.display())]
    NotFound(PathBuf),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import would close a cycle
    #[error("circular import: {}", render_cycle(.cycle))]
    Cycle { cycle: Vec<PathBuf> },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] WatchError),

    /// Blocking resolve task failed to complete
    #[error("resolve task failed: {0}")]
    Join(String),
}

impl YextError {
    pub fn is_path_error(&self) -> bool {
        matches!(
            self,
            YextError::OutsideSandbox(_) | YextError::InvalidExtension(_) | YextError::NotFound(_)
        )
    }
}

/// Result type alias for yext operations
pub type Result<T> = std::result::Result<T, YextError>;
