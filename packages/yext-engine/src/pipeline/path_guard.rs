//! Path validation: extension, existence, sandbox

use std::io;
use std::path::{Path, PathBuf};

use super::source::DocumentSource;
use crate::config::{ConfigError, EngineOptions};
use crate::errors::{Result, YextError};
use crate::features::directives::has_yaml_extension;

fn is_yaml(path: &Path) -> bool {
    path.to_str().map(has_yaml_extension).unwrap_or(false)
}

#[derive(Debug, Clone)]
pub struct PathGuard {
    /// Canonical sandbox root; `None` when unsafe paths are allowed
    sandbox: Option<PathBuf>,
}

impl PathGuard {
    pub fn new(options: &EngineOptions, source: &dyn DocumentSource) -> Result<Self> {
        if options.unsafe_paths {
            return Ok(Self { sandbox: None });
        }
        let sandbox = source
            .canonicalize(&options.sandbox)
            .map_err(|_| ConfigError::MissingSandbox(options.sandbox.clone()))?;
        Ok(Self {
            sandbox: Some(sandbox),
        })
    }

    pub fn sandbox(&self) -> Option<&Path> {
        self.sandbox.as_deref()
    }

    /// Canonical form of `path` if it is an existing YAML document inside
    /// the sandbox.
    pub fn check(&self, path: &Path, source: &dyn DocumentSource) -> Result<PathBuf> {
        if !is_yaml(path) {
            return Err(YextError::InvalidExtension(path.to_path_buf()));
        }

        let canonical = source.canonicalize(path).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => YextError::NotFound(path.to_path_buf()),
            _ => YextError::Io(e),
        })?;

        // A symlink may point at a non-YAML file
        if !is_yaml(&canonical) {
            return Err(YextError::InvalidExtension(canonical));
        }

        if let Some(root) = &self.sandbox {
            if !canonical.starts_with(root) {
                tracing::warn!(path = %canonical.display(), sandbox = %root.display(), "path outside sandbox");
                return Err(YextError::OutsideSandbox(canonical));
            }
        }
        Ok(canonical)
    }
}
