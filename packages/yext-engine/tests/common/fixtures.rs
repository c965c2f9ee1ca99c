//! Test fixtures: YAML document trees in a temporary sandbox

use std::path::{Path, PathBuf};

use serde_yaml::Value;
use tempfile::TempDir;
use yext_engine::{Engine, EngineOptions};

/// A temporary sandbox directory holding documents
pub struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    /// Sandbox with `(relative path, content)` documents
    pub fn with_documents(documents: &[(&str, &str)]) -> Self {
        let sandbox = Self::new();
        for (name, content) in documents {
            sandbox.write(name, content);
        }
        sandbox
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Write (or overwrite) a document, creating parent directories
    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dirs");
        }
        std::fs::write(&path, content).expect("write document");
        path
    }

    pub fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    /// Canonical path, as used in diagnostics and cycles
    pub fn canonical(&self, name: &str) -> PathBuf {
        std::fs::canonicalize(self.path(name)).expect("canonicalize")
    }

    pub fn options(&self) -> EngineOptions {
        EngineOptions::new(self.root())
    }

    pub fn engine(&self) -> Engine {
        Engine::new(self.options()).expect("create engine")
    }
}

/// Parse a YAML literal for comparisons
pub fn yaml(text: &str) -> Value {
    serde_yaml::from_str(text).expect("valid YAML literal")
}
