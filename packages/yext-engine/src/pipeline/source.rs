//! Document source port

use std::io;
use std::path::{Path, PathBuf};

/// Where document text comes from. The engine performs no filesystem
/// access of its own.
pub trait DocumentSource: Send + Sync {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Absolute path with symlinks resolved; fails if `path` is missing.
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// Local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DocumentSource for FsSource {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        std::fs::canonicalize(path)
    }
}
