//! Ports - Interface definitions for the file watcher

use std::path::{Path, PathBuf};

/// Change reported for one watched document
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FileChangeEvent {
    /// Content written
    Changed(PathBuf),
    /// Renamed away or removed
    Renamed(PathBuf),
}

impl FileChangeEvent {
    pub fn path(&self) -> &Path {
        match self {
            FileChangeEvent::Changed(p) => p,
            FileChangeEvent::Renamed(p) => p,
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            FileChangeEvent::Changed(_) => "changed",
            FileChangeEvent::Renamed(_) => "renamed",
        }
    }
}
