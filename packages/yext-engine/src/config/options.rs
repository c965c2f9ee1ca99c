//! Engine options
//!
//! Built in code through the builder methods, from a [`Preset`], or loaded
//! from a versioned YAML file (see [`io`](super::io)).

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::preset::Preset;

pub const DEFAULT_DEBOUNCE_MS: u64 = 200;
pub const DEVELOPMENT_DEBOUNCE_MS: u64 = 50;

/// Which documents keep their `%PRIVATE` fields in the output
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnorePrivate {
    /// Filter private fields everywhere
    #[default]
    None,
    /// Never filter
    All,
    /// Only the entry document's own output is unfiltered
    Current,
    /// Documents at these paths are unfiltered
    Paths(Vec<PathBuf>),
}

impl IgnorePrivate {
    /// Whether private filtering is skipped for `path`. `is_entry` tells if
    /// the document is being resolved as the top-level entry.
    pub fn skips(&self, path: &Path, is_entry: bool) -> bool {
        match self {
            IgnorePrivate::None => false,
            IgnorePrivate::All => true,
            IgnorePrivate::Current => is_entry,
            IgnorePrivate::Paths(paths) => paths.iter().any(|p| p == path),
        }
    }
}

/// What a reload publishes when the rebuilt result carries diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReloadErrorPolicy {
    /// Publish the new (partial) value anyway
    #[default]
    ReturnNew,
    /// Keep publishing the last diagnostic-free value and raise a warning
    KeepLastGood,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineOptions {
    /// Sandbox root every document path must lie under
    pub sandbox: PathBuf,
    /// Disable the sandbox check
    pub unsafe_paths: bool,
    pub ignore_private: IgnorePrivate,
    /// Leave custom tags unprocessed
    pub ignore_tags: bool,
    /// Live-reload debounce window in milliseconds
    pub debounce_ms: u64,
    pub reload_error_policy: ReloadErrorPolicy,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::preset(Preset::Strict)
    }
}

impl EngineOptions {
    /// Strict defaults rooted at `sandbox`
    pub fn new(sandbox: impl Into<PathBuf>) -> Self {
        Self::default().sandbox(sandbox)
    }

    pub fn preset(preset: Preset) -> Self {
        match preset {
            Preset::Strict => Self {
                sandbox: PathBuf::from("."),
                unsafe_paths: false,
                ignore_private: IgnorePrivate::None,
                ignore_tags: false,
                debounce_ms: DEFAULT_DEBOUNCE_MS,
                reload_error_policy: ReloadErrorPolicy::ReturnNew,
            },
            Preset::Development => Self {
                sandbox: PathBuf::from("."),
                unsafe_paths: true,
                ignore_private: IgnorePrivate::Current,
                ignore_tags: false,
                debounce_ms: DEVELOPMENT_DEBOUNCE_MS,
                reload_error_policy: ReloadErrorPolicy::ReturnNew,
            },
        }
    }

    pub fn sandbox(mut self, sandbox: impl Into<PathBuf>) -> Self {
        self.sandbox = sandbox.into();
        self
    }

    pub fn unsafe_paths(mut self, enabled: bool) -> Self {
        self.unsafe_paths = enabled;
        self
    }

    pub fn ignore_private(mut self, mode: IgnorePrivate) -> Self {
        self.ignore_private = mode;
        self
    }

    pub fn ignore_tags(mut self, enabled: bool) -> Self {
        self.ignore_tags = enabled;
        self
    }

    pub fn debounce(mut self, interval: Duration) -> Self {
        self.debounce_ms = interval.as_millis() as u64;
        self
    }

    pub fn reload_error_policy(mut self, policy: ReloadErrorPolicy) -> Self {
        self.reload_error_policy = policy;
        self
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        let strict = EngineOptions::default();
        assert!(!strict.unsafe_paths);
        assert_eq!(strict.ignore_private, IgnorePrivate::None);
        assert_eq!(strict.debounce_interval(), Duration::from_millis(200));

        let dev = EngineOptions::preset(Preset::Development);
        assert!(dev.unsafe_paths);
        assert_eq!(dev.ignore_private, IgnorePrivate::Current);
        assert_eq!(dev.debounce_ms, 50);
    }

    #[test]
    fn test_ignore_private_modes() {
        let path = Path::new("/docs/a.yaml");
        assert!(!IgnorePrivate::None.skips(path, true));
        assert!(IgnorePrivate::All.skips(path, false));
        assert!(IgnorePrivate::Current.skips(path, true));
        assert!(!IgnorePrivate::Current.skips(path, false));
        assert!(IgnorePrivate::Paths(vec![PathBuf::from("/docs/a.yaml")]).skips(path, false));
    }

    #[test]
    fn test_builder_chain() {
        let options = EngineOptions::new("/srv/docs")
            .ignore_tags(true)
            .debounce(Duration::from_millis(20))
            .reload_error_policy(ReloadErrorPolicy::KeepLastGood);

        assert_eq!(options.sandbox, PathBuf::from("/srv/docs"));
        assert!(options.ignore_tags);
        assert_eq!(options.debounce_ms, 20);
        assert_eq!(options.reload_error_policy, ReloadErrorPolicy::KeepLastGood);
    }
}
