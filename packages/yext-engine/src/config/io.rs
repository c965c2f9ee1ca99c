//! Configuration I/O (YAML loading)
//!
//! ```yaml
//! version: 1
//! preset: development
//! sandbox: ./documents
//! debounce_ms: 100
//! ```
//!
//! Every field other than `version` is optional and overrides the preset.
//! A relative `sandbox` is taken relative to the configuration file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::error::{ConfigError, ConfigResult};
use super::options::{EngineOptions, IgnorePrivate, ReloadErrorPolicy};
use super::preset::Preset;
use super::validation::Validatable;

pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// YAML Schema v1
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfigV1 {
    /// Schema version (always 1 for v1)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,

    /// Base preset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<Preset>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub unsafe_paths: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_private: Option<IgnorePrivate>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ignore_tags: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub reload_error_policy: Option<ReloadErrorPolicy>,
}

impl EngineConfigV1 {
    /// Apply this file's overrides on top of its preset.
    pub fn into_options(self, base_dir: &Path) -> ConfigResult<EngineOptions> {
        match self.version {
            None => return Err(ConfigError::MissingVersion),
            Some(found) if !SUPPORTED_VERSIONS.contains(&found) => {
                return Err(ConfigError::UnsupportedVersion {
                    found,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }

        let mut options = EngineOptions::preset(self.preset.unwrap_or_default());
        if let Some(sandbox) = self.sandbox {
            options.sandbox = if sandbox.is_relative() {
                base_dir.join(sandbox)
            } else {
                sandbox
            };
        } else {
            options.sandbox = base_dir.to_path_buf();
        }
        if let Some(unsafe_paths) = self.unsafe_paths {
            options.unsafe_paths = unsafe_paths;
        }
        if let Some(ignore_private) = self.ignore_private {
            options.ignore_private = ignore_private;
        }
        if let Some(ignore_tags) = self.ignore_tags {
            options.ignore_tags = ignore_tags;
        }
        if let Some(debounce_ms) = self.debounce_ms {
            options.debounce_ms = debounce_ms;
        }
        if let Some(policy) = self.reload_error_policy {
            options.reload_error_policy = policy;
        }
        Ok(options)
    }
}

impl EngineOptions {
    /// Load and validate options from a versioned YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<EngineOptions> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let options = Self::from_yaml_str(&content, base_dir)?;
        tracing::debug!(config = %path.display(), sandbox = %options.sandbox.display(), "loaded engine options");
        Ok(options)
    }

    /// Parse and validate options from YAML text; relative sandboxes are
    /// resolved against `base_dir`.
    pub fn from_yaml_str(content: &str, base_dir: &Path) -> ConfigResult<EngineOptions> {
        let export: EngineConfigV1 = serde_yaml::from_str(content)?;
        let options = export.into_options(base_dir)?;
        options.validate()?;
        Ok(options)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let export = EngineConfigV1 {
            version: Some(1),
            preset: None,
            sandbox: Some(self.sandbox.clone()),
            unsafe_paths: Some(self.unsafe_paths),
            ignore_private: Some(self.ignore_private.clone()),
            ignore_tags: Some(self.ignore_tags),
            debounce_ms: Some(self.debounce_ms),
            reload_error_policy: Some(self.reload_error_policy),
        };
        Ok(serde_yaml::to_string(&export)?)
    }
}
