//! Configuration validation

use super::error::{ConfigError, ConfigResult};
use super::options::EngineOptions;

pub const MIN_DEBOUNCE_MS: u64 = 1;
pub const MAX_DEBOUNCE_MS: u64 = 60_000;

/// Trait for validatable configuration objects
pub trait Validatable {
    /// Returns `Ok(())` if valid, `Err(ConfigError)` with details if invalid.
    fn validate(&self) -> ConfigResult<()>;

    /// Get the configuration name for error messages
    fn config_name(&self) -> &'static str {
        "Config"
    }
}

impl Validatable for EngineOptions {
    fn validate(&self) -> ConfigResult<()> {
        if !(MIN_DEBOUNCE_MS..=MAX_DEBOUNCE_MS).contains(&self.debounce_ms) {
            return Err(ConfigError::Range {
                field: "debounce_ms".to_string(),
                value: self.debounce_ms.to_string(),
                min: MIN_DEBOUNCE_MS.to_string(),
                max: MAX_DEBOUNCE_MS.to_string(),
                hint: "Use a few hundred milliseconds for editor-driven reloads.".to_string(),
            });
        }

        if !self.unsafe_paths && !self.sandbox.is_dir() {
            return Err(ConfigError::MissingSandbox(self.sandbox.clone()));
        }

        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "EngineOptions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_debounce_range() {
        let dir = TempDir::new().unwrap();
        let options = EngineOptions::new(dir.path()).debounce(Duration::from_secs(120));

        let err = options.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Range { ref field, .. } if field == "debounce_ms"));

        let options = EngineOptions::new(dir.path()).debounce(Duration::ZERO);
        assert!(options.validate().is_err());
    }

    #[test]
    fn test_missing_sandbox() {
        let options = EngineOptions::new("/definitely/not/here");
        assert!(matches!(options.validate(), Err(ConfigError::MissingSandbox(_))));

        let options = options.unsafe_paths(true);
        assert!(options.validate().is_ok());
    }
}
