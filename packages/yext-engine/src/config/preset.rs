//! Preset configurations
//!
//! Presets provide complete default option sets for common use cases.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Configuration preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Production: sandboxed paths, private fields filtered everywhere,
    /// 200 ms debounce
    #[default]
    Strict,

    /// Local authoring: unsandboxed paths, the entry document keeps its
    /// private fields, 50 ms debounce
    Development,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Development => "development",
        }
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "development" | "dev" => Ok(Self::Development),
            _ => Err(ConfigError::UnknownPreset(s.to_string())),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_from_str() {
        assert_eq!("strict".parse::<Preset>().unwrap(), Preset::Strict);
        assert_eq!("Development".parse::<Preset>().unwrap(), Preset::Development);
        assert!(matches!(
            "fast".parse::<Preset>(),
            Err(ConfigError::UnknownPreset(name)) if name == "fast"
        ));
    }
}
