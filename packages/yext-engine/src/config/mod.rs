//! Engine configuration
//!
//! Three ways to obtain [`EngineOptions`]:
//!
//! ```rust,ignore
//! use yext_engine::config::{EngineOptions, Preset};
//!
//! // Preset
//! let options = EngineOptions::preset(Preset::Development);
//!
//! // Builder
//! let options = EngineOptions::new("./docs").ignore_tags(true);
//!
//! // Versioned YAML file
//! let options = EngineOptions::from_yaml("yext.yaml")?;
//! ```

pub mod error;
pub mod io;
pub mod options;
pub mod preset;
pub mod validation;

// Re-exports
pub use error::{ConfigError, ConfigResult};
pub use io::EngineConfigV1;
pub use options::{EngineOptions, IgnorePrivate, ReloadErrorPolicy};
pub use preset::Preset;
pub use validation::Validatable;
