//! Shared models

mod declared_type;
pub mod diagnostic;
mod params;
mod span;

pub use declared_type::DeclaredType;
pub use diagnostic::{Diagnostic, DiagnosticKind, Severity};
pub use params::Params;
pub use span::Span;

// Resolved values are plain YAML values
pub use serde_yaml::{Mapping, Value};
