//! Shared module - Common types and utilities
//!
//! Types used by every feature: spans, diagnostics, parameter bindings.

pub mod models;
pub mod utils;

// Re-exports for convenience
pub use models::*;
pub use utils::locals_stack::LocalsStack;
