/*
 * yext - a module system for YAML
 *
 * Feature-First Architecture:
 * - shared/      : Common models (Span, Diagnostic, Params)
 * - features/    : Vertical slices (tokenizer → directives → syntax → resolver,
 *                  dependency, cache, file_watcher → live_reload)
 * - pipeline/    : Engine, sessions, path safety
 * - config/      : Engine options, presets, YAML config files
 */

// ═══════════════════════════════════════════════════════════════════════════
// Module Exports - Feature-First Architecture
// ═══════════════════════════════════════════════════════════════════════════

/// Shared models and utilities
pub mod shared;

/// Feature modules (vertical slices)
pub mod features;

/// Resolution pipeline
pub mod pipeline;

/// Engine configuration
pub mod config;

/// Fatal error types
pub mod errors;

// ═══════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════

pub use config::{EngineOptions, IgnorePrivate, Preset, ReloadErrorPolicy};
pub use errors::{Result, YextError};
pub use features::file_watcher::FileChangeEvent;
pub use features::live_reload::{LiveReload, ReloadListener};
pub use features::resolver::ResolvedDocument;
pub use features::tags::{TagDefinition, TagRegistry};
pub use pipeline::{DocumentSource, Engine, FsSource};
pub use shared::models::{DeclaredType, Diagnostic, DiagnosticKind, Params, Severity, Span, Value};
