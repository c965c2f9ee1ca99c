//! Resolution pipeline
//!
//! [`Engine`] owns every loaded [`Document`], the dependency graph and the
//! result cache behind one lock. A [`Session`] is one top-level resolution
//! holding that lock: it loads documents through the [`DocumentSource`]
//! port, checks paths with the [`PathGuard`], consults the cache and runs
//! the resolver, which calls back into the session for imports.

mod document;
mod engine;
mod path_guard;
mod session;
mod source;

pub use document::Document;
pub use engine::Engine;
pub use path_guard::PathGuard;
pub use session::Session;
pub use source::{DocumentSource, FsSource};
