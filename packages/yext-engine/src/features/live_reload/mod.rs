//! Live reload
//!
//! Watches every document reachable from the registered entries and
//! re-resolves the affected entries after a debounced burst of changes.

mod coordinator;
mod debounce;
mod listener;

pub use coordinator::LiveReload;
pub use debounce::{DebounceState, Debouncer, ReloadBatch};
pub use listener::ReloadListener;
