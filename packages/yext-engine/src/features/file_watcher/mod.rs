//! File watcher
//!
//! One `notify` watcher per watched document. Raw notify events are reduced
//! to [`FileChangeEvent`]s and handed to a sink; debouncing happens in the
//! live-reload coordinator.

mod error;
pub mod infrastructure;
pub mod ports;

pub use error::WatchError;
pub use infrastructure::{EventSink, FileWatcher};
pub use ports::FileChangeEvent;
