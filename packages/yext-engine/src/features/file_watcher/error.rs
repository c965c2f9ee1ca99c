//! Watcher errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WatchError {
    #[error("failed to create watcher for {}: {source}", path.display())]
    Create {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },
}
