//! FileWatcher - per-document file system monitoring
//!
//! Every watched path gets its own non-recursive `RecommendedWatcher`, so
//! watching follows the dependency graph exactly: a path is watched while
//! some entry document reaches it and unwatched once it is purged.

use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Config as NotifyConfig, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;

use crate::features::file_watcher::ports::FileChangeEvent;
use crate::features::file_watcher::WatchError;

/// Receives every change event, on notify's own thread
pub type EventSink = Arc<dyn Fn(FileChangeEvent) + Send + Sync>;

pub struct FileWatcher {
    sink: EventSink,
    watchers: Mutex<HashMap<PathBuf, RecommendedWatcher>>,
}

impl FileWatcher {
    pub fn new(sink: EventSink) -> Self {
        Self {
            sink,
            watchers: Mutex::new(HashMap::new()),
        }
    }

    /// Start watching `path`. Returns `false` if it was already watched.
    pub fn watch(&self, path: &Path) -> Result<bool, WatchError> {
        let mut watchers = self.watchers.lock();
        if watchers.contains_key(path) {
            return Ok(false);
        }

        let sink = Arc::clone(&self.sink);
        let watched = path.to_path_buf();
        let mut watcher = RecommendedWatcher::new(
            move |res: Result<Event, notify::Error>| match res {
                Ok(event) => {
                    if let Some(change) = Self::convert_event(&event, &watched) {
                        sink(change);
                    }
                }
                Err(e) => {
                    tracing::warn!(path = %watched.display(), error = %e, "file watcher error");
                }
            },
            NotifyConfig::default(),
        )
        .map_err(|source| WatchError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        watcher
            .watch(path, RecursiveMode::NonRecursive)
            .map_err(|source| WatchError::Watch {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), "watching document");
        watchers.insert(path.to_path_buf(), watcher);
        Ok(true)
    }

    /// Stop watching `path`; dropping the notify watcher ends its thread.
    pub fn unwatch(&self, path: &Path) -> bool {
        let removed = self.watchers.lock().remove(path).is_some();
        if removed {
            tracing::debug!(path = %path.display(), "stopped watching document");
        }
        removed
    }

    /// Re-arm the watch on `path`. A file replaced by rename keeps no
    /// watch on the new inode, so a watched path is dropped and watched
    /// again. Returns `false` if `path` was not watched.
    pub fn rewatch(&self, path: &Path) -> Result<bool, WatchError> {
        if !self.unwatch(path) {
            return Ok(false);
        }
        self.watch(path)
    }

    /// Watch exactly `wanted`: add what is missing, drop the rest.
    ///
    /// Paths that cannot be watched (removed meanwhile) are skipped with a
    /// warning; the first such error is returned after the sync completes.
    pub fn sync<I>(&self, wanted: I) -> Result<(), WatchError>
    where
        I: IntoIterator<Item = PathBuf>,
    {
        let wanted: BTreeSet<PathBuf> = wanted.into_iter().collect();
        let stale: Vec<PathBuf> = self
            .watchers
            .lock()
            .keys()
            .filter(|p| !wanted.contains(*p))
            .cloned()
            .collect();
        for path in &stale {
            self.unwatch(path);
        }

        let mut first_error = None;
        for path in &wanted {
            if let Err(e) = self.watch(path) {
                tracing::warn!(error = %e, "could not watch document");
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watchers.lock().contains_key(path)
    }

    /// Watched paths, sorted
    pub fn watched(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.watchers.lock().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn len(&self) -> usize {
        self.watchers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.watchers.lock().is_empty()
    }

    pub fn clear(&self) {
        let count = {
            let mut watchers = self.watchers.lock();
            let count = watchers.len();
            watchers.clear();
            count
        };
        tracing::debug!(count, "dropped all document watchers");
    }

    /// Convert a notify event on `watched` to a [`FileChangeEvent`].
    ///
    /// Editors that save by replacing the file produce remove/create pairs,
    /// so the existence of the path decides between change and removal for
    /// ambiguous kinds.
    fn convert_event(event: &Event, watched: &Path) -> Option<FileChangeEvent> {
        let exists = watched.exists();
        let change_or_removal = || {
            if exists {
                FileChangeEvent::Changed(watched.to_path_buf())
            } else {
                FileChangeEvent::Renamed(watched.to_path_buf())
            }
        };

        match event.kind {
            EventKind::Create(_) => Some(FileChangeEvent::Changed(watched.to_path_buf())),
            EventKind::Modify(ModifyKind::Name(_)) => Some(change_or_removal()),
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                Some(change_or_removal())
            }
            EventKind::Remove(_) => Some(change_or_removal()),
            EventKind::Any => Some(change_or_removal()),
            _ => None, // metadata and access events
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, RemoveKind, RenameMode};

    fn event(kind: EventKind) -> Event {
        Event::new(kind)
    }

    #[test]
    fn test_convert_event_kinds() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.yaml");
        std::fs::write(&present, "a: 1\n").unwrap();
        let missing = dir.path().join("gone.yaml");

        assert_eq!(
            FileWatcher::convert_event(&event(EventKind::Modify(ModifyKind::Data(DataChange::Content))), &present),
            Some(FileChangeEvent::Changed(present.clone()))
        );
        assert_eq!(
            FileWatcher::convert_event(&event(EventKind::Create(CreateKind::File)), &present),
            Some(FileChangeEvent::Changed(present.clone()))
        );
        assert_eq!(
            FileWatcher::convert_event(&event(EventKind::Remove(RemoveKind::File)), &missing),
            Some(FileChangeEvent::Renamed(missing.clone()))
        );
        assert_eq!(
            FileWatcher::convert_event(
                &event(EventKind::Modify(ModifyKind::Name(RenameMode::From))),
                &missing
            ),
            Some(FileChangeEvent::Renamed(missing.clone()))
        );
        assert_eq!(
            FileWatcher::convert_event(&event(EventKind::Access(AccessKind::Any)), &present),
            None
        );
    }

    #[test]
    fn test_watch_sync_and_unwatch() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.yaml");
        let b = dir.path().join("b.yaml");
        std::fs::write(&a, "a: 1\n").unwrap();
        std::fs::write(&b, "b: 1\n").unwrap();

        let watcher = FileWatcher::new(Arc::new(|_| {}));
        assert!(watcher.watch(&a).unwrap());
        assert!(!watcher.watch(&a).unwrap());

        watcher.sync(vec![b.clone()]).unwrap();
        assert_eq!(watcher.watched(), vec![b.clone()]);

        assert!(watcher.unwatch(&b));
        assert!(watcher.is_empty());
    }

    #[test]
    fn test_rewatch_after_replace_by_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.yaml");
        std::fs::write(&path, "a: 1\n").unwrap();
        let path = std::fs::canonicalize(&path).unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        let tx = Mutex::new(tx);
        let watcher = FileWatcher::new(Arc::new(move |event| {
            let _ = tx.lock().send(event);
        }));
        assert!(!watcher.rewatch(&path).unwrap());
        assert!(watcher.watch(&path).unwrap());

        let tmp = dir.path().join("a.yaml.tmp");
        std::fs::write(&tmp, "a: 2\n").unwrap();
        std::fs::rename(&tmp, &path).unwrap();
        assert!(rx.recv_timeout(std::time::Duration::from_secs(5)).is_ok());

        assert!(watcher.rewatch(&path).unwrap());
        while rx.try_recv().is_ok() {}
        std::fs::write(&path, "a: 3\n").unwrap();

        let event = rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(event, FileChangeEvent::Changed(path));
    }

    #[test]
    fn test_watch_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = FileWatcher::new(Arc::new(|_| {}));
        let result = watcher.watch(&dir.path().join("nope.yaml"));
        assert!(matches!(result, Err(WatchError::Watch { .. })));
        assert!(watcher.is_empty());
    }
}
