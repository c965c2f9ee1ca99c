//! LiveReload - debounced re-resolution on file changes
//!
//! One worker thread owns the [`Debouncer`]. Change events reach it through
//! a channel, either from the per-document watchers or from
//! [`LiveReload::handle_event`], so only one rebuild ever runs at a time.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use super::debounce::{Debouncer, ReloadBatch};
use super::listener::ReloadListener;
use crate::config::ReloadErrorPolicy;
use crate::errors::{Result, YextError};
use crate::features::file_watcher::{EventSink, FileChangeEvent, FileWatcher};
use crate::features::resolver::ResolvedDocument;
use crate::pipeline::Engine;
use crate::shared::models::Params;

enum Command {
    Event(FileChangeEvent),
    Shutdown,
}

struct Shared {
    engine: Engine,
    listener: Arc<dyn ReloadListener>,
    watcher: FileWatcher,
    policy: ReloadErrorPolicy,
    /// Registered entries and the params they are resolved with
    entries: Mutex<BTreeMap<PathBuf, Params>>,
    last_good: Mutex<HashMap<PathBuf, Arc<ResolvedDocument>>>,
    rebuilds: AtomicUsize,
}

pub struct LiveReload {
    shared: Arc<Shared>,
    commands: Sender<Command>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl LiveReload {
    /// Start the worker thread. The debounce window and the error policy
    /// come from the engine's options.
    pub fn new(engine: Engine, listener: Arc<dyn ReloadListener>) -> Result<Self> {
        let (commands, receiver) = mpsc::channel();
        let sink_commands = commands.clone();
        let sink: EventSink = Arc::new(move |event| {
            let _ = sink_commands.send(Command::Event(event));
        });

        let interval = engine.options().debounce_interval();
        let shared = Arc::new(Shared {
            policy: engine.options().reload_error_policy,
            engine,
            listener,
            watcher: FileWatcher::new(sink),
            entries: Mutex::new(BTreeMap::new()),
            last_good: Mutex::new(HashMap::new()),
            rebuilds: AtomicUsize::new(0),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name("yext-live-reload".to_string())
            .spawn(move || run(worker_shared, receiver, interval))?;

        tracing::info!(debounce_ms = interval.as_millis() as u64, "live reload started");
        Ok(Self {
            shared,
            commands,
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn engine(&self) -> &Engine {
        &self.shared.engine
    }

    /// Resolve `path` as an entry, watch it and everything it imports.
    pub fn add(&self, path: impl AsRef<Path>, params: Params) -> Result<Arc<ResolvedDocument>> {
        let document = self.shared.engine.resolve(path, params.clone())?;
        let key = document.path.clone();

        self.shared.entries.lock().insert(key.clone(), params);
        if !document.has_errors() {
            self.shared
                .last_good
                .lock()
                .insert(key, Arc::clone(&document));
        }
        self.shared.sync_watchers();
        Ok(document)
    }

    /// Published result of an entry (the last good one under
    /// [`ReloadErrorPolicy::KeepLastGood`] while the latest has errors)
    pub fn get(&self, path: impl AsRef<Path>) -> Option<Arc<ResolvedDocument>> {
        let key = self.shared.engine.canonical(path);
        self.shared.published(&key)
    }

    pub fn get_all(&self) -> BTreeMap<PathBuf, Arc<ResolvedDocument>> {
        let keys: Vec<PathBuf> = self.shared.entries.lock().keys().cloned().collect();
        keys.into_iter()
            .filter_map(|key| self.shared.published(&key).map(|doc| (key, doc)))
            .collect()
    }

    /// Stop tracking an entry. Returns whether it was registered.
    pub fn delete(&self, path: impl AsRef<Path>) -> bool {
        let key = self.shared.engine.canonical(path);
        let removed = self.shared.entries.lock().remove(&key).is_some();
        self.shared.last_good.lock().remove(&key);
        self.shared.engine.delete(&key);
        self.shared.sync_watchers();
        removed
    }

    pub fn delete_all(&self) {
        self.shared.entries.lock().clear();
        self.shared.last_good.lock().clear();
        self.shared.engine.delete_all();
        self.shared.watcher.clear();
    }

    /// Queue a change as if a watcher had reported it
    pub fn handle_event(&self, event: FileChangeEvent) -> Result<()> {
        self.commands
            .send(Command::Event(event))
            .map_err(|_| YextError::Join("live reload worker has stopped".to_string()))
    }

    /// Completed rebuilds since start
    pub fn rebuild_count(&self) -> usize {
        self.shared.rebuilds.load(Ordering::SeqCst)
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.shared.watcher.watched()
    }

    /// Stop the worker and every watcher, then clear the engine.
    pub fn teardown(&self) {
        self.shutdown();
        self.shared.watcher.clear();
        self.shared.entries.lock().clear();
        self.shared.last_good.lock().clear();
        self.shared.engine.teardown();
    }

    fn shutdown(&self) {
        let Some(worker) = self.worker.lock().take() else {
            return;
        };
        let _ = self.commands.send(Command::Shutdown);
        if worker.join().is_err() {
            tracing::warn!("live reload worker panicked");
        }
    }
}

impl Drop for LiveReload {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn run(shared: Arc<Shared>, commands: Receiver<Command>, interval: Duration) {
    let mut debouncer = Debouncer::new(interval);
    loop {
        let received = match debouncer.next_deadline() {
            Some(deadline) => commands.recv_timeout(deadline.saturating_duration_since(Instant::now())),
            None => commands.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };
        match received {
            Ok(Command::Event(event)) => {
                tracing::debug!(path = %event.path().display(), kind = event.event_type(), "change queued");
                debouncer.push(event, Instant::now());
            }
            Ok(Command::Shutdown) | Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {}
        }

        if let Some(batch) = debouncer.poll(Instant::now()) {
            shared.rebuild(batch);

            // Whatever arrived during the rebuild starts the next cycle
            loop {
                match commands.try_recv() {
                    Ok(Command::Event(event)) => debouncer.push(event, Instant::now()),
                    Ok(Command::Shutdown) | Err(TryRecvError::Disconnected) => return,
                    Err(TryRecvError::Empty) => break,
                }
            }
            debouncer.finish();
        }
    }
    tracing::debug!("live reload worker stopped");
}

impl Shared {
    fn published(&self, key: &Path) -> Option<Arc<ResolvedDocument>> {
        let latest = self.engine.get(key)?;
        if self.policy == ReloadErrorPolicy::KeepLastGood && latest.has_errors() {
            if let Some(good) = self.last_good.lock().get(key) {
                return Some(Arc::clone(good));
            }
        }
        Some(latest)
    }

    fn sync_watchers(&self) {
        if let Err(e) = self.watcher.sync(self.engine.reachable()) {
            tracing::debug!(error = %e, "watcher sync incomplete");
        }
    }

    fn rebuild(&self, batch: ReloadBatch) {
        let started = Instant::now();
        let registered: BTreeSet<PathBuf> = self.entries.lock().keys().cloned().collect();

        let mut affected = BTreeSet::new();
        let mut removed = Vec::new();
        for event in batch.events() {
            let path = self.engine.canonical(event.path());
            match event {
                FileChangeEvent::Changed(_) => {
                    // Re-armed before the re-read, so later writes are seen
                    if let Err(e) = self.watcher.rewatch(&path) {
                        tracing::debug!(path = %path.display(), error = %e, "could not re-arm watcher");
                    }
                    affected.extend(self.engine.invalidate(&path));
                }
                FileChangeEvent::Renamed(_) => {
                    affected.extend(self.engine.dependents(&path));
                    if registered.contains(&path) {
                        removed.push(path.clone());
                    }
                    self.engine.delete(&path);
                }
            }
        }

        let mut updates = Vec::new();
        for path in affected {
            if removed.contains(&path) {
                continue;
            }
            let Some(params) = self.entries.lock().get(&path).cloned() else {
                continue;
            };
            match self.engine.resolve(&path, params) {
                Ok(document) => updates.push((path, document)),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "entry can no longer be resolved");
                    self.engine.delete(&path);
                    removed.push(path);
                }
            }
        }

        for path in &removed {
            self.entries.lock().remove(path);
            self.last_good.lock().remove(path);
        }
        self.sync_watchers();
        self.rebuilds.fetch_add(1, Ordering::SeqCst);

        tracing::info!(
            events = batch.len(),
            rebuilt = updates.len(),
            removed = removed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "reload complete"
        );

        for path in &removed {
            self.listener.on_update(path, None);
        }
        for (path, document) in updates {
            self.publish(&path, document);
        }
    }

    fn publish(&self, path: &Path, document: Arc<ResolvedDocument>) {
        if !document.has_errors() {
            self.last_good
                .lock()
                .insert(path.to_path_buf(), Arc::clone(&document));
            self.listener.on_update(path, Some(&document.value));
            return;
        }

        let last_good = match self.policy {
            ReloadErrorPolicy::KeepLastGood => self.last_good.lock().get(path).cloned(),
            ReloadErrorPolicy::ReturnNew => None,
        };
        match last_good {
            Some(good) => {
                let diagnostics: Vec<_> = document.diagnostics().cloned().collect();
                self.listener.on_warning(path, &diagnostics);
                self.listener.on_update(path, Some(&good.value));
            }
            None => self.listener.on_update(path, Some(&document.value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineOptions;
    use crate::shared::models::Value;
    use tempfile::TempDir;

    #[derive(Default)]
    struct Recorder {
        updates: Mutex<Vec<(PathBuf, Option<Value>)>>,
        warnings: AtomicUsize,
    }

    impl ReloadListener for Recorder {
        fn on_update(&self, path: &Path, value: Option<&Value>) {
            self.updates
                .lock()
                .push((path.to_path_buf(), value.cloned()));
        }

        fn on_warning(&self, _path: &Path, _diagnostics: &[crate::shared::models::Diagnostic]) {
            self.warnings.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn wait_for(mut done: impl FnMut() -> bool) {
        let until = Instant::now() + Duration::from_secs(5);
        while !done() && Instant::now() < until {
            thread::sleep(Duration::from_millis(10));
        }
    }

    fn setup(policy: ReloadErrorPolicy) -> (TempDir, PathBuf, Arc<Recorder>, LiveReload) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.yaml");
        std::fs::write(&path, "v: 1\n").unwrap();
        let options = EngineOptions::new(dir.path())
            .debounce(Duration::from_millis(100))
            .reload_error_policy(policy);
        let recorder = Arc::new(Recorder::default());
        let live = LiveReload::new(Engine::new(options).unwrap(), recorder.clone()).unwrap();
        (dir, path, recorder, live)
    }

    #[test]
    fn test_keep_last_good_on_errors() {
        let (_dir, path, recorder, live) = setup(ReloadErrorPolicy::KeepLastGood);
        live.add(&path, Params::new()).unwrap();

        std::fs::write(&path, "v: $param.missing\n").unwrap();
        live.handle_event(FileChangeEvent::Changed(path.clone())).unwrap();
        wait_for(|| !recorder.updates.lock().is_empty());

        let updates = recorder.updates.lock().clone();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].1, Some(serde_yaml::from_str("v: 1").unwrap()));
        assert_eq!(recorder.warnings.load(Ordering::SeqCst), 1);
        assert_eq!(live.get(&path).unwrap().value["v"], Value::from(1));
    }

    #[test]
    fn test_removed_entry_notifies_none() {
        let (_dir, path, recorder, live) = setup(ReloadErrorPolicy::ReturnNew);
        live.add(&path, Params::new()).unwrap();
        let key = live.engine().canonical(&path);

        std::fs::remove_file(&path).unwrap();
        live.handle_event(FileChangeEvent::Renamed(key.clone())).unwrap();
        wait_for(|| recorder.updates.lock().iter().any(|(_, v)| v.is_none()));

        assert!(recorder.updates.lock().contains(&(key, None)));
        assert!(live.get_all().is_empty());
    }

    #[test]
    fn test_teardown_stops_worker() {
        let (_dir, path, _recorder, live) = setup(ReloadErrorPolicy::ReturnNew);
        live.add(&path, Params::new()).unwrap();
        assert_eq!(live.watched().len(), 1);

        live.teardown();
        assert!(live.watched().is_empty());
        assert!(live.get_all().is_empty());
        assert!(live.handle_event(FileChangeEvent::Changed(path)).is_err());
    }
}
