//! Live reload against real files and watchers

#[path = "../common/mod.rs"]
mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use common::{yaml, Sandbox};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use yext_engine::{Engine, FileChangeEvent, LiveReload, Params, ReloadListener, Value};

#[derive(Default)]
struct Recorder {
    updates: Mutex<Vec<(PathBuf, Option<Value>)>>,
}

impl Recorder {
    fn count(&self) -> usize {
        self.updates.lock().len()
    }

    fn last(&self) -> Option<(PathBuf, Option<Value>)> {
        self.updates.lock().last().cloned()
    }
}

impl ReloadListener for Recorder {
    fn on_update(&self, path: &Path, value: Option<&Value>) {
        self.updates.lock().push((path.to_path_buf(), value.cloned()));
    }
}

fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    let until = Instant::now() + Duration::from_secs(5);
    while Instant::now() < until {
        if done() {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    done()
}

fn live(sandbox: &Sandbox) -> (Arc<Recorder>, LiveReload) {
    let options = sandbox.options().debounce(Duration::from_millis(100));
    let recorder = Arc::new(Recorder::default());
    let live = LiveReload::new(Engine::new(options).unwrap(), recorder.clone()).unwrap();
    (recorder, live)
}

#[test]
fn test_burst_of_events_is_one_rebuild() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "v: 1\n")]);
    let (recorder, live) = live(&sandbox);
    let app = sandbox.canonical("app.yaml");
    live.add(&app, Params::new()).unwrap();

    for _ in 0..3 {
        live.handle_event(FileChangeEvent::Changed(app.clone())).unwrap();
    }

    assert!(wait_for(|| live.rebuild_count() >= 1));
    thread::sleep(Duration::from_millis(300));
    assert_eq!(live.rebuild_count(), 1);
    assert_eq!(recorder.count(), 1);
    assert_eq!(recorder.last(), Some((app, Some(yaml("v: 1")))));
}

#[test]
fn test_dependency_change_rebuilds_importer() {
    let sandbox = Sandbox::with_documents(&[
        ("lib.yaml", "port: 80\n"),
        ("app.yaml", "%IMPORT lib ./lib.yaml\n---\nport: $import.lib.port\n"),
    ]);
    let (recorder, live) = live(&sandbox);
    let app = sandbox.canonical("app.yaml");
    let lib = sandbox.canonical("lib.yaml");
    live.add(&app, Params::new()).unwrap();

    sandbox.write("lib.yaml", "port: 8080\n");
    live.handle_event(FileChangeEvent::Changed(lib)).unwrap();

    let expected = Some((app.clone(), Some(yaml("port: 8080"))));
    assert!(wait_for(|| recorder.last() == expected));
    assert_eq!(live.get(&app).unwrap().value["port"], Value::from(8080));
}

#[test]
fn test_watchers_follow_the_import_graph() {
    let sandbox = Sandbox::with_documents(&[
        ("a.yaml", "a: 1\n"),
        ("b.yaml", "b: 2\n"),
        ("app.yaml", "%IMPORT a ./a.yaml\n---\na: $import.a.a\n"),
    ]);
    let (_recorder, live) = live(&sandbox);
    let app = sandbox.canonical("app.yaml");
    live.add(&app, Params::new()).unwrap();

    let mut expected = vec![sandbox.canonical("a.yaml"), app.clone()];
    expected.sort();
    assert_eq!(live.watched(), expected);

    sandbox.write("app.yaml", "%IMPORT b ./b.yaml\n---\nb: $import.b.b\n");
    live.handle_event(FileChangeEvent::Changed(app.clone())).unwrap();

    let mut expected = vec![sandbox.canonical("b.yaml"), app];
    expected.sort();
    assert!(wait_for(|| live.watched() == expected));
}

#[test]
fn test_file_write_is_picked_up_by_watcher() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "name: before\n")]);
    let (recorder, live) = live(&sandbox);
    let app = sandbox.canonical("app.yaml");
    live.add(&app, Params::new()).unwrap();

    sandbox.write("app.yaml", "name: after\n");

    let expected = Some((app, Some(yaml("name: after"))));
    assert!(wait_for(|| recorder.last() == expected));
}

#[test]
fn test_writes_after_replace_by_rename_are_seen() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "v: 1\n")]);
    let (recorder, live) = live(&sandbox);
    let app = sandbox.canonical("app.yaml");
    live.add(&app, Params::new()).unwrap();

    let tmp = sandbox.write("app.yaml.tmp", "v: 2\n");
    std::fs::rename(&tmp, &app).unwrap();
    let replaced = Some((app.clone(), Some(yaml("v: 2"))));
    assert!(wait_for(|| recorder.last() == replaced));

    sandbox.write("app.yaml", "v: 3\n");
    let written = Some((app.clone(), Some(yaml("v: 3"))));
    assert!(wait_for(|| recorder.last() == written));
    assert_eq!(live.watched(), vec![app]);
}

#[test]
fn test_add_rejects_paths_outside_sandbox() {
    let outside = Sandbox::with_documents(&[("x.yaml", "x: 1\n")]);
    let sandbox = Sandbox::new();
    let (_recorder, live) = live(&sandbox);

    assert!(live.add(outside.path("x.yaml"), Params::new()).is_err());
    assert!(live.watched().is_empty());
}
