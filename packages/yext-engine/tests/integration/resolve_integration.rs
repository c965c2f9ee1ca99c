//! End-to-end resolution over real document trees

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;

use common::{yaml, Sandbox};
use pretty_assertions::assert_eq;
use yext_engine::{
    DiagnosticKind, Engine, EngineOptions, IgnorePrivate, Params, Preset, Value, YextError,
};

#[test]
fn test_same_params_return_same_result() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "%PARAM a\n---\nv: $param.a\n")]);
    let engine = sandbox.engine();

    let params = Params::from_pairs([("a", "1")]);
    let first = engine.resolve("app.yaml", params.clone()).unwrap();
    let second = engine.resolve("app.yaml", params).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(engine.cache_stats().hits, 1);
}

#[test]
fn test_params_are_part_of_the_cache_key() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "%PARAM a\n%PARAM b\n---\nv: $param.a\n")]);
    let engine = sandbox.engine();

    let one = engine
        .resolve("app.yaml", Params::from_pairs([("a", "1")]))
        .unwrap();
    let two = engine
        .resolve("app.yaml", Params::from_pairs([("a", "1"), ("b", "2")]))
        .unwrap();
    let reordered = engine
        .resolve("app.yaml", Params::from_pairs([("b", "2"), ("a", "1")]))
        .unwrap();

    assert!(!Arc::ptr_eq(&one, &two));
    assert!(Arc::ptr_eq(&two, &reordered));
}

#[test]
fn test_import_cycle_is_reported_and_not_cached() {
    let sandbox = Sandbox::with_documents(&[
        ("a.yaml", "%IMPORT b ./b.yaml\n---\nfrom_b: $import.b.name\nname: a\n"),
        ("b.yaml", "%IMPORT a ./a.yaml\n---\nfrom_a: $import.a.name\nname: b\n"),
    ]);
    let engine = sandbox.engine();

    let first = engine.resolve("a.yaml", Params::new()).unwrap();
    assert!(first.has_cycle());

    let cycle = first
        .diagnostics()
        .find(|d| d.is_cycle())
        .and_then(|d| d.cycle.clone())
        .unwrap();
    let a = sandbox.canonical("a.yaml");
    let b = sandbox.canonical("b.yaml");
    assert_eq!(cycle, vec![a.clone(), b, a]);

    let second = engine.resolve("a.yaml", Params::new()).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
}

#[test]
fn test_self_import_is_a_cycle() {
    let sandbox = Sandbox::with_documents(&[("a.yaml", "%IMPORT me ./a.yaml\n---\nx: $import.me\n")]);
    let doc = sandbox.engine().resolve("a.yaml", Params::new()).unwrap();

    let a = sandbox.canonical("a.yaml");
    let cycle = doc.errors.iter().find_map(|d| d.cycle.clone()).unwrap();
    assert_eq!(cycle, vec![a.clone(), a]);
    assert_eq!(doc.value["x"], Value::Null);
}

#[test]
fn test_private_fields_hidden_from_output_but_traversable() {
    let sandbox = Sandbox::with_documents(&[
        ("secrets.yaml", "%PRIVATE secret.key\n---\nsecret:\n  key: 1\n  other: 2\n"),
        (
            "app.yaml",
            "%IMPORT s ./secrets.yaml\n---\nkey: $import.s.secret.key\nwhole: $import.s\n",
        ),
    ]);
    let engine = sandbox.engine();

    let app = engine.resolve("app.yaml", Params::new()).unwrap();
    assert!(app.errors.is_empty(), "{:?}", app.errors);
    assert_eq!(app.value["key"], Value::from(1));
    assert_eq!(app.value["whole"], yaml("secret: {other: 2}"));

    let secrets = engine.resolve("secrets.yaml", Params::new()).unwrap();
    assert_eq!(secrets.value, yaml("secret: {other: 2}"));
}

#[test]
fn test_ignore_private_for_the_entry_only() {
    let sandbox = Sandbox::with_documents(&[
        ("lib.yaml", "%PRIVATE hidden\n---\nhidden: 1\nshown: 2\n"),
        ("app.yaml", "%PRIVATE mine\n%IMPORT lib ./lib.yaml\n---\nmine: 0\nlib: $import.lib\n"),
    ]);
    let options = sandbox.options().ignore_private(IgnorePrivate::Current);
    let engine = Engine::new(options).unwrap();

    let app = engine.resolve("app.yaml", Params::new()).unwrap();
    assert_eq!(app.value, yaml("mine: 0\nlib: {shown: 2}"));
}

#[test]
fn test_import_params_defaults_and_overrides() {
    let sandbox = Sandbox::with_documents(&[
        (
            "db.yaml",
            "%PARAM env dev\n%PARAM port scalar 5432\n---\nurl: \"postgres://${param.env}.db:${param.port}\"\n",
        ),
        (
            "app.yaml",
            "%IMPORT db ./db.yaml env=staging\n---\ndefault: $import.db.url\nprod: $import.db.url(env=prod, port=6432)\n",
        ),
    ]);
    let app = sandbox.engine().resolve("app.yaml", Params::new()).unwrap();

    assert!(app.errors.is_empty(), "{:?}", app.errors);
    assert_eq!(app.value["default"], Value::from("postgres://staging.db:5432"));
    assert_eq!(app.value["prod"], Value::from("postgres://prod.db:6432"));
}

#[test]
fn test_dependency_change_invalidates_importer() {
    let sandbox = Sandbox::with_documents(&[
        ("lib.yaml", "v: 1\n"),
        ("app.yaml", "%IMPORT lib ./lib.yaml\n---\nv: $import.lib.v\n"),
    ]);
    let engine = sandbox.engine();

    let before = engine.resolve("app.yaml", Params::new()).unwrap();
    assert_eq!(before.value["v"], Value::from(1));

    sandbox.write("lib.yaml", "v: 2\n");
    let after = engine.resolve("app.yaml", Params::new()).unwrap();
    assert_eq!(after.value["v"], Value::from(2));
}

#[test]
fn test_nested_directories_and_relative_imports() {
    let sandbox = Sandbox::with_documents(&[
        ("shared/base.yaml", "name: base\n"),
        ("services/api.yaml", "%IMPORT base ../shared/base.yaml\n---\nname: $import.base.name\n"),
        ("app.yaml", "%IMPORT api ./services/api.yaml\n---\napi: $import.api\n"),
    ]);
    let engine = sandbox.engine();
    let app = engine.resolve("app.yaml", Params::new()).unwrap();

    assert_eq!(app.value, yaml("api: {name: base}"));
    assert_eq!(engine.dependencies("app.yaml").len(), 2);
}

#[test]
fn test_import_outside_sandbox_is_a_path_diagnostic() {
    let outside = Sandbox::with_documents(&[("x.yaml", "x: 1\n")]);
    let target = outside.canonical("x.yaml");
    let sandbox = Sandbox::with_documents(&[(
        "app.yaml",
        &format!("%IMPORT x {}\n---\nx: $import.x\n", target.display()),
    )]);

    let app = sandbox.engine().resolve("app.yaml", Params::new()).unwrap();
    assert_eq!(app.value["x"], Value::Null);
    assert_eq!(app.errors.len(), 1);
    assert_eq!(app.errors[0].kind, DiagnosticKind::Path);
    assert!(app.errors[0].message.contains("outside the sandbox"));
}

#[test]
fn test_entry_outside_sandbox_is_an_error() {
    let outside = Sandbox::with_documents(&[("x.yaml", "x: 1\n")]);
    let sandbox = Sandbox::new();

    let result = sandbox.engine().resolve(outside.path("x.yaml"), Params::new());
    assert!(matches!(result, Err(YextError::OutsideSandbox(_))));
}

#[test]
fn test_escaped_interpolation_and_forward_alias() {
    let sandbox = Sandbox::with_documents(&[(
        "app.yaml",
        "template: \"$${name}\"\nearly: *late\nlate: &late 3\n",
    )]);
    let app = sandbox.engine().resolve("app.yaml", Params::new()).unwrap();

    assert_eq!(app.value["template"], Value::from("${name}"));
    assert_eq!(app.value["early"], Value::Null);
    assert_eq!(app.errors.len(), 1);
    assert_eq!(app.errors[0].kind, DiagnosticKind::Expression);
}

#[test]
fn test_diagnostics_render_logical_filename() {
    let sandbox = Sandbox::with_documents(&[(
        "app.yaml",
        "%FILENAME settings\n---\na: 1\nb: $param.nope\n",
    )]);
    let app = sandbox.engine().resolve("app.yaml", Params::new()).unwrap();

    let rendered = app.errors[0].to_string();
    assert!(rendered.starts_with("settings:4:"), "{}", rendered);
    assert!(rendered.ends_with("error [expression]: unknown $param alias 'nope'"));
}

#[test]
fn test_options_from_yaml_file() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "a: 1\n")]);
    let config = sandbox.write(
        "yext.yml.cfg",
        "version: 1\npreset: development\nsandbox: .\ndebounce_ms: 75\n",
    );

    let options = EngineOptions::from_yaml(&config).unwrap();
    assert!(options.unsafe_paths);
    assert_eq!(options.debounce_ms, 75);
    assert_eq!(options.ignore_private, EngineOptions::preset(Preset::Development).ignore_private);

    let engine = Engine::new(options).unwrap();
    assert_eq!(
        engine.resolve(sandbox.path("app.yaml"), Params::new()).unwrap().value,
        yaml("a: 1")
    );
}

#[tokio::test]
async fn test_resolve_async_matches_blocking() {
    let sandbox = Sandbox::with_documents(&[("app.yaml", "%PARAM n\n---\nn: $param.n\n")]);
    let engine = sandbox.engine();

    let params = Params::from_pairs([("n", 7)]);
    let async_result = engine
        .resolve_async(sandbox.path("app.yaml"), params.clone())
        .await
        .unwrap();
    let blocking = engine.resolve("app.yaml", params).unwrap();

    assert_eq!(async_result.value["n"], Value::from(7));
    assert!(Arc::ptr_eq(&async_result, &blocking));
}
