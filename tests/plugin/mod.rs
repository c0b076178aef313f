//! Tests for plugin install, uninstall, lifecycle, and capability merging.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use faultline::config::ConfigPatch;
use faultline::middleware::Middleware;
use faultline::plugin::{InstallError, InstallReport, Plugin};
use faultline::{ErrorValue, Runtime};

#[test]
fn install_merges_and_uninstall_reverses_exactly() {
    let runtime = Runtime::new();
    let baseline = runtime.middleware().len();

    let plugin = Plugin::builder("obs", "1.0.0")
        .middleware(Middleware::tap(|_r, _c| {}))
        .middleware(Middleware::tap(|_r, _c| {}))
        .error_kind("HttpError", |msg| ErrorValue::new("HttpError", msg))
        .utility("double", |v| serde_json::json!(v.as_i64().unwrap_or(0) * 2))
        .build();

    assert_eq!(runtime.install(plugin), Ok(InstallReport::Installed));
    assert_eq!(runtime.middleware().len(), baseline + 2);
    assert!(runtime.error_from_factory("HttpError", "x").is_some());
    assert_eq!(
        runtime.call_utility("double", serde_json::json!(21)),
        Some(serde_json::json!(42))
    );

    assert!(runtime.uninstall("obs"));
    assert_eq!(runtime.middleware().len(), baseline);
    assert!(runtime.error_from_factory("HttpError", "x").is_none());
    assert!(runtime.call_utility("double", serde_json::json!(1)).is_none());
    assert!(runtime.list_plugins().is_empty());
}

#[test]
fn missing_dependency_fails_without_partial_merge() {
    let runtime = Runtime::new();
    let installed = Arc::new(AtomicUsize::new(0));
    let hook_count = Arc::clone(&installed);

    let plugin = Plugin::builder("needs-base", "0.1.0")
        .depends_on("base")
        .on_install(move || {
            hook_count.fetch_add(1, Ordering::SeqCst);
        })
        .middleware(Middleware::tap(|_r, _c| {}))
        .error_kind("X", |msg| ErrorValue::new("X", msg))
        .build();

    let err = runtime.install(plugin).unwrap_err();
    assert_eq!(
        err,
        InstallError::MissingDependency {
            plugin: "needs-base".to_string(),
            missing: vec!["base".to_string()],
        }
    );
    assert_eq!(err.to_error_value().kind(), "MissingDependency");

    // Nothing leaked: no hook call, no middleware, no factory, no listing.
    assert_eq!(installed.load(Ordering::SeqCst), 0);
    assert!(runtime.middleware().is_empty());
    assert!(runtime.error_from_factory("X", "m").is_none());
    assert!(runtime.list_plugins().is_empty());
}

#[test]
fn dependency_satisfied_after_base_installs() {
    let runtime = Runtime::new();
    runtime.install(Plugin::builder("base", "1.0.0").build()).unwrap();

    let report = runtime
        .install(Plugin::builder("needs-base", "0.1.0").depends_on("base").build())
        .unwrap();
    assert_eq!(report, InstallReport::Installed);
    assert_eq!(runtime.list_plugins().len(), 2);
}

#[test]
fn reinstalling_same_name_is_a_benign_duplicate() {
    let runtime = Runtime::new();
    runtime.install(Plugin::builder("p", "1.0.0").build()).unwrap();

    let report = runtime
        .install(Plugin::builder("p", "2.0.0").middleware(Middleware::tap(|_r, _c| {})).build())
        .unwrap();
    assert_eq!(report, InstallReport::Duplicate);
    // The duplicate's capabilities were not merged.
    assert!(runtime.middleware().is_empty());
    assert_eq!(runtime.list_plugins()[0].version, "1.0.0");
}

#[test]
fn name_collision_is_last_write_wins_and_owner_checked_on_uninstall() {
    let runtime = Runtime::new();
    runtime
        .install(
            Plugin::builder("first", "1.0.0")
                .utility("fmt", |_| serde_json::json!("first"))
                .build(),
        )
        .unwrap();
    runtime
        .install(
            Plugin::builder("second", "1.0.0")
                .utility("fmt", |_| serde_json::json!("second"))
                .build(),
        )
        .unwrap();

    assert_eq!(
        runtime.call_utility("fmt", serde_json::json!(null)),
        Some(serde_json::json!("second"))
    );

    // "first" no longer owns the key, so its uninstall must not remove it.
    assert!(runtime.uninstall("first"));
    assert_eq!(
        runtime.call_utility("fmt", serde_json::json!(null)),
        Some(serde_json::json!("second"))
    );

    assert!(runtime.uninstall("second"));
    assert!(runtime.call_utility("fmt", serde_json::json!(null)).is_none());
}

#[test]
fn lifecycle_hooks_fire_in_order() {
    let runtime = Runtime::new();
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let push = |label: &'static str| {
        let log = Arc::clone(&log);
        move || log.lock().push(label)
    };

    let plugin = Plugin::builder("lifecycle", "1.0.0")
        .on_install(push("install"))
        .on_enable(push("enable"))
        .on_disable(push("disable"))
        .on_uninstall(push("uninstall"))
        .build();

    runtime.install(plugin).unwrap();
    runtime.disable_plugin("lifecycle");
    runtime.enable_plugin("lifecycle");
    runtime.uninstall("lifecycle");

    assert_eq!(
        *log.lock(),
        vec!["install", "enable", "disable", "enable", "disable", "uninstall"]
    );
}

#[test]
fn disabled_plugin_misses_config_change_notifications() {
    let runtime = Runtime::new();
    let seen = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&seen);

    let plugin = Plugin::builder("watcher", "1.0.0")
        .on_config_change(move |config| {
            assert!(!config.default_kind.is_empty());
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .build();
    runtime.install(plugin).unwrap();

    runtime.configure(ConfigPatch::new().capture_trace(true));
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    // Scope pushes are not configure calls; no notification.
    runtime.push_scope(ConfigPatch::new().minimal_mode(true));
    runtime.pop_scope();
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    runtime.disable_plugin("watcher");
    runtime.configure(ConfigPatch::new().capture_trace(false));
    assert_eq!(seen.load(Ordering::SeqCst), 1);

    runtime.enable_plugin("watcher");
    runtime.configure(ConfigPatch::new().capture_trace(true));
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

#[test]
fn config_patch_applies_at_install_time() {
    let runtime = Runtime::new();
    assert!(!runtime.config_snapshot().capture_trace);

    let plugin = Plugin::builder("tracer", "1.0.0")
        .config_patch(ConfigPatch::new().capture_trace(true).default_kind("TracedError"))
        .build();
    runtime.install(plugin).unwrap();

    let config = runtime.config_snapshot();
    assert!(config.capture_trace);
    assert_eq!(config.default_kind, "TracedError");
}

#[test]
fn disable_keeps_capabilities_merged() {
    let runtime = Runtime::new();
    let plugin = Plugin::builder("kinds", "1.0.0")
        .error_kind("NotFound", |msg| ErrorValue::new("NotFound", msg))
        .build();
    runtime.install(plugin).unwrap();

    runtime.disable_plugin("kinds");
    assert!(runtime.error_from_factory("NotFound", "gone").is_some());
    assert!(!runtime.list_plugins()[0].enabled);
}

#[test]
fn unknown_names_are_reported() {
    let runtime = Runtime::new();
    assert!(!runtime.uninstall("ghost"));
    assert!(!runtime.enable_plugin("ghost"));
    assert!(!runtime.disable_plugin("ghost"));
}
