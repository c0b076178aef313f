//! Tests for middleware ordering, halting, recovery, and type erasure.

use std::sync::Arc;

use parking_lot::Mutex;

use faultline::middleware::{Middleware, PipelineResult};
use faultline::{ErrorValue, OutcomeExt, RunOptions, Runtime};

fn tracer(log: &Arc<Mutex<Vec<&'static str>>>, label: &'static str) -> faultline::middleware::MiddlewareFn {
    let log = Arc::clone(log);
    Middleware::tap(move |_result, _ctx| log.lock().push(label))
}

#[test]
fn entries_run_in_registration_order() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    runtime.use_many([tracer(&log, "a"), tracer(&log, "b"), tracer(&log, "c")]);

    let _ = runtime.run_sync(|| Ok::<_, String>(1), RunOptions::new());
    assert_eq!(*log.lock(), vec!["a", "b", "c"]);
}

#[test]
fn halt_skips_remaining_entries() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    runtime.use_entry(tracer(&log, "a"));
    let halt_log = Arc::clone(&log);
    runtime.use_entry(Middleware::new(move |result, ctx| {
        halt_log.lock().push("b");
        ctx.halt();
        result
    }));
    runtime.use_entry(tracer(&log, "c"));

    let _ = runtime.run_sync(|| Ok::<_, String>(1), RunOptions::new());
    assert_eq!(*log.lock(), vec!["a", "b"]);
}

#[test]
fn recover_with_flips_an_error_into_success() {
    let runtime = Runtime::new();
    runtime.use_entry(Middleware::recover_with(|err, _ctx| {
        err.is_kind("Thrown").then_some(-1i32)
    }));

    let outcome = runtime.run_sync(|| "x".parse::<i32>(), RunOptions::new());
    assert_eq!(outcome, Ok(-1));
}

#[test]
fn recover_with_leaves_unmatched_errors_alone() {
    let runtime = Runtime::new();
    runtime.use_entry(Middleware::recover_with(|err, _ctx| {
        err.is_kind("CacheMiss").then_some(0i32)
    }));

    let outcome = runtime.run_sync(|| "x".parse::<i32>(), RunOptions::new());
    assert!(outcome.is_error_kind("Thrown"));
}

#[test]
fn explicit_priorities_reorder_the_stack() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let late = Arc::clone(&log);
    runtime.middleware().use_with_priority(10, Middleware::tap(move |_r, _c| late.lock().push("late")));
    let early = Arc::clone(&log);
    runtime.middleware().use_with_priority(-5, Middleware::tap(move |_r, _c| early.lock().push("early")));
    runtime.use_entry(tracer(&log, "default"));

    let _ = runtime.run_sync(|| Ok::<_, String>(1), RunOptions::new());
    // Lower priority runs first; entries without one sort as zero.
    assert_eq!(*log.lock(), vec!["early", "default", "late"]);
}

#[test]
fn removing_an_entry_by_id_takes_effect() {
    let runtime = Runtime::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let id = runtime.use_entry(tracer(&log, "removed"));
    runtime.use_entry(tracer(&log, "kept"));

    assert!(runtime.middleware().remove(id));
    assert!(!runtime.middleware().remove(id));

    let _ = runtime.run_sync(|| Ok::<_, String>(1), RunOptions::new());
    assert_eq!(*log.lock(), vec!["kept"]);
}

#[test]
fn type_mismatched_replacement_surfaces_as_thrown() {
    let runtime = Runtime::new();
    runtime.use_entry(Middleware::new(|result, _ctx| match result {
        PipelineResult::Failure(_) => PipelineResult::Success(Box::new("wrong type")),
        success => success,
    }));

    let outcome: Result<i32, _> = runtime.run_sync(|| "x".parse::<i32>(), RunOptions::new());
    let err = outcome.error_value().unwrap();
    assert_eq!(err.kind(), "Thrown");
    assert!(err.message().contains("mismatched type"));
}

#[test]
fn error_replacement_feeds_the_next_entry() {
    let runtime = Runtime::new();
    runtime.use_entry(Middleware::on_error(|err, _ctx| {
        ErrorValue::new("Stage1", err.message())
    }));
    runtime.use_entry(Middleware::on_error(|err, _ctx| {
        assert_eq!(err.kind(), "Stage1");
        ErrorValue::new("Stage2", err.message())
    }));

    let outcome = runtime.run_sync(|| "x".parse::<i32>(), RunOptions::new());
    assert!(outcome.is_error_kind("Stage2"));
}

#[test]
fn empty_stack_leaves_success_unboxed() {
    let runtime = Runtime::new();
    assert!(runtime.middleware().is_empty());
    let outcome = runtime.run_sync(|| Ok::<_, String>(vec![1, 2, 3]), RunOptions::new());
    assert_eq!(outcome, Ok(vec![1, 2, 3]));
}
