//! Tests for the async wrapper: normalization, timeout, and cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use faultline::async_ext::{AsyncOptions, CancelToken, FutureOutcomeExt};
use faultline::middleware::Middleware;
use faultline::{Cause, ErrorValue, OutcomeExt, RunOptions, Runtime};

#[tokio::test]
async fn success_passes_through() {
    let runtime = Runtime::new();
    let outcome = runtime
        .run_async(|| async { Ok::<_, String>(7) }, AsyncOptions::new())
        .await;
    assert_eq!(outcome, Ok(7));
}

#[tokio::test]
async fn rejected_future_normalizes_like_the_sync_wrapper() {
    let runtime = Runtime::new();

    let sync = runtime.run_sync(|| "x".parse::<i32>(), RunOptions::new());
    let from_async = runtime
        .run_async(|| async { "x".parse::<i32>() }, AsyncOptions::new())
        .await;

    let sync_err = sync.error_value().unwrap();
    let async_err = from_async.error_value().unwrap();
    assert_eq!(async_err.kind(), sync_err.kind());
    assert_eq!(async_err.message(), sync_err.message());
    assert_eq!(async_err.cause(), sync_err.cause());
}

#[tokio::test]
async fn timeout_produces_the_distinguished_kind() {
    let runtime = Runtime::new();
    let started = Instant::now();

    let outcome: Result<i32, _> = runtime
        .run_async(
            || std::future::pending::<Result<i32, String>>(),
            AsyncOptions::new().timeout(Duration::from_millis(50)),
        )
        .await;

    assert!(outcome.is_timeout());
    assert!(outcome.error_value().unwrap().message().contains("timed out"));
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(40), "fired too early: {elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "fired too late: {elapsed:?}");
}

#[tokio::test]
async fn kind_override_does_not_apply_to_timeouts() {
    let runtime = Runtime::new();
    let outcome: Result<i32, _> = runtime
        .run_async(
            || std::future::pending::<Result<i32, String>>(),
            AsyncOptions::new().kind("Custom").timeout(Duration::from_millis(10)),
        )
        .await;
    assert!(outcome.is_timeout());
}

#[tokio::test]
async fn ready_operation_beats_a_zero_timeout() {
    let runtime = Runtime::new();
    let outcome = runtime
        .run_async(
            || async { Ok::<_, String>(42) },
            AsyncOptions::new().timeout(Duration::ZERO),
        )
        .await;
    assert_eq!(outcome, Ok(42));
}

#[tokio::test]
async fn pre_cancelled_token_aborts_without_starting_the_work() {
    let runtime = Runtime::new();
    let token = CancelToken::new();
    token.cancel();

    let invoked = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&invoked);
    let outcome: Result<i32, _> = runtime
        .run_async(
            move || {
                flag.store(true, Ordering::SeqCst);
                async { Ok::<_, String>(0) }
            },
            AsyncOptions::new().cancel(token),
        )
        .await;

    assert!(outcome.is_aborted());
    assert!(outcome.error_value().unwrap().message().contains("before start"));
    assert!(!invoked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn mid_flight_cancellation_aborts_the_wait() {
    let runtime = Runtime::new();
    let token = CancelToken::new();

    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        trigger.cancel();
    });

    let outcome: Result<i32, _> = runtime
        .run_async(
            || std::future::pending::<Result<i32, String>>(),
            AsyncOptions::new().cancel(token.clone()),
        )
        .await;

    assert!(outcome.is_aborted());
    assert!(token.is_cancelled());
}

#[tokio::test]
async fn cancel_is_idempotent() {
    let token = CancelToken::new();
    assert!(!token.is_cancelled());
    token.cancel();
    token.cancel();
    assert!(token.is_cancelled());
    // Resolves immediately once cancelled.
    token.cancelled().await;
}

#[tokio::test]
async fn panicking_future_is_caught() {
    let runtime = Runtime::new();
    let outcome: Result<i32, _> = runtime
        .run_async(
            || async {
                if true {
                    panic!("async kaboom");
                }
                Ok::<_, String>(0)
            },
            AsyncOptions::new(),
        )
        .await;

    let err = outcome.error_value().unwrap();
    assert_eq!(err.kind(), "Thrown");
    assert_eq!(err.message(), "async kaboom");
}

#[tokio::test]
async fn panic_before_producing_the_future_is_caught() {
    let runtime = Runtime::new();
    let outcome: Result<i32, _> = runtime
        .run_async(
            || {
                if true {
                    panic!("constructor kaboom");
                }
                async { Ok::<_, String>(0) }
            },
            AsyncOptions::new(),
        )
        .await;

    assert!(outcome.is_error_kind("Thrown"));
    assert_eq!(outcome.error_value().unwrap().message(), "constructor kaboom");
}

#[tokio::test]
async fn timeout_error_carries_the_per_call_context() {
    let runtime = Runtime::new();
    let outcome: Result<i32, _> = runtime
        .run_async(
            || std::future::pending::<Result<i32, String>>(),
            AsyncOptions::new()
                .timeout(Duration::from_millis(10))
                .context(faultline::context! { "endpoint" => "/slow" }),
        )
        .await;

    let ctx = outcome.error_value().unwrap().context().unwrap();
    assert_eq!(ctx.get("endpoint"), Some(&serde_json::json!("/slow")));
}

#[tokio::test]
async fn middleware_runs_on_every_async_path() {
    let runtime = Runtime::new();
    runtime.use_entry(Middleware::on_error(|err, _ctx| {
        ErrorValue::new("Wrapped", err.message())
    }));

    let failed = runtime
        .run_async(|| async { "x".parse::<i32>() }, AsyncOptions::new())
        .await;
    assert!(failed.is_error_kind("Wrapped"));

    let timed_out: Result<i32, _> = runtime
        .run_async(
            || std::future::pending::<Result<i32, String>>(),
            AsyncOptions::new().timeout(Duration::from_millis(10)),
        )
        .await;
    assert!(timed_out.is_error_kind("Wrapped"));
}

#[tokio::test]
async fn error_value_rejections_chain_structurally() {
    let runtime = Runtime::new();
    let outcome: Result<i32, _> = runtime
        .run_async(
            || async { Err::<i32, _>(ErrorValue::new("DbError", "refused")) },
            AsyncOptions::new().kind("SaveFailed"),
        )
        .await;

    let err = outcome.error_value().unwrap();
    assert_eq!(err.kind(), "SaveFailed");
    match err.cause() {
        Some(Cause::Chain(prior)) => assert_eq!(prior.kind(), "DbError"),
        other => panic!("expected chained cause, got {:?}", other),
    }
}

#[tokio::test]
async fn outcome_adapter_converts_result_futures() {
    let outcome = async { "not a number".parse::<i32>() }
        .outcome_kind("ParseFailure")
        .await;

    assert!(outcome.is_error_kind("ParseFailure"));
    assert!(outcome.error_value().unwrap().message().contains("invalid digit"));

    let ok = async { "5".parse::<i32>() }.outcome_kind("ParseFailure").await;
    assert_eq!(ok, Ok(5));
}
