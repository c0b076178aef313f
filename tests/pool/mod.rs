//! Tests for the slot pool and its observational transparency.

use faultline::config::{ConfigPatch, PerfPatch};
use faultline::pool::ErrorPool;
use faultline::{CreateOptions, Runtime};

#[test]
fn pooled_and_unpooled_values_are_field_identical() {
    let pooled = Runtime::new();
    pooled.configure(
        ConfigPatch::new().capture_trace(false).perf(PerfPatch::new().pooling(true)),
    );
    let unpooled = Runtime::new();
    unpooled.configure(ConfigPatch::new().capture_trace(false));

    let a = pooled.create_error("DbError", "refused", CreateOptions::new());
    let b = unpooled.create_error("DbError", "refused", CreateOptions::new());

    assert_eq!(a.kind(), b.kind());
    assert_eq!(a.message(), b.message());
    assert_eq!(a.trace(), b.trace());
    // Origins differ only in line numbers; both must be present.
    assert!(a.origin().is_some() && b.origin().is_some());
    assert!(a.occurred_at().is_some() && b.occurred_at().is_some());
}

#[test]
fn recycled_buffers_are_reused() {
    let runtime = Runtime::new();
    runtime.configure(ConfigPatch::new().perf(PerfPatch::new().pooling(true)));

    let first = runtime.create_error("E", "first", CreateOptions::new());
    assert_eq!(runtime.pool_stats().misses, 1);
    assert_eq!(runtime.pool_stats().hits, 0);

    runtime.recycle(first);
    assert_eq!(runtime.pool_stats().released, 1);

    let second = runtime.create_error("E", "second", CreateOptions::new());
    assert_eq!(runtime.pool_stats().hits, 1);
    // A reused slot must not leak the previous value's content.
    assert_eq!(second.kind(), "E");
    assert_eq!(second.message(), "second");
}

#[test]
fn recycle_is_a_noop_with_pooling_disabled() {
    let runtime = Runtime::new();
    let err = runtime.create_error("E", "m", CreateOptions::new());

    runtime.recycle(err);
    assert_eq!(runtime.pool_stats().released, 0);
    assert_eq!(runtime.pool().idle_count(), 0);
}

#[test]
fn release_respects_the_capacity_cap() {
    let runtime = Runtime::new();
    runtime.configure(
        ConfigPatch::new().perf(PerfPatch::new().pooling(true).pool_capacity(2)),
    );

    let errors: Vec<_> = (0..4)
        .map(|i| runtime.create_error("E", format!("m{}", i), CreateOptions::new()))
        .collect();
    for err in errors {
        runtime.recycle(err);
    }

    assert_eq!(runtime.pool().idle_count(), 2);
    assert_eq!(runtime.pool_stats().released, 2);
}

#[test]
fn bare_pool_counts_hits_and_misses() {
    let pool = ErrorPool::new();

    let slot = pool.acquire();
    assert_eq!(pool.stats().misses, 1);

    pool.release(slot, 8);
    assert_eq!(pool.idle_count(), 1);

    let _slot = pool.acquire();
    assert_eq!(pool.stats().hits, 1);
    assert_eq!(pool.idle_count(), 0);
}
