//! Slot pool reusing error-value backing buffers.
//!
//! Pooling is strictly an optimization for high-failure-rate paths: a
//! [`Slot`] is a set of reusable `String` buffers that round-trip through an
//! error value. The creation pipeline acquires a slot, writes the captured
//! fields into its buffers and moves them into the final value; the caller's
//! disposal point is [`Runtime::recycle`](crate::Runtime::recycle), which
//! clears the buffers (capacity retained) and returns them to the free-list.
//! If a value is never recycled its buffers are simply dropped.
//!
//! Whether pooling is on or off, every field of the produced error value is
//! identical.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Reusable backing buffers for one error value.
#[derive(Debug, Default)]
pub struct Slot {
    pub(crate) kind: String,
    pub(crate) message: String,
    pub(crate) origin: String,
    pub(crate) trace: String,
}

impl Slot {
    fn clear(&mut self) {
        self.kind.clear();
        self.message.clear();
        self.origin.clear();
        self.trace.clear();
    }
}

/// Counters observed by tests and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Acquisitions served from the free-list.
    pub hits: u64,
    /// Acquisitions that allocated a fresh slot.
    pub misses: u64,
    /// Slots returned to the free-list.
    pub released: u64,
}

/// Synchronized free-list of idle slots.
///
/// Safe under concurrent acquire/release from multiple logical executions;
/// all shared state sits behind a single mutex.
pub struct ErrorPool {
    idle: Mutex<Vec<Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    released: AtomicU64,
}

impl ErrorPool {
    pub fn new() -> Self {
        Self {
            idle: Mutex::new(Vec::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            released: AtomicU64::new(0),
        }
    }

    /// Returns an idle slot, or a fresh one if the free-list is empty.
    pub fn acquire(&self) -> Slot {
        match self.idle.lock().pop() {
            Some(slot) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                slot
            },
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                Slot::default()
            },
        }
    }

    /// Clears a slot and returns it to the free-list. No-op once the pool
    /// holds `capacity` idle slots; the slot is then left for normal drop.
    pub fn release(&self, mut slot: Slot, capacity: usize) {
        let mut idle = self.idle.lock();
        if idle.len() >= capacity {
            return;
        }
        slot.clear();
        idle.push(slot);
        self.released.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of idle slots currently held.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            released: self.released.load(Ordering::Relaxed),
        }
    }
}

impl Default for ErrorPool {
    fn default() -> Self {
        Self::new()
    }
}
