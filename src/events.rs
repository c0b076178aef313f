//! Synchronous pub/sub notifying observers of error creation.
//!
//! The bus is a direct call-through notification mechanism: `emit` invokes
//! all listeners registered for the event type synchronously, in registration
//! order, with no queueing or persistence. A snapshot of the listener list is
//! taken before dispatch, so a listener may itself register, unsubscribe, or
//! trigger new error creation without deadlocking.
//!
//! A panicking listener is caught and logged per-listener; one faulty
//! observer cannot break error creation.
//!
//! # Examples
//!
//! ```
//! use faultline::events::{EventBus, ERROR_CREATED};
//! use faultline::ErrorValue;
//!
//! let bus = EventBus::new();
//! let seen = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
//! let counter = seen.clone();
//!
//! let sub = bus.on(ERROR_CREATED, move |_event| {
//!     counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
//! });
//!
//! bus.emit(ERROR_CREATED, ErrorValue::new("Thrown", "boom"));
//! assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
//!
//! sub.unsubscribe();
//! bus.emit(ERROR_CREATED, ErrorValue::new("Thrown", "boom"));
//! assert_eq!(seen.load(std::sync::atomic::Ordering::SeqCst), 1);
//! ```

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::error_value::now_millis;
use crate::types::ErrorValue;

/// Event type emitted by the creation pipeline for every produced value.
pub const ERROR_CREATED: &str = "error:created";

/// Payload delivered to listeners.
#[derive(Debug, Clone)]
pub struct Event {
    /// The event type the listener was registered for.
    pub event_type: String,
    /// The error value that was created.
    pub error: ErrorValue,
    /// Emission time in epoch milliseconds.
    pub timestamp: u64,
}

type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

struct Registered {
    id: u64,
    event_type: String,
    listener: Listener,
}

struct BusInner {
    listeners: RwLock<Vec<Registered>>,
    next_id: AtomicU64,
}

/// Handle returned by [`EventBus::on`]; consuming it removes the listener.
#[must_use = "dropping the subscription does not unsubscribe; call unsubscribe()"]
pub struct Subscription {
    id: u64,
    inner: Arc<BusInner>,
}

impl Subscription {
    /// Stable identifier usable with [`EventBus::off`].
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Removes the listener this subscription refers to.
    pub fn unsubscribe(self) {
        self.inner.listeners.write().retain(|r| r.id != self.id);
    }
}

/// Synchronous, reentrant-safe listener-list broadcaster.
#[derive(Clone)]
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(BusInner {
                listeners: RwLock::new(Vec::new()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    /// Registers a listener for `event_type` and returns its unsubscribe
    /// handle.
    pub fn on<F>(&self, event_type: &str, listener: F) -> Subscription
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        self.inner.listeners.write().push(Registered {
            id,
            event_type: event_type.to_string(),
            listener: Arc::new(listener),
        });
        Subscription { id, inner: Arc::clone(&self.inner) }
    }

    /// Removes the listener with the given id. Unknown ids are ignored.
    pub fn off(&self, id: u64) {
        self.inner.listeners.write().retain(|r| r.id != id);
    }

    /// Delivers an event to all current listeners for `event_type`,
    /// synchronously and in registration order.
    pub fn emit(&self, event_type: &str, error: ErrorValue) {
        let event = Event {
            event_type: event_type.to_string(),
            error,
            timestamp: now_millis(),
        };

        // Snapshot outside the lock so listeners can re-enter the bus.
        let snapshot: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .iter()
            .filter(|r| r.event_type == event_type)
            .map(|r| Arc::clone(&r.listener))
            .collect();

        for listener in snapshot {
            if catch_unwind(AssertUnwindSafe(|| listener(&event))).is_err() {
                tracing::warn!(event_type, "event listener panicked; continuing dispatch");
            }
        }
    }

    /// Removes all listeners. Intended for test teardown.
    pub fn clear(&self) {
        self.inner.listeners.write().clear();
    }

    /// Number of listeners registered for `event_type`.
    pub fn listener_count(&self, event_type: &str) -> usize {
        self.inner
            .listeners
            .read()
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
