//! The runtime wiring: configuration store, pool, event bus, middleware
//! stack, plugin registries, and error history under one roof.
//!
//! Most applications use the process-wide runtime through the crate-root free
//! functions ([`create_error`](crate::create_error),
//! [`run_sync`](crate::run_sync), [`configure`](crate::configure), ...).
//! Tests and embedders that need isolation construct their own [`Runtime`];
//! every capability is available as an instance method.

use std::collections::VecDeque;

use once_cell::sync::Lazy;
use parking_lot::Mutex;

use crate::config::{Config, ConfigPatch, ConfigStore};
use crate::events::EventBus;
use crate::middleware::{MiddlewareFn, MiddlewareStack};
use crate::plugin::PluginRegistry;
use crate::pool::{ErrorPool, PoolStats, Slot};
use crate::types::ErrorValue;

/// One complete error-handling runtime.
pub struct Runtime {
    config: ConfigStore,
    pool: ErrorPool,
    bus: EventBus,
    middleware: MiddlewareStack,
    plugins: PluginRegistry,
    history: Mutex<VecDeque<ErrorValue>>,
}

static GLOBAL: Lazy<Runtime> = Lazy::new(Runtime::new);

/// The process-wide runtime backing the crate-root free functions.
pub fn runtime() -> &'static Runtime {
    &GLOBAL
}

impl Runtime {
    /// Creates a runtime with default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates a runtime with an explicit base configuration.
    pub fn with_config(base: Config) -> Self {
        Self {
            config: ConfigStore::with_base(base),
            pool: ErrorPool::new(),
            bus: EventBus::new(),
            middleware: MiddlewareStack::new(),
            plugins: PluginRegistry::new(),
            history: Mutex::new(VecDeque::new()),
        }
    }

    /// Merges a partial configuration into the active scope and notifies
    /// every installed, enabled plugin via its `on_config_change` hook.
    pub fn configure(&self, patch: ConfigPatch) {
        self.config.configure(patch);
        let snapshot = self.config.snapshot();
        self.plugins.notify_config_change(&snapshot);
    }

    /// Pushes a temporary configuration scope. Scopes are process-global:
    /// see [`ConfigStore`] for the caller discipline this implies.
    pub fn push_scope(&self, patch: ConfigPatch) {
        self.config.push_scope(patch);
    }

    /// Pops the most recent configuration scope; a no-op at the base scope.
    pub fn pop_scope(&self) {
        self.config.pop_scope();
    }

    /// Restores compiled-in configuration defaults and clears all scopes.
    pub fn reset_config(&self) {
        self.config.reset();
    }

    /// Copy of the active configuration.
    pub fn config_snapshot(&self) -> Config {
        self.config.snapshot()
    }

    /// Monotonic configuration version.
    pub fn config_version(&self) -> u64 {
        self.config.version()
    }

    /// The runtime's event bus.
    #[inline]
    pub fn events(&self) -> &EventBus {
        &self.bus
    }

    /// The runtime's middleware stack.
    #[inline]
    pub fn middleware(&self) -> &MiddlewareStack {
        &self.middleware
    }

    /// Appends a middleware entry; returns its stable id.
    pub fn use_entry(&self, entry: MiddlewareFn) -> u64 {
        self.middleware.use_entry(entry)
    }

    /// Appends several middleware entries in iteration order.
    pub fn use_many<I: IntoIterator<Item = MiddlewareFn>>(&self, entries: I) {
        self.middleware.use_many(entries);
    }

    #[inline]
    pub(crate) fn plugins(&self) -> &PluginRegistry {
        &self.plugins
    }

    /// The runtime's slot pool.
    #[inline]
    pub fn pool(&self) -> &ErrorPool {
        &self.pool
    }

    /// Pool counters, for diagnostics and tests.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Returns an error value's backing buffers to the pool.
    ///
    /// This is the explicit disposal point of the pooling design: callers
    /// that churn through error values on hot paths recycle them once
    /// inspected. With pooling disabled (or the pool at capacity) the value
    /// is simply dropped.
    pub fn recycle(&self, error: ErrorValue) {
        let config = self.config.snapshot();
        if !config.perf.pooling {
            return;
        }
        let slot = Slot {
            kind: error.kind,
            message: error.message,
            origin: error.origin.unwrap_or_default(),
            trace: error.trace.unwrap_or_default(),
        };
        self.pool.release(slot, config.perf.pool_capacity);
    }

    /// Recently created error values, most recent last. Empty unless
    /// `history_capacity` is non-zero.
    pub fn recent_errors(&self) -> Vec<ErrorValue> {
        self.history.lock().iter().cloned().collect()
    }

    /// Drops all retained history.
    pub fn clear_history(&self) {
        self.history.lock().clear();
    }

    pub(crate) fn push_history(&self, error: &ErrorValue, capacity: usize) {
        if capacity == 0 {
            return;
        }
        let mut history = self.history.lock();
        while history.len() >= capacity {
            history.pop_front();
        }
        history.push_back(error.clone());
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}
