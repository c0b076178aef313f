//! Scope-stacked configuration store.
//!
//! The store holds a stack of [`Config`] scopes; the active configuration is
//! always the top of the stack. `configure` merges into the active scope,
//! `push_scope`/`pop_scope` layer temporary overrides, and `reset` restores
//! compiled-in defaults. A monotonic version counter bumps on every mutation.
//!
//! The scope stack is global, mutable state. Concurrent `push_scope` /
//! `pop_scope` from independent logical operations is a caller-discipline
//! hazard: scopes are not operation-local, so scoped configuration is meant
//! for short, serialized use. Concurrent callers should pass an explicit
//! per-call configuration override on the wrapper options instead.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;

use super::{Config, ConfigPatch};

/// Stack of configuration scopes with synchronized access.
pub struct ConfigStore {
    stack: RwLock<Vec<Config>>,
    version: AtomicU64,
}

impl ConfigStore {
    /// Creates a store with the compiled-in defaults as the base scope.
    pub fn new() -> Self {
        Self::with_base(Config::default())
    }

    /// Creates a store with an explicit base configuration.
    pub fn with_base(base: Config) -> Self {
        Self { stack: RwLock::new(vec![base]), version: AtomicU64::new(0) }
    }

    /// Merges a partial configuration into the active scope.
    pub fn configure(&self, patch: ConfigPatch) {
        {
            let mut stack = self.stack.write();
            // Base scope always exists.
            if let Some(active) = stack.last_mut() {
                active.apply(patch);
            } else {
                let mut base = Config::default();
                base.apply(patch);
                stack.push(base);
            }
        }
        self.bump();
    }

    /// Pushes a new scope: a copy of the active configuration with the patch
    /// applied on top. The outer scope is untouched.
    pub fn push_scope(&self, patch: ConfigPatch) {
        {
            let mut stack = self.stack.write();
            let mut scope = stack.last().cloned().unwrap_or_default();
            scope.apply(patch);
            stack.push(scope);
        }
        self.bump();
    }

    /// Pops the most recent scope. With only the base scope present this is a
    /// no-op: the base (defaults or whatever `configure` made of them) stays
    /// in effect and is never popped.
    pub fn pop_scope(&self) {
        let popped = {
            let mut stack = self.stack.write();
            if stack.len() > 1 {
                stack.pop();
                true
            } else {
                false
            }
        };
        if popped {
            self.bump();
        }
    }

    /// Restores compiled-in defaults and clears all scopes.
    pub fn reset(&self) {
        {
            let mut stack = self.stack.write();
            stack.clear();
            stack.push(Config::default());
        }
        self.bump();
    }

    /// Returns a copy of the active (top-of-stack) configuration.
    pub fn snapshot(&self) -> Config {
        self.stack.read().last().cloned().unwrap_or_default()
    }

    /// Current scope depth, the base scope included.
    pub fn depth(&self) -> usize {
        self.stack.read().len()
    }

    /// Monotonic counter bumped on every mutation.
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    fn bump(&self) {
        self.version.fetch_add(1, Ordering::AcqRel);
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}
