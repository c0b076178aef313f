//! Ordered, composable post-processing of results before they reach the
//! caller.
//!
//! Middleware entries run left-to-right inside the wrapper's settle step,
//! each entry's output feeding the next entry's input. An entry may pass the
//! result through, replace it (including flipping success and error), or
//! short-circuit by calling [`ExecContext::halt`], which skips the remaining
//! entries.
//!
//! Because one global stack must serve every success type, the pipeline
//! operates on a type-erased [`PipelineResult`]; the wrappers box the success
//! value only when the stack is non-empty and downcast it back afterwards.
//! Entries are pure with respect to the pipeline's own state; side effects
//! such as logging are the entry's own concern.
//!
//! # Examples
//!
//! ```
//! use faultline::middleware::{ExecContext, Middleware, MiddlewareStack, PipelineResult};
//! use faultline::ErrorValue;
//!
//! let stack = MiddlewareStack::new();
//! stack.use_entry(Middleware::on_error(|err, _ctx| {
//!     ErrorValue::new("Tagged", format!("seen: {}", err.message()))
//! }));
//!
//! let mut ctx = ExecContext::new("demo");
//! let out = stack.run(PipelineResult::Failure(ErrorValue::new("Thrown", "boom")), &mut ctx);
//! assert_eq!(out.failure().map(|e| e.kind()), Some("Tagged"));
//! ```

use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::types::{ContextMap, ErrorValue};

/// Type-erased result flowing through the pipeline.
pub enum PipelineResult {
    /// The operation's success value, boxed for type erasure.
    Success(Box<dyn Any + Send>),
    /// The error variant.
    Failure(ErrorValue),
}

impl PipelineResult {
    #[inline]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure(_))
    }

    /// Borrows the error value, if this is the failure variant.
    pub fn failure(&self) -> Option<&ErrorValue> {
        match self {
            Self::Failure(error) => Some(error),
            Self::Success(_) => None,
        }
    }
}

/// Per-invocation execution context handed to every entry.
///
/// Carries the operation name, free-form metadata, and the halt marker.
pub struct ExecContext {
    operation: String,
    metadata: ContextMap,
    halted: bool,
}

impl ExecContext {
    pub fn new<S: Into<String>>(operation: S) -> Self {
        Self { operation: operation.into(), metadata: ContextMap::new(), halted: false }
    }

    /// The wrapped operation's name.
    #[inline]
    pub fn operation(&self) -> &str {
        &self.operation
    }

    #[inline]
    pub fn metadata(&self) -> &ContextMap {
        &self.metadata
    }

    #[inline]
    pub fn metadata_mut(&mut self) -> &mut ContextMap {
        &mut self.metadata
    }

    /// Marks the pipeline to stop after the current entry returns.
    #[inline]
    pub fn halt(&mut self) {
        self.halted = true;
    }

    #[inline]
    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

/// An installed middleware entry.
pub type MiddlewareFn =
    Arc<dyn Fn(PipelineResult, &mut ExecContext) -> PipelineResult + Send + Sync>;

/// Constructors for the common entry shapes.
pub struct Middleware;

impl Middleware {
    /// Wraps a raw pipeline function.
    pub fn new<F>(f: F) -> MiddlewareFn
    where
        F: Fn(PipelineResult, &mut ExecContext) -> PipelineResult + Send + Sync + 'static,
    {
        Arc::new(f)
    }

    /// Entry that only rewrites the error variant; successes pass through.
    pub fn on_error<F>(f: F) -> MiddlewareFn
    where
        F: Fn(ErrorValue, &mut ExecContext) -> ErrorValue + Send + Sync + 'static,
    {
        Arc::new(move |result, ctx| match result {
            PipelineResult::Failure(error) => PipelineResult::Failure(f(error, ctx)),
            success => success,
        })
    }

    /// Entry that observes the result without changing it.
    pub fn tap<F>(f: F) -> MiddlewareFn
    where
        F: Fn(&PipelineResult, &mut ExecContext) + Send + Sync + 'static,
    {
        Arc::new(move |result, ctx| {
            f(&result, ctx);
            result
        })
    }

    /// Entry that may flip an error into a success value of type `T`.
    ///
    /// The recovery type must match the wrapped operation's success type;
    /// a mismatch surfaces as a `Thrown` error value at the downcast step.
    pub fn recover_with<T, F>(f: F) -> MiddlewareFn
    where
        T: Send + 'static,
        F: Fn(&ErrorValue, &mut ExecContext) -> Option<T> + Send + Sync + 'static,
    {
        Arc::new(move |result, ctx| match result {
            PipelineResult::Failure(error) => match f(&error, ctx) {
                Some(value) => PipelineResult::Success(Box::new(value)),
                None => PipelineResult::Failure(error),
            },
            success => success,
        })
    }
}

struct Entry {
    id: u64,
    owner: Option<String>,
    priority: Option<i32>,
    func: MiddlewareFn,
}

/// The ordered entry list shared by all wrappers of one runtime.
pub struct MiddlewareStack {
    entries: RwLock<Vec<Entry>>,
    next_id: AtomicU64,
}

impl MiddlewareStack {
    pub fn new() -> Self {
        Self { entries: RwLock::new(Vec::new()), next_id: AtomicU64::new(1) }
    }

    /// Appends an entry in registration order; returns its stable id.
    pub fn use_entry(&self, func: MiddlewareFn) -> u64 {
        self.push(None, None, func)
    }

    /// Appends several entries in iteration order.
    pub fn use_many<I: IntoIterator<Item = MiddlewareFn>>(&self, entries: I) {
        for func in entries {
            self.use_entry(func);
        }
    }

    /// Appends an entry carrying an explicit priority; returns its stable id.
    pub fn use_with_priority(&self, priority: i32, func: MiddlewareFn) -> u64 {
        self.push(None, Some(priority), func)
    }

    pub(crate) fn push(
        &self,
        owner: Option<String>,
        priority: Option<i32>,
        func: MiddlewareFn,
    ) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.entries.write().push(Entry { id, owner, priority, func });
        id
    }

    /// Removes the entries with the given ids (used by plugin uninstall).
    pub(crate) fn remove_ids(&self, ids: &[u64]) {
        self.entries.write().retain(|e| !ids.contains(&e.id));
    }

    /// Removes one entry by id; returns whether it existed.
    pub fn remove(&self, id: u64) -> bool {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|e| e.id != id);
        entries.len() != before
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Ids of entries contributed by `owner`.
    pub(crate) fn ids_owned_by(&self, owner: &str) -> Vec<u64> {
        self.entries
            .read()
            .iter()
            .filter(|e| e.owner.as_deref() == Some(owner))
            .map(|e| e.id)
            .collect()
    }

    /// Folds the result through the assembled entry list.
    ///
    /// Assembly is registration order, except that entries carrying an
    /// explicit priority are ordered by it (stable sort, lower first; entries
    /// without a priority sort as zero). An entry that sets the halt marker
    /// short-circuits the remainder.
    pub fn run(&self, mut result: PipelineResult, ctx: &mut ExecContext) -> PipelineResult {
        let mut snapshot: Vec<(Option<i32>, MiddlewareFn)> = self
            .entries
            .read()
            .iter()
            .map(|e| (e.priority, Arc::clone(&e.func)))
            .collect();
        if snapshot.iter().any(|(p, _)| p.is_some()) {
            snapshot.sort_by_key(|(p, _)| p.unwrap_or(0));
        }

        for (_, func) in snapshot {
            result = func(result, ctx);
            if ctx.is_halted() {
                break;
            }
        }
        result
    }
}

impl Default for MiddlewareStack {
    fn default() -> Self {
        Self::new()
    }
}
