//! Synchronous execution wrapper: run a unit of work, convert any failure
//! into an error value, post-process through the middleware pipeline.
//!
//! [`Runtime::run_sync`] never re-raises. Both an `Err` return and a panic
//! unwound out of the closure are normalized into the same [`Outcome`] shape,
//! so callers have exactly one failure-handling idiom. Retry policy is
//! deliberately not performed here; that is caller or plugin responsibility.
//!
//! # Examples
//!
//! ```
//! use faultline::{run_sync, OutcomeExt, RunOptions};
//!
//! let ok = run_sync(|| "17".parse::<i32>(), RunOptions::new());
//! assert_eq!(ok, Ok(17));
//!
//! let bad = run_sync(|| "x".parse::<i32>(), RunOptions::new());
//! assert!(bad.is_error_kind("Thrown"));
//! ```

use core::fmt::Display;
use core::panic::Location;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::create::CreateOptions;
use crate::middleware::{ExecContext, PipelineResult};
use crate::runtime::Runtime;
use crate::types::{kind, Cause, ContextMap, ErrorValue, Outcome};
use crate::Config;

/// Per-call options recognized by the execution wrappers.
#[must_use]
#[derive(Default)]
pub struct RunOptions {
    /// Overrides the `kind` of a caught failure (not of timeouts/aborts).
    pub kind: Option<String>,
    /// Overrides the `message` of a caught failure.
    pub message: Option<String>,
    /// Debugging metadata attached to any produced error value.
    pub context: Option<ContextMap>,
    /// Operation name carried by the middleware execution context.
    pub operation: Option<String>,
    /// Per-call configuration override; bypasses the global scope stack.
    pub config: Option<Config>,
}

impl RunOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn message<S: Into<String>>(mut self, message: S) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn context(mut self, context: ContextMap) -> Self {
        self.context = Some(context);
        self
    }

    pub fn operation<S: Into<String>>(mut self, operation: S) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }
}

/// A normalized caught failure: its message and preserved cause.
pub(crate) struct Caught {
    pub(crate) message: String,
    pub(crate) cause: Cause,
}

/// Captures an arbitrary failure value, chaining prior error values
/// structurally instead of flattening them to text.
pub(crate) fn capture_cause<E: Display + 'static>(error: E) -> Caught {
    let message = error.to_string();
    let boxed: Box<dyn Any> = Box::new(error);
    match boxed.downcast::<ErrorValue>() {
        Ok(prior) => Caught { message, cause: Cause::Chain(*prior) },
        Err(_) => Caught { cause: Cause::Raw(message.clone()), message },
    }
}

/// Renders a panic payload into a message, mirroring how arbitrary thrown
/// values are stringified.
pub(crate) fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

impl Runtime {
    /// Runs `f`, converting an `Err` return or a panic into the error
    /// variant via the creation pipeline, then folds the result through the
    /// middleware pipeline. Never re-raises.
    #[track_caller]
    pub fn run_sync<T, E, F>(&self, f: F, options: RunOptions) -> Outcome<T>
    where
        T: Send + 'static,
        E: Display + 'static,
        F: FnOnce() -> Result<T, E>,
    {
        let caller = Location::caller();
        let outcome = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(self.settle_failure(capture_cause(error), &options, caller)),
            Err(payload) => {
                let message = panic_message(payload);
                let caught = Caught { cause: Cause::Raw(message.clone()), message };
                Err(self.settle_failure(caught, &options, caller))
            },
        };

        let mut ctx = ExecContext::new(options.operation.as_deref().unwrap_or("run_sync"));
        self.apply_middleware(outcome, &mut ctx)
    }

    /// Builds the error value for a caught failure, honoring the per-call
    /// overrides.
    pub(crate) fn settle_failure(
        &self,
        caught: Caught,
        options: &RunOptions,
        caller: &'static Location<'static>,
    ) -> ErrorValue {
        let kind = match &options.kind {
            Some(kind) => kind.clone(),
            None => match &options.config {
                Some(config) => config.default_kind.clone(),
                None => self.config_snapshot().default_kind,
            },
        };
        let message = options.message.clone().unwrap_or(caught.message);

        let mut create = CreateOptions::new().cause(caught.cause);
        if let Some(context) = options.context.clone() {
            create = create.context(context);
        }
        if let Some(config) = options.config.clone() {
            create = create.config(config);
        }
        self.build_error(&kind, &message, create, caller)
    }

    /// Sends an already-settled outcome through the middleware pipeline.
    ///
    /// The success value is boxed for type erasure only when the stack is
    /// non-empty. A middleware that replaces the success side with a value of
    /// the wrong type surfaces as a `Thrown` error at the downcast step.
    pub(crate) fn apply_middleware<T: Send + 'static>(
        &self,
        outcome: Outcome<T>,
        ctx: &mut ExecContext,
    ) -> Outcome<T> {
        if self.middleware().is_empty() {
            return outcome;
        }

        let erased = match outcome {
            Ok(value) => PipelineResult::Success(Box::new(value)),
            Err(error) => PipelineResult::Failure(error),
        };

        match self.middleware().run(erased, ctx) {
            PipelineResult::Failure(error) => Err(error),
            PipelineResult::Success(any) => match any.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(_) => Err(ErrorValue::new(
                    kind::THROWN,
                    "middleware replaced the success value with a mismatched type",
                )),
            },
        }
    }
}
