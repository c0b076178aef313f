//! Asynchronous execution wrapper and future adapters.
//!
//! [`Runtime::run_async`] mirrors [`run_sync`](crate::Runtime::run_sync)
//! (same normalization, same middleware pass) and adds the timeout and
//! cancellation race. Per invocation there is exactly one suspension point:
//! awaiting the first of {operation completion, timer, cancellation signal}.
//!
//! Ordering guarantees: the race is a `tokio::select!` with `biased;` and the
//! operation listed first, so if the operation and the timer are both ready
//! in the same poll, the operation wins: success beats a same-tick timeout,
//! deterministically. Cancellation is checked before the
//! timer. Losing futures are dropped, which in Rust cancels them; an
//! operation that must keep running past its deadline should be spawned
//! before being wrapped.
//!
//! # Examples
//!
//! ```
//! use std::time::Duration;
//! use faultline::async_ext::AsyncOptions;
//! use faultline::{run_async, OutcomeExt};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let outcome = run_async(
//!     || async { Ok::<_, std::io::Error>(7) },
//!     AsyncOptions::new().timeout(Duration::from_millis(100)),
//! )
//! .await;
//!
//! assert_eq!(outcome, Ok(7));
//! # }
//! ```

mod cancel;
mod future_ext;

pub use cancel::CancelToken;
pub use future_ext::{CatchUnwind, FutureOutcomeExt, OutcomeFuture};

use core::fmt::Display;
use core::future::Future;
use core::panic::Location;
use core::time::Duration;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::Config;
use crate::create::CreateOptions;
use crate::exec::{capture_cause, panic_message, Caught, RunOptions};
use crate::middleware::ExecContext;
use crate::runtime::Runtime;
use crate::types::{kind, ContextMap, Outcome};

/// Per-call options recognized by [`Runtime::run_async`].
///
/// The `kind`/`message` overrides apply to caught failures only; timeout and
/// cancellation produce the distinguished [`Timeout`](crate::kind::TIMEOUT)
/// and [`Aborted`](crate::kind::ABORTED) kinds regardless.
#[must_use]
#[derive(Default)]
pub struct AsyncOptions {
    pub kind: Option<String>,
    pub message: Option<String>,
    pub context: Option<ContextMap>,
    pub operation: Option<String>,
    pub config: Option<Config>,
    /// Deadline for the whole operation.
    pub timeout: Option<Duration>,
    /// Cooperative cancellation signal.
    pub cancel: Option<CancelToken>,
}

impl AsyncOptions {
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

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            kind: self.kind.clone(),
            message: self.message.clone(),
            context: self.context.clone(),
            operation: self.operation.clone(),
            config: self.config.clone(),
        }
    }
}

impl Runtime {
    /// Runs an async unit of work, normalizing every failure path (sync
    /// panic, rejected future, timeout, cancellation) into the same
    /// [`Outcome`] shape. Never re-raises; no retries.
    #[track_caller]
    pub fn run_async<'a, T, E, F, Fut>(
        &'a self,
        f: F,
        options: AsyncOptions,
    ) -> impl Future<Output = Outcome<T>> + 'a
    where
        T: Send + 'static,
        E: Display + 'static,
        F: FnOnce() -> Fut + 'a,
        Fut: Future<Output = Result<T, E>> + 'a,
    {
        let caller = Location::caller();
        self.run_async_inner(f, options, caller)
    }

    async fn run_async_inner<T, E, F, Fut>(
        &self,
        f: F,
        options: AsyncOptions,
        caller: &'static Location<'static>,
    ) -> Outcome<T>
    where
        T: Send + 'static,
        E: Display + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let operation = options.operation.clone().unwrap_or_else(|| "run_async".to_string());

        // Already-cancelled tokens short-circuit without invoking the work.
        if options.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            let error = self.distinguished(
                kind::ABORTED,
                "operation aborted before start".to_string(),
                &options,
                caller,
            );
            let mut ctx = ExecContext::new(operation);
            return self.apply_middleware(Err(error), &mut ctx);
        }

        let run_options = options.run_options();
        let mut ctx = ExecContext::new(operation);

        // The closure itself may panic before producing a future.
        let future = match catch_unwind(AssertUnwindSafe(f)) {
            Ok(future) => future,
            Err(payload) => {
                let message = panic_message(payload);
                let caught = Caught { cause: crate::types::Cause::Raw(message.clone()), message };
                let error = self.settle_failure(caught, &run_options, caller);
                return self.apply_middleware(Err(error), &mut ctx);
            },
        };

        let guarded = CatchUnwind::new(future);
        tokio::pin!(guarded);

        let cancel = options.cancel.clone();
        let cancel_wait = async {
            match &cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };
        let timeout = options.timeout;
        let timeout_wait = async {
            match timeout {
                Some(duration) => tokio::time::sleep(duration).await,
                None => std::future::pending::<()>().await,
            }
        };

        let settled = tokio::select! {
            biased;
            settled = &mut guarded => settled,
            _ = cancel_wait => {
                let error = self.distinguished(
                    kind::ABORTED,
                    "operation aborted by cancellation token".to_string(),
                    &options,
                    caller,
                );
                return self.apply_middleware(Err(error), &mut ctx);
            },
            _ = timeout_wait => {
                let error = self.distinguished(
                    kind::TIMEOUT,
                    format!("operation timed out after {:?}", timeout.unwrap_or_default()),
                    &options,
                    caller,
                );
                return self.apply_middleware(Err(error), &mut ctx);
            },
        };

        let outcome = match settled {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(error)) => Err(self.settle_failure(capture_cause(error), &run_options, caller)),
            Err(message) => {
                let caught = Caught { cause: crate::types::Cause::Raw(message.clone()), message };
                Err(self.settle_failure(caught, &run_options, caller))
            },
        };
        self.apply_middleware(outcome, &mut ctx)
    }

    /// Builds a timeout/abort error value: distinguished kind, per-call
    /// context and config honored, no cause.
    fn distinguished(
        &self,
        error_kind: &str,
        message: String,
        options: &AsyncOptions,
        caller: &'static Location<'static>,
    ) -> crate::types::ErrorValue {
        let mut create = CreateOptions::new();
        if let Some(context) = options.context.clone() {
            create = create.context(context);
        }
        if let Some(config) = options.config.clone() {
            create = create.config(config);
        }
        self.build_error(error_kind, &message, create, caller)
    }
}
