//! Future adapters: panic isolation and direct `Result`-to-`Outcome`
//! conversion.
//!
//! [`CatchUnwind`] is the async analogue of `std::panic::catch_unwind`: it
//! turns a panic unwinding out of a poll into a settled value, so the async
//! wrapper can normalize it like any other failure.
//!
//! [`FutureOutcomeExt`] converts any `Result`-producing future into an
//! [`Outcome`] through the global runtime's creation pipeline, for call sites
//! that want error-value normalization without the full wrapper (no
//! middleware pass, no timeout/cancellation race).

use core::fmt::Display;
use core::future::Future;
use core::panic::Location;
use core::pin::Pin;
use core::task::{Context, Poll};
use std::panic::{catch_unwind, AssertUnwindSafe};

use pin_project_lite::pin_project;

use crate::create::CreateOptions;
use crate::exec::{capture_cause, panic_message, Caught};
use crate::runtime::runtime;
use crate::types::Outcome;

pin_project! {
    /// Future wrapper that converts a panic during poll into `Err(message)`.
    #[must_use = "futures do nothing unless polled"]
    pub struct CatchUnwind<F> {
        #[pin]
        inner: F,
    }
}

impl<F> CatchUnwind<F> {
    pub fn new(inner: F) -> Self {
        Self { inner }
    }
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = Result<F::Output, String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match catch_unwind(AssertUnwindSafe(|| this.inner.poll(cx))) {
            Ok(Poll::Ready(value)) => Poll::Ready(Ok(value)),
            Ok(Poll::Pending) => Poll::Pending,
            Err(payload) => Poll::Ready(Err(panic_message(payload))),
        }
    }
}

pin_project! {
    /// Future wrapper created by [`FutureOutcomeExt`].
    ///
    /// Resolves the inner `Result<T, E>` into an `Outcome<T>`: the error side
    /// goes through the creation pipeline (configuration capture, transform
    /// hook, `error:created` emission) with the origin pointing at the
    /// adapter's call site.
    #[must_use = "futures do nothing unless polled"]
    pub struct OutcomeFuture<F> {
        #[pin]
        inner: F,
        kind: Option<String>,
        caller: &'static Location<'static>,
    }
}

impl<F, T, E> Future for OutcomeFuture<F>
where
    F: Future<Output = Result<T, E>>,
    E: Display + 'static,
{
    type Output = Outcome<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.project();
        match this.inner.poll(cx) {
            Poll::Ready(Ok(value)) => Poll::Ready(Ok(value)),
            Poll::Ready(Err(error)) => {
                let Caught { message, cause } = capture_cause(error);
                let rt = runtime();
                let kind = match this.kind.take() {
                    Some(kind) => kind,
                    None => rt.config_snapshot().default_kind,
                };
                let value =
                    rt.build_error(&kind, &message, CreateOptions::new().cause(cause), this.caller);
                Poll::Ready(Err(value))
            },
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Extension trait converting `Result` futures into [`Outcome`] futures.
///
/// # Examples
///
/// ```
/// use faultline::async_ext::FutureOutcomeExt;
/// use faultline::OutcomeExt;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let outcome = async { "not a number".parse::<i32>() }
///     .outcome_kind("ParseFailure")
///     .await;
///
/// assert!(outcome.is_error_kind("ParseFailure"));
/// # }
/// ```
pub trait FutureOutcomeExt<T, E>: Future<Output = Result<T, E>> + Sized {
    /// Converts the future's failure into an error value with the configured
    /// default kind.
    #[track_caller]
    fn into_outcome(self) -> OutcomeFuture<Self> {
        OutcomeFuture { inner: self, kind: None, caller: Location::caller() }
    }

    /// Converts the future's failure into an error value with an explicit
    /// kind.
    #[track_caller]
    fn outcome_kind<S: Into<String>>(self, kind: S) -> OutcomeFuture<Self> {
        OutcomeFuture { inner: self, kind: Some(kind.into()), caller: Location::caller() }
    }
}

impl<F, T, E> FutureOutcomeExt<T, E> for F where F: Future<Output = Result<T, E>> {}
