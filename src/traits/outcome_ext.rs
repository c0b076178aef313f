//! The predicate API: inspecting the error variant without exceptions.
//!
//! Callers distinguish the two [`Outcome`](crate::types::Outcome) variants
//! with `is_ok`/`is_err` and the kind-aware helpers below, instead of any
//! throw/catch idiom. Accessing success-only data on the error variant is a
//! compile error by construction.
//!
//! # Examples
//!
//! ```
//! use faultline::{run_sync, OutcomeExt, RunOptions};
//!
//! let outcome = run_sync(|| "oops".parse::<u8>(), RunOptions::new());
//!
//! assert!(outcome.is_err());
//! assert!(outcome.is_error_kind("Thrown"));
//! assert!(outcome.error_value().unwrap().message().contains("invalid digit"));
//! ```

use crate::types::{kind, ErrorValue};

/// Kind-aware inspection helpers for `Result<T, ErrorValue>`.
pub trait OutcomeExt<T> {
    /// Borrows the error value, if this is the error variant.
    fn error_value(&self) -> Option<&ErrorValue>;

    /// The error's kind discriminant, if this is the error variant.
    fn error_kind(&self) -> Option<&str>;

    /// Returns `true` if this is the error variant with the given kind.
    fn is_error_kind(&self, kind: &str) -> bool;

    /// Returns `true` for the distinguished timeout kind.
    fn is_timeout(&self) -> bool;

    /// Returns `true` for the distinguished cancellation kind.
    fn is_aborted(&self) -> bool;
}

impl<T> OutcomeExt<T> for Result<T, ErrorValue> {
    #[inline]
    fn error_value(&self) -> Option<&ErrorValue> {
        self.as_ref().err()
    }

    #[inline]
    fn error_kind(&self) -> Option<&str> {
        self.as_ref().err().map(ErrorValue::kind)
    }

    #[inline]
    fn is_error_kind(&self, kind: &str) -> bool {
        self.error_kind() == Some(kind)
    }

    #[inline]
    fn is_timeout(&self) -> bool {
        self.is_error_kind(kind::TIMEOUT)
    }

    #[inline]
    fn is_aborted(&self) -> bool {
        self.is_error_kind(kind::ABORTED)
    }
}
