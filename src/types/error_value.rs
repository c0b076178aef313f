//! The structured, immutable error record produced by every failure.
//!
//! [`ErrorValue`] is the "error" variant of an [`Outcome`](crate::types::Outcome):
//! a value carrying a logical `kind` discriminant, a human-readable message,
//! and the optional debugging fields (origin, trace, timestamp, context,
//! cause) captured by the creation pipeline under the active configuration.
//!
//! Optional fields are present only when configuration allowed their capture;
//! absence means "not captured", never "empty".
//!
//! # Examples
//!
//! ```
//! use faultline::{kind, ErrorValue};
//!
//! let err = ErrorValue::new("DbUnavailable", "replica lagging")
//!     .with_occurred_at(1_700_000_000_000);
//!
//! assert_eq!(err.kind(), "DbUnavailable");
//! assert!(err.trace().is_none());
//! assert!(!err.is_kind(kind::TIMEOUT));
//! ```

use core::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::types::ContextMap;

/// Reserved `kind` discriminants the runtime itself may produce.
///
/// All other kinds are caller-defined strings.
pub mod kind {
    /// Wraps an arbitrary caught failure (an `Err` return or a panic).
    pub const THROWN: &str = "Thrown";
    /// An async operation lost the race against its deadline.
    pub const TIMEOUT: &str = "Timeout";
    /// A cancellation token fired before or during the operation.
    pub const ABORTED: &str = "Aborted";
    /// A plugin declared a dependency that is not installed.
    pub const MISSING_DEPENDENCY: &str = "MissingDependency";
    /// A configuration value was structurally impossible and was ignored.
    pub const CONFIG_INVALID: &str = "ConfigInvalid";
}

/// The preserved origin of a failure: either the display text of an arbitrary
/// caught value, or a prior [`ErrorValue`] forming a causal chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Cause {
    /// Display rendering of the original caught value.
    Raw(String),
    /// A prior error value, preserved structurally.
    Chain(ErrorValue),
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw(text) => f.write_str(text),
            Self::Chain(error) => write!(f, "{}", error),
        }
    }
}

/// Immutable record describing one failure.
///
/// `kind` and `message` are always present. Every other field is present only
/// if the configuration active at creation time requested its capture.
#[must_use]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorValue {
    pub(crate) kind: String,
    pub(crate) message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) trace: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) occurred_at: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) context: Option<ContextMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) cause: Option<Box<Cause>>,
}

impl ErrorValue {
    /// Creates a minimal error value with only the mandatory fields.
    ///
    /// This bypasses the creation pipeline entirely: no origin, trace,
    /// timestamp, transform hook, or event emission. Use
    /// [`create_error`](crate::create_error) (or
    /// [`Runtime::create_error`](crate::Runtime::create_error)) for
    /// configuration-driven capture.
    #[inline]
    pub fn new<K: Into<String>, M: Into<String>>(kind: K, message: M) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            origin: None,
            trace: None,
            occurred_at: None,
            context: None,
            cause: None,
        }
    }

    /// Attaches caller-supplied context metadata.
    #[inline]
    pub fn with_context(mut self, context: ContextMap) -> Self {
        self.context = Some(context);
        self
    }

    /// Attaches a causal predecessor.
    #[inline]
    pub fn with_cause(mut self, cause: Cause) -> Self {
        self.cause = Some(Box::new(cause));
        self
    }

    /// Sets the origin locator (normally derived by the creation pipeline).
    #[inline]
    pub fn with_origin<S: Into<String>>(mut self, origin: S) -> Self {
        self.origin = Some(origin.into());
        self
    }

    /// Sets the creation timestamp in epoch milliseconds.
    #[inline]
    pub fn with_occurred_at(mut self, epoch_ms: u64) -> Self {
        self.occurred_at = Some(epoch_ms);
        self
    }

    /// The logical error type, used for exhaustive matching by callers.
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Human-readable description of the failure.
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Best-effort source locator (`file:line:column` or equivalent),
    /// if origin capture was enabled.
    #[inline]
    pub fn origin(&self) -> Option<&str> {
        self.origin.as_deref()
    }

    /// Captured call-stack text, if trace capture was enabled.
    #[inline]
    pub fn trace(&self) -> Option<&str> {
        self.trace.as_deref()
    }

    /// Creation timestamp in epoch milliseconds, if timestamp capture was
    /// enabled.
    #[inline]
    pub fn occurred_at(&self) -> Option<u64> {
        self.occurred_at
    }

    /// Caller-supplied debugging metadata, if supplied and not skipped.
    #[inline]
    pub fn context(&self) -> Option<&ContextMap> {
        self.context.as_ref()
    }

    /// The preserved causal predecessor, if any.
    #[inline]
    pub fn cause(&self) -> Option<&Cause> {
        self.cause.as_deref()
    }

    /// Returns `true` if this error's kind equals `kind`.
    #[inline]
    pub fn is_kind(&self, kind: &str) -> bool {
        self.kind == kind
    }

    /// Returns `true` for the runtime's distinguished timeout kind.
    #[inline]
    pub fn is_timeout(&self) -> bool {
        self.is_kind(kind::TIMEOUT)
    }

    /// Returns `true` for the runtime's distinguished cancellation kind.
    #[inline]
    pub fn is_aborted(&self) -> bool {
        self.is_kind(kind::ABORTED)
    }

    /// Serializes the value to JSON with the default serializer.
    ///
    /// Absent optional fields are omitted from the output, not rendered as
    /// null. For the configured custom serializer, use
    /// [`Runtime::serialize_error`](crate::Runtime::serialize_error).
    #[must_use = "serialization result should be used"]
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            format!(r#"{{"kind":{:?},"message":{:?}}}"#, self.kind, self.message)
        })
    }
}

impl fmt::Display for ErrorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(origin) = &self.origin {
            write!(f, " (at {})", origin)?;
        }
        Ok(())
    }
}

impl std::error::Error for ErrorValue {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self.cause.as_deref() {
            Some(Cause::Chain(error)) => Some(error),
            _ => None,
        }
    }
}

/// Current time in epoch milliseconds. Clock-before-epoch degrades to zero
/// rather than failing creation.
pub(crate) fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
