//! The configuration-driven creation pipeline.
//!
//! [`Runtime::create_error`] builds an [`ErrorValue`] from a kind, a message
//! and [`CreateOptions`], consulting the active configuration for every
//! optional capture step: trace, origin, timestamp, context (with the
//! truncation policy), the global transform hook, and finally the
//! `error:created` emission.
//!
//! The pipeline itself never fails: a panicking user hook (origin formatter
//! or transform) degrades gracefully to the pre-step value with a logged
//! warning, and a malformed or oversized context is truncated, never
//! rejected.
//!
//! # Examples
//!
//! ```
//! use faultline::{CreateOptions, Runtime};
//!
//! let runtime = Runtime::new();
//! let err = runtime.create_error("CacheMiss", "key not present", CreateOptions::new());
//!
//! assert_eq!(err.kind(), "CacheMiss");
//! assert!(err.origin().is_some());
//! assert!(err.occurred_at().is_some());
//! assert!(err.trace().is_none()); // trace capture is off by default
//! ```

use core::fmt::Write as _;
use core::panic::Location;
use std::backtrace::Backtrace;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::config::{Config, OriginFormat};
use crate::events::ERROR_CREATED;
use crate::pool::Slot;
use crate::runtime::Runtime;
use crate::types::error_value::now_millis;
use crate::types::{Cause, ContextMap, ErrorValue};

/// Optional inputs to one creation-pipeline invocation.
#[must_use]
#[derive(Default)]
pub struct CreateOptions {
    /// Caller-supplied debugging metadata.
    pub context: Option<ContextMap>,
    /// Causal predecessor to preserve.
    pub cause: Option<Cause>,
    /// Per-call configuration override. When set, the global scope stack is
    /// not consulted at all; this is the concurrency-safe path for servers.
    pub config: Option<Config>,
}

impl CreateOptions {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn context(mut self, context: ContextMap) -> Self {
        self.context = Some(context);
        self
    }

    pub fn cause(mut self, cause: Cause) -> Self {
        self.cause = Some(cause);
        self
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }
}

impl Runtime {
    /// Builds an error value under the active configuration and emits
    /// `error:created`. Never panics and never fails; see the module docs
    /// for the degradation rules.
    #[track_caller]
    pub fn create_error<K, M>(&self, kind: K, message: M, options: CreateOptions) -> ErrorValue
    where
        K: AsRef<str>,
        M: AsRef<str>,
    {
        self.build_error(kind.as_ref(), message.as_ref(), options, Location::caller())
    }

    pub(crate) fn build_error(
        &self,
        kind: &str,
        message: &str,
        mut options: CreateOptions,
        caller: &'static Location<'static>,
    ) -> ErrorValue {
        let config = match options.config.take() {
            Some(config) => config,
            None => self.config_snapshot(),
        };

        let capture_trace = config.capture_trace && !config.minimal_mode;
        let include_origin = config.include_origin && !config.minimal_mode;

        let slot = if config.perf.pooling { Some(self.pool().acquire()) } else { None };
        let Slot {
            kind: mut kind_buf,
            message: mut message_buf,
            origin: mut origin_buf,
            trace: mut trace_buf,
        } = slot.unwrap_or_default();

        kind_buf.push_str(kind);
        message_buf.push_str(message);

        let trace = if capture_trace {
            render_trace(&mut trace_buf, config.perf.trace_max_frames);
            Some(trace_buf)
        } else {
            None
        };

        let origin = if include_origin {
            render_origin(&mut origin_buf, &config, caller);
            Some(origin_buf)
        } else {
            None
        };

        let occurred_at = if config.skip_timestamp { None } else { Some(now_millis()) };

        let context = if config.skip_context {
            None
        } else {
            options.context.take().map(|mut context| {
                let dropped = context
                    .truncate_to(config.perf.context_max_entries, config.perf.context_max_bytes);
                if dropped > 0 {
                    tracing::warn!(dropped, "context exceeded configured ceiling; tail entries dropped");
                }
                context
            })
        };

        let mut value = ErrorValue {
            kind: kind_buf,
            message: message_buf,
            origin,
            trace,
            occurred_at,
            context,
            cause: options.cause.take().map(Box::new),
        };

        if let Some(transform) = &config.transform {
            match catch_unwind(AssertUnwindSafe(|| transform(value.clone()))) {
                Ok(transformed) => value = transformed,
                Err(_) => {
                    tracing::warn!("transform hook panicked; keeping untransformed error value");
                },
            }
        }

        self.push_history(&value, config.perf.history_capacity);
        self.events().emit(ERROR_CREATED, value.clone());
        value
    }

    /// Serializes an error value, honoring the configured custom serializer.
    ///
    /// A panicking serializer hook falls back to the default JSON rendering.
    pub fn serialize_error(&self, error: &ErrorValue) -> String {
        let config = self.config_snapshot();
        if let Some(serializer) = &config.serializer {
            match catch_unwind(AssertUnwindSafe(|| serializer(error))) {
                Ok(rendered) => return rendered,
                Err(_) => {
                    tracing::warn!("serializer hook panicked; falling back to default JSON");
                },
            }
        }
        error.to_json()
    }
}

/// Renders the current backtrace into `buf`, keeping at most `max_frames`
/// lines of the rendered text.
fn render_trace(buf: &mut String, max_frames: usize) {
    let rendered = Backtrace::force_capture().to_string();
    for (index, line) in rendered.lines().take(max_frames).enumerate() {
        if index > 0 {
            buf.push('\n');
        }
        buf.push_str(line);
    }
}

/// Renders the caller location into `buf` per the configured format, or the
/// custom formatter when one is set. A panicking formatter falls back to the
/// configured format.
fn render_origin(buf: &mut String, config: &Config, caller: &'static Location<'static>) {
    if let Some(formatter) = &config.origin_formatter {
        match catch_unwind(AssertUnwindSafe(|| formatter(caller))) {
            Ok(rendered) => {
                buf.push_str(&rendered);
                return;
            },
            Err(_) => {
                tracing::warn!("origin formatter panicked; using configured format");
            },
        }
    }

    let file = caller.file();
    let basename = file.rsplit(['/', '\\']).next().unwrap_or(file);
    // Infallible writes into a String.
    let _ = match config.origin_format {
        OriginFormat::Full => write!(buf, "{}:{}:{}", file, caller.line(), caller.column()),
        OriginFormat::FileLineColumn => {
            write!(buf, "{}:{}:{}", basename, caller.line(), caller.column())
        },
        OriginFormat::FileLine => write!(buf, "{}:{}", basename, caller.line()),
        OriginFormat::File => write!(buf, "{}", basename),
    };
}
