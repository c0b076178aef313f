//! Configuration controlling what the creation pipeline captures.
//!
//! A [`Config`] is a record of capture toggles, a default error kind, an
//! origin rendering format, optional hooks (origin formatter, global
//! transform, custom serializer), and a nested [`PerfConfig`]. Configuration
//! is advisory, not contractual: structurally impossible values are clamped
//! or ignored with a warning, never rejected.
//!
//! Mutation happens through [`ConfigPatch`] partials, merged shallowly at the
//! top level with the performance record merged one level deep. Named presets
//! ([`ConfigPatch::development`], [`ConfigPatch::production`],
//! [`ConfigPatch::performance`], [`ConfigPatch::minimal`]) are pre-built
//! partials.
//!
//! # Examples
//!
//! ```
//! use faultline::config::{Config, ConfigPatch};
//!
//! let mut config = Config::default();
//! config.apply(ConfigPatch::new().capture_trace(true).default_kind("AppError"));
//!
//! assert!(config.capture_trace);
//! assert_eq!(config.default_kind, "AppError");
//! ```

mod store;

pub use store::ConfigStore;

use core::fmt;
use core::panic::Location;
use std::sync::Arc;

use crate::types::ErrorValue;

/// Hook applied to every fully-built error value before it is returned.
pub type TransformHook = Arc<dyn Fn(ErrorValue) -> ErrorValue + Send + Sync>;

/// Hook overriding the default JSON serializer for error values.
pub type SerializerHook = Arc<dyn Fn(&ErrorValue) -> String + Send + Sync>;

/// Hook overriding the rendering of a caller location into an origin string.
pub type OriginFormatter = Arc<dyn Fn(&'static Location<'static>) -> String + Send + Sync>;

/// How a caller location is rendered into the `origin` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OriginFormat {
    /// Full path with line and column: `src/api/orders.rs:41:9`.
    Full,
    /// File name with line and column: `orders.rs:41:9`.
    FileLineColumn,
    /// File name with line: `orders.rs:41`.
    FileLine,
    /// File name only: `orders.rs`.
    File,
}

/// Performance sub-record: pooling, trace depth, context ceilings, history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerfConfig {
    /// Reuse error-value backing buffers through the slot pool.
    pub pooling: bool,
    /// Maximum idle slots retained by the pool. Must be non-zero while
    /// pooling is enabled.
    pub pool_capacity: usize,
    /// Maximum rendered backtrace lines kept in the `trace` field.
    pub trace_max_frames: usize,
    /// Maximum number of context entries kept per error value.
    pub context_max_entries: usize,
    /// Ceiling on the structural byte estimate of the context map.
    pub context_max_bytes: usize,
    /// Number of recent error values retained by the runtime; zero disables
    /// history retention.
    pub history_capacity: usize,
}

impl Default for PerfConfig {
    fn default() -> Self {
        Self {
            pooling: false,
            pool_capacity: 32,
            trace_max_frames: 32,
            context_max_entries: 64,
            context_max_bytes: 8 * 1024,
            history_capacity: 0,
        }
    }
}

/// Process-wide capture settings read on every creation-pipeline invocation.
#[derive(Clone)]
pub struct Config {
    /// Capture a rendered backtrace into the `trace` field.
    pub capture_trace: bool,
    /// Derive a source locator into the `origin` field.
    pub include_origin: bool,
    /// Omit the `occurred_at` timestamp.
    pub skip_timestamp: bool,
    /// Drop caller-supplied context instead of copying it.
    pub skip_context: bool,
    /// Skip the expensive capture steps (trace and origin) wholesale.
    pub minimal_mode: bool,
    /// Kind used when a wrapper has no explicit override.
    pub default_kind: String,
    /// Rendering of the origin locator.
    pub origin_format: OriginFormat,
    /// Custom origin rendering hook; overrides `origin_format` when set.
    pub origin_formatter: Option<OriginFormatter>,
    /// Global transform applied to every error value before return.
    pub transform: Option<TransformHook>,
    /// Custom serializer consulted by `Runtime::serialize_error`.
    pub serializer: Option<SerializerHook>,
    /// Nested performance record.
    pub perf: PerfConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capture_trace: false,
            include_origin: true,
            skip_timestamp: false,
            skip_context: false,
            minimal_mode: false,
            default_kind: crate::types::kind::THROWN.to_string(),
            origin_format: OriginFormat::FileLineColumn,
            origin_formatter: None,
            transform: None,
            serializer: None,
            perf: PerfConfig::default(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("capture_trace", &self.capture_trace)
            .field("include_origin", &self.include_origin)
            .field("skip_timestamp", &self.skip_timestamp)
            .field("skip_context", &self.skip_context)
            .field("minimal_mode", &self.minimal_mode)
            .field("default_kind", &self.default_kind)
            .field("origin_format", &self.origin_format)
            .field("origin_formatter", &self.origin_formatter.is_some())
            .field("transform", &self.transform.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("perf", &self.perf)
            .finish()
    }
}

impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        fn hook_eq<T: ?Sized>(a: &Option<Arc<T>>, b: &Option<Arc<T>>) -> bool {
            match (a, b) {
                (None, None) => true,
                (Some(a), Some(b)) => Arc::ptr_eq(a, b),
                _ => false,
            }
        }

        self.capture_trace == other.capture_trace
            && self.include_origin == other.include_origin
            && self.skip_timestamp == other.skip_timestamp
            && self.skip_context == other.skip_context
            && self.minimal_mode == other.minimal_mode
            && self.default_kind == other.default_kind
            && self.origin_format == other.origin_format
            && hook_eq(&self.origin_formatter, &other.origin_formatter)
            && hook_eq(&self.transform, &other.transform)
            && hook_eq(&self.serializer, &other.serializer)
            && self.perf == other.perf
    }
}

impl Config {
    /// Merges a patch into this configuration: shallow at the top level, one
    /// level deep for the performance record. Structurally impossible values
    /// are ignored with a warning.
    pub fn apply(&mut self, patch: ConfigPatch) {
        if let Some(v) = patch.capture_trace {
            self.capture_trace = v;
        }
        if let Some(v) = patch.include_origin {
            self.include_origin = v;
        }
        if let Some(v) = patch.skip_timestamp {
            self.skip_timestamp = v;
        }
        if let Some(v) = patch.skip_context {
            self.skip_context = v;
        }
        if let Some(v) = patch.minimal_mode {
            self.minimal_mode = v;
        }
        if let Some(v) = patch.default_kind {
            if v.is_empty() {
                tracing::warn!("ignoring empty default_kind in configuration patch");
            } else {
                self.default_kind = v;
            }
        }
        if let Some(v) = patch.origin_format {
            self.origin_format = v;
        }
        if let Some(v) = patch.origin_formatter {
            self.origin_formatter = Some(v);
        }
        if let Some(v) = patch.transform {
            self.transform = Some(v);
        }
        if let Some(v) = patch.serializer {
            self.serializer = Some(v);
        }
        if let Some(perf) = patch.perf {
            self.perf.apply(perf);
        }
    }
}

impl PerfConfig {
    fn apply(&mut self, patch: PerfPatch) {
        if let Some(v) = patch.pooling {
            self.pooling = v;
        }
        if let Some(v) = patch.pool_capacity {
            if v == 0 {
                tracing::warn!("ignoring pool_capacity of zero in configuration patch");
            } else {
                self.pool_capacity = v;
            }
        }
        if let Some(v) = patch.trace_max_frames {
            if v == 0 {
                tracing::warn!("ignoring trace_max_frames of zero in configuration patch");
            } else {
                self.trace_max_frames = v;
            }
        }
        if let Some(v) = patch.context_max_entries {
            if v == 0 {
                tracing::warn!("ignoring context_max_entries of zero in configuration patch");
            } else {
                self.context_max_entries = v;
            }
        }
        if let Some(v) = patch.context_max_bytes {
            if v == 0 {
                tracing::warn!("ignoring context_max_bytes of zero in configuration patch");
            } else {
                self.context_max_bytes = v;
            }
        }
        if let Some(v) = patch.history_capacity {
            self.history_capacity = v;
        }
    }
}

/// Partial performance record; `None` fields leave the current value intact.
#[must_use]
#[derive(Clone, Default)]
pub struct PerfPatch {
    pub pooling: Option<bool>,
    pub pool_capacity: Option<usize>,
    pub trace_max_frames: Option<usize>,
    pub context_max_entries: Option<usize>,
    pub context_max_bytes: Option<usize>,
    pub history_capacity: Option<usize>,
}

impl PerfPatch {
    /// Creates an empty performance patch.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pooling(mut self, on: bool) -> Self {
        self.pooling = Some(on);
        self
    }

    pub fn pool_capacity(mut self, capacity: usize) -> Self {
        self.pool_capacity = Some(capacity);
        self
    }

    pub fn trace_max_frames(mut self, frames: usize) -> Self {
        self.trace_max_frames = Some(frames);
        self
    }

    pub fn context_max_entries(mut self, entries: usize) -> Self {
        self.context_max_entries = Some(entries);
        self
    }

    pub fn context_max_bytes(mut self, bytes: usize) -> Self {
        self.context_max_bytes = Some(bytes);
        self
    }

    pub fn history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = Some(capacity);
        self
    }
}

/// Partial configuration; `None` fields leave the current value intact.
#[must_use]
#[derive(Clone, Default)]
pub struct ConfigPatch {
    pub capture_trace: Option<bool>,
    pub include_origin: Option<bool>,
    pub skip_timestamp: Option<bool>,
    pub skip_context: Option<bool>,
    pub minimal_mode: Option<bool>,
    pub default_kind: Option<String>,
    pub origin_format: Option<OriginFormat>,
    pub origin_formatter: Option<OriginFormatter>,
    pub transform: Option<TransformHook>,
    pub serializer: Option<SerializerHook>,
    pub perf: Option<PerfPatch>,
}

impl ConfigPatch {
    /// Creates an empty patch.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture_trace(mut self, on: bool) -> Self {
        self.capture_trace = Some(on);
        self
    }

    pub fn include_origin(mut self, on: bool) -> Self {
        self.include_origin = Some(on);
        self
    }

    pub fn skip_timestamp(mut self, on: bool) -> Self {
        self.skip_timestamp = Some(on);
        self
    }

    pub fn skip_context(mut self, on: bool) -> Self {
        self.skip_context = Some(on);
        self
    }

    pub fn minimal_mode(mut self, on: bool) -> Self {
        self.minimal_mode = Some(on);
        self
    }

    pub fn default_kind<S: Into<String>>(mut self, kind: S) -> Self {
        self.default_kind = Some(kind.into());
        self
    }

    pub fn origin_format(mut self, format: OriginFormat) -> Self {
        self.origin_format = Some(format);
        self
    }

    pub fn origin_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&'static Location<'static>) -> String + Send + Sync + 'static,
    {
        self.origin_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(ErrorValue) -> ErrorValue + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub fn serializer<F>(mut self, serializer: F) -> Self
    where
        F: Fn(&ErrorValue) -> String + Send + Sync + 'static,
    {
        self.serializer = Some(Arc::new(serializer));
        self
    }

    pub fn perf(mut self, perf: PerfPatch) -> Self {
        self.perf = Some(perf);
        self
    }

    /// Preset for local development: full capture including traces, full-path
    /// origins, and a short error history for inspection.
    pub fn development() -> Self {
        Self::new()
            .capture_trace(true)
            .include_origin(true)
            .origin_format(OriginFormat::Full)
            .perf(PerfPatch::new().history_capacity(16))
    }

    /// Preset for production: origins but no traces, timestamps kept.
    pub fn production() -> Self {
        Self::new()
            .capture_trace(false)
            .include_origin(true)
            .origin_format(OriginFormat::FileLineColumn)
    }

    /// Preset for high-failure-rate paths: pooling on, capture trimmed to
    /// the cheap fields, tight context ceilings.
    pub fn performance() -> Self {
        Self::new()
            .capture_trace(false)
            .include_origin(false)
            .perf(
                PerfPatch::new()
                    .pooling(true)
                    .context_max_entries(16)
                    .context_max_bytes(1024),
            )
    }

    /// Preset capturing only kind and message.
    pub fn minimal() -> Self {
        Self::new()
            .minimal_mode(true)
            .skip_timestamp(true)
            .skip_context(true)
    }
}
