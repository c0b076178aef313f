//! Typed error-as-value runtime: failures become structured, inspectable
//! [`ErrorValue`]s instead of unwound panics or stringly-typed errors, without
//! giving up debugging context (origin, timing, causal chain, free-form
//! metadata).
//!
//! Each submodule re-exports its public surface from here; most applications
//! use the crate-root free functions, which delegate to a process-wide
//! [`Runtime`]. Embedders and tests construct their own `Runtime` for
//! isolation.
//!
//! # Examples
//!
//! ## Wrapping fallible work
//!
//! ```
//! use faultline::{run_sync, OutcomeExt, RunOptions};
//!
//! let outcome = run_sync(
//!     || serde_json::from_str::<serde_json::Value>("not json"),
//!     RunOptions::new(),
//! );
//!
//! assert!(outcome.is_error_kind("Thrown"));
//! assert!(outcome.error_value().unwrap().message().contains("expected"));
//! ```
//!
//! ## Creating an error value directly
//!
//! ```
//! use faultline::{context, create_error, CreateOptions};
//!
//! let err = create_error(
//!     "QuotaExceeded",
//!     "monthly request quota exhausted",
//!     CreateOptions::new().context(context! { "limit" => 10_000 }),
//! );
//!
//! assert_eq!(err.kind(), "QuotaExceeded");
//! assert_eq!(err.context().unwrap().get("limit"), Some(&serde_json::json!(10_000)));
//! ```
//!
//! ## Observing error creation
//!
//! ```
//! use faultline::events::ERROR_CREATED;
//! use faultline::{CreateOptions, Runtime};
//!
//! let runtime = Runtime::new();
//! let sub = runtime.events().on(ERROR_CREATED, |event| {
//!     eprintln!("created: {}", event.error);
//! });
//!
//! let _ = runtime.create_error("DiskFull", "no space left on device", CreateOptions::new());
//! sub.unsubscribe();
//! ```

/// Capture configuration: toggles, hooks, presets, and the scope stack.
pub mod config;
/// The configuration-driven creation pipeline.
pub mod create;
/// Synchronous pub/sub for `error:created` observers.
pub mod events;
/// The synchronous execution wrapper.
pub mod exec;
/// `context!` macro for literal context maps.
pub mod macros;
/// Ordered post-processing of results.
pub mod middleware;
/// Lifecycle-managed runtime extensions.
pub mod plugin;
/// Slot pool reusing error-value backing buffers.
pub mod pool;
/// Convenience re-exports for quick starts.
pub mod prelude;
/// Runtime wiring and the process-wide instance.
pub mod runtime;
/// Extension traits over `Outcome`.
pub mod traits;
/// Core data types.
pub mod types;

/// Async execution wrapper and future adapters (requires the `async`
/// feature, on by default).
#[cfg(feature = "async")]
pub mod async_ext;

pub use config::{Config, ConfigPatch, OriginFormat, PerfConfig, PerfPatch};
pub use create::CreateOptions;
pub use events::{Event, EventBus, Subscription, ERROR_CREATED};
pub use exec::RunOptions;
pub use middleware::{ExecContext, Middleware, MiddlewareFn, PipelineResult};
pub use plugin::{InstallError, InstallReport, Plugin, PluginInfo};
pub use runtime::{runtime, Runtime};
pub use traits::OutcomeExt;
pub use types::{kind, Cause, ContextMap, ErrorValue, Outcome};

#[cfg(feature = "async")]
pub use async_ext::{AsyncOptions, CancelToken, FutureOutcomeExt};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::json;
}

use core::fmt::Display;

/// Builds an error value through the process-wide runtime's creation
/// pipeline. See [`Runtime::create_error`].
#[track_caller]
pub fn create_error<K, M>(kind: K, message: M, options: CreateOptions) -> ErrorValue
where
    K: AsRef<str>,
    M: AsRef<str>,
{
    runtime().create_error(kind, message, options)
}

/// Runs a unit of work on the process-wide runtime. See
/// [`Runtime::run_sync`].
#[track_caller]
pub fn run_sync<T, E, F>(f: F, options: RunOptions) -> Outcome<T>
where
    T: Send + 'static,
    E: Display + 'static,
    F: FnOnce() -> Result<T, E>,
{
    runtime().run_sync(f, options)
}

/// Runs an async unit of work on the process-wide runtime. See
/// [`Runtime::run_async`].
#[cfg(feature = "async")]
#[track_caller]
pub fn run_async<T, E, F, Fut>(
    f: F,
    options: AsyncOptions,
) -> impl core::future::Future<Output = Outcome<T>>
where
    T: Send + 'static,
    E: Display + 'static,
    F: FnOnce() -> Fut + 'static,
    Fut: core::future::Future<Output = Result<T, E>> + 'static,
{
    runtime().run_async(f, options)
}

/// Merges a partial configuration into the process-wide active scope and
/// notifies installed plugins. See [`Runtime::configure`].
pub fn configure(patch: ConfigPatch) {
    runtime().configure(patch);
}

/// Pushes a temporary configuration scope on the process-wide runtime.
pub fn push_scope(patch: ConfigPatch) {
    runtime().push_scope(patch);
}

/// Pops the most recent configuration scope; a no-op at the base scope.
pub fn pop_scope() {
    runtime().pop_scope();
}

/// Restores compiled-in configuration defaults and clears all scopes.
pub fn reset_config() {
    runtime().reset_config();
}

/// Appends a middleware entry to the process-wide runtime; returns its id.
pub fn use_entry(entry: MiddlewareFn) -> u64 {
    runtime().use_entry(entry)
}

/// Appends several middleware entries in iteration order.
pub fn use_many<I: IntoIterator<Item = MiddlewareFn>>(entries: I) {
    runtime().use_many(entries);
}

/// Installs a plugin on the process-wide runtime. See [`Runtime::install`].
pub fn install(plugin: Plugin) -> Result<InstallReport, InstallError> {
    runtime().install(plugin)
}

/// Uninstalls a plugin from the process-wide runtime by name.
pub fn uninstall(name: &str) -> bool {
    runtime().uninstall(name)
}

/// Lists plugins installed on the process-wide runtime.
pub fn list_plugins() -> Vec<PluginInfo> {
    runtime().list_plugins()
}
