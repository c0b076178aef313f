//! Convenience re-exports for common usage patterns.
//!
//! Import everything with:
//!
//! ```
//! use faultline::prelude::*;
//! ```
//!
//! # What's Included
//!
//! - **Macros**: [`context!`](crate::context)
//! - **Types**: [`ErrorValue`], [`Cause`], [`ContextMap`], [`Outcome`]
//! - **Traits**: [`OutcomeExt`]
//! - **Entry points**: [`create_error`], [`run_sync`], [`configure`],
//!   the option builders, and the reserved [`kind`] constants
//!
//! # Examples
//!
//! ```
//! use faultline::prelude::*;
//!
//! fn parse_port(raw: &str) -> Outcome<u16> {
//!     run_sync(|| raw.parse::<u16>(), RunOptions::new().kind("BadPort"))
//! }
//!
//! assert!(parse_port("8080").is_ok());
//! assert!(parse_port("eighty").is_error_kind("BadPort"));
//! ```

pub use crate::config::{Config, ConfigPatch, PerfPatch};
pub use crate::context;
pub use crate::create::CreateOptions;
pub use crate::exec::RunOptions;
pub use crate::traits::OutcomeExt;
pub use crate::types::{kind, Cause, ContextMap, ErrorValue, Outcome};
pub use crate::{configure, create_error, pop_scope, push_scope, run_sync};

#[cfg(feature = "async")]
pub use crate::async_ext::{AsyncOptions, CancelToken, FutureOutcomeExt};
#[cfg(feature = "async")]
pub use crate::run_async;
