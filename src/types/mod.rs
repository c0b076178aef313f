//! Core data types: the error value, its context map, and the result alias.
//!
//! # Examples
//!
//! ```
//! use faultline::types::{ErrorValue, Outcome};
//!
//! fn half(n: i32) -> Outcome<i32> {
//!     if n % 2 == 0 {
//!         Ok(n / 2)
//!     } else {
//!         Err(ErrorValue::new("OddInput", format!("{} is not even", n)))
//!     }
//! }
//!
//! assert_eq!(half(4), Ok(2));
//! assert!(half(3).is_err());
//! ```

pub mod context_map;
pub mod error_value;

pub use context_map::ContextMap;
pub use error_value::{kind, Cause, ErrorValue};

/// The two-variant union returned by every wrapped operation: the operation's
/// success value, or an [`ErrorValue`].
///
/// This is a plain `Result`, so the predicate API is `is_ok`/`is_err` plus
/// [`OutcomeExt`](crate::traits::OutcomeExt), and accessing success-only data
/// on the error variant is a compile error rather than a runtime surprise.
pub type Outcome<T> = Result<T, ErrorValue>;
