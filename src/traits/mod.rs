//! Extension traits over the [`Outcome`](crate::types::Outcome) result type.

mod outcome_ext;

pub use outcome_ext::OutcomeExt;
