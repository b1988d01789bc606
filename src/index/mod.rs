//! Index subsystem
//!
//! Declarative index definitions per collection. Creation is idempotent by
//! name: re-declaring an identical index is a no-op, re-declaring a name with
//! different keys or uniqueness is a conflict.

pub mod catalog;
mod errors;
mod spec;

pub use catalog::validate_catalog;
pub use errors::{IndexError, IndexErrorCode, IndexResult};
pub use spec::{IndexDirection, IndexSpec};
