/*!
 * Error Types
 * Centralized error handling with thiserror, miette, and serde support
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Buffer and pool errors with serialization support
///
/// All errors are synchronous and fail-fast at the call that triggers them;
/// nothing in this crate retries internally.
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PoolError {
    #[error("Invalid argument: {0}")]
    #[diagnostic(
        code(poolbuf::invalid_argument),
        help("Check lengths passed to rent/release and provenance of recycled wrappers.")
    )]
    InvalidArgument(String),

    #[error("Index {index} out of range for length {len}")]
    #[diagnostic(
        code(poolbuf::index_out_of_range),
        help("Index must be non-negative and less than the size of the collection.")
    )]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Collection was modified; enumeration operation may not execute")]
    #[diagnostic(
        code(poolbuf::concurrent_modification),
        help("Do not mutate a buffer while a cursor over it is live. Request a fresh cursor after mutating.")
    )]
    ConcurrentModification,

    #[error("Buffer was already disposed")]
    #[diagnostic(
        code(poolbuf::use_after_dispose),
        help("A disposed buffer cannot be used again. Rent a new one or use a recycler.")
    )]
    UseAfterDispose,

    #[error("Capacity overflow: requested {requested} elements")]
    #[diagnostic(
        code(poolbuf::capacity_overflow),
        help("Growth exceeded the maximum representable backing-store length for this element type.")
    )]
    CapacityOverflow {
        /// Wide enough to report a request whose element count itself
        /// overflowed `usize`
        requested: u128,
    },
}

/// Result type for pool and buffer operations
///
/// # Must Use
/// Buffer operations can fail and must be handled to keep ownership of backing
/// stores well-defined
pub type Result<T> = std::result::Result<T, PoolError>;
