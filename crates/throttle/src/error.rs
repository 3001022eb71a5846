//! Throttle Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A throttle error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for throttle operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A category tag was not one of `download`, `list` or `search`.
    #[display("invalid request category: {_0}")]
    InvalidCategory(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
