//! Storage Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// A storage error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The file store answered, but refused the request. The message is the
    /// store's own and is shown to users as-is.
    #[display("{message}")]
    Rejected { code: i64, message: String },
    /// The file store could not be reached.
    #[display("network error: {_0}")]
    Network(#[error(not(source))] String),
    /// Path contains NUL bytes or escapes the root.
    #[display("invalid path: {_0}")]
    InvalidPath(#[error(not(source))] String),
    /// The file store answered with something that isn't a listing.
    #[display("unexpected response: {_0}")]
    Decode(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
