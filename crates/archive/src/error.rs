//! Archive Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction.

use derive_more::{Display, Error};

/// An archive error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for archive operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The output destination could not be opened or refused bytes.
    #[display("output error: {_0}")]
    Sink(#[error(not(source))] String),
    /// The ZIP container could not be written (bad entry name, format limits).
    #[display("archive encoding error: {_0}")]
    Encoding(#[error(not(source))] String),
    /// Copying an entry's bytes into the archive failed, on either side.
    #[display("I/O error: {_0}")]
    Io(#[error(not(source))] String),
    /// The archive was already finished, or abandoned after a failed entry.
    #[display("archive already finished")]
    Finished,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}
