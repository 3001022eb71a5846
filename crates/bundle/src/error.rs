//! Bundle Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction. Every kind carries the message a user should see; the
//! error tree underneath keeps the originating frames for logs.

use derive_more::{Display, Error};

/// A bundle error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for bundle operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// A directory in the selection couldn't be listed. Nothing was written.
    #[display("failed to fetch folder structure: {_0}")]
    Resolve(#[error(not(source))] String),
    /// A file couldn't be downloaded, even after retrying.
    #[display("download failed: {_0}")]
    Fetch(#[error(not(source))] String),
    /// The archive couldn't be written to its destination.
    #[display("archive failed: {_0}")]
    Archive(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

/// Raise `kind` on top of another crate's error, keeping its message for
/// display.
pub(crate) fn raise_as<E>(kind: fn(String) -> ErrorKind) -> impl FnOnce(exn::Exn<E>) -> Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    move |err| {
        let message = (*err).to_string();
        err.raise(kind(message))
    }
}
