//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// The first three describe a single failed attempt and are retried by
/// [`fetch_with_retry`](crate::fetch_with_retry); [`Exhausted`](Self::Exhausted)
/// is what the caller finally sees once no attempts remain.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request never produced a response (DNS, connection, TLS, ...).
    #[display("{_0}")]
    Transport(#[error(not(source))] String),
    /// The server answered with a non-success status.
    #[display("HTTP {code} {reason}")]
    Status { code: u16, reason: String },
    /// The response carried no body to stream.
    #[display("empty response body")]
    EmptyBody,
    /// Every attempt failed; `message` is the last attempt's failure.
    #[display("{}{message}", label.as_ref().map(|l| format!("{l}: ")).unwrap_or_default())]
    Exhausted {
        label: Option<String>,
        message: String,
        attempts: u32,
    },
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Status { .. } | Self::EmptyBody)
    }
}
