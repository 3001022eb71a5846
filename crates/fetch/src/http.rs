use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// A response body, streamed chunk by chunk.
pub type ByteStream = Pin<Box<dyn Stream<Item = std::io::Result<Bytes>> + Send + 'static>>;

/// Shared handle to an [`HttpClient`].
pub type ClientHandle = Arc<dyn HttpClient>;

/// The parts of an HTTP response the fetcher cares about.
pub struct Response {
    pub status: u16,
    /// Canonical reason phrase for `status`, or empty if unknown.
    pub reason: String,
    /// `None` when the response has no body to stream at all.
    pub body: Option<ByteStream>,
}

impl Response {
    pub fn new(status: u16, reason: impl Into<String>, body: Option<ByteStream>) -> Self {
        Self { status, reason: reason.into(), body }
    }

    /// A `200 OK` streaming the given chunks.
    pub fn ok(chunks: impl IntoIterator<Item = Bytes>) -> Self {
        let chunks: Vec<std::io::Result<Bytes>> = chunks.into_iter().map(Ok).collect();
        Self::new(200, "OK", Some(Box::pin(futures::stream::iter(chunks))))
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("reason", &self.reason)
            .field("body", &self.body.as_ref().map(|_| ".."))
            .finish()
    }
}

/// Minimal HTTP client abstraction used for content downloads.
///
/// Implementations issue exactly one request per call: no retries, no
/// status classification. Transport-level failures are reported as
/// [`Transport`](crate::error::ErrorKind::Transport) errors; any response
/// that arrived, successful or not, is returned as a [`Response`].
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn get(&self, url: &str) -> Result<Response>;
}
