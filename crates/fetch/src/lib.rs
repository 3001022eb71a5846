//! Retrying HTTP fetches.
//!
//! - [`compute_backoff`] decides how long to wait before the next attempt.
//! - [`fetch_with_retry`] performs bounded attempts against any
//!   [`HttpClient`], returning the first successful response body as a
//!   [`ByteStream`].
//! - [`ThrottledClient`] (feature `reqwest`) is the production client: every
//!   request it sends first waits for a slot in its
//!   [`Category`](parcel_throttle::Category).

mod backoff;
#[cfg(feature = "reqwest")]
mod client;
pub mod error;
mod http;
mod retry;

pub use crate::backoff::compute_backoff;
#[cfg(feature = "reqwest")]
pub use crate::client::ThrottledClient;
pub use crate::http::{ByteStream, ClientHandle, HttpClient, Response};
pub use crate::retry::{RetryConfig, fetch_with_retry};
