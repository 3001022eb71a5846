//! Directory listing service.
//!
//! The bundler only ever needs to ask the file store one question: what is
//! in this directory? [`Listing`] is that question; [`HttpListing`] asks the
//! real store over HTTP and `MockListing` (behind the `mock` feature)
//! answers from memory.

mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::http::HttpListing;
#[cfg(feature = "mock")]
pub use self::mock::MockListing;
use crate::entry::Entry;
use crate::error::Result;
use async_trait::async_trait;

/// Lists the contents of remote directories.
///
/// # Errors
/// A directory the store refuses to list (wrong password, missing,
/// forbidden) is reported as [`Rejected`](crate::error::ErrorKind::Rejected)
/// carrying the store's message unchanged. Implementations don't retry.
///
/// # Examples
///
/// ```
/// use parcel_storage::{Entry, Listing, error::Result};
///
/// async fn total_size(listing: &dyn Listing, dir: &str) -> Result<u64> {
///     let entries: Vec<Entry> = listing.list(dir, None).await?;
///     Ok(entries.iter().filter(|e| !e.is_dir).map(|e| e.size).sum())
/// }
/// ```
#[async_trait]
pub trait Listing: Send + Sync {
    /// Entries of the directory at `path`, in the store's order.
    async fn list(&self, path: &str, password: Option<&str>) -> Result<Vec<Entry>>;
}
