//! In-memory listing service for testing.

use super::Listing;
use crate::entry::Entry;
use crate::error::{ErrorKind, Result};
use crate::path::normalize;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::Mutex;

/// In-memory [`Listing`] for testing.
///
/// Directories are registered up front by path; every call to
/// [`list`](Listing::list) is recorded so tests can assert which
/// directories were (and weren't) visited.
///
/// # Examples
///
/// ```
/// use parcel_storage::{Entry, Listing, MockListing};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let listing = MockListing::default()
///     .with_dir("/", [Entry::dir("docs")])
///     .with_dir("/docs", [Entry::file("a.txt", 10)])
///     .with_failure("/private", "permission denied");
///
/// assert_eq!(listing.list("/docs", None).await?, vec![Entry::file("a.txt", 10)]);
/// assert!(listing.list("/private", None).await.is_err());
/// assert_eq!(listing.calls().await, vec!["/docs", "/private"]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default)]
pub struct MockListing {
    dirs: HashMap<String, Vec<Entry>>,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MockListing {
    /// Register a directory and its entries.
    ///
    /// Panics if the path is invalid. If test setup is wrong, then test
    /// should not pass.
    pub fn with_dir(mut self, path: &str, entries: impl IntoIterator<Item = Entry>) -> Self {
        self.dirs.insert(Self::key(path), entries.into_iter().collect());
        self
    }

    /// Make listing `path` fail with the given store message.
    pub fn with_failure(mut self, path: &str, message: impl Into<String>) -> Self {
        self.failures.insert(Self::key(path), message.into());
        self
    }

    /// Normalized paths of every directory listed so far, in call order.
    pub async fn calls(&self) -> Vec<String> {
        self.calls.lock().await.clone()
    }

    fn key(path: &str) -> String {
        let Ok(path) = normalize(path) else {
            // The panic here is DELIBERATE. MockListing is intended to be
            // used in tests; panics are expected. There is no error result.
            panic!("MockListing: invalid path {path}");
        };
        path
    }
}

#[async_trait]
impl Listing for MockListing {
    async fn list(&self, path: &str, _password: Option<&str>) -> Result<Vec<Entry>> {
        let path = normalize(path)?;
        self.calls.lock().await.push(path.clone());
        if let Some(message) = self.failures.get(&path) {
            exn::bail!(ErrorKind::Rejected { code: 403, message: message.clone() });
        }
        match self.dirs.get(&path) {
            Some(entries) => Ok(entries.clone()),
            None => exn::bail!(ErrorKind::Rejected { code: 500, message: "object not found".to_string() }),
        }
    }
}
