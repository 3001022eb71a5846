use parcel_archive::{Compression, SinkHandle};
use parcel_fetch::{ClientHandle, RetryConfig};
use parcel_storage::{LinkHandle, ListingHandle};

/// Collaborators and settings for one bulk download session.
#[derive(Clone)]
pub struct Context {
    pub listing: ListingHandle,
    pub links: LinkHandle,
    pub client: ClientHandle,
    pub sink: SinkHandle,
    pub retry: RetryConfig,
    /// Password sent with every directory listing.
    pub password: Option<String>,
    pub compression: Compression,
    /// Archive name of last resort, see [`save_name`](crate::save_name).
    pub home_label: String,
}

impl Context {
    pub fn new(listing: ListingHandle, links: LinkHandle, client: ClientHandle, sink: SinkHandle) -> Self {
        Self {
            listing,
            links,
            client,
            sink,
            retry: RetryConfig::default(),
            password: None,
            compression: Compression::default(),
            home_label: "root".to_string(),
        }
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_password(mut self, password: Option<String>) -> Self {
        self.password = password;
        self
    }

    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    pub fn with_home_label(mut self, home_label: impl Into<String>) -> Self {
        self.home_label = home_label.into();
        self
    }
}
