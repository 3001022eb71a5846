use crate::entry::Entry;
use crate::path::join;
use std::sync::Arc;

pub type LinkHandle = Arc<dyn LinkBuilder + Send + Sync>;

/// Builds the URL an entry's bytes can be fetched from.
pub trait LinkBuilder: Send + Sync {
    /// Absolute URL for `entry`, which lives in the directory `dir`.
    fn link(&self, dir: &str, entry: &Entry) -> String;
}

/// Direct download links: `{base}/d/<path>`, signed when the entry carries
/// a signature.
///
/// # Examples
///
/// ```
/// use parcel_storage::{DirectLinks, Entry, LinkBuilder};
///
/// let links = DirectLinks::new("http://localhost:5244/");
/// let entry = Entry::file("q1 report.pdf", 100).with_sign("abc=:0");
/// assert_eq!(
///     links.link("/docs", &entry),
///     "http://localhost:5244/d/docs/q1%20report.pdf?sign=abc%3D%3A0",
/// );
/// ```
#[derive(Debug, Clone)]
pub struct DirectLinks {
    base_url: String,
}

impl DirectLinks {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

impl LinkBuilder for DirectLinks {
    fn link(&self, dir: &str, entry: &Entry) -> String {
        let path = join(["", dir, entry.name.as_str()]);
        let encoded: Vec<_> = path.split('/').map(urlencoding::encode).collect();
        let mut url = format!("{}/d{}", self.base_url, encoded.join("/"));
        if let Some(sign) = &entry.sign {
            url.push_str("?sign=");
            url.push_str(&urlencoding::encode(sign));
        }
        url
    }
}
