use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// Classification of an outbound request for pacing purposes.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum Category {
    /// Fetching file contents (direct or proxied links).
    #[display("download")]
    Download,
    /// Directory listings and metadata lookups.
    #[display("list")]
    List,
    /// Search queries.
    #[display("search")]
    Search,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Download, Category::List, Category::Search];

    /// Derive the category of a request from its target path.
    ///
    /// Search endpoints are `search`, content links (`/d/...` and `/p/...`)
    /// are `download`, and everything else (listing, metadata, unknown
    /// endpoints) is `list`.
    ///
    /// ```
    /// use parcel_throttle::Category;
    ///
    /// assert_eq!(Category::from_path("/api/fs/search"), Category::Search);
    /// assert_eq!(Category::from_path("/d/docs/report.pdf"), Category::Download);
    /// assert_eq!(Category::from_path("/api/fs/list"), Category::List);
    /// assert_eq!(Category::from_path("/api/me"), Category::List);
    /// ```
    pub fn from_path(path: &str) -> Self {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let trimmed = path.trim_end_matches('/');
        if trimmed.ends_with("/fs/search") {
            Category::Search
        } else if path.starts_with("/d/") || path.starts_with("/p/") {
            Category::Download
        } else {
            Category::List
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            Category::Download => 0,
            Category::List => 1,
            Category::Search => 2,
        }
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(Category::Download),
            "list" => Ok(Category::List),
            "search" => Ok(Category::Search),
            _ => exn::bail!(ErrorKind::InvalidCategory(s.to_string())),
        }
    }
}
