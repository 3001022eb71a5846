mod entry;
pub mod error;
mod link;
pub mod listing;
pub mod path;

pub use crate::entry::Entry;
pub use crate::link::{DirectLinks, LinkBuilder, LinkHandle};
#[cfg(feature = "mock")]
pub use crate::listing::MockListing;
pub use crate::listing::{HttpListing, Listing};
use std::sync::Arc;

pub type ListingHandle = Arc<dyn Listing + Send + Sync>;
