//! Per-category request pacing.
//!
//! Outbound requests are classified into a [`Category`] (download, list or
//! search) and each category is paced independently by a [`Throttle`]:
//! callers in the same category queue up single-file and are admitted no
//! closer together than `1000ms / limit`, while callers in different
//! categories never wait on each other.

mod category;
pub mod error;
mod throttle;

pub use crate::category::Category;
pub use crate::throttle::{RateLimits, Throttle};
