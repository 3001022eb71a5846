//! Bulk downloads: many remote files and folders, one ZIP archive.
//!
//! A download runs in two phases. First the selection is resolved
//! ([`resolve_selection`]): folders are listed recursively until every
//! selected item has become a flat, ordered list of files. Nothing is written
//! until this succeeds. Then the files are fetched one at a time
//! ([`EntryProducer`]) and streamed into the archive as they arrive, so
//! neither a whole file nor the whole archive is ever held in memory.
//!
//! [`run`] drives both phases and reports progress as a stream of
//! [`DownloadEvent`]s.

mod context;
pub mod error;
mod naming;
mod producer;
mod resolve;
mod run;
#[cfg(test)]
mod testing;

pub use crate::context::Context;
pub use crate::naming::{archive_name, save_name};
pub use crate::producer::EntryProducer;
pub use crate::resolve::{Resolution, ResolvedFile, resolve_selection};
pub use crate::run::{DownloadEvent, Status, run};
