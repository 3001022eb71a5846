//! Streaming ZIP output.
//!
//! [`ZipEncoder`] writes [`ArchiveEntry`]s one at a time into a ZIP stream
//! without seeking, so the archive can go straight to any [`OutputSink`]
//! (a local file, or memory in tests) without ever being held whole.
//!
//! Entry bodies are async byte streams; the ZIP writer is synchronous. Each
//! entry is copied on a blocking thread through a
//! [`SyncIoBridge`](tokio_util::io::SyncIoBridge), so the encoder is only
//! ever pulling as fast as the sink accepts bytes.

mod encoder;
pub mod error;
#[cfg(feature = "mock")]
mod memory;
mod sink;

pub use crate::encoder::ZipEncoder;
#[cfg(feature = "mock")]
pub use crate::memory::MemorySink;
pub use crate::sink::{BoxSyncWrite, LocalSink, OutputSink, SinkHandle};
use crate::error::{Error, ErrorKind};
use parcel_fetch::ByteStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How entry bodies are stored inside the archive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    /// Bytes are stored as-is. Fastest, and what most downloads want: the
    /// files are usually compressed already.
    #[default]
    Stored,
    /// DEFLATE, the compression every ZIP reader understands.
    Deflated,
}

impl FromStr for Compression {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "stored" | "store" | "none" => Ok(Compression::Stored),
            "deflated" | "deflate" => Ok(Compression::Deflated),
            _ => exn::bail!(ErrorKind::Encoding(format!("unsupported compression: {s}"))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Compression::Stored => "stored",
            Compression::Deflated => "deflated",
        })
    }
}

/// A named byte stream, ready to become one file inside the archive.
pub struct ArchiveEntry {
    /// Archive-relative path, `/`-separated, no leading slash.
    pub name: String,
    /// Expected size in bytes, when known up front.
    pub size: Option<u64>,
    pub stream: ByteStream,
}

impl ArchiveEntry {
    pub fn new(name: impl Into<String>, stream: ByteStream) -> Self {
        Self { name: name.into(), size: None, stream }
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }
}

impl fmt::Debug for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveEntry").field("name", &self.name).field("size", &self.size).finish_non_exhaustive()
    }
}
