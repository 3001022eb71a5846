//! In-memory output sink for testing.

use crate::error::Result;
use crate::sink::{BoxSyncWrite, OutputSink};
use async_trait::async_trait;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Debug, Default)]
struct Shared {
    opened: Vec<(String, Option<u64>)>,
    bytes: Vec<u8>,
}

/// In-memory [`OutputSink`] for testing.
///
/// Everything written through any opened writer lands in one shared buffer.
/// A byte limit can be set to make writes fail part-way, the way a full
/// disk or a closed download would.
///
/// # Examples
///
/// ```
/// use parcel_archive::{MemorySink, OutputSink};
/// use std::io::Write;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = MemorySink::default();
/// let mut writer = sink.open("docs.zip", Some(15)).await?;
/// writer.write_all(b"PK")?;
/// assert_eq!(sink.bytes(), b"PK");
/// assert_eq!(sink.opened(), vec![("docs.zip".to_string(), Some(15))]);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    shared: Arc<Mutex<Shared>>,
    limit: Option<usize>,
}

impl MemorySink {
    /// A sink that fails any write which would grow it beyond `limit` bytes.
    pub fn with_limit(limit: usize) -> Self {
        Self { shared: Arc::default(), limit: Some(limit) }
    }

    /// Everything written so far.
    pub fn bytes(&self) -> Vec<u8> {
        self.lock().bytes.clone()
    }

    /// File names and size hints of every `open` call, in order.
    pub fn opened(&self) -> Vec<(String, Option<u64>)> {
        self.lock().opened.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Shared> {
        self.shared.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl OutputSink for MemorySink {
    async fn open(&self, file_name: &str, size_hint: Option<u64>) -> Result<BoxSyncWrite> {
        self.lock().opened.push((file_name.to_string(), size_hint));
        Ok(Box::new(self.clone()))
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut shared = self.lock();
        if let Some(limit) = self.limit
            && shared.bytes.len() + buf.len() > limit
        {
            return Err(io::Error::new(io::ErrorKind::StorageFull, "memory sink is full"));
        }
        shared.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
