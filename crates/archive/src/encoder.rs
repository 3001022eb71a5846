use crate::error::{ErrorKind, Result};
use crate::sink::BoxSyncWrite;
use crate::{ArchiveEntry, Compression};
use exn::OptionExt;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::task::spawn_blocking;
use tokio_util::io::{StreamReader, SyncIoBridge};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, StreamWriter, ZipWriter};

type Writer = ZipWriter<StreamWriter<Output>>;

/// Entries at least this large need ZIP64 extensions.
const ZIP32_LIMIT: u64 = u32::MAX as u64;

impl Compression {
    fn method(self) -> CompressionMethod {
        match self {
            Compression::Stored => CompressionMethod::Stored,
            Compression::Deflated => CompressionMethod::Deflated,
        }
    }
}

/// The sink, behind a switch that cuts it off once the archive is abandoned.
///
/// A `ZipWriter` finalizes itself when dropped. Writes after the cut-off are
/// swallowed, so an abandoned archive stays exactly as far as it got.
struct Output {
    inner: BoxSyncWrite,
    abandoned: Arc<AtomicBool>,
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.abandoned.load(Ordering::Acquire) {
            return Ok(buf.len());
        }
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.abandoned.load(Ordering::Acquire) {
            return Ok(());
        }
        self.inner.flush()
    }
}

/// Writes a ZIP archive entry by entry into a non-seekable output.
///
/// Entries are written in the order they are appended, each one completely
/// before the next is accepted. If appending an entry fails the archive is
/// abandoned: every later call returns [`Finished`](ErrorKind::Finished),
/// and nothing more reaches the output. The same goes for an encoder dropped
/// before [`finish`](Self::finish).
///
/// # Examples
///
/// ```no_run
/// use parcel_archive::{ArchiveEntry, Compression, LocalSink, OutputSink, ZipEncoder};
/// use parcel_fetch::ByteStream;
///
/// # async fn example(body: ByteStream) -> Result<(), Box<dyn std::error::Error>> {
/// let output = LocalSink::new("/tmp").open("docs.zip", None).await?;
/// let mut encoder = ZipEncoder::new(output, Compression::Stored);
/// encoder.append(ArchiveEntry::new("docs/a.txt", body)).await?;
/// encoder.finish().await?;
/// # Ok(())
/// # }
/// ```
pub struct ZipEncoder {
    writer: Option<Writer>,
    abandoned: Arc<AtomicBool>,
    compression: Compression,
    entries: usize,
}

impl ZipEncoder {
    pub fn new(output: BoxSyncWrite, compression: Compression) -> Self {
        let abandoned = Arc::new(AtomicBool::new(false));
        let output = Output { inner: output, abandoned: abandoned.clone() };
        Self {
            writer: Some(ZipWriter::new_stream(output)),
            abandoned,
            compression,
            entries: 0,
        }
    }

    /// Number of entries written so far.
    pub fn entries(&self) -> usize {
        self.entries
    }

    /// Stream one entry into the archive, returning its uncompressed size.
    ///
    /// The entry's body is pulled only as fast as the output accepts bytes.
    pub async fn append(&mut self, entry: ArchiveEntry) -> Result<u64> {
        let mut writer = self.writer.take().ok_or_raise(|| ErrorKind::Finished)?;
        let options = SimpleFileOptions::default()
            .compression_method(self.compression.method())
            .unix_permissions(0o644)
            .large_file(entry.size.is_some_and(|size| size >= ZIP32_LIMIT));
        let ArchiveEntry { name, stream, .. } = entry;
        // Must be created on the runtime; it's only read from the blocking thread.
        let mut body = SyncIoBridge::new(StreamReader::new(stream));
        let abandoned = self.abandoned.clone();
        let (writer, written) = spawn_blocking(move || {
            let written = write_entry(&mut writer, name, options, &mut body);
            if written.is_err() {
                abandoned.store(true, Ordering::Release);
                drop(writer);
                return (None, written);
            }
            (Some(writer), written)
        })
        .await
        .map_err(|e| ErrorKind::Encoding(format!("archive writer stopped: {e}")))?;
        let written = written?;
        self.writer = writer;
        self.entries += 1;
        Ok(written)
    }

    /// Write the central directory and flush the output.
    pub async fn finish(&mut self) -> Result<()> {
        let writer = self.writer.take().ok_or_raise(|| ErrorKind::Finished)?;
        let entries = self.entries;
        spawn_blocking(move || -> Result<()> {
            let mut output = writer.finish().map_err(|e| ErrorKind::Encoding(e.to_string()))?.into_inner();
            output.flush().map_err(|e| ErrorKind::Sink(e.to_string()))?;
            tracing::debug!(entries, "Archive finished");
            Ok(())
        })
        .await
        .map_err(|e| ErrorKind::Encoding(format!("archive writer stopped: {e}")))?
    }
}

impl Drop for ZipEncoder {
    // An encoder dropped before `finish` leaves a truncated archive rather
    // than one the writer patched up on its way out.
    fn drop(&mut self) {
        self.abandoned.store(true, Ordering::Release);
    }
}

fn write_entry(writer: &mut Writer, name: String, options: SimpleFileOptions, body: &mut impl Read) -> Result<u64> {
    writer
        .start_file(name.as_str(), options)
        .map_err(|e| ErrorKind::Encoding(format!("{name}: {e}")))?;
    let written = io::copy(body, writer).map_err(|e| ErrorKind::Io(format!("{name}: {e}")))?;
    tracing::debug!(%name, bytes = written, "Archived entry");
    Ok(written)
}
