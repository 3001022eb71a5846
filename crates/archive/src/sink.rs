use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;

/// A synchronous writer that can be moved onto a blocking thread.
pub type BoxSyncWrite = Box<dyn Write + Send + 'static>;

pub type SinkHandle = Arc<dyn OutputSink + Send + Sync>;

/// Where a finished archive's bytes go.
///
/// Opened exactly once per download, after the file list is known, so that
/// a download that fails while resolving leaves nothing behind.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Open a destination for a file called `file_name`.
    ///
    /// `size_hint` is the total size of the files going into the archive
    /// (not the archive itself); sinks may use it for progress or
    /// preallocation, or ignore it.
    ///
    /// Returns a `'static` boxed [`Write`] suitable for use inside
    /// [`spawn_blocking`](tokio::task::spawn_blocking). Callers should call
    /// `flush()` before dropping it.
    async fn open(&self, file_name: &str, size_hint: Option<u64>) -> Result<BoxSyncWrite>;
}

/// Writes archives into a local directory.
///
/// # Examples
///
/// ```no_run
/// use parcel_archive::{LocalSink, OutputSink};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let sink = LocalSink::new("/home/me/Downloads");
/// let mut writer = sink.open("docs.zip", Some(1024)).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct LocalSink {
    dir: PathBuf,
}

impl LocalSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Full path of `file_name` inside the sink's directory.
    ///
    /// The name must be a plain file name: anything that would land outside
    /// the directory is refused.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf> {
        let plain = !file_name.is_empty()
            && file_name != "."
            && file_name != ".."
            && !file_name.contains(['/', '\\', '\0']);
        if !plain {
            exn::bail!(ErrorKind::Sink(format!("refusing to write outside output directory: {file_name}")));
        }
        Ok(self.dir.join(file_name))
    }
}

#[async_trait]
impl OutputSink for LocalSink {
    async fn open(&self, file_name: &str, size_hint: Option<u64>) -> Result<BoxSyncWrite> {
        let path = self.path_for(file_name)?;
        fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| ErrorKind::Sink(format!("{}: {e}", self.dir.display())))?;
        let file = fs::File::create(&path).await.map_err(|e| ErrorKind::Sink(format!("{}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), size_hint, "Opened archive file");
        let file = file.into_std().await;
        Ok(Box::new(std::io::BufWriter::new(file)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::path::Path;

    #[rstest]
    #[case("")]
    #[case(".")]
    #[case("..")]
    #[case("../escape.zip")]
    #[case("nested/docs.zip")]
    #[case("a\\b.zip")]
    fn test_path_for_rejects(#[case] name: &str) {
        let sink = LocalSink::new("/tmp/out");
        let err = sink.path_for(name).unwrap_err();
        assert!(matches!(&*err, ErrorKind::Sink(_)));
    }

    #[test]
    fn test_path_for() {
        let sink = LocalSink::new("/tmp/out");
        assert_eq!(sink.path_for("docs.zip").unwrap(), Path::new("/tmp/out/docs.zip"));
        assert_eq!(sink.path_for("..hidden.zip").unwrap(), Path::new("/tmp/out/..hidden.zip"));
    }

    #[tokio::test]
    async fn test_open_creates_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path().join("nested/out");
        let sink = LocalSink::new(&dir);
        let mut writer = sink.open("docs.zip", None).await.unwrap();
        writer.write_all(b"PK").unwrap();
        writer.flush().unwrap();
        drop(writer);
        assert_eq!(std::fs::read(dir.join("docs.zip")).unwrap(), b"PK");
    }
}
