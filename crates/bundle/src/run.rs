use crate::Context;
use crate::error::{Error, ErrorKind, Result, raise_as};
use crate::naming::save_name;
use crate::producer::EntryProducer;
use crate::resolve::resolve_selection;
use async_stream::stream;
use futures::Stream;
use parcel_archive::ZipEncoder;
use parcel_storage::Entry;

/// Progress of a bulk download, emitted by [`run`].
///
/// Events follow a strict ordering:
/// 1. [`Initializing`](Self::Initializing) and
///    [`FetchingStructure`](Self::FetchingStructure), once each.
/// 2. [`StructureResolved`](Self::StructureResolved) once every selected
///    folder has been listed.
/// 3. [`Fetching`](Self::Fetching) then [`Fetched`](Self::Fetched) for each
///    file, in archive order.
/// 4. [`Success`](Self::Success), once the archive is complete.
///
/// A failure ends the stream with a single `Err` in place of the remaining
/// events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadEvent {
    Initializing,
    FetchingStructure,
    StructureResolved {
        files: usize,
        total_size: u64,
    },
    /// Download of the named archive entry has started.
    Fetching(String),
    /// The named entry has been written to the archive.
    Fetched {
        name: String,
        bytes: u64,
    },
    Success {
        /// File name the archive was saved as.
        archive: String,
        files: usize,
        bytes: u64,
    },
}

/// Coarse state for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Status {
    Initializing,
    FetchingStructure,
    /// Downloading, with the name of the current file.
    FetchingFiles(String),
    Success,
    Failed(String),
}

impl DownloadEvent {
    pub fn status(&self) -> Status {
        match self {
            DownloadEvent::Initializing => Status::Initializing,
            DownloadEvent::FetchingStructure | DownloadEvent::StructureResolved { .. } => Status::FetchingStructure,
            DownloadEvent::Fetching(name) | DownloadEvent::Fetched { name, .. } => Status::FetchingFiles(name.clone()),
            DownloadEvent::Success { .. } => Status::Success,
        }
    }
}

impl From<&Error> for Status {
    fn from(err: &Error) -> Self {
        Status::Failed((**err).to_string())
    }
}

/// Download `selection`, made in directory `dir`, into a single ZIP archive.
///
/// The selection is resolved to a flat file list first; if any folder can't
/// be listed, the run fails before the output sink is opened. The archive is
/// then opened as `"<save name>.zip"` with the total size as a hint, and
/// files are fetched and written one at a time, in order. A failure while
/// streaming leaves whatever was written so far in the sink. An empty
/// selection saves an empty archive.
///
/// Dropping the stream cancels the run, including any fetch in flight.
pub fn run<'a>(ctx: &'a Context, dir: &'a str, selection: &'a [Entry]) -> impl Stream<Item = Result<DownloadEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(DownloadEvent::Initializing);
        tracing::info!(%dir, items = selection.len(), "Fetching folder structure");
        yield Ok(DownloadEvent::FetchingStructure);
        let resolution = match resolve_selection(ctx, dir, selection).await {
            Ok(resolution) => resolution,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        let files = resolution.files.len();
        let total_size = resolution.total_size;
        yield Ok(DownloadEvent::StructureResolved { files, total_size });

        let save = save_name(selection, dir, &ctx.home_label);
        let archive = format!("{save}.zip");
        let output = match ctx.sink.open(&archive, Some(total_size)).await.map_err(raise_as(ErrorKind::Archive)) {
            Ok(output) => output,
            Err(e) => {
                yield Err(e);
                return;
            },
        };
        tracing::info!(%archive, files, total_size, "Streaming archive");

        let mut encoder = ZipEncoder::new(output, ctx.compression);
        let mut producer = EntryProducer::new(ctx, resolution.files, save, selection.len() == 1);
        let mut bytes = 0_u64;
        while let Some(name) = producer.upcoming() {
            yield Ok(DownloadEvent::Fetching(name));
            let entry = match producer.next().await {
                Some(Ok(entry)) => entry,
                Some(Err(e)) => {
                    yield Err(e);
                    return;
                },
                None => break,
            };
            let name = entry.name.clone();
            let written = match encoder.append(entry).await.map_err(raise_as(ErrorKind::Archive)) {
                Ok(written) => written,
                Err(e) => {
                    yield Err(e);
                    return;
                },
            };
            bytes = bytes.saturating_add(written);
            yield Ok(DownloadEvent::Fetched { name, bytes: written });
        }

        if let Err(e) = encoder.finish().await.map_err(raise_as(ErrorKind::Archive)) {
            yield Err(e);
            return;
        }
        tracing::info!(%archive, files, bytes, "Download complete");
        yield Ok(DownloadEvent::Success { archive, files, bytes });
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClient, context_with_sink};
    use futures::StreamExt;
    use parcel_archive::MemorySink;
    use parcel_fetch::RetryConfig;
    use parcel_storage::MockListing;
    use std::io::{Cursor, Read};
    use std::sync::Arc;
    use zip::ZipArchive;

    async fn collect(ctx: &Context, dir: &str, selection: &[Entry]) -> Vec<Result<DownloadEvent>> {
        run(ctx, dir, selection).collect().await
    }

    /// Everything up to the first error, and the error (if any).
    fn split(events: Vec<Result<DownloadEvent>>) -> (Vec<DownloadEvent>, Option<Error>) {
        let mut ok = Vec::new();
        for event in events {
            match event {
                Ok(event) => ok.push(event),
                Err(err) => return (ok, Some(err)),
            }
        }
        (ok, None)
    }

    fn entries(sink: &MemorySink) -> Vec<(String, String)> {
        let mut archive = ZipArchive::new(Cursor::new(sink.bytes())).unwrap();
        (0..archive.len())
            .map(|i| {
                let mut file = archive.by_index(i).unwrap();
                let mut contents = String::new();
                file.read_to_string(&mut contents).unwrap();
                (file.name().to_string(), contents)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_single_file() {
        let client = Arc::new(FakeClient::default().with_body("http://store/d/report.pdf", b"%PDF-1.7"));
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(MockListing::default()), client.clone(), sink.clone());

        let (events, err) = split(collect(&ctx, "/", &[Entry::file("report.pdf", 100)]).await);
        assert!(err.is_none());
        assert_eq!(events, [
            DownloadEvent::Initializing,
            DownloadEvent::FetchingStructure,
            DownloadEvent::StructureResolved { files: 1, total_size: 100 },
            DownloadEvent::Fetching("report.pdf".into()),
            DownloadEvent::Fetched { name: "report.pdf".into(), bytes: 8 },
            DownloadEvent::Success { archive: "report.pdf.zip".into(), files: 1, bytes: 8 },
        ]);
        assert_eq!(events.last().unwrap().status(), Status::Success);
        assert_eq!(sink.opened(), [("report.pdf.zip".to_string(), Some(100))]);
        assert_eq!(entries(&sink), [("report.pdf".to_string(), "%PDF-1.7".to_string())]);
    }

    #[tokio::test]
    async fn test_listing_failure_writes_nothing() {
        let listing = MockListing::default()
            .with_dir("/docs", [Entry::file("a.txt", 1), Entry::file("b.txt", 1)])
            .with_failure("/docs", "permission denied");
        let client = Arc::new(FakeClient::default());
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(listing), client.clone(), sink.clone());

        let (events, err) = split(collect(&ctx, "/", &[Entry::dir("docs")]).await);
        assert_eq!(events, [DownloadEvent::Initializing, DownloadEvent::FetchingStructure]);
        let err = err.unwrap();
        assert!((*err).to_string().contains("permission denied"));
        assert_eq!(Status::from(&err), Status::Failed("failed to fetch folder structure: permission denied".into()));
        assert_eq!(client.requests(), 0);
        assert!(sink.opened().is_empty());
        assert!(sink.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_single_folder_is_unwrapped() {
        let listing = MockListing::default()
            .with_dir("/projects/docs", [Entry::file("a.txt", 3), Entry::dir("sub")])
            .with_dir("/projects/docs/sub", [Entry::file("b.txt", 2)]);
        let client = Arc::new(
            FakeClient::default()
                .with_body("http://store/d/projects/docs/a.txt", b"aaa")
                .with_body("http://store/d/projects/docs/sub/b.txt", b"bb"),
        );
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(listing), client.clone(), sink.clone());

        let (events, err) = split(collect(&ctx, "/projects", &[Entry::dir("docs")]).await);
        assert!(err.is_none());
        assert_eq!(events[2..], [
            DownloadEvent::StructureResolved { files: 2, total_size: 5 },
            DownloadEvent::Fetching("a.txt".into()),
            DownloadEvent::Fetched { name: "a.txt".into(), bytes: 3 },
            DownloadEvent::Fetching("sub/b.txt".into()),
            DownloadEvent::Fetched { name: "sub/b.txt".into(), bytes: 2 },
            DownloadEvent::Success { archive: "docs.zip".into(), files: 2, bytes: 5 },
        ]);
        assert_eq!(sink.opened(), [("docs.zip".to_string(), Some(5))]);
        assert_eq!(entries(&sink), [
            ("a.txt".to_string(), "aaa".to_string()),
            ("sub/b.txt".to_string(), "bb".to_string()),
        ]);
        assert_eq!(client.log(), [
            "start http://store/d/projects/docs/a.txt",
            "end http://store/d/projects/docs/a.txt",
            "start http://store/d/projects/docs/sub/b.txt",
            "end http://store/d/projects/docs/sub/b.txt",
        ]);
    }

    #[tokio::test]
    async fn test_several_items_at_root() {
        let listing = MockListing::default().with_dir("/d", [Entry::file("y", 1)]);
        let client = Arc::new(FakeClient::default().with_body("http://store/d/x", b"x").with_body("http://store/d/d/y", b"y"));
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(listing), client, sink.clone()).with_home_label("home");

        let (events, err) = split(collect(&ctx, "/", &[Entry::file("x", 1), Entry::dir("d")]).await);
        assert!(err.is_none());
        assert_eq!(events.last(), Some(&DownloadEvent::Success { archive: "home.zip".into(), files: 2, bytes: 2 }));
        assert_eq!(entries(&sink), [("x".to_string(), "x".to_string()), ("d/y".to_string(), "y".to_string())]);
    }

    #[tokio::test]
    async fn test_fetch_exhaustion_mid_stream() {
        let listing = MockListing::default().with_dir("/docs", [Entry::file("a", 1), Entry::file("b", 1), Entry::file("c", 1)]);
        let client = Arc::new(
            FakeClient::default()
                .with_body("http://store/d/docs/a", b"a")
                .with_status("http://store/d/docs/b", 500)
                .with_body("http://store/d/docs/c", b"c"),
        );
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(listing), client.clone(), sink.clone())
            .with_retry(RetryConfig { retries: 1, ..RetryConfig::default() });

        let (events, err) = split(collect(&ctx, "/", &[Entry::dir("docs")]).await);
        assert_eq!(events[3..], [
            DownloadEvent::Fetching("a".into()),
            DownloadEvent::Fetched { name: "a".into(), bytes: 1 },
            DownloadEvent::Fetching("b".into()),
        ]);
        let err = err.unwrap();
        assert_eq!(*err, ErrorKind::Fetch("b: HTTP 500 Nope".into()));
        assert!(err.is_retryable());
        // One attempt for `a`, two for `b`, none for `c`.
        assert_eq!(client.requests(), 3);
        assert!(!sink.bytes().is_empty());
    }

    #[tokio::test]
    async fn test_sink_failure() {
        let client = Arc::new(FakeClient::default().with_body("http://store/d/big.bin", &[0; 64]));
        let sink = MemorySink::with_limit(16);
        let ctx = context_with_sink(Arc::new(MockListing::default()), client, sink);

        let (events, err) = split(collect(&ctx, "/", &[Entry::file("big.bin", 64)]).await);
        assert!(!events.iter().any(|event| matches!(event, DownloadEvent::Success { .. })));
        assert!(matches!(&*err.unwrap(), ErrorKind::Archive(_)));
    }

    #[tokio::test]
    async fn test_empty_selection_saves_empty_archive() {
        let client = Arc::new(FakeClient::default());
        let sink = MemorySink::default();
        let ctx = context_with_sink(Arc::new(MockListing::default()), client.clone(), sink.clone());

        let (events, err) = split(collect(&ctx, "/projects", &[]).await);
        assert!(err.is_none());
        assert_eq!(events, [
            DownloadEvent::Initializing,
            DownloadEvent::FetchingStructure,
            DownloadEvent::StructureResolved { files: 0, total_size: 0 },
            DownloadEvent::Success { archive: "projects.zip".into(), files: 0, bytes: 0 },
        ]);
        assert_eq!(sink.opened(), [("projects.zip".to_string(), Some(0))]);
        assert!(entries(&sink).is_empty());
        assert_eq!(client.requests(), 0);
    }

    #[tokio::test]
    async fn test_stream_ends_after_error() {
        let listing = MockListing::default().with_failure("/a", "nope");
        let ctx = context_with_sink(Arc::new(listing), Arc::default(), MemorySink::default());
        let events = collect(&ctx, "/", &[Entry::dir("a"), Entry::file("b", 1)]).await;
        assert_eq!(events.len(), 3);
        assert!(events[2].is_err());
    }

    #[test]
    fn test_status() {
        assert_eq!(DownloadEvent::Initializing.status(), Status::Initializing);
        assert_eq!(
            DownloadEvent::StructureResolved { files: 0, total_size: 0 }.status(),
            Status::FetchingStructure
        );
        assert_eq!(DownloadEvent::Fetching("a.txt".into()).status(), Status::FetchingFiles("a.txt".into()));
        assert_eq!(
            DownloadEvent::Fetched { name: "a.txt".into(), bytes: 1 }.status(),
            Status::FetchingFiles("a.txt".into())
        );
    }
}
