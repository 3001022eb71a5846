use crate::Context;
use crate::error::{ErrorKind, Result, raise_as};
use crate::naming::archive_name;
use crate::resolve::ResolvedFile;
use parcel_archive::ArchiveEntry;
use parcel_fetch::{ClientHandle, RetryConfig, fetch_with_retry};
use std::collections::VecDeque;

/// Turns resolved files into archive entries, one fetch per pull.
///
/// Nothing is fetched ahead: each call to [`next`](Self::next) downloads
/// exactly one file and returns its body unread, so the archive encoder
/// decides how fast bytes move. Once a fetch fails, or every file has been
/// handed out, the producer is spent and only returns `None`.
pub struct EntryProducer {
    client: ClientHandle,
    retry: RetryConfig,
    save_name: String,
    single: bool,
    queue: VecDeque<ResolvedFile>,
}

impl EntryProducer {
    /// `single` is whether the selection was exactly one item, in which case
    /// `"<save_name>/"` is stripped from the front of entry names.
    pub fn new(ctx: &Context, files: Vec<ResolvedFile>, save_name: impl Into<String>, single: bool) -> Self {
        Self {
            client: ctx.client.clone(),
            retry: ctx.retry,
            save_name: save_name.into(),
            single,
            queue: files.into(),
        }
    }

    /// Archive name of the entry the next pull will produce.
    pub fn upcoming(&self) -> Option<String> {
        self.queue.front().map(|file| archive_name(&file.path, &self.save_name, self.single))
    }

    /// Files not yet handed out.
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    pub async fn next(&mut self) -> Option<Result<ArchiveEntry>> {
        let file = self.queue.pop_front()?;
        let name = archive_name(&file.path, &self.save_name, self.single);
        tracing::debug!(%name, url = %file.url, "Fetching file");
        match fetch_with_retry(self.client.as_ref(), &file.url, &self.retry, Some(name.as_str())).await {
            Ok(stream) => Some(Ok(ArchiveEntry::new(name, stream).with_size(file.size))),
            Err(err) => {
                self.queue.clear();
                Some(Err(raise_as(ErrorKind::Fetch)(err)))
            },
        }
    }
}
