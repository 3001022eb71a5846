use crate::Context;
use crate::error::{ErrorKind, Result, raise_as};
use futures::FutureExt;
use futures::future::BoxFuture;
use parcel_storage::Entry;
use parcel_storage::path::join;

/// One file to download, in archive order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Path relative to the directory the selection was made in, with a
    /// leading slash (`/docs/a.txt`).
    pub path: String,
    /// Where to fetch the file's bytes from.
    pub url: String,
    /// Size reported by the listing.
    pub size: u64,
}

/// Every file a selection expands to, and their combined size.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolution {
    pub files: Vec<ResolvedFile>,
    pub total_size: u64,
}

impl Resolution {
    fn push(&mut self, file: ResolvedFile) {
        self.total_size = self.total_size.saturating_add(file.size);
        self.files.push(file);
    }
}

/// Expand `selection`, made in directory `dir`, into a flat list of files.
///
/// Files are taken as they are. Directories are listed (with the session
/// password) and their children resolved the same way, depth-first and in
/// listing order. The first listing that fails stops everything: no more
/// directories are listed and no partial result is returned. The error
/// carries the store's message verbatim.
pub async fn resolve_selection(ctx: &Context, dir: &str, selection: &[Entry]) -> Result<Resolution> {
    let mut resolution = Resolution::default();
    for entry in selection {
        resolve_entry(ctx, dir, "", entry, &mut resolution).await?;
    }
    tracing::info!(files = resolution.files.len(), total_size = resolution.total_size, "Folder structure resolved");
    Ok(resolution)
}

fn resolve_entry<'a>(
    ctx: &'a Context,
    dir: &'a str,
    prefix: &'a str,
    entry: &'a Entry,
    resolution: &'a mut Resolution,
) -> BoxFuture<'a, Result<()>> {
    async move {
        if !entry.is_dir {
            resolution.push(ResolvedFile {
                path: join([prefix, entry.name.as_str()]),
                url: ctx.links.link(&join([dir, prefix]), entry),
                size: entry.size,
            });
            return Ok(());
        }

        let path = join([dir, prefix, entry.name.as_str()]);
        tracing::debug!(%path, "Listing directory");
        let children = ctx.listing.list(&path, ctx.password.as_deref()).await.map_err(raise_as(ErrorKind::Resolve))?;
        let prefix = join([prefix, entry.name.as_str()]);
        for child in &children {
            resolve_entry(ctx, dir, &prefix, child, resolution).await?;
        }
        Ok(())
    }
    .boxed()
}
