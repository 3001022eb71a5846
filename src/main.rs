use clap::Parser;
use derive_more::{Display, Error};
use exn::ResultExt;
use futures::StreamExt;
use parcel_archive::LocalSink;
use parcel_bundle::{Context, DownloadEvent, run};
use parcel_config::Config;
use parcel_fetch::ThrottledClient;
use parcel_storage::{DirectLinks, Entry, HttpListing, Listing};
use parcel_throttle::Throttle;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "PARCEL_LOG";

/// Download remote files and folders into a single ZIP archive.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Remote directory to download from.
    #[arg(long, default_value = "/")]
    path: String,
    /// Name of an item in `--path` to include. Repeatable; everything in
    /// the directory is included when omitted.
    #[arg(long = "select", value_name = "NAME")]
    select: Vec<String>,
    /// Local directory the archive is saved into.
    #[arg(long, default_value = ".")]
    out: PathBuf,
    /// Configuration file, instead of the one in the platform config directory.
    #[arg(long)]
    config: Option<PathBuf>,
}

type Error = exn::Exn<ErrorKind>;

#[derive(Debug, Display, Error)]
enum ErrorKind {
    #[display("could not load configuration")]
    Config,
    #[display("could not create HTTP client")]
    Client,
    #[display("could not list {_0}")]
    List(#[error(not(source))] String),
    #[display("not found in {dir}: {names}")]
    NotFound { dir: String, names: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Args::parse();
    match download(args).await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("error: {err:?}");
            ExitCode::FAILURE
        },
    }
}

/// Set up the download and report its progress. `Ok(false)` is a download
/// that ran and failed.
async fn download(args: Args) -> Result<bool, Error> {
    let config = Config::load(args.config.as_deref()).or_raise(|| ErrorKind::Config)?;
    let throttle = Arc::new(Throttle::with_limits(config.rate_limits()));
    let mut client = ThrottledClient::new(throttle).or_raise(|| ErrorKind::Client)?;
    if let Some(token) = &config.api.token {
        client = client.with_token(token);
    }

    let listing = HttpListing::new(client.clone(), &config.api.base_url);
    let entries = listing
        .list(&args.path, config.api.password.as_deref())
        .await
        .or_raise(|| ErrorKind::List(args.path.clone()))?;
    let selection = select(entries, &args.select).map_err(|names| ErrorKind::NotFound {
        dir: args.path.clone(),
        names: names.join(", "),
    })?;

    let ctx = Context::new(
        Arc::new(listing),
        Arc::new(DirectLinks::new(config.api.base_url.as_str())),
        Arc::new(client),
        Arc::new(LocalSink::new(&args.out)),
    )
    .with_retry(config.retry_config())
    .with_password(config.api.password.clone())
    .with_compression(config.archive.compression)
    .with_home_label(config.archive.home_label.as_str());

    let mut events = std::pin::pin!(run(&ctx, &args.path, &selection));
    while let Some(event) = events.next().await {
        match event {
            Ok(DownloadEvent::Initializing) => {},
            Ok(DownloadEvent::FetchingStructure) => println!("Fetching folder structure..."),
            Ok(DownloadEvent::StructureResolved { files, total_size }) => {
                println!("Found {files} file(s), {total_size} bytes");
            },
            Ok(DownloadEvent::Fetching(name)) => println!("Fetching: {name}"),
            Ok(DownloadEvent::Fetched { .. }) => {},
            Ok(DownloadEvent::Success { archive, files, bytes }) => {
                println!("Saved {} ({files} file(s), {bytes} bytes)", args.out.join(archive).display());
            },
            Err(err) => {
                eprintln!("Download failed: {}", *err);
                tracing::debug!(error = ?err, "Download failed");
                return Ok(false);
            },
        }
    }
    Ok(true)
}

/// Entries named in `names`, in listing order; every entry if `names` is
/// empty. Names with no matching entry are returned as the error.
fn select(entries: Vec<Entry>, names: &[String]) -> Result<Vec<Entry>, Vec<String>> {
    if names.is_empty() {
        return Ok(entries);
    }
    let missing: Vec<String> =
        names.iter().filter(|name| !entries.iter().any(|entry| &entry.name == *name)).cloned().collect();
    if !missing.is_empty() {
        return Err(missing);
    }
    Ok(entries.into_iter().filter(|entry| names.contains(&entry.name)).collect())
}
