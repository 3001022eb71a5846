//! Layered configuration for parcel.
//!
//! Sources, lowest priority first:
//!
//! 1. built-in defaults;
//! 2. a config file: either the one given explicitly, or the first of
//!    `config.toml`, `config.yaml`, `config.yml`, `config.json` found in the
//!    platform config directory (e.g. `~/.config/parcel/` on Linux);
//! 3. environment variables prefixed `PARCEL_`, with `__` separating
//!    sections from keys (`PARCEL_RETRY__SLEEP_MS=500`).
//!
//! ```toml
//! [api]
//! base_url = "https://files.example.com"
//! password = "hunter2"
//!
//! [retry]
//! retries = 5
//! sleep_ms = 1000
//! exponential = true
//!
//! [limits]
//! download = 2
//! list = 5
//!
//! [archive]
//! compression = "deflated"
//! ```

pub mod error;
mod lenient;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::ResultExt;
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use parcel_archive::Compression;
use parcel_fetch::RetryConfig;
use parcel_throttle::RateLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_PREFIX: &str = "PARCEL_";
const CONFIG_FILES: [&str; 4] = ["config.toml", "config.yaml", "config.yml", "config.json"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiConfig,
    pub retry: RetrySettings,
    pub limits: LimitSettings,
    pub archive: ArchiveSettings,
}

/// Where the file store lives and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as the `Authorization` header.
    #[serde(deserialize_with = "lenient::text")]
    pub token: Option<String>,
    /// Password for protected directories.
    #[serde(deserialize_with = "lenient::text")]
    pub password: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5244".to_string(),
            token: None,
            password: None,
        }
    }
}

/// How hard to try before giving up on a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Extra attempts after the first one.
    #[serde(deserialize_with = "lenient::retries")]
    pub retries: u32,
    /// Wait before retrying. Zero retries immediately.
    #[serde(deserialize_with = "lenient::sleep_ms")]
    pub sleep_ms: u64,
    /// Double the wait after each failed attempt.
    #[serde(deserialize_with = "lenient::flag")]
    pub exponential: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            retries: lenient::DEFAULT_RETRIES,
            sleep_ms: lenient::DEFAULT_SLEEP_MS,
            exponential: false,
        }
    }
}

/// Requests per second per request category. Zero is unlimited.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    #[serde(deserialize_with = "lenient::rate_limit")]
    pub download: u32,
    #[serde(deserialize_with = "lenient::rate_limit")]
    pub list: u32,
    #[serde(deserialize_with = "lenient::rate_limit")]
    pub search: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    pub compression: Compression,
    /// Archive name used when there's nothing better to name it after
    /// (downloading everything at the root).
    pub home_label: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            home_label: "root".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from every source.
    ///
    /// With `path`, that file must exist and replaces the search of the
    /// platform config directory.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let figment = Self::figment(path)?;
        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(
            base_url = %config.api.base_url,
            retries = config.retry.retries,
            sleep_ms = config.retry.sleep_ms,
            exponential = config.retry.exponential,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// The layered sources, without extracting them.
    pub fn figment(path: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        match path {
            Some(path) => {
                if !path.is_file() {
                    exn::bail!(ErrorKind::Invalid(format!("config file not found: {}", path.display())));
                }
                figment = merge_file(figment, path)?;
            },
            None => {
                if let Some(path) = Self::default_file() {
                    tracing::debug!(path = %path.display(), "Using config file");
                    figment = merge_file(figment, &path)?;
                }
            },
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// First config file present in the platform config directory.
    pub fn default_file() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("", "", "parcel")?;
        CONFIG_FILES.iter().map(|name| dirs.config_dir().join(name)).find(|path| path.is_file())
    }

    fn validate(&self) -> Result<()> {
        let base_url = self.api.base_url.trim();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            exn::bail!(ErrorKind::Invalid(format!("api.base_url must be an http(s) URL, got `{base_url}`")));
        }
        if self.archive.home_label.trim().is_empty() {
            exn::bail!(ErrorKind::Invalid("archive.home_label must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            retries: self.retry.retries,
            sleep: Duration::from_millis(self.retry.sleep_ms),
            exponential: self.retry.exponential,
        }
    }

    pub fn rate_limits(&self) -> RateLimits {
        RateLimits {
            download: self.limits.download,
            list: self.limits.list,
            search: self.limits.search,
        }
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::Invalid(format!("unsupported config format: {}", path.display()))),
    })
}
