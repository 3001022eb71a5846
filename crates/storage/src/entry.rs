//! Directory entries as reported by the file store.

use serde::{Deserialize, Serialize};

/// One item in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub is_dir: bool,
    /// Size in bytes. Meaningless for directories.
    #[serde(default)]
    pub size: u64,
    /// Download signature, required by direct links on password-protected
    /// or signed paths. The store sends an empty string when there is none.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub sign: Option<String>,
}

impl Entry {
    pub fn file(name: impl Into<String>, size: u64) -> Self {
        Self { name: name.into(), is_dir: false, size, sign: None }
    }

    pub fn dir(name: impl Into<String>) -> Self {
        Self { name: name.into(), is_dir: true, size: 0, sign: None }
    }

    pub fn with_sign(mut self, sign: impl Into<String>) -> Self {
        self.sign = Some(sign.into());
        self
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let sign = Option::<String>::deserialize(deserializer)?;
    Ok(sign.filter(|s| !s.is_empty()))
}
