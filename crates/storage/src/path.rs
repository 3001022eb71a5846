//! Path helpers for remote file-store paths.
//!
//! Remote paths are always `/`-separated strings, independent of the local
//! platform, so these work on `str` rather than [`std::path::Path`].

use crate::error::{ErrorKind, Result};

/// Join path segments with `/`, collapsing runs of slashes.
///
/// Empty segments are kept as separators, so joining onto an empty prefix
/// yields an absolute path.
///
/// # Examples
///
/// ```
/// use parcel_storage::path::join;
/// assert_eq!(join(["/docs", "reports"]), "/docs/reports");
/// assert_eq!(join(["", "a.txt"]), "/a.txt");
/// assert_eq!(join(["/docs/", "/sub/", "a.txt"]), "/docs/sub/a.txt");
/// assert_eq!(join(["a", "b"]), "a/b");
/// ```
pub fn join<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    let mut joined = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            joined.push('/');
        }
        joined.push_str(segment);
    }
    collapse_slashes(&joined)
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Last segment of a path, ignoring trailing slashes. The root has none.
///
/// ```
/// use parcel_storage::path::base_name;
/// assert_eq!(base_name("/docs/reports"), "reports");
/// assert_eq!(base_name("/docs/reports/"), "reports");
/// assert_eq!(base_name("/"), "");
/// ```
pub fn base_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or_default()
}

/// Strip every leading and trailing slash.
pub fn trim_slashes(path: &str) -> &str {
    path.trim_matches('/')
}

/// Resolve `.` and `..` segments and produce an absolute path.
///
/// Fails with [`InvalidPath`](ErrorKind::InvalidPath) when the path climbs
/// above the root or contains a NUL byte. Unlike a file path, the root
/// itself (`/`, or an empty string) is valid: it's a directory that can be
/// listed.
///
/// ```
/// use parcel_storage::path::normalize;
/// assert_eq!(normalize("docs//./reports/../2024/").unwrap(), "/docs/2024");
/// assert_eq!(normalize("").unwrap(), "/");
/// assert!(normalize("/docs/../../etc").is_err());
/// ```
pub fn normalize(path: &str) -> Result<String> {
    if path.contains('\0') {
        exn::bail!(ErrorKind::InvalidPath(path.escape_default().to_string()));
    }
    let mut segments = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {},
            ".." => {
                if segments.pop().is_none() {
                    exn::bail!(ErrorKind::InvalidPath(path.to_string()));
                }
            },
            segment => segments.push(segment),
        }
    }
    Ok(format!("/{}", segments.join("/")))
}
