use parcel_storage::Entry;
use parcel_storage::path::{base_name, trim_slashes};

/// Name for the archive (without extension) and for the folder stripped
/// from entry names.
///
/// A single selected item names the archive after itself. Several items are
/// named after the directory they were selected in, unless that is the root,
/// in which case `fallback` is used.
///
/// # Examples
///
/// ```
/// use parcel_bundle::save_name;
/// use parcel_storage::Entry;
///
/// assert_eq!(save_name(&[Entry::dir("docs")], "/projects", "root"), "docs");
/// assert_eq!(save_name(&[Entry::file("a", 1), Entry::file("b", 1)], "/projects", "root"), "projects");
/// assert_eq!(save_name(&[Entry::file("a", 1), Entry::file("b", 1)], "/", "root"), "root");
/// ```
pub fn save_name(selection: &[Entry], dir: &str, fallback: &str) -> String {
    let name = match selection {
        [only] => only.name.as_str(),
        _ => base_name(dir),
    };
    match name.is_empty() {
        true => fallback.to_string(),
        false => name.to_string(),
    }
}

/// Archive-relative name of a resolved file.
///
/// Leading and trailing slashes are removed. When the selection was a single
/// item, its own `"<save_name>/"` prefix is stripped too, so a downloaded
/// folder's contents sit at the top of the archive rather than one level
/// down. Only a leading prefix is stripped.
pub fn archive_name(path: &str, save_name: &str, single: bool) -> String {
    let name = trim_slashes(path);
    if single
        && let Some(inner) = name.strip_prefix(save_name).and_then(|rest| rest.strip_prefix('/'))
    {
        return inner.to_string();
    }
    name.to_string()
}
