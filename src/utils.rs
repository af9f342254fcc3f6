use std::path::{Path, PathBuf};

/// append `suffix` to the final component of `path` without interpreting dots as extensions
pub(crate) fn append_to_path(path: &Path, suffix: &str) -> PathBuf {
    let mut raw = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// the final component of `path` as a string, for references between files in one directory
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
