//! Sibling naming rules shared by the compress and replace pipelines.
//!
//! For a source `name.ext` the compressed artifact is always `name_min.ext` in
//! the same directory, and the backup used while replacing is `name.ext.backup`.

use crate::constants::{BACKUP_SUFFIX, MIN_MARKER};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Returns `true` if the file name carries the compressed marker (`_min.`).
pub fn is_compressed_artifact(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().contains(&marker_with_dot()))
        .unwrap_or(false)
}

/// `dir/name.ext` -> `dir/name_min.ext`. Files without an extension get a bare `_min` suffix.
pub fn compressed_sibling(source: &Path) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let file_name = match source.extension() {
        Some(ext) => format!("{}{}.{}", stem, MIN_MARKER, ext.to_string_lossy()),
        None => format!("{}{}", stem, MIN_MARKER),
    };
    source.with_file_name(file_name)
}

/// Inverse of [`compressed_sibling`]: strips the last `_min` that precedes a dot.
pub fn original_for(compressed: &Path) -> Option<PathBuf> {
    let name = compressed.file_name()?.to_string_lossy().into_owned();
    let idx = name.rfind(&marker_with_dot())?;

    let mut original = String::with_capacity(name.len() - MIN_MARKER.len());
    original.push_str(&name[..idx]);
    original.push_str(&name[idx + MIN_MARKER.len()..]);
    Some(compressed.with_file_name(original))
}

/// `dir/name.ext` -> `dir/name.ext.backup`
pub fn backup_path(original: &Path) -> PathBuf {
    let mut os: OsString = original.as_os_str().to_owned();
    os.push(BACKUP_SUFFIX);
    PathBuf::from(os)
}

fn marker_with_dot() -> String {
    format!("{}.", MIN_MARKER)
}
