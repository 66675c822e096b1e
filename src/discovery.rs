use crate::constants::{ANALYZE_EXTENSIONS, COMPRESS_EXTENSIONS};
use crate::error::Result;
use crate::naming::is_compressed_artifact;
use crate::validation::validate_directory;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

/// One unit of work: a source image to be processed exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkItem {
    pub source_path: PathBuf,
}

impl WorkItem {
    pub fn new(source_path: impl Into<PathBuf>) -> Self {
        Self {
            source_path: source_path.into(),
        }
    }
}

/// Recursively collects source images below a root directory.
#[derive(Debug, Clone, Copy)]
pub struct FileEnumerator {
    extensions: &'static [&'static str],
}

impl FileEnumerator {
    pub fn new(extensions: &'static [&'static str]) -> Self {
        Self { extensions }
    }

    pub fn for_compress() -> Self {
        Self::new(COMPRESS_EXTENSIONS)
    }

    pub fn for_analyze() -> Self {
        Self::new(ANALYZE_EXTENSIONS)
    }

    /// Extension is in the allow-list (case-insensitive) and the name has no `_min.` marker.
    pub fn is_candidate(&self, path: &Path) -> bool {
        has_extension(path, self.extensions) && !is_compressed_artifact(path)
    }

    /// Returns matching files in traversal order. The order is not stable
    /// across platforms.
    pub fn enumerate(&self, root: &Path) -> Result<Vec<WorkItem>> {
        validate_directory(root)?;

        Ok(walk_files(root)
            .filter(|path| self.is_candidate(path))
            .map(WorkItem::new)
            .collect())
    }
}

/// Every `*_min.<ext>` file below `root` whose extension is a compress target.
pub fn find_compressed_siblings(root: &Path) -> Result<Vec<PathBuf>> {
    validate_directory(root)?;

    Ok(walk_files(root)
        .filter(|path| has_extension(path, COMPRESS_EXTENSIONS) && is_compressed_artifact(path))
        .collect())
}

fn walk_files(root: &Path) -> impl Iterator<Item = PathBuf> {
    WalkDir::new(root).into_iter().filter_map(|entry| match entry {
        Ok(entry) if entry.file_type().is_file() => Some(entry.into_path()),
        Ok(_) => None,
        Err(e) => {
            warn!("Skipping unreadable entry: {}", e);
            None
        }
    })
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| {
            let ext_lower = ext.to_lowercase();
            extensions.contains(&ext_lower.as_str())
        })
        .unwrap_or(false)
}
