//! Swaps compressed `_min` artifacts into their original file names.
//!
//! Every swap walks `Intact -> BackedUp -> Swapped -> Cleaned`:
//!
//! 1. rename `original` to `original.backup`
//! 2. rename `name_min.ext` to `original`
//! 3. delete `original.backup`
//!
//! If step 2 fails the backup is renamed back, returning to `Intact`. Between
//! steps 1 and 2 the original name does not resolve to any file; that window
//! cannot be closed without an atomic multi-rename. A process killed inside a
//! swap can leave `original.backup` behind, which must be restored by hand.

use crate::constants::{ERROR_PREFIX, SUCCESS_PREFIX, WARNING_PREFIX};
use crate::discovery::find_compressed_siblings;
use crate::error::{CompressionError, Result};
use crate::naming::{backup_path, original_for};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

/// Filesystem mutations used by a swap.
pub trait FileOps {
    fn exists(&self, path: &Path) -> bool;
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;
    fn remove_file(&self, path: &Path) -> io::Result<()>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StdFileOps;

impl FileOps for StdFileOps {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapState {
    /// Original in place, compressed file beside it.
    Intact,
    /// Original moved to the backup path.
    BackedUp,
    /// Compressed file now holds the original name.
    Swapped,
    /// Backup removed.
    Cleaned,
}

impl fmt::Display for SwapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SwapState::Intact => "intact",
            SwapState::BackedUp => "backed-up",
            SwapState::Swapped => "swapped",
            SwapState::Cleaned => "cleaned",
        };
        write!(f, "{}", name)
    }
}

/// Final state of a swap, or the state it stopped in and why.
pub type SwapOutcome = std::result::Result<SwapState, (SwapState, CompressionError)>;

/// One compressed/original/backup triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplaceOp {
    pub compressed: PathBuf,
    pub original: PathBuf,
    pub backup: PathBuf,
}

impl ReplaceOp {
    /// `None` when `compressed` does not carry the `_min` marker.
    pub fn for_compressed(compressed: &Path) -> Option<Self> {
        let original = original_for(compressed)?;
        let backup = backup_path(&original);
        Some(Self {
            compressed: compressed.to_path_buf(),
            original,
            backup,
        })
    }

    /// Runs the swap. On error the returned state is where the files were left.
    pub fn execute<F: FileOps + ?Sized>(&self, ops: &F) -> SwapOutcome {
        let mut state = SwapState::Intact;

        if ops.exists(&self.backup) {
            return Err((state, CompressionError::StaleBackup(self.backup.clone())));
        }

        self.log_transition(state, SwapState::BackedUp);
        if let Err(source) = ops.rename(&self.original, &self.backup) {
            return Err((
                state,
                CompressionError::BackupFailed {
                    original: self.original.clone(),
                    source,
                },
            ));
        }
        state = SwapState::BackedUp;

        self.log_transition(state, SwapState::Swapped);
        if let Err(source) = ops.rename(&self.compressed, &self.original) {
            let (state, restored) = self.recover(ops, state);
            return Err((
                state,
                CompressionError::SwapFailed {
                    original: self.original.clone(),
                    restored,
                    source,
                },
            ));
        }
        state = SwapState::Swapped;

        self.log_transition(state, SwapState::Cleaned);
        if let Err(e) = ops.remove_file(&self.backup) {
            warn!(
                "{}  Replaced {:?} but could not remove backup {:?}: {}",
                WARNING_PREFIX, self.original, self.backup, e
            );
            return Ok(state);
        }

        Ok(SwapState::Cleaned)
    }

    fn recover<F: FileOps + ?Sized>(&self, ops: &F, state: SwapState) -> (SwapState, bool) {
        self.log_transition(state, SwapState::Intact);
        match ops.rename(&self.backup, &self.original) {
            Ok(()) => (SwapState::Intact, true),
            Err(e) => {
                error!(
                    "{} Could not restore {:?} from {:?}: {}. Restore it manually.",
                    ERROR_PREFIX, self.original, self.backup, e
                );
                (state, false)
            }
        }
    }

    fn log_transition(&self, from: SwapState, to: SwapState) {
        debug!("{:?}: {} -> {}", self.original, from, to);
    }
}

/// Per-file failure from a replace run.
#[derive(Debug)]
pub struct ReplaceFailure {
    pub original: PathBuf,
    pub state: SwapState,
    pub error: CompressionError,
}

#[derive(Debug, Default)]
pub struct ReplaceSummary {
    pub replaced: usize,
    /// `_min` files with no original beside them.
    pub orphans: usize,
    pub failures: Vec<ReplaceFailure>,
}

/// Replaces every original below `root` that has a `_min` sibling.
pub fn replace_with_compressed(root: &Path) -> Result<ReplaceSummary> {
    replace_with_compressed_using(root, &StdFileOps)
}

pub fn replace_with_compressed_using<F: FileOps + ?Sized>(
    root: &Path,
    ops: &F,
) -> Result<ReplaceSummary> {
    info!("🔁 Replacing originals with compressed files in {:?}", root);
    let mut summary = ReplaceSummary::default();

    for compressed in find_compressed_siblings(root)? {
        let Some(op) = ReplaceOp::for_compressed(&compressed) else {
            continue;
        };

        if !ops.exists(&op.original) {
            debug!("No original for {:?}, leaving it in place", op.compressed);
            summary.orphans += 1;
            continue;
        }

        match op.execute(ops) {
            Ok(_) => {
                info!("{} Replaced {:?}", SUCCESS_PREFIX, op.original);
                summary.replaced += 1;
            }
            Err((state, error)) => {
                error!(
                    "{} Failed to replace {:?} (left {}): {}",
                    ERROR_PREFIX, op.original, state, error
                );
                summary.failures.push(ReplaceFailure {
                    original: op.original,
                    state,
                    error,
                });
            }
        }
    }

    if summary.replaced > 0 {
        info!("Replacement complete: {} files replaced", summary.replaced);
    } else {
        info!("No files to replace");
    }
    if summary.orphans > 0 {
        info!("{} compressed files had no original", summary.orphans);
    }
    if !summary.failures.is_empty() {
        warn!(
            "{}  {} files could not be replaced",
            WARNING_PREFIX,
            summary.failures.len()
        );
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::cell::RefCell;
    use tempfile::TempDir;

    /// Real filesystem, but renames whose source matches `fail_from` are refused.
    struct FlakyOps {
        fail_from: Vec<PathBuf>,
        fail_remove: bool,
        calls: RefCell<Vec<String>>,
    }

    impl FlakyOps {
        fn failing_renames(fail_from: Vec<PathBuf>) -> Self {
            Self {
                fail_from,
                fail_remove: false,
                calls: RefCell::new(Vec::new()),
            }
        }
    }

    impl FileOps for FlakyOps {
        fn exists(&self, path: &Path) -> bool {
            path.exists()
        }

        fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
            self.calls
                .borrow_mut()
                .push(format!("rename {} -> {}", name(from), name(to)));
            if self.fail_from.iter().any(|p| p == from) {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "simulated"));
            }
            fs::rename(from, to)
        }

        fn remove_file(&self, path: &Path) -> io::Result<()> {
            self.calls.borrow_mut().push(format!("remove {}", name(path)));
            if self.fail_remove {
                return Err(io::Error::new(io::ErrorKind::PermissionDenied, "simulated"));
            }
            fs::remove_file(path)
        }
    }

    fn name(path: &Path) -> String {
        path.file_name().unwrap().to_string_lossy().into_owned()
    }

    fn setup_pair(dir: &Path, stem: &str) -> (PathBuf, PathBuf) {
        let original = dir.join(format!("{}.jpg", stem));
        let compressed = dir.join(format!("{}_min.jpg", stem));
        fs::write(&original, format!("original {}", stem)).unwrap();
        fs::write(&compressed, format!("compressed {}", stem)).unwrap();
        (original, compressed)
    }

    #[test]
    fn test_replace_op_paths() {
        let op = ReplaceOp::for_compressed(Path::new("/x/photo_min.jpg")).unwrap();
        assert_eq!(op.original, PathBuf::from("/x/photo.jpg"));
        assert_eq!(op.backup, PathBuf::from("/x/photo.jpg.backup"));
        assert!(ReplaceOp::for_compressed(Path::new("/x/photo.jpg")).is_none());
    }

    #[test]
    fn test_swap_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let (original, compressed) = setup_pair(temp_dir.path(), "photo");

        let summary = replace_with_compressed(temp_dir.path()).unwrap();

        assert_eq!(summary.replaced, 1);
        assert!(summary.failures.is_empty());
        assert_eq!(fs::read_to_string(&original).unwrap(), "compressed photo");
        assert!(!compressed.exists());
        assert!(!backup_path(&original).exists());
    }

    #[test]
    fn test_swap_state_sequence() {
        let temp_dir = TempDir::new().unwrap();
        let (_, compressed) = setup_pair(temp_dir.path(), "photo");
        let ops = FlakyOps::failing_renames(Vec::new());

        let op = ReplaceOp::for_compressed(&compressed).unwrap();
        assert_eq!(op.execute(&ops).unwrap(), SwapState::Cleaned);
        assert_eq!(
            *ops.calls.borrow(),
            vec![
                "rename photo.jpg -> photo.jpg.backup".to_string(),
                "rename photo_min.jpg -> photo.jpg".to_string(),
                "remove photo.jpg.backup".to_string(),
            ]
        );
    }

    #[test]
    fn test_swap_failure_rolls_back() {
        let temp_dir = TempDir::new().unwrap();
        let (original, compressed) = setup_pair(temp_dir.path(), "photo");
        let (other_original, other_compressed) = setup_pair(temp_dir.path(), "other");
        let ops = FlakyOps::failing_renames(vec![compressed.clone()]);

        let summary = replace_with_compressed_using(temp_dir.path(), &ops).unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(summary.failures.len(), 1);
        let failure = &summary.failures[0];
        assert_eq!(failure.original, original);
        assert_eq!(failure.state, SwapState::Intact);
        assert_eq!(failure.error.kind(), ErrorKind::Swap);

        assert_eq!(fs::read_to_string(&original).unwrap(), "original photo");
        assert!(compressed.exists());
        assert!(!backup_path(&original).exists());

        assert_eq!(fs::read_to_string(&other_original).unwrap(), "compressed other");
        assert!(!other_compressed.exists());
    }

    #[test]
    fn test_backup_failure_changes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let (original, compressed) = setup_pair(temp_dir.path(), "photo");
        let ops = FlakyOps::failing_renames(vec![original.clone()]);

        let op = ReplaceOp::for_compressed(&compressed).unwrap();
        let (state, error) = op.execute(&ops).unwrap_err();

        assert_eq!(state, SwapState::Intact);
        assert!(matches!(error, CompressionError::BackupFailed { .. }));
        assert_eq!(fs::read_to_string(&original).unwrap(), "original photo");
        assert_eq!(fs::read_to_string(&compressed).unwrap(), "compressed photo");
    }

    #[test]
    fn test_cleanup_failure_keeps_replacement() {
        let temp_dir = TempDir::new().unwrap();
        let (original, compressed) = setup_pair(temp_dir.path(), "photo");
        let ops = FlakyOps {
            fail_from: Vec::new(),
            fail_remove: true,
            calls: RefCell::new(Vec::new()),
        };

        let op = ReplaceOp::for_compressed(&compressed).unwrap();
        assert_eq!(op.execute(&ops).unwrap(), SwapState::Swapped);
        assert_eq!(fs::read_to_string(&original).unwrap(), "compressed photo");
        assert_eq!(
            fs::read_to_string(backup_path(&original)).unwrap(),
            "original photo"
        );
    }

    #[test]
    fn test_stale_backup_is_not_clobbered() {
        let temp_dir = TempDir::new().unwrap();
        let (original, compressed) = setup_pair(temp_dir.path(), "photo");
        fs::write(backup_path(&original), "older backup").unwrap();

        let summary = replace_with_compressed(temp_dir.path()).unwrap();

        assert_eq!(summary.replaced, 0);
        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(
            summary.failures[0].error,
            CompressionError::StaleBackup(_)
        ));
        assert_eq!(fs::read_to_string(&original).unwrap(), "original photo");
        assert_eq!(
            fs::read_to_string(backup_path(&original)).unwrap(),
            "older backup"
        );
        assert!(compressed.exists());
    }

    #[test]
    fn test_orphan_compressed_file_is_skipped() {
        let temp_dir = TempDir::new().unwrap();
        let orphan = temp_dir.path().join("lonely_min.png");
        fs::write(&orphan, b"compressed").unwrap();

        let summary = replace_with_compressed(temp_dir.path()).unwrap();

        assert_eq!(summary.replaced, 0);
        assert_eq!(summary.orphans, 1);
        assert!(summary.failures.is_empty());
        assert!(orphan.exists());
    }

    #[test]
    fn test_replace_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        let (original, compressed) = setup_pair(&nested, "deep");

        let summary = replace_with_compressed(temp_dir.path()).unwrap();

        assert_eq!(summary.replaced, 1);
        assert_eq!(fs::read_to_string(&original).unwrap(), "compressed deep");
        assert!(!compressed.exists());
    }

    #[test]
    fn test_replace_rejects_non_directory() {
        let result = replace_with_compressed(Path::new("/nonexistent/photos"));
        assert!(matches!(result, Err(CompressionError::NotADirectory(_))));
    }
}
