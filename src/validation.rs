use crate::error::{CompressionError, Result};
use std::path::Path;

/// Validate that the run root exists and is a directory
pub fn validate_directory(path: &Path) -> Result<()> {
    if !path.is_dir() {
        return Err(CompressionError::NotADirectory(path.to_path_buf()));
    }
    Ok(())
}

/// Positional target dimensions use `0` for "no target"
pub fn normalize_target(value: Option<u32>) -> Option<u32> {
    value.filter(|&v| v > 0)
}
