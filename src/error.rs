use std::path::PathBuf;
use thiserror::Error;

/// Coarse classification used for reporting and exit behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad arguments or directory. Fatal before any work starts.
    InvalidInput,
    /// Filesystem failure scoped to one file.
    Io,
    /// Unsupported or corrupt image content scoped to one file.
    Decode,
    /// The compressed -> original rename failed during a replace.
    Swap,
}

#[derive(Debug, Error)]
pub enum CompressionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image processing error: {0}")]
    ImageProcessing(#[from] image::ImageError),

    #[error("PNG optimization error: {0}")]
    PngOptimization(String),

    #[error("JPEG encoding error: {0}")]
    JpegEncoding(String),

    #[error("WebP encoding error: {0}")]
    WebPEncoding(String),

    #[error("Invalid quality value: {0}. Must be between 1 and 100")]
    InvalidQuality(u32),

    #[error("Invalid scale ratio: {0}. Must be between 0 and 1")]
    InvalidScaleRatio(f32),

    #[error("Invalid target dimension: {0}. Must be greater than 0")]
    InvalidDimension(u32),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Walkdir error: {0}")]
    WalkdirError(#[from] walkdir::Error),

    #[error("Failed to build worker pool: {0}")]
    ThreadPool(String),

    #[error("Backup of {} failed: {source}", .original.display())]
    BackupFailed {
        original: PathBuf,
        source: std::io::Error,
    },

    #[error("Stale backup already present: {}", .0.display())]
    StaleBackup(PathBuf),

    #[error("Swap into {} failed (original restored: {restored}): {source}", .original.display())]
    SwapFailed {
        original: PathBuf,
        restored: bool,
        source: std::io::Error,
    },
}

impl CompressionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompressionError::InvalidQuality(_)
            | CompressionError::InvalidScaleRatio(_)
            | CompressionError::InvalidDimension(_)
            | CompressionError::NotADirectory(_)
            | CompressionError::ThreadPool(_) => ErrorKind::InvalidInput,
            CompressionError::ImageProcessing(image::ImageError::IoError(_))
            | CompressionError::Io(_)
            | CompressionError::WalkdirError(_)
            | CompressionError::BackupFailed { .. }
            | CompressionError::StaleBackup(_) => ErrorKind::Io,
            CompressionError::ImageProcessing(_)
            | CompressionError::PngOptimization(_)
            | CompressionError::JpegEncoding(_)
            | CompressionError::WebPEncoding(_)
            | CompressionError::UnsupportedFormat(_) => ErrorKind::Decode,
            CompressionError::SwapFailed { .. } => ErrorKind::Swap,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompressionError>;
