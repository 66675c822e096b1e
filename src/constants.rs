pub const DEFAULT_QUALITY: u32 = 50;
pub const MIN_QUALITY: u32 = 1;
pub const MAX_QUALITY: u32 = 100;

pub const DEFAULT_SCALE_RATIO: f32 = 0.5;

/// Inserted before the extension of every compressed artifact: `photo.jpg` -> `photo_min.jpg`.
pub const MIN_MARKER: &str = "_min";
pub const BACKUP_SUFFIX: &str = ".backup";

pub const COMPRESS_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];
pub const ANALYZE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff",
];

/// oxipng preset used for every PNG. 2 is the oxipng CLI default.
pub const PNG_OPTIMIZATION_PRESET: u8 = 2;

pub const PROGRESS_BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}";

// Common output message prefixes
pub const ORIGINAL_SIZE_PREFIX: &str = "📊 Original size:";
pub const COMPRESSED_SIZE_PREFIX: &str = "📈 Compressed size:";
pub const COMPRESSION_RATIO_PREFIX: &str = "🎯 Compression ratio:";
pub const SUCCESS_PREFIX: &str = "✅";
pub const SKIP_PREFIX: &str = "⏭️";
pub const WARNING_PREFIX: &str = "⚠️";
pub const ERROR_PREFIX: &str = "❌";
pub const INFO_PREFIX: &str = "📋";
