//! Format-specific save policy.
//!
//! Each profile declares how the decoded image is converted before encoding and
//! which encoder settings apply, so the rules can be checked without touching
//! the filesystem.

use crate::error::{CompressionError, Result};
use image::{ColorType, ImageFormat};
use std::fmt;

/// Pixel layout handed to the encoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelLayout {
    Luma8,
    Rgb8,
    Rgba8,
    Rgb16,
    Rgba16,
}

/// Everything an encoder needs besides the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeSettings {
    pub profile: SaveProfile,
    pub layout: PixelLayout,
    /// `None` for encoders with no quality knob (PNG).
    pub quality: Option<u8>,
    pub lossless: bool,
    /// Optimised entropy coding for JPEG, an oxipng pass for PNG.
    pub optimize: bool,
    pub progressive: bool,
}

/// Supported re-encode targets. The output format always equals the decoded input format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveProfile {
    /// Lossless; re-encoded and run through oxipng. Alpha and 16-bit depth kept
    /// when present, everything else stored as RGB8.
    Png,
    /// Lossy with `quality`, progressive with optimised coding. Grayscale stays
    /// single-channel, anything else becomes RGB.
    Jpeg,
    /// Lossy with `quality`, or lossless when the source carries alpha.
    WebP,
}

impl SaveProfile {
    pub fn from_image_format(format: ImageFormat) -> Result<Self> {
        match format {
            ImageFormat::Png => Ok(SaveProfile::Png),
            ImageFormat::Jpeg => Ok(SaveProfile::Jpeg),
            ImageFormat::WebP => Ok(SaveProfile::WebP),
            other => Err(CompressionError::UnsupportedFormat(format!("{:?}", other))),
        }
    }

    /// Layout for a source decoded as `color`.
    pub fn layout(&self, color: ColorType) -> PixelLayout {
        let has_alpha = color.has_alpha();
        let wide = color.bytes_per_pixel() > color.channel_count();
        match self {
            SaveProfile::Jpeg if !color.has_color() => PixelLayout::Luma8,
            SaveProfile::Jpeg => PixelLayout::Rgb8,
            SaveProfile::Png if wide && has_alpha => PixelLayout::Rgba16,
            SaveProfile::Png if wide => PixelLayout::Rgb16,
            SaveProfile::Png | SaveProfile::WebP if has_alpha => PixelLayout::Rgba8,
            SaveProfile::Png | SaveProfile::WebP => PixelLayout::Rgb8,
        }
    }

    pub fn settings(&self, quality: u8, color: ColorType) -> EncodeSettings {
        let layout = self.layout(color);
        match self {
            SaveProfile::Png => EncodeSettings {
                profile: *self,
                layout,
                quality: None,
                lossless: true,
                optimize: true,
                progressive: false,
            },
            SaveProfile::Jpeg => EncodeSettings {
                profile: *self,
                layout,
                quality: Some(quality),
                lossless: false,
                optimize: true,
                progressive: true,
            },
            SaveProfile::WebP => EncodeSettings {
                profile: *self,
                layout,
                quality: Some(quality),
                lossless: color.has_alpha(),
                optimize: false,
                progressive: false,
            },
        }
    }
}

impl fmt::Display for SaveProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SaveProfile::Png => "PNG",
            SaveProfile::Jpeg => "JPEG",
            SaveProfile::WebP => "WebP",
        };
        write!(f, "{}", name)
    }
}
