use crate::constants::{
    DEFAULT_QUALITY, DEFAULT_SCALE_RATIO, MAX_QUALITY, MIN_QUALITY, PNG_OPTIMIZATION_PRESET,
};
use crate::error::{CompressionError, Result};
use crate::formats::{EncodeSettings, PixelLayout, SaveProfile};
use crate::naming::compressed_sibling;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, ImageEncoder, ImageFormat, ImageReader};
use mozjpeg::{ColorSpace, Compress};
use std::fs;
use std::io::Cursor;
use std::path::Path;
use tracing::{debug, warn};

/// Parameters shared read-only by every worker of one compress run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformParams {
    pub quality: u8,
    pub target_width: Option<u32>,
    pub target_height: Option<u32>,
    pub scale_ratio: f32,
}

impl TransformParams {
    pub fn new(
        quality: u32,
        target_width: Option<u32>,
        target_height: Option<u32>,
        scale_ratio: f32,
    ) -> Result<Self> {
        if !(MIN_QUALITY..=MAX_QUALITY).contains(&quality) {
            return Err(CompressionError::InvalidQuality(quality));
        }
        if !(0.0..=1.0).contains(&scale_ratio) {
            return Err(CompressionError::InvalidScaleRatio(scale_ratio));
        }
        for target in [target_width, target_height].into_iter().flatten() {
            if target == 0 {
                return Err(CompressionError::InvalidDimension(target));
            }
        }

        Ok(Self {
            quality: quality as u8,
            target_width,
            target_height,
            scale_ratio,
        })
    }

    /// Computes the downsampled size for an image of `width` x `height`.
    ///
    /// Each axis that exceeds its target moves to
    /// `target + scale_ratio * (original - target)`. When both axes exceed,
    /// the smaller scale factor is applied to both so the aspect ratio holds.
    /// Returns `None` when no resize is needed.
    pub fn plan_resize(&self, width: u32, height: u32) -> Option<(u32, u32)> {
        let ratio = self.scale_ratio as f64;
        let axis_scale = |original: u32, target: Option<u32>| -> Option<f64> {
            let target = target?;
            if original <= target {
                return None;
            }
            let interpolated = target as f64 + ratio * (original - target) as f64;
            Some(interpolated / original as f64)
        };

        let scale = match (
            axis_scale(width, self.target_width),
            axis_scale(height, self.target_height),
        ) {
            (None, None) => return None,
            (Some(w), None) => w,
            (None, Some(h)) => h,
            (Some(w), Some(h)) => w.min(h),
        };

        let new_width = ((width as f64 * scale).round() as u32).max(1);
        let new_height = ((height as f64 * scale).round() as u32).max(1);
        if (new_width, new_height) == (width, height) {
            None
        } else {
            Some((new_width, new_height))
        }
    }
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY as u8,
            target_width: None,
            target_height: None,
            scale_ratio: DEFAULT_SCALE_RATIO,
        }
    }
}

/// Outcome of one work item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransformResult {
    Success {
        original_size: u64,
        compressed_size: u64,
        resolution: Option<(u32, u32)>,
    },
    /// Re-encoding did not make the file smaller; nothing was kept.
    Skipped,
    Failed {
        reason: String,
    },
}

/// A decoded source image plus what the save policy needs to know about it.
pub struct DecodedImage {
    pub image: DynamicImage,
    pub format: ImageFormat,
    /// Colour type as decoded, before any resize.
    pub color: ColorType,
}

impl DecodedImage {
    pub fn has_alpha(&self) -> bool {
        self.color.has_alpha()
    }
}

/// Image decode/resize/encode capability used by the transform worker.
pub trait Codec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage>;
    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage;
    fn encode(&self, image: &DynamicImage, settings: &EncodeSettings) -> Result<Vec<u8>>;
}

/// Production codec: `image` for decode/resize/PNG, `mozjpeg` for progressive
/// JPEG, `oxipng` for PNG optimisation and `webp` (libwebp) for WebP.
#[derive(Debug, Clone)]
pub struct ImageCodec {
    png_preset: u8,
}

impl ImageCodec {
    pub fn new(png_preset: u8) -> Self {
        Self { png_preset }
    }
}

impl Default for ImageCodec {
    fn default() -> Self {
        Self::new(PNG_OPTIMIZATION_PRESET)
    }
}

impl Codec for ImageCodec {
    fn decode(&self, bytes: &[u8]) -> Result<DecodedImage> {
        let reader = ImageReader::new(Cursor::new(bytes)).with_guessed_format()?;
        let format = reader.format().ok_or_else(|| {
            CompressionError::UnsupportedFormat("unrecognized image data".to_string())
        })?;
        let image = reader.decode()?;
        let color = image.color();

        Ok(DecodedImage {
            image,
            format,
            color,
        })
    }

    fn resize(&self, image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
        image.resize_exact(width, height, FilterType::Lanczos3)
    }

    fn encode(&self, image: &DynamicImage, settings: &EncodeSettings) -> Result<Vec<u8>> {
        let image = match settings.layout {
            PixelLayout::Luma8 => DynamicImage::ImageLuma8(image.to_luma8()),
            PixelLayout::Rgb8 => DynamicImage::ImageRgb8(image.to_rgb8()),
            PixelLayout::Rgba8 => DynamicImage::ImageRgba8(image.to_rgba8()),
            PixelLayout::Rgb16 => DynamicImage::ImageRgb16(image.to_rgb16()),
            PixelLayout::Rgba16 => DynamicImage::ImageRgba16(image.to_rgba16()),
        };
        let (width, height) = image.dimensions();
        let quality = settings.quality.unwrap_or(DEFAULT_QUALITY as u8);
        let mut buf = Vec::new();

        match settings.profile {
            SaveProfile::Jpeg => {
                buf = encode_jpeg(&image, quality, settings)
                    .map_err(|e| CompressionError::JpegEncoding(e.to_string()))?;
            }
            SaveProfile::Png => {
                PngEncoder::new_with_quality(
                    &mut buf,
                    CompressionType::Best,
                    PngFilterType::Adaptive,
                )
                .write_image(image.as_bytes(), width, height, image.color().into())?;

                if settings.optimize {
                    let options = oxipng::Options::from_preset(self.png_preset);
                    buf = oxipng::optimize_from_memory(&buf, &options)
                        .map_err(|e| CompressionError::PngOptimization(e.to_string()))?;
                }
            }
            SaveProfile::WebP => {
                let encoder = webp::Encoder::from_image(&image)
                    .map_err(|e| CompressionError::WebPEncoding(e.to_string()))?;
                let memory = if settings.lossless {
                    encoder.encode_lossless()
                } else {
                    encoder.encode(quality as f32)
                };
                buf = memory.to_vec();
            }
        }

        Ok(buf)
    }
}

fn encode_jpeg(
    image: &DynamicImage,
    quality: u8,
    settings: &EncodeSettings,
) -> std::io::Result<Vec<u8>> {
    let color_space = match settings.layout {
        PixelLayout::Luma8 => ColorSpace::JCS_GRAYSCALE,
        _ => ColorSpace::JCS_RGB,
    };

    let mut comp = Compress::new(color_space);
    comp.set_size(image.width() as usize, image.height() as usize);
    comp.set_quality(quality as f32);
    if settings.progressive {
        comp.set_progressive_mode();
    }
    if settings.optimize {
        comp.set_optimize_coding(true);
        comp.set_optimize_scans(settings.progressive);
    }

    let mut writer = comp.start_compress(Vec::new())?;
    writer.write_scanlines(image.as_bytes())?;
    writer.finish()
}

/// Removes the output file on drop unless [`OutputGuard::keep`] was called,
/// so a failed or rejected transform never leaves a sibling behind.
struct OutputGuard<'a> {
    path: &'a Path,
    armed: bool,
}

impl<'a> OutputGuard<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, armed: true }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for OutputGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match fs::remove_file(self.path) {
            Ok(()) => debug!("Removed discarded output {:?}", self.path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove discarded output {:?}: {}", self.path, e),
        }
    }
}

/// Recompresses `source` into its `_min` sibling.
///
/// Never returns an error: I/O and decode failures become
/// [`TransformResult::Failed`] and any output written so far is removed.
pub fn transform<C: Codec + ?Sized>(
    source: &Path,
    params: &TransformParams,
    codec: &C,
) -> TransformResult {
    match try_transform(source, params, codec) {
        Ok(result) => result,
        Err(e) => TransformResult::Failed {
            reason: e.to_string(),
        },
    }
}

fn try_transform<C: Codec + ?Sized>(
    source: &Path,
    params: &TransformParams,
    codec: &C,
) -> Result<TransformResult> {
    let original_size = fs::metadata(source)?.len();
    let bytes = fs::read(source)?;

    let DecodedImage {
        mut image,
        format,
        color,
    } = codec.decode(&bytes)?;
    let profile = SaveProfile::from_image_format(format)?;

    if let Some((width, height)) = params.plan_resize(image.width(), image.height()) {
        debug!(
            "Resizing {:?} from {}x{} to {}x{}",
            source,
            image.width(),
            image.height(),
            width,
            height
        );
        image = codec.resize(&image, width, height);
    }
    let resolution = image.dimensions();

    let settings = profile.settings(params.quality, color);
    let encoded = codec.encode(&image, &settings)?;

    let output_path = compressed_sibling(source);
    let guard = OutputGuard::new(&output_path);
    fs::write(&output_path, &encoded)?;
    let compressed_size = fs::metadata(&output_path)?.len();

    if compressed_size >= original_size {
        debug!(
            "{} output for {:?} is not smaller ({} >= {} bytes)",
            profile, source, compressed_size, original_size
        );
        return Ok(TransformResult::Skipped);
    }

    guard.keep();
    Ok(TransformResult::Success {
        original_size,
        compressed_size,
        resolution: Some(resolution),
    })
}
