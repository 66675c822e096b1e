#![allow(dead_code)]

use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Deterministic high-entropy pixels so encoders cannot shrink the image to nothing.
pub fn noisy_rgb(width: u32, height: u32) -> RgbImage {
    let mut state: u32 = 0x9e37_79b9;
    RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [_, r, g, b] = state.to_le_bytes();
        Rgb([r, g, b])
    })
}

pub fn write_jpeg(path: &Path, width: u32, height: u32, quality: u8) {
    let image = noisy_rgb(width, height);
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality)
        .write_image(image.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
    fs::write(path, buf).unwrap();
}

/// A near-lossless JPEG that re-encodes much smaller at the default quality.
pub fn write_large_jpeg(path: &Path, width: u32, height: u32) {
    write_jpeg(path, width, height, 100);
}

/// A JPEG already at minimum quality; re-encoding it never wins.
pub fn write_tiny_jpeg(path: &Path, width: u32, height: u32) {
    write_jpeg(path, width, height, 1);
}

pub fn write_png(path: &Path, width: u32, height: u32) {
    noisy_rgb(width, height).save(path).unwrap();
}

pub fn create_non_image_files(temp_dir: &Path) -> Vec<PathBuf> {
    let broken = temp_dir.join("broken.jpg");
    let notes = temp_dir.join("notes.txt");

    File::create(&broken)
        .unwrap()
        .write_all(b"fake jpg data")
        .unwrap();
    File::create(&notes)
        .unwrap()
        .write_all(b"not an image")
        .unwrap();

    vec![broken, notes]
}

pub fn create_nested_directory(temp_dir: &Path) -> PathBuf {
    let subdir = temp_dir.join("subdir");
    fs::create_dir(&subdir).unwrap();
    subdir
}

pub fn create_temp_directory() -> TempDir {
    TempDir::new().unwrap()
}
