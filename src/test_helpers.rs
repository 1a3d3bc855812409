//! Shared test utilities for the pose-manifest test suite.
//!
//! Provides throwaway image directories and synthetic image files so unit
//! tests can exercise scanning and compression against a real filesystem.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = image_dir_with(&["0001-aaaaaaaaaaaa.jpg", "notes.txt"]);
//! write_jpeg(&tmp.path().join("0002-eaabbgcbbegd.jpg"), 64, 48);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;
use tempfile::TempDir;

// =========================================================================
// Fixture setup
// =========================================================================

/// Create a temp directory holding one empty file per name.
///
/// Enough for anything that only looks at filenames (manifest scanning) or
/// runs against the mock backend.
pub fn image_dir_with(names: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    for name in names {
        std::fs::write(tmp.path().join(name), b"").unwrap();
    }
    tmp
}

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a small valid JPEG with a gradient so it doesn't compress to nothing.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new_with_quality(writer, 95)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write an RGBA PNG to `path`, whatever its extension says.
pub fn write_png_rgba(path: &Path, width: u32, height: u32) {
    let img = RgbaImage::from_fn(width, height, |x, y| {
        image::Rgba([(x % 256) as u8, (y % 256) as u8, 64, (x % 2 * 255) as u8])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::png::PngEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgba8)
        .unwrap();
}
