//! Pure Rust image backend built on the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only) |
//! | Decode | `image::ImageReader` with format sniffing |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode | `image::codecs::jpeg::JpegEncoder` |
//! | Write | [`write_atomic`](crate::atomic::write_atomic) over the source |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::needs_resize;
use super::params::RecompressParams;
use crate::atomic::write_atomic;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::path::Path;

/// Production backend. See the [module docs](self) for the crate mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Reduce to a pixel layout JPEG can store: grayscale stays grayscale,
/// everything else (alpha, palette, 16-bit) becomes RGB8.
fn to_jpeg_layout(img: DynamicImage) -> DynamicImage {
    match img {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => img,
        DynamicImage::ImageLuma16(_) | DynamicImage::ImageLumaA8(_) => {
            DynamicImage::ImageLuma8(img.to_luma8())
        }
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

fn encode_jpeg(img: &DynamicImage, quality: u8) -> Result<Vec<u8>, BackendError> {
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut buf, quality);
    img.write_with_encoder(encoder)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn recompress(&self, params: &RecompressParams) -> Result<(), BackendError> {
        let img = to_jpeg_layout(load_image(&params.path)?);

        let source = (img.width(), img.height());
        let target = (params.width, params.height);
        let img = if needs_resize(source, target) {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        } else {
            img
        };

        // Encode fully in memory so a failure never touches the original.
        let bytes = encode_jpeg(&img, params.quality.value())?;
        write_atomic(&params.path, &bytes)?;
        Ok(())
    }
}
