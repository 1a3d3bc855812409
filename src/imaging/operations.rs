//! High-level image operations.
//!
//! These functions combine calculations with backend execution: they read
//! the current size, work out the bounded target, and hand the backend a
//! fully specified [`RecompressParams`].

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_bounded_dimensions;
use super::params::{Quality, RecompressParams};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Settings shared by every file in a compression run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecompressConfig {
    pub quality: Quality,
    /// Longest allowed edge; `0` disables resizing.
    pub max_size: u32,
}

impl Default for RecompressConfig {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            max_size: 1200,
        }
    }
}

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    Ok(backend.identify(path)?.into())
}

/// Source and target size of a recompress, as planned or as executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub original: (u32, u32),
    pub target: (u32, u32),
}

impl ResizePlan {
    pub fn resizes(&self) -> bool {
        self.original != self.target
    }
}

/// Plan a recompress without executing it. Used by dry runs.
pub fn plan_recompress(
    backend: &impl ImageBackend,
    path: &Path,
    config: &RecompressConfig,
) -> Result<ResizePlan> {
    let original = get_dimensions(backend, path)?;
    Ok(ResizePlan {
        original,
        target: calculate_bounded_dimensions(original, config.max_size),
    })
}

/// Downscale (if needed) and re-encode `path` in place.
pub fn recompress_image(
    backend: &impl ImageBackend,
    path: &Path,
    config: &RecompressConfig,
) -> Result<ResizePlan> {
    let plan = plan_recompress(backend, path, config)?;
    backend.recompress(&RecompressParams {
        path: path.to_path_buf(),
        width: plan.target.0,
        height: plan.target.1,
        quality: config.quality,
    })?;
    Ok(plan)
}
