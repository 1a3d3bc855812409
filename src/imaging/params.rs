//! Parameter types for image operations.
//!
//! These structs describe *what* to do, not *how*. They sit between
//! [`operations`](super::operations), which decides the target size, and the
//! [`backend`](super::backend), which does the pixel work, so tests can swap in
//! a mock backend without touching operation logic.

use std::path::PathBuf;

/// JPEG encoding quality (1-95). Clamped on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 95;

    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, Self::MAX as u32) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(75)
    }
}

/// Re-encode a JPEG in place at `width`×`height`.
///
/// When the target matches the source dimensions no resampling happens; the
/// image is only re-encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct RecompressParams {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}
