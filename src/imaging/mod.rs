//! JPEG recompression in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Recompress** | Lanczos3 downscale + `JpegEncoder`, written in place |
//!
//! Layers, from pure to effectful:
//! - `calculations`: bounded-size math, no I/O
//! - `params`: [`Quality`] and [`RecompressParams`], the backend's input
//! - [`backend`]: the [`ImageBackend`] trait (mocked in tests)
//! - [`operations`]: identify, plan, recompress against any backend
//! - [`rust_backend`]: [`RustBackend`], the `image`-crate implementation

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_bounded_dimensions;
pub use operations::{
    RecompressConfig, ResizePlan, get_dimensions, plan_recompress, recompress_image,
};
pub use params::{Quality, RecompressParams};
pub use rust_backend::RustBackend;
