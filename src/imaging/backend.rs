//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations compression needs:
//! identify (read dimensions) and recompress (optionally downscale, then
//! re-encode as JPEG in place). The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::RecompressParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl From<Dimensions> for (u32, u32) {
    fn from(d: Dimensions) -> Self {
        (d.width, d.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared across the rayon worker pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode, resize to the requested dimensions if they differ, and write
    /// the re-encoded JPEG back over `params.path`.
    fn recompress(&self, params: &RecompressParams) -> Result<(), BackendError>;
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::imaging::Quality;
    use std::sync::Mutex;

    /// Mock backend that records operations without touching pixels.
    ///
    /// Every identify returns the same `dimensions`. Files whose name is in
    /// `failing` error on recompress. Uses Mutex (not RefCell) so it is Sync
    /// and works with rayon's par_iter.
    pub struct MockBackend {
        pub dimensions: Dimensions,
        pub failing: Vec<String>,
        pub operations: Mutex<Vec<RecordedOp>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Identify(String),
        Recompress {
            file: String,
            width: u32,
            height: u32,
            quality: u8,
        },
    }

    fn file_name(path: &Path) -> String {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    impl MockBackend {
        pub fn with_dimensions(width: u32, height: u32) -> Self {
            Self {
                dimensions: Dimensions { width, height },
                failing: Vec::new(),
                operations: Mutex::new(Vec::new()),
            }
        }

        pub fn failing_on(mut self, names: &[&str]) -> Self {
            self.failing = names.iter().map(|n| n.to_string()).collect();
            self
        }

        /// Recorded operations, sorted so parallel runs compare stably.
        pub fn get_operations(&self) -> Vec<RecordedOp> {
            let mut ops = self.operations.lock().unwrap().clone();
            ops.sort_by_key(|op| format!("{op:?}"));
            ops
        }

        pub fn recompressed_files(&self) -> Vec<String> {
            let mut files: Vec<String> = self
                .get_operations()
                .into_iter()
                .filter_map(|op| match op {
                    RecordedOp::Recompress { file, .. } => Some(file),
                    RecordedOp::Identify(_) => None,
                })
                .collect();
            files.sort();
            files
        }
    }

    impl ImageBackend for MockBackend {
        fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Identify(file_name(path)));
            Ok(self.dimensions)
        }

        fn recompress(&self, params: &RecompressParams) -> Result<(), BackendError> {
            let file = file_name(&params.path);
            self.operations.lock().unwrap().push(RecordedOp::Recompress {
                file: file.clone(),
                width: params.width,
                height: params.height,
                quality: params.quality.value(),
            });
            if self.failing.contains(&file) {
                return Err(BackendError::ProcessingFailed(format!(
                    "mock failure for {file}"
                )));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_records_identify() {
        let backend = MockBackend::with_dimensions(800, 600);

        let dims = backend.identify(Path::new("/test/0001-a.jpg")).unwrap();
        assert_eq!(<(u32, u32)>::from(dims), (800, 600));
        assert_eq!(
            backend.get_operations(),
            vec![RecordedOp::Identify("0001-a.jpg".into())]
        );
    }

    #[test]
    fn mock_records_recompress_and_fails_on_request() {
        let backend = MockBackend::with_dimensions(10, 10).failing_on(&["bad.jpg"]);
        let params = |name: &str| RecompressParams {
            path: Path::new("/x").join(name),
            width: 5,
            height: 5,
            quality: Quality::new(70),
        };

        assert!(backend.recompress(&params("good.jpg")).is_ok());
        assert!(backend.recompress(&params("bad.jpg")).is_err());
        assert_eq!(backend.recompressed_files(), vec!["bad.jpg", "good.jpg"]);
    }
}
