//! In-place JPEG compression for the sample images.
//!
//! Every `*.jpg` directly inside the images directory is decoded, downscaled
//! so its long edge fits `max_size`, and re-encoded at `quality` over the
//! original file. Files are independent: a failure on one is reported and the
//! rest carry on.
//!
//! ## Parallel Processing
//!
//! Files are processed with rayon's `par_iter` inside the global pool that
//! `main` sizes to `min(workers, cores)`. Workers report progress through an
//! optional `mpsc` sender; the per-file outcomes are collected and sorted by
//! filename afterwards, so reports don't depend on scheduling.
//!
//! ## Cache
//!
//! Files we compressed on a previous run, with the same settings, and that
//! haven't changed since are skipped. See [`crate::cache`].

use crate::cache::{self, CacheStats, CompressCache};
use crate::codec::IMAGE_EXTENSION;
use crate::config::CompressionConfig;
use crate::imaging::{
    ImageBackend, Quality, RecompressConfig, ResizePlan, RustBackend, plan_recompress,
    recompress_image,
};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::Sender;
use thiserror::Error;

/// A progress line is emitted every this many finished files.
pub const PROGRESS_INTERVAL: usize = 100;

#[derive(Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Images directory not found: {0}")]
    MissingDirectory(PathBuf),
}

/// Settings for one compression run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompressSettings {
    pub recompress: RecompressConfig,
    /// Consult and honour `.compress-cache.json`.
    pub use_cache: bool,
}

impl CompressSettings {
    pub fn from_config(config: &CompressionConfig, use_cache: bool) -> Self {
        Self {
            recompress: RecompressConfig {
                quality: Quality::new(config.quality),
                max_size: config.max_size,
            },
            use_cache,
        }
    }

    fn params_hash(&self) -> String {
        cache::hash_compress_params(self.recompress.quality.value(), self.recompress.max_size)
    }
}

/// Events sent from worker threads while a run is in progress.
#[derive(Debug, Clone, PartialEq)]
pub enum CompressEvent {
    Started {
        total: usize,
        quality: u8,
        max_size: u32,
    },
    Progress { done: usize, total: usize },
    Failed { filename: String, reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileStatus {
    Compressed {
        original_bytes: u64,
        compressed_bytes: u64,
        plan: ResizePlan,
    },
    /// Unchanged since we last compressed it with the same settings.
    Cached,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileOutcome {
    pub filename: String,
    pub status: FileStatus,
}

/// Everything a finished run has to say.
#[derive(Debug, Clone, PartialEq)]
pub struct CompressReport {
    pub outcomes: Vec<FileOutcome>,
    pub cache_stats: CacheStats,
}

impl CompressReport {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| !matches!(o.status, FileStatus::Failed(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            FileStatus::Failed(reason) => Some((o.filename.as_str(), reason.as_str())),
            _ => None,
        })
    }

    /// Bytes before and after, over the files compressed this run.
    pub fn byte_totals(&self) -> (u64, u64) {
        self.outcomes
            .iter()
            .fold((0, 0), |(before, after), o| match o.status {
                FileStatus::Compressed {
                    original_bytes,
                    compressed_bytes,
                    ..
                } => (before + original_bytes, after + compressed_bytes),
                _ => (before, after),
            })
    }

    /// Space saved in megabytes. Negative if re-encoding grew the files.
    pub fn saved_mb(&self) -> f64 {
        let (before, after) = self.byte_totals();
        to_mb(before) - to_mb(after)
    }

    /// Saved bytes as a percentage of the original total, if anything was compressed.
    pub fn saved_percent(&self) -> Option<f64> {
        let (before, after) = self.byte_totals();
        (before > 0).then(|| (before as f64 - after as f64) / before as f64 * 100.0)
    }
}

pub fn to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

/// One line of a dry run.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedFile {
    pub filename: String,
    /// `Err` holds the reason the file couldn't be read.
    pub plan: Result<ResizePlan, String>,
    pub cached: bool,
}

/// List `*.jpg` files directly in `dir`, sorted by name.
pub fn find_images(dir: &Path) -> Result<Vec<PathBuf>, CompressError> {
    if !dir.is_dir() {
        return Err(CompressError::MissingDirectory(dir.to_path_buf()));
    }
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_jpg = path
            .extension()
            .is_some_and(|e| e == IMAGE_EXTENSION);
        if is_jpg && path.is_file() {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn load_cache(images_dir: &Path, settings: &CompressSettings) -> CompressCache {
    if settings.use_cache {
        CompressCache::load(images_dir)
    } else {
        CompressCache::empty()
    }
}

/// Describe what a run would do without touching any file.
pub fn plan(images_dir: &Path, settings: &CompressSettings) -> Result<Vec<PlannedFile>, CompressError> {
    plan_with_backend(&RustBackend::new(), images_dir, settings)
}

pub fn plan_with_backend(
    backend: &impl ImageBackend,
    images_dir: &Path,
    settings: &CompressSettings,
) -> Result<Vec<PlannedFile>, CompressError> {
    let images = find_images(images_dir)?;
    let cache = load_cache(images_dir, settings);
    let params_hash = settings.params_hash();

    Ok(images
        .iter()
        .map(|path| {
            let filename = file_name(path);
            let cached = cache::hash_file(path)
                .is_ok_and(|hash| cache.is_current(&filename, &hash, &params_hash));
            let plan = plan_recompress(backend, path, &settings.recompress)
                .map_err(|e| e.to_string());
            PlannedFile {
                filename,
                plan,
                cached,
            }
        })
        .collect())
}

pub fn compress(
    images_dir: &Path,
    settings: &CompressSettings,
    events: Option<Sender<CompressEvent>>,
) -> Result<CompressReport, CompressError> {
    compress_with_backend(&RustBackend::new(), images_dir, settings, events)
}

/// Compress using a specific backend (allows testing with mock).
pub fn compress_with_backend(
    backend: &impl ImageBackend,
    images_dir: &Path,
    settings: &CompressSettings,
    events: Option<Sender<CompressEvent>>,
) -> Result<CompressReport, CompressError> {
    let images = find_images(images_dir)?;
    let mut cache = load_cache(images_dir, settings);
    let params_hash = settings.params_hash();
    let total = images.len();

    let send = |event: CompressEvent| {
        if let Some(tx) = &events {
            // A dropped receiver only loses progress output.
            let _ = tx.send(event);
        }
    };

    send(CompressEvent::Started {
        total,
        quality: settings.recompress.quality.value(),
        max_size: settings.recompress.max_size,
    });

    let done = AtomicUsize::new(0);
    let mut results: Vec<(FileOutcome, Option<String>)> = images
        .par_iter()
        .map(|path| {
            let result = compress_one(backend, path, settings, &cache, &params_hash);
            if let FileStatus::Failed(reason) = &result.0.status {
                send(CompressEvent::Failed {
                    filename: result.0.filename.clone(),
                    reason: reason.clone(),
                });
            }
            let finished = done.fetch_add(1, Ordering::SeqCst) + 1;
            if finished % PROGRESS_INTERVAL == 0 || finished == total {
                send(CompressEvent::Progress {
                    done: finished,
                    total,
                });
            }
            result
        })
        .collect();
    results.sort_by(|a, b| a.0.filename.cmp(&b.0.filename));

    let mut cache_stats = CacheStats::default();
    let mut outcomes = Vec::with_capacity(results.len());
    for (outcome, new_hash) in results {
        match &outcome.status {
            FileStatus::Cached => cache_stats.hit(),
            FileStatus::Compressed { .. } => {
                cache_stats.miss();
                if let Some(hash) = new_hash {
                    cache.insert(outcome.filename.clone(), hash, params_hash.clone());
                }
            }
            FileStatus::Failed(_) => cache.remove(&outcome.filename),
        }
        outcomes.push(outcome);
    }
    cache.retain_files(outcomes.iter().map(|o| o.filename.as_str()));
    cache.save(images_dir)?;

    Ok(CompressReport {
        outcomes,
        cache_stats,
    })
}

/// Compress a single file. Returns the outcome and, on success, the hash of
/// the bytes now on disk.
fn compress_one(
    backend: &impl ImageBackend,
    path: &Path,
    settings: &CompressSettings,
    cache: &CompressCache,
    params_hash: &str,
) -> (FileOutcome, Option<String>) {
    let filename = file_name(path);
    match try_compress(backend, path, &filename, settings, cache, params_hash) {
        Ok((status, hash)) => (FileOutcome { filename, status }, hash),
        Err(reason) => (
            FileOutcome {
                filename,
                status: FileStatus::Failed(reason),
            },
            None,
        ),
    }
}

fn try_compress(
    backend: &impl ImageBackend,
    path: &Path,
    filename: &str,
    settings: &CompressSettings,
    cache: &CompressCache,
    params_hash: &str,
) -> Result<(FileStatus, Option<String>), String> {
    let original = fs::read(path).map_err(|e| e.to_string())?;
    if cache.is_current(filename, &cache::hash_bytes(&original), params_hash) {
        return Ok((FileStatus::Cached, None));
    }

    let plan = recompress_image(backend, path, &settings.recompress).map_err(|e| e.to_string())?;

    let written = fs::read(path).map_err(|e| e.to_string())?;
    Ok((
        FileStatus::Compressed {
            original_bytes: original.len() as u64,
            compressed_bytes: written.len() as u64,
            plan,
        },
        Some(cache::hash_bytes(&written)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::image_dir_with;
    use std::sync::mpsc;

    fn settings() -> CompressSettings {
        CompressSettings::from_config(&CompressionConfig::default(), true)
    }

    #[test]
    fn settings_from_config_clamps_quality() {
        let config = CompressionConfig {
            quality: 100,
            max_size: 800,
            workers: 2,
        };
        let s = CompressSettings::from_config(&config, false);
        assert_eq!(s.recompress.quality.value(), 95);
        assert_eq!(s.recompress.max_size, 800);
        assert!(!s.use_cache);
    }

    #[test]
    fn find_images_lists_sorted_jpgs_only() {
        let tmp = image_dir_with(&["c.jpg", "b.jpg", "a.JPG", "notes.txt", "d.png"]);
        fs::create_dir(tmp.path().join("sub.jpg")).unwrap();

        let names: Vec<String> = find_images(tmp.path())
            .unwrap()
            .iter()
            .map(|p| file_name(p))
            .collect();
        assert_eq!(names, vec!["b.jpg", "c.jpg"]);
    }

    #[test]
    fn find_images_missing_dir_errors() {
        let result = find_images(Path::new("/definitely/not/here"));
        assert!(matches!(result, Err(CompressError::MissingDirectory(_))));
    }

    #[test]
    fn failure_on_one_file_does_not_stop_others() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg", "0003-c.jpg"]);
        let backend = MockBackend::with_dimensions(4000, 3000).failing_on(&["0002-b.jpg"]);

        let report = compress_with_backend(&backend, tmp.path(), &settings(), None).unwrap();

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        let failures: Vec<_> = report.failures().map(|(f, _)| f).collect();
        assert_eq!(failures, vec!["0002-b.jpg"]);
        assert_eq!(
            backend.recompressed_files(),
            vec!["0001-a.jpg", "0002-b.jpg", "0003-c.jpg"]
        );
    }

    #[test]
    fn outcomes_sorted_and_carry_plan() {
        let tmp = image_dir_with(&["0002-b.jpg", "0001-a.jpg"]);
        let backend = MockBackend::with_dimensions(3000, 4000);

        let report = compress_with_backend(&backend, tmp.path(), &settings(), None).unwrap();

        assert_eq!(report.outcomes[0].filename, "0001-a.jpg");
        assert_eq!(report.outcomes[1].filename, "0002-b.jpg");
        match &report.outcomes[0].status {
            FileStatus::Compressed { plan, .. } => assert_eq!(plan.target, (900, 1200)),
            other => panic!("unexpected status {other:?}"),
        }
    }

    #[test]
    fn second_run_skips_unchanged_files() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg"]);

        let first = MockBackend::with_dimensions(100, 100);
        compress_with_backend(&first, tmp.path(), &settings(), None).unwrap();

        let second = MockBackend::with_dimensions(100, 100);
        let report = compress_with_backend(&second, tmp.path(), &settings(), None).unwrap();

        assert!(second.recompressed_files().is_empty());
        assert_eq!(report.cache_stats, CacheStats { hits: 2, misses: 0 });
        assert!(
            report
                .outcomes
                .iter()
                .all(|o| o.status == FileStatus::Cached)
        );
    }

    #[test]
    fn changed_file_or_settings_recompress() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg"]);
        compress_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings(), None)
            .unwrap();

        fs::write(tmp.path().join("0001-a.jpg"), b"a new original").unwrap();
        let backend = MockBackend::with_dimensions(10, 10);
        compress_with_backend(&backend, tmp.path(), &settings(), None).unwrap();
        assert_eq!(backend.recompressed_files(), vec!["0001-a.jpg"]);

        let mut other = settings();
        other.recompress.quality = Quality::new(50);
        let backend = MockBackend::with_dimensions(10, 10);
        compress_with_backend(&backend, tmp.path(), &other, None).unwrap();
        assert_eq!(backend.recompressed_files().len(), 2);
    }

    #[test]
    fn no_cache_recompresses_everything() {
        let tmp = image_dir_with(&["0001-a.jpg"]);
        compress_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings(), None)
            .unwrap();

        let mut no_cache = settings();
        no_cache.use_cache = false;
        let backend = MockBackend::with_dimensions(10, 10);
        compress_with_backend(&backend, tmp.path(), &no_cache, None).unwrap();

        assert_eq!(backend.recompressed_files(), vec!["0001-a.jpg"]);
    }

    #[test]
    fn failed_files_are_not_cached() {
        let tmp = image_dir_with(&["0001-a.jpg"]);
        let failing = MockBackend::with_dimensions(10, 10).failing_on(&["0001-a.jpg"]);
        compress_with_backend(&failing, tmp.path(), &settings(), None).unwrap();

        assert!(CompressCache::load(tmp.path()).entries.is_empty());
    }

    #[test]
    fn cache_pruned_of_deleted_files() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg"]);
        compress_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings(), None)
            .unwrap();
        fs::remove_file(tmp.path().join("0002-b.jpg")).unwrap();
        compress_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings(), None)
            .unwrap();

        let cache = CompressCache::load(tmp.path());
        assert_eq!(cache.entries.keys().collect::<Vec<_>>(), vec!["0001-a.jpg"]);
    }

    #[test]
    fn events_report_start_failures_and_final_progress() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg"]);
        let backend = MockBackend::with_dimensions(10, 10).failing_on(&["0001-a.jpg"]);
        let (tx, rx) = mpsc::channel();

        compress_with_backend(&backend, tmp.path(), &settings(), Some(tx)).unwrap();
        let events: Vec<CompressEvent> = rx.into_iter().collect();

        assert_eq!(
            events.first(),
            Some(&CompressEvent::Started {
                total: 2,
                quality: 75,
                max_size: 1200,
            })
        );
        assert!(events.contains(&CompressEvent::Failed {
            filename: "0001-a.jpg".into(),
            reason: "Processing failed: mock failure for 0001-a.jpg".into(),
        }));
        assert!(events.contains(&CompressEvent::Progress { done: 2, total: 2 }));
    }

    #[test]
    fn progress_emitted_every_interval() {
        let names: Vec<String> = (1..=250).map(|i| format!("{i:04}-x.jpg")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let tmp = image_dir_with(&refs);
        let (tx, rx) = mpsc::channel();

        compress_with_backend(
            &MockBackend::with_dimensions(10, 10),
            tmp.path(),
            &settings(),
            Some(tx),
        )
        .unwrap();

        let mut progress: Vec<usize> = rx
            .into_iter()
            .filter_map(|e| match e {
                CompressEvent::Progress { done, .. } => Some(done),
                _ => None,
            })
            .collect();
        progress.sort();
        assert_eq!(progress, vec![100, 200, 250]);
    }

    #[test]
    fn dry_run_touches_nothing() {
        let tmp = image_dir_with(&["0001-a.jpg", "0002-b.jpg"]);
        let backend = MockBackend::with_dimensions(4000, 3000);

        let planned = plan_with_backend(&backend, tmp.path(), &settings()).unwrap();

        assert_eq!(planned.len(), 2);
        assert_eq!(planned[0].filename, "0001-a.jpg");
        assert_eq!(
            planned[0].plan,
            Ok(ResizePlan {
                original: (4000, 3000),
                target: (1200, 900),
            })
        );
        assert!(!planned[0].cached);
        assert!(backend.recompressed_files().is_empty());
        assert!(!cache::cache_path(tmp.path()).exists());
    }

    #[test]
    fn dry_run_marks_cached_files() {
        let tmp = image_dir_with(&["0001-a.jpg"]);
        compress_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings(), None)
            .unwrap();

        let planned =
            plan_with_backend(&MockBackend::with_dimensions(10, 10), tmp.path(), &settings())
                .unwrap();
        assert!(planned[0].cached);
    }

    #[test]
    fn report_totals() {
        let report = CompressReport {
            outcomes: vec![
                FileOutcome {
                    filename: "a.jpg".into(),
                    status: FileStatus::Compressed {
                        original_bytes: 3 * 1024 * 1024,
                        compressed_bytes: 1024 * 1024,
                        plan: ResizePlan {
                            original: (10, 10),
                            target: (10, 10),
                        },
                    },
                },
                FileOutcome {
                    filename: "b.jpg".into(),
                    status: FileStatus::Cached,
                },
                FileOutcome {
                    filename: "c.jpg".into(),
                    status: FileStatus::Failed("boom".into()),
                },
            ],
            cache_stats: CacheStats { hits: 1, misses: 1 },
        };

        assert_eq!(report.total(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.byte_totals(), (3 * 1024 * 1024, 1024 * 1024));
        assert!((report.saved_mb() - 2.0).abs() < 1e-9);
        let percent = report.saved_percent().unwrap();
        assert!((percent - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn saved_percent_absent_when_nothing_compressed() {
        let report = CompressReport {
            outcomes: vec![FileOutcome {
                filename: "a.jpg".into(),
                status: FileStatus::Cached,
            }],
            cache_stats: CacheStats { hits: 1, misses: 0 },
        };
        assert_eq!(report.saved_percent(), None);
        assert_eq!(report.saved_mb(), 0.0);
    }
}
