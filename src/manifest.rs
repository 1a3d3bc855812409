//! Asset manifest generation, loading, and validation.
//!
//! The manifest is the single file the app reads to learn which sample photos
//! it ships and what each one shows. It is always rebuilt from scratch by
//! scanning the images directory; nothing is carried over from a previous
//! manifest.
//!
//! ## Output
//!
//! ```json
//! {
//!   "version": "2.0",
//!   "encoding_version": "v3",
//!   "total_images": 1,
//!   "encoding_definitions": { "shot_size": { "a": "特写", ... }, ... },
//!   "files": [
//!     {
//!       "asset_path": "assets/images/pose_samples/0001-eaabbgcbbegd.jpg",
//!       "filename": "0001-eaabbgcbbegd.jpg",
//!       "sequence": "0001",
//!       "encoding": { "shot_size": { "code": "e", "name": "远景" }, ... },
//!       "full_code": "eaabbgcbbegd"
//!     }
//!   ]
//! }
//! ```
//!
//! Records are ordered by filename and the file carries no timestamp, so two
//! runs over an unchanged directory produce byte-identical output.
//!
//! ## Skipped files
//!
//! `.jpg` files whose names don't match `<sequence>-<code>.jpg` are left out of
//! the manifest and returned as [`SkippedFile`]s for the CLI to report.

use crate::atomic::write_atomic;
use crate::codec::{
    self, EncodedName, Encoding, EncodingDefinitions, Field, FieldCode, ParseError,
};
use crate::config::ManifestConfig;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Images directory not found: {0}")]
    MissingDirectory(PathBuf),
}

/// The top-level manifest document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub encoding_version: String,
    pub total_images: usize,
    pub encoding_definitions: EncodingDefinitions,
    pub files: Vec<ManifestRecord>,
}

impl Manifest {
    /// Wrap records with the current table snapshot. `total_images` always
    /// equals `files.len()`.
    pub fn new(files: Vec<ManifestRecord>, config: &ManifestConfig) -> Self {
        Self {
            version: config.version.clone(),
            encoding_version: config.encoding_version.clone(),
            total_images: files.len(),
            encoding_definitions: codec::encoding_definitions(),
            files,
        }
    }
}

/// One sample photo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestRecord {
    pub asset_path: String,
    pub filename: String,
    pub sequence: String,
    pub encoding: Encoding,
    /// The 12 letters re-joined from `encoding`; equals the filename's code.
    pub full_code: String,
    /// Auxiliary classification attached by downstream tooling. Never
    /// produced by a scan; kept intact when a manifest is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simple_tags: Option<BTreeMap<String, String>>,
}

impl ManifestRecord {
    pub fn from_encoded(filename: &str, name: EncodedName, asset_prefix: &str) -> Self {
        let full_code = name.encoding.full_code();
        Self {
            asset_path: asset_path(asset_prefix, filename),
            filename: filename.to_string(),
            sequence: name.sequence,
            encoding: name.encoding,
            full_code,
            simple_tags: None,
        }
    }
}

fn asset_path(prefix: &str, filename: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        filename.to_string()
    } else {
        format!("{}/{}", prefix, filename)
    }
}

/// Whether `asset_path` is `filename` itself or ends in `/filename`.
fn asset_path_names(asset_path: &str, filename: &str) -> bool {
    match asset_path.rsplit_once('/') {
        Some((_, last)) => last == filename,
        None => asset_path == filename,
    }
}

/// Why a candidate image was left out of the manifest.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    #[error("file name is not valid UTF-8")]
    NonUtf8Name,
    #[error(transparent)]
    Malformed(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub filename: String,
    pub reason: SkipReason,
}

/// Result of a scan: the manifest plus everything that didn't make it in.
#[derive(Debug)]
pub struct ScanOutcome {
    pub manifest: Manifest,
    pub skipped: Vec<SkippedFile>,
}

/// Scan `images_dir` for `.jpg` files and build the manifest.
///
/// Only regular files directly inside `images_dir` are considered. Files are
/// processed in filename order.
pub fn build_manifest(
    images_dir: &Path,
    config: &ManifestConfig,
) -> Result<ScanOutcome, ManifestError> {
    if !images_dir.is_dir() {
        return Err(ManifestError::MissingDirectory(images_dir.to_path_buf()));
    }

    let mut candidates = Vec::new();
    for entry in fs::read_dir(images_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_jpg = path
            .extension()
            .is_some_and(|e| e == codec::IMAGE_EXTENSION);
        if is_jpg && path.is_file() {
            candidates.push(entry.file_name());
        }
    }
    candidates.sort();

    let mut files = Vec::new();
    let mut skipped = Vec::new();
    for os_name in candidates {
        let Some(filename) = os_name.to_str() else {
            skipped.push(SkippedFile {
                filename: os_name.to_string_lossy().into_owned(),
                reason: SkipReason::NonUtf8Name,
            });
            continue;
        };
        match codec::parse_encoded_filename(filename) {
            Ok(name) => files.push(ManifestRecord::from_encoded(
                filename,
                name,
                &config.asset_prefix,
            )),
            Err(e) => skipped.push(SkippedFile {
                filename: filename.to_string(),
                reason: e.into(),
            }),
        }
    }

    Ok(ScanOutcome {
        manifest: Manifest::new(files, config),
        skipped,
    })
}

/// Render the manifest as indented JSON with a trailing newline.
///
/// Labels are written verbatim (no `\u` escapes).
pub fn to_json(manifest: &Manifest) -> Result<String, ManifestError> {
    let mut json = serde_json::to_string_pretty(manifest)?;
    json.push('\n');
    Ok(json)
}

/// Write the manifest to `path` in one atomic step.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
    let json = to_json(manifest)?;
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

pub fn load_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// An inconsistency found by [`check_manifest`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CheckIssue {
    #[error("total_images is {declared} but files has {actual} entries")]
    TotalMismatch { declared: usize, actual: usize },
    #[error("encoding_definitions differ from the built-in table")]
    DefinitionsMismatch,
    #[error("{filename}: listed more than once")]
    DuplicateFilename { filename: String },
    #[error("{filename}: {reason}")]
    UnparseableFilename { filename: String, reason: ParseError },
    #[error("{filename}: asset_path {asset_path:?} does not end with the filename")]
    AssetPathMismatch { filename: String, asset_path: String },
    #[error("{filename}: sequence is {found:?}, filename says {expected:?}")]
    SequenceMismatch {
        filename: String,
        expected: String,
        found: String,
    },
    #[error("{filename}: full_code is {found:?}, filename says {expected:?}")]
    FullCodeMismatch {
        filename: String,
        expected: String,
        found: String,
    },
    #[error("{filename}: {field} is {found:?}, expected {expected:?}")]
    EncodingMismatch {
        filename: String,
        field: Field,
        expected: Option<FieldCode>,
        found: Option<FieldCode>,
    },
}

/// Check a loaded manifest against its own filenames and the built-in table.
///
/// Returns every issue found; an empty list means the manifest is exactly what
/// a fresh scan of the same files would produce (ignoring `asset_path`
/// prefixes and `simple_tags`).
pub fn check_manifest(manifest: &Manifest) -> Vec<CheckIssue> {
    let mut issues = Vec::new();

    if manifest.total_images != manifest.files.len() {
        issues.push(CheckIssue::TotalMismatch {
            declared: manifest.total_images,
            actual: manifest.files.len(),
        });
    }
    if manifest.encoding_definitions != codec::encoding_definitions() {
        issues.push(CheckIssue::DefinitionsMismatch);
    }

    let mut seen = HashSet::new();
    for record in &manifest.files {
        let filename = &record.filename;
        if !seen.insert(filename.as_str()) {
            issues.push(CheckIssue::DuplicateFilename {
                filename: filename.clone(),
            });
        }
        if !asset_path_names(&record.asset_path, filename) {
            issues.push(CheckIssue::AssetPathMismatch {
                filename: filename.clone(),
                asset_path: record.asset_path.clone(),
            });
        }

        let parsed = match codec::parse_encoded_filename(filename) {
            Ok(parsed) => parsed,
            Err(reason) => {
                issues.push(CheckIssue::UnparseableFilename {
                    filename: filename.clone(),
                    reason,
                });
                continue;
            }
        };

        if record.sequence != parsed.sequence {
            issues.push(CheckIssue::SequenceMismatch {
                filename: filename.clone(),
                expected: parsed.sequence.clone(),
                found: record.sequence.clone(),
            });
        }
        if record.full_code != parsed.code {
            issues.push(CheckIssue::FullCodeMismatch {
                filename: filename.clone(),
                expected: parsed.code.clone(),
                found: record.full_code.clone(),
            });
        }
        for field in Field::ALL {
            let expected = parsed.encoding.get(field);
            let found = record.encoding.get(field);
            if expected != found {
                issues.push(CheckIssue::EncodingMismatch {
                    filename: filename.clone(),
                    field,
                    expected: expected.cloned(),
                    found: found.cloned(),
                });
            }
        }
    }

    issues
}
