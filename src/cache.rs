//! Compression cache for repeat runs.
//!
//! `compress` rewrites each JPEG in place, so running it twice would
//! re-encode already-compressed images and lose a little more quality every
//! time. This module remembers what each file looked like right after we
//! wrote it, and lets the next run skip files that are byte-for-byte what
//! we left behind.
//!
//! ## Cache keys
//!
//! Entries are keyed by file name within the images directory.
//!
//! - **`output_hash`**: SHA-256 of the file contents as written by the last
//!   compression. Content-based rather than mtime-based so it survives
//!   `git checkout` (which resets modification times). If someone replaces
//!   the photo with a new original, the hash no longer matches and the file
//!   is compressed again.
//!
//! - **`params_hash`**: SHA-256 of (quality, max size). Changing either
//!   setting recompresses everything.
//!
//! ## Storage
//!
//! The cache is a JSON file at `<images_dir>/.compress-cache.json`. It is
//! not a `.jpg`, so neither the manifest scan nor the compressor picks it up.
//!
//! ## Bypassing the cache
//!
//! `--no-cache` loads an empty cache, so every image is recompressed. The
//! fresh cache is still written afterwards.

use crate::atomic::write_atomic;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache file within the images directory.
pub const CACHE_FILENAME: &str = ".compress-cache.json";

/// Bump to invalidate all existing caches when the key computation changes.
const CACHE_VERSION: u32 = 1;

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub output_hash: String,
    pub params_hash: String,
}

/// On-disk cache mapping file names to the state we last left them in.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CompressCache {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CompressCache {
    /// Create an empty cache (used for `--no-cache` or a first run).
    pub fn empty() -> Self {
        Self {
            version: CACHE_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the images directory. Returns an empty cache if the file
    /// doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(images_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(cache_path(images_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(cache) if cache.version == CACHE_VERSION => cache,
            _ => Self::empty(),
        }
    }

    pub fn save(&self, images_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        write_atomic(&cache_path(images_dir), json.as_bytes())
    }

    /// True when `filename` was compressed with `params_hash` and has not
    /// changed since.
    pub fn is_current(&self, filename: &str, content_hash: &str, params_hash: &str) -> bool {
        self.entries.get(filename).is_some_and(|entry| {
            entry.output_hash == content_hash && entry.params_hash == params_hash
        })
    }

    pub fn insert(&mut self, filename: String, output_hash: String, params_hash: String) {
        self.entries.insert(
            filename,
            CacheEntry {
                output_hash,
                params_hash,
            },
        );
    }

    pub fn remove(&mut self, filename: &str) {
        self.entries.remove(filename);
    }

    /// Drop entries for files that are no longer in the directory.
    pub fn retain_files<'a>(&mut self, present: impl IntoIterator<Item = &'a str>) {
        let present: std::collections::BTreeSet<&str> = present.into_iter().collect();
        self.entries.retain(|name, _| present.contains(name.as_str()));
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    Ok(hash_bytes(&bytes))
}

pub fn hash_bytes(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// SHA-256 hash of the compression settings.
pub fn hash_compress_params(quality: u8, max_size: u32) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"jpeg\0");
    hasher.update([quality]);
    hasher.update(max_size.to_le_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a compression run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} compressed ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} compressed", self.misses)
        }
    }
}

/// Resolve the cache file path for an images directory.
pub fn cache_path(images_dir: &Path) -> PathBuf {
    images_dir.join(CACHE_FILENAME)
}
