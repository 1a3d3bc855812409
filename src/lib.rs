//! # pose-manifest
//!
//! Offline tooling for the pose reference app's bundled sample photos.
//!
//! Every sample photo is named `<sequence>-<code>.jpg`, where `code` is twelve
//! letters, one per attribute (shot size, composition, angle, ... style). The
//! app never parses filenames itself; it reads a single JSON manifest that
//! lists every photo with its attributes already decoded into labels.
//!
//! ```text
//! 1. compress   pose_samples/*.jpg  →  pose_samples/*.jpg     (in place)
//! 2. manifest   pose_samples/       →  asset_manifest.json
//! 3. check      asset_manifest.json →  issues (if any)
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`codec`] | The 12-position code table, filename parsing, and decoding |
//! | [`manifest`] | Directory scan → manifest, JSON output, and consistency check |
//! | [`compress`] | Parallel in-place JPEG downscale and re-encode |
//! | [`imaging`] | Backend trait, dimension math, and the `image`-crate backend |
//! | [`cache`] | Content hashes that let `compress` skip already-compressed files |
//! | [`config`] | `pose-manifest.toml` loading, merging over defaults, validation |
//! | [`atomic`] | Temp-file-and-rename writes |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Rebuilt, Never Patched
//!
//! The manifest is regenerated from the directory listing every time. Records
//! are sorted by filename and the file carries no timestamp, so an unchanged
//! directory always produces a byte-identical manifest and a clean diff.
//!
//! ## Unknown Letters Are Data, Not Errors
//!
//! A letter with no entry in its field's table decodes to `未知` but keeps its
//! letter, so `full_code` always equals the code in the filename. Only
//! structurally broken names (wrong segment count, non-numeric sequence,
//! wrong code length) are left out, and those are reported by name.

pub mod atomic;
pub mod cache;
pub mod codec;
pub mod compress;
pub mod config;
pub mod imaging;
pub mod manifest;
pub mod output;

#[cfg(test)]
pub(crate) mod test_helpers;
