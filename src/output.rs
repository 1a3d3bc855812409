//! CLI output formatting for every subcommand.
//!
//! # Information-First Display
//!
//! The primary display for every image is its positional index and its
//! identity (sequence number and code). Filesystem details are secondary
//! context on indented lines. Anything that was left out or went wrong is
//! listed by name, never just counted.
//!
//! # Output Format
//!
//! ## Manifest
//!
//! ```text
//! Images
//! 001 #0001 aaaaaaaaaaaa
//!     Source: 0001-aaaaaaaaaaaa.jpg
//! 002 #0002 zzzzzzzzzzzz
//!     Source: 0002-zzzzzzzzzzzz.jpg
//!     Unknown: shot_size (z), composition (z), ...
//!
//! Skipped
//!     cover.jpg: expected <sequence>-<code>, found 1 dash-separated segment(s)
//!
//! Wrote 2 images → assets/images/asset_manifest.json
//! ```
//!
//! ## Compress
//!
//! ```text
//! Compressing 250 images (quality 75, max 1200px)
//!     Progress: 100/250
//!     FAILED 0042-eaabbgcbbegd.jpg: Processing failed: ...
//!     Progress: 250/250
//! Compressed 249/250 images (1 failed)
//! Cache: 10 cached, 239 compressed (249 total)
//! Original: 180.20 MB
//! Compressed: 56.75 MB
//! Saved 123.45 MB (68.5%)
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::codec::UNKNOWN_LABEL;
use crate::compress::{CompressEvent, CompressReport, PlannedFile, to_mb};
use crate::manifest::{CheckIssue, Manifest, ManifestRecord, ScanOutcome, SkippedFile};
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}

/// Header line for a manifest record.
///
/// ```text
/// 001 #0001 eaabbgcbbegd
/// ```
fn record_header(index: usize, record: &ManifestRecord) -> String {
    format!(
        "{} #{} {}",
        format_index(index),
        record.sequence,
        record.full_code
    )
}

/// Fields whose letter has no label, as `field (letter)`.
fn unknown_fields(record: &ManifestRecord) -> Vec<String> {
    record
        .encoding
        .iter()
        .filter(|(_, fc)| fc.name == UNKNOWN_LABEL)
        .map(|(field, fc)| format!("{} ({})", field, fc.code))
        .collect()
}

fn skipped_lines(skipped: &[SkippedFile]) -> Vec<String> {
    if skipped.is_empty() {
        return Vec::new();
    }
    let mut lines = vec![String::new(), "Skipped".to_string()];
    for file in skipped {
        lines.push(format!("{}{}: {}", indent(1), file.filename, file.reason));
    }
    lines
}

// ============================================================================
// manifest
// ============================================================================

/// Format the result of building and writing a manifest.
pub fn format_manifest_output(outcome: &ScanOutcome, output_path: &Path) -> Vec<String> {
    let manifest = &outcome.manifest;
    let mut lines = vec!["Images".to_string()];

    for (i, record) in manifest.files.iter().enumerate() {
        lines.push(record_header(i + 1, record));
        lines.push(format!("{}Source: {}", indent(1), record.filename));
        let unknown = unknown_fields(record);
        if !unknown.is_empty() {
            lines.push(format!("{}Unknown: {}", indent(1), unknown.join(", ")));
        }
    }

    lines.extend(skipped_lines(&outcome.skipped));

    lines.push(String::new());
    lines.push(format!(
        "Wrote {} → {}",
        plural(manifest.total_images, "image"),
        output_path.display()
    ));
    lines
}

pub fn print_manifest_output(outcome: &ScanOutcome, output_path: &Path) {
    for line in format_manifest_output(outcome, output_path) {
        println!("{}", line);
    }
}

// ============================================================================
// check
// ============================================================================

pub fn format_check_output(path: &Path, manifest: &Manifest, issues: &[CheckIssue]) -> Vec<String> {
    if issues.is_empty() {
        return vec![format!(
            "OK {}: {}, encoding {}",
            path.display(),
            plural(manifest.files.len(), "image"),
            manifest.encoding_version
        )];
    }

    let mut lines = vec![format!(
        "{}: {}",
        path.display(),
        plural(issues.len(), "issue")
    )];
    for issue in issues {
        lines.push(format!("{}{}", indent(1), issue));
    }
    lines
}

pub fn print_check_output(path: &Path, manifest: &Manifest, issues: &[CheckIssue]) {
    for line in format_check_output(path, manifest, issues) {
        println!("{}", line);
    }
}

// ============================================================================
// compress
// ============================================================================

/// Format a single compression progress event as display lines.
pub fn format_compress_event(event: &CompressEvent) -> Vec<String> {
    match event {
        CompressEvent::Started {
            total,
            quality,
            max_size,
        } => {
            let size = match max_size {
                0 => "no resize".to_string(),
                px => format!("max {}px", px),
            };
            vec![format!(
                "Compressing {} (quality {}, {})",
                plural(*total, "image"),
                quality,
                size
            )]
        }
        CompressEvent::Progress { done, total } => {
            vec![format!("{}Progress: {}/{}", indent(1), done, total)]
        }
        CompressEvent::Failed { filename, reason } => {
            vec![format!("{}FAILED {}: {}", indent(1), filename, reason)]
        }
    }
}

/// Final summary after a compression run.
pub fn format_compress_summary(report: &CompressReport) -> Vec<String> {
    let failed = report.total() - report.succeeded();
    let mut lines = Vec::new();

    let mut headline = format!(
        "Compressed {}/{} images",
        report.succeeded(),
        report.total()
    );
    if failed > 0 {
        headline.push_str(&format!(" ({} failed)", failed));
    }
    lines.push(headline);
    lines.push(format!("Cache: {}", report.cache_stats));
    let (before, after) = report.byte_totals();
    lines.push(format!("Original: {:.2} MB", to_mb(before)));
    lines.push(format!("Compressed: {:.2} MB", to_mb(after)));
    let mut saved = format!("Saved {:.2} MB", report.saved_mb());
    if let Some(percent) = report.saved_percent() {
        saved.push_str(&format!(" ({:.1}%)", percent));
    }
    lines.push(saved);
    lines
}

pub fn print_compress_summary(report: &CompressReport) {
    for line in format_compress_summary(report) {
        println!("{}", line);
    }
}

/// Format a dry-run plan: one header per file with its size change.
///
/// ```text
/// 001 0001-eaabbgcbbegd.jpg
///     4000x3000 → 1200x900
/// 002 0002-eaabbgcbbegd.jpg
///     800x600 (size unchanged), cached
/// ```
pub fn format_dry_run(planned: &[PlannedFile]) -> Vec<String> {
    let mut lines = vec![format!(
        "Dry run: {}, nothing written",
        plural(planned.len(), "image")
    )];

    for (i, file) in planned.iter().enumerate() {
        lines.push(format!("{} {}", format_index(i + 1), file.filename));
        let mut detail = match &file.plan {
            Ok(plan) if plan.resizes() => format!(
                "{}x{} → {}x{}",
                plan.original.0, plan.original.1, plan.target.0, plan.target.1
            ),
            Ok(plan) => format!(
                "{}x{} (size unchanged)",
                plan.original.0, plan.original.1
            ),
            Err(reason) => format!("unreadable: {}", reason),
        };
        if file.cached {
            detail.push_str(", cached");
        }
        lines.push(format!("{}{}", indent(1), detail));
    }
    lines
}

pub fn print_dry_run(planned: &[PlannedFile]) {
    for line in format_dry_run(planned) {
        println!("{}", line);
    }
}
