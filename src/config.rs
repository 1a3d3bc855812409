//! Tool configuration.
//!
//! Settings live in an optional `pose-manifest.toml` (path set with the global
//! `--config` flag). The file is sparse: values it sets are merged on top of
//! the stock defaults, then command-line flags override both.
//!
//! ```text
//! stock defaults  ←  pose-manifest.toml  ←  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! images_dir = "assets/images/pose_samples"  # Encoded sample photos
//!
//! [manifest]
//! output = "assets/images/asset_manifest.json"
//! asset_prefix = "assets/images/pose_samples"  # Prepended to each filename
//! version = "2.0"
//! encoding_version = "v3"
//!
//! [compress]
//! quality = 75      # JPEG quality (1-95)
//! max_size = 1200   # Longest edge in pixels (0 = never resize)
//! workers = 8       # Parallel workers, capped at the CPU core count
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Highest JPEG quality accepted. Above this the encoder mostly grows files.
pub const MAX_QUALITY: u32 = 95;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Top-level configuration loaded from `pose-manifest.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToolConfig {
    /// Directory holding the encoded `<sequence>-<code>.jpg` sample photos.
    pub images_dir: PathBuf,
    /// Manifest generation settings.
    pub manifest: ManifestConfig,
    /// In-place compression settings.
    pub compress: CompressionConfig,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            images_dir: PathBuf::from("assets/images/pose_samples"),
            manifest: ManifestConfig::default(),
            compress: CompressionConfig::default(),
        }
    }
}

impl ToolConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.manifest.version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest.version must not be empty".into(),
            ));
        }
        if self.manifest.encoding_version.trim().is_empty() {
            return Err(ConfigError::Validation(
                "manifest.encoding_version must not be empty".into(),
            ));
        }
        if self.compress.quality == 0 || self.compress.quality > MAX_QUALITY {
            return Err(ConfigError::Validation(format!(
                "compress.quality must be 1-{MAX_QUALITY}"
            )));
        }
        if self.compress.workers == 0 {
            return Err(ConfigError::Validation(
                "compress.workers must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Manifest generation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Where `asset_manifest.json` is written.
    pub output: PathBuf,
    /// Prefix for each record's `asset_path`, as the app bundles it.
    pub asset_prefix: String,
    /// Manifest format version.
    pub version: String,
    /// Version of the positional encoding table.
    pub encoding_version: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("assets/images/asset_manifest.json"),
            asset_prefix: "assets/images/pose_samples".to_string(),
            version: "2.0".to_string(),
            encoding_version: "v3".to_string(),
        }
    }
}

/// In-place JPEG compression settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// JPEG quality, 1-95.
    pub quality: u32,
    /// Longest allowed edge in pixels. `0` disables resizing.
    pub max_size: u32,
    /// Maximum parallel workers. Values above the core count are clamped down.
    pub workers: usize,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            quality: 75,
            max_size: 1200,
            workers: 8,
        }
    }
}

/// Resolve the effective worker count: `min(workers, cores)`.
///
/// The user can constrain parallelism down, not up.
pub fn effective_threads(config: &CompressionConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.workers.clamp(1, cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(ToolConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load config from `path` merged over stock defaults, without validating.
///
/// A missing file is not an error: the stock defaults are returned. Callers
/// that layer CLI flags on top validate once they are applied.
pub fn load_merged_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = if path.exists() {
        let content = fs::read_to_string(path)?;
        let overlay: toml::Value = toml::from_str(&content)?;
        merge_toml(base, overlay)
    } else {
        base
    };
    let config: ToolConfig = merged.try_into()?;
    Ok(config)
}

/// Load config from `path`, merged over stock defaults and validated.
pub fn load_config(path: &Path) -> Result<ToolConfig, ConfigError> {
    let config = load_merged_config(path)?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `pose-manifest.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# pose-manifest configuration
# ===========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Command-line flags override them.
# Unknown keys will cause an error.

# Directory holding the encoded sample photos (<sequence>-<code>.jpg).
images_dir = "assets/images/pose_samples"

# ---------------------------------------------------------------------------
# Manifest generation (`pose-manifest manifest`)
# ---------------------------------------------------------------------------
[manifest]
# Output path of the generated manifest.
output = "assets/images/asset_manifest.json"

# Prefix joined with each filename to form the record's asset_path.
asset_prefix = "assets/images/pose_samples"

# Version tags written at the top of the manifest.
version = "2.0"
encoding_version = "v3"

# ---------------------------------------------------------------------------
# In-place compression (`pose-manifest compress`)
# ---------------------------------------------------------------------------
[compress]
# JPEG quality (1 = worst, 95 = best).
quality = 75

# Longest edge in pixels; larger images are scaled down. 0 disables resizing.
max_size = 1200

# Maximum parallel workers, capped at the number of CPU cores.
workers = 8
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = ToolConfig::default();
        assert_eq!(config.images_dir, PathBuf::from("assets/images/pose_samples"));
        assert_eq!(config.manifest.version, "2.0");
        assert_eq!(config.manifest.encoding_version, "v3");
        assert_eq!(config.compress.quality, 75);
        assert_eq!(config.compress.max_size, 1200);
        assert_eq!(config.compress.workers, 8);
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[compress]
quality = 60
"#;
        let config: ToolConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.compress.quality, 60);
        // Defaults preserved
        assert_eq!(config.compress.max_size, 1200);
        assert_eq!(config.manifest.asset_prefix, "assets/images/pose_samples");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("pose-manifest.toml")).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pose-manifest.toml");
        fs::write(
            &path,
            r#"
images_dir = "photos"

[manifest]
asset_prefix = "assets/photos"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.images_dir, PathBuf::from("photos"));
        assert_eq!(config.manifest.asset_prefix, "assets/photos");
        assert_eq!(config.manifest.version, "2.0");
    }

    #[test]
    fn invalid_file_value_can_be_overridden_before_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pose-manifest.toml");
        fs::write(&path, "[compress]\nquality = 0\n").unwrap();

        assert!(matches!(
            load_config(&path),
            Err(ConfigError::Validation(_))
        ));

        let mut config = load_merged_config(&path).unwrap();
        assert_eq!(config.compress.quality, 0);
        config.compress.quality = 80;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pose-manifest.toml");
        fs::write(&path, "[compress]\nqualty = 80\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("pose-manifest.toml");
        fs::write(&path, "[compress\n").unwrap();

        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_quality_range() {
        let mut config = ToolConfig::default();
        config.compress.quality = 0;
        assert!(config.validate().is_err());
        config.compress.quality = 96;
        assert!(config.validate().is_err());
        config.compress.quality = 95;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_workers() {
        let mut config = ToolConfig::default();
        config.compress.workers = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_empty_versions() {
        let mut config = ToolConfig::default();
        config.manifest.encoding_version = " ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_max_size_is_valid() {
        let mut config = ToolConfig::default();
        config.compress.max_size = 0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn merge_toml_overlay_wins_and_base_preserved() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let config: ToolConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config, ToolConfig::default());
    }

    #[test]
    fn effective_threads_never_exceeds_cores() {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        let config = CompressionConfig {
            workers: usize::MAX,
            ..Default::default()
        };
        assert_eq!(effective_threads(&config), cores);

        let config = CompressionConfig {
            workers: 1,
            ..Default::default()
        };
        assert_eq!(effective_threads(&config), 1);
    }
}
