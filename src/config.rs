//! Gallery configuration module.
//!
//! Handles loading, validating, and merging `gallery.toml` files. Stock
//! defaults are overridden by whatever keys the user file sets.
//!
//! ## Config File Location
//!
//! `gallery.toml` is looked up in the picked folder itself, or passed
//! explicitly with `--config`.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scan]
//! batch_size = 5            # Records per incremental batch
//! batch_pause_ms = 10       # Pause after each batch so consumers keep up
//!
//! [thumbnails]
//! profile = "compact"       # "compact" (320x240 JPEG) or "lossless" (400x300 PNG)
//! device_pixel_ratio = 1.0  # Render density, capped at 2
//!
//! [cache]
//! capacity = 200            # Thumbnails kept in memory
//!
//! [export]
//! compression_level = 6     # Deflate level (1-9)
//!
//! [memory]
//! notice_mb = 200           # Tell the user above this estimate
//! warn_mb = 300             # Log a warning above this estimate
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! ## Partial Configuration
//!
//! Config files are sparse; override just the values you want:
//!
//! ```toml
//! [thumbnails]
//! profile = "lossless"
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::ThumbnailProfile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Name of the per-folder config file.
pub const CONFIG_FILENAME: &str = "gallery.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Gallery configuration loaded from `gallery.toml`.
///
/// All fields have sensible defaults. User config files need only specify
/// the values they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Incremental delivery pacing.
    pub scan: ScanConfig,
    /// Thumbnail size/format profile and render density.
    pub thumbnails: ThumbnailsConfig,
    /// Thumbnail cache bound.
    pub cache: CacheConfig,
    /// Archive settings.
    pub export: ExportConfig,
    /// Memory estimate thresholds.
    pub memory: MemoryConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scan.batch_size == 0 {
            return Err(ConfigError::Validation(
                "scan.batch_size must be at least 1".into(),
            ));
        }
        if self.cache.capacity == 0 {
            return Err(ConfigError::Validation(
                "cache.capacity must be at least 1".into(),
            ));
        }
        if !(1..=9).contains(&self.export.compression_level) {
            return Err(ConfigError::Validation(
                "export.compression_level must be 1-9".into(),
            ));
        }
        let dpr = self.thumbnails.device_pixel_ratio;
        if !dpr.is_finite() || dpr <= 0.0 {
            return Err(ConfigError::Validation(
                "thumbnails.device_pixel_ratio must be positive".into(),
            ));
        }
        if self.memory.warn_mb < self.memory.notice_mb {
            return Err(ConfigError::Validation(
                "memory.warn_mb must not be below memory.notice_mb".into(),
            ));
        }
        Ok(())
    }
}

/// Incremental delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Records delivered per batch.
    pub batch_size: usize,
    /// Pause after each batch, in milliseconds. 0 only yields the thread.
    pub batch_pause_ms: u64,
}

impl ScanConfig {
    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.batch_pause_ms)
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            batch_size: 5,
            batch_pause_ms: 10,
        }
    }
}

/// Thumbnail rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThumbnailsConfig {
    pub profile: ThumbnailProfile,
    /// Render density multiplier; values above 2 are capped at render time.
    pub device_pixel_ratio: f32,
}

impl Default for ThumbnailsConfig {
    fn default() -> Self {
        Self {
            profile: ThumbnailProfile::Compact,
            device_pixel_ratio: 1.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CacheConfig {
    /// Maximum number of thumbnails kept in memory.
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { capacity: 200 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExportConfig {
    /// Deflate level, 1 (fastest) to 9 (smallest).
    pub compression_level: i64,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            compression_level: 6,
        }
    }
}

/// Thresholds for the advisory memory estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MemoryConfig {
    pub notice_mb: u64,
    pub warn_mb: u64,
}

impl MemoryConfig {
    pub fn notice_bytes(&self) -> u64 {
        self.notice_mb * 1024 * 1024
    }

    pub fn warn_bytes(&self) -> u64 {
        self.warn_mb * 1024 * 1024
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            notice_mb: 200,
            warn_mb: 300,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel decode workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(file: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !file.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load `gallery.toml` from the given folder, falling back to defaults.
pub fn load_config(folder: &Path) -> Result<GalleryConfig, ConfigError> {
    resolve_config(load_raw_config(&folder.join(CONFIG_FILENAME))?)
}

/// Load an explicitly named config file. A missing file is an error.
pub fn load_config_file(file: &Path) -> Result<GalleryConfig, ConfigError> {
    let content = fs::read_to_string(file)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `gallery.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Gallery Pick Configuration
# ==========================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file as gallery.toml in the folder you scan, or pass it
# with --config. Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Scanning
# ---------------------------------------------------------------------------
[scan]
# Records delivered to the display per incremental batch.
batch_size = 5

# Pause after each batch, in milliseconds. 0 only yields the thread.
batch_pause_ms = 10

# ---------------------------------------------------------------------------
# Thumbnails
# ---------------------------------------------------------------------------
[thumbnails]
# "compact":  fits 320x240, JPEG quality 90 (small, bounded memory)
# "lossless": fits 400x300, PNG (sharper, several times larger)
profile = "compact"

# Render density multiplier. Values above 2 are capped.
device_pixel_ratio = 1.0

# ---------------------------------------------------------------------------
# Thumbnail cache
# ---------------------------------------------------------------------------
[cache]
# Thumbnails kept in memory; least recently used are dropped first.
capacity = 200

# ---------------------------------------------------------------------------
# Export
# ---------------------------------------------------------------------------
[export]
# Deflate level, 1 (fastest) to 9 (smallest).
compression_level = 6

# ---------------------------------------------------------------------------
# Memory estimate
# ---------------------------------------------------------------------------
[memory]
# Tell the user when the estimate passes this many megabytes.
notice_mb = 200

# Log a warning when the estimate passes this many megabytes.
warn_mb = 300

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel decode workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
