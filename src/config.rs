//! Editor configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are the base layer; a user `config.toml` overrides only the keys it names.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [scaling]
//! max_dimension = 8192   # Largest accepted width or height
//! high_quality = true    # Lanczos when shrinking (nearest otherwise)
//! lobes = 3              # Lanczos lobes (1-8)
//! slice_budget = 32      # Rows/columns resampled per pump
//! parallel = false       # Run resampling passes on the worker pool
//!
//! [crop]
//! inset = 20             # Initial selection margin from the raster edge
//! handle_size = 6        # Corner hit window at rest
//! hover_handle_size = 10 # Corner hit window while hovered
//!
//! [dimensions]
//! aspect_lock = true     # Editing one dimension recomputes the other
//!
//! [history]
//! max_restore_points = 32 # 0 keeps every restore point
//!
//! [processing]
//! max_processes = 4      # Max worker threads (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Editor configuration loaded from `config.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EditorConfig {
    /// Resampling limits and path selection.
    pub scaling: ScalingConfig,
    /// Crop selection geometry.
    pub crop: CropConfig,
    /// Initial dimension-sync state.
    pub dimensions: DimensionsConfig,
    /// Restore-point retention.
    pub history: HistoryConfig,
    /// Worker pool settings for the parallel resampling path.
    pub processing: ProcessingConfig,
}

impl EditorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.scaling.max_dimension == 0 {
            return Err(ConfigError::Validation(
                "scaling.max_dimension must be non-zero".into(),
            ));
        }
        if !(1..=8).contains(&self.scaling.lobes) {
            return Err(ConfigError::Validation(
                "scaling.lobes must be 1-8".into(),
            ));
        }
        if self.scaling.slice_budget == 0 {
            return Err(ConfigError::Validation(
                "scaling.slice_budget must be non-zero".into(),
            ));
        }
        if self.crop.handle_size == 0 {
            return Err(ConfigError::Validation(
                "crop.handle_size must be non-zero".into(),
            ));
        }
        if self.crop.hover_handle_size < self.crop.handle_size {
            return Err(ConfigError::Validation(
                "crop.hover_handle_size must be at least crop.handle_size".into(),
            ));
        }
        Ok(())
    }
}

/// Resampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScalingConfig {
    /// Largest accepted target width or height, in pixels.
    pub max_dimension: u32,
    /// Use Lanczos when shrinking. Growth always uses nearest-neighbor.
    pub high_quality: bool,
    /// Lanczos lobes.
    pub lobes: u32,
    /// Rows or columns resampled per `pump` call.
    pub slice_budget: usize,
    /// Resample on the worker pool instead of in slices.
    pub parallel: bool,
}

impl Default for ScalingConfig {
    fn default() -> Self {
        Self {
            max_dimension: 8192,
            high_quality: true,
            lobes: 3,
            slice_budget: 32,
            parallel: false,
        }
    }
}

/// Crop selection geometry, in raster pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CropConfig {
    /// Margin between the raster edge and the initial selection.
    pub inset: u32,
    /// Half-width of a corner's hit window at rest.
    pub handle_size: u32,
    /// Half-width of a corner's hit window while hovered. A selection must
    /// stay larger than twice this on both axes.
    pub hover_handle_size: u32,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            inset: 20,
            handle_size: 6,
            hover_handle_size: 10,
        }
    }
}

/// Initial state of the dimension fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DimensionsConfig {
    pub aspect_lock: bool,
}

impl Default for DimensionsConfig {
    fn default() -> Self {
        Self { aspect_lock: true }
    }
}

/// Restore-point retention.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HistoryConfig {
    /// Oldest restore points are dropped past this count. 0 keeps all.
    pub max_restore_points: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_restore_points: 32,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of resampling worker threads.
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
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(EditorConfig::default())?)
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

/// Load a `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<EditorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: EditorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<EditorConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# cropkit Configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Each file only needs the keys it wants to override.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Scaling
# ---------------------------------------------------------------------------
[scaling]
# Largest accepted target width or height, in pixels. Larger requests are
# rejected instead of allocating.
max_dimension = 8192

# Shrink with two-pass Lanczos resampling. When false, shrinking uses
# nearest-neighbor like growth does.
high_quality = true

# Lanczos lobes (1-8). More lobes keep more detail and cost more.
lobes = 3

# Rows or columns resampled per pump while a Lanczos job is in flight.
slice_budget = 32

# Resample on the worker pool in one go instead of in cooperative slices.
parallel = false

# ---------------------------------------------------------------------------
# Crop selection
# ---------------------------------------------------------------------------
[crop]
# Margin between the raster edge and the initial selection.
inset = 20

# Half-width of a corner handle's hit window at rest.
handle_size = 6

# Half-width of a corner handle's hit window while hovered. The selection
# must stay larger than twice this value on both axes.
hover_handle_size = 10

# ---------------------------------------------------------------------------
# Dimensions
# ---------------------------------------------------------------------------
[dimensions]
# Editing width recomputes height from the original aspect ratio, and
# the other way round.
aspect_lock = true

# ---------------------------------------------------------------------------
# History
# ---------------------------------------------------------------------------
[history]
# Restore points kept before the oldest are dropped. 0 keeps all of them.
max_restore_points = 32

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum worker threads for parallel resampling.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
