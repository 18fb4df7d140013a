//! Tool settings.
//!
//! Handles loading, validating, and merging `sempipe.toml`. These are
//! settings of the tool itself, not of the site: everything about resources,
//! representations and hosted spaces lives in the graph configuration
//! (`sempipeconf.n3` and the documents it imports).
//!
//! ## Config File Location
//!
//! ```text
//! project/
//! ├── sempipe.toml          # Tool settings (optional)
//! ├── sempipeconf.n3        # Root configuration document
//! └── ...
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! conf_file = "sempipeconf.n3"   # Root configuration document
//!
//! [processing]
//! max_processes = 4              # Max parallel builds (omit for auto = CPU cores)
//!
//! [transform]
//! command = ["xsltproc", "{stylesheet}", "-"]
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use crate::render::default_transform_command;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Name of the settings file within the project directory.
pub const SETTINGS_FILENAME: &str = "sempipe.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML encode error: {0}")]
    TomlEncode(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Settings loaded from `sempipe.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Root configuration document, relative to the project directory.
    pub conf_file: String,
    /// Parallel build settings.
    pub processing: ProcessingConfig,
    /// How `semp:transformation` steps are executed.
    pub transform: TransformConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            conf_file: "sempipeconf.n3".to_string(),
            processing: ProcessingConfig::default(),
            transform: TransformConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.conf_file.trim().is_empty() {
            return Err(ConfigError::Validation("conf_file must not be empty".into()));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be at least 1".into(),
            ));
        }
        if self.transform.command.is_empty() {
            return Err(ConfigError::Validation(
                "transform.command must not be empty".into(),
            ));
        }
        if !self.transform.command.iter().any(|a| a.contains("{stylesheet}")) {
            return Err(ConfigError::Validation(
                "transform.command must contain a {stylesheet} placeholder".into(),
            ));
        }
        Ok(())
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of resources built in parallel.
    /// When absent, defaults to the number of CPU cores.
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

/// Transformation step execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformConfig {
    /// Program and arguments; `{stylesheet}` is replaced by the step.
    pub command: Vec<String>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            command: default_transform_command(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(PipelineConfig::default())?)
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

/// Load `sempipe.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let path = dir.join(SETTINGS_FILENAME);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Load settings from the project directory, layered over stock defaults,
/// and validate the result.
pub fn load_config(dir: &Path) -> Result<PipelineConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match load_raw_config(dir)? {
        Some(overlay) => merge_toml(base, overlay),
        None => base,
    };
    let config: PipelineConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Returns a fully-commented stock `sempipe.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# SemPipe tool settings
# =====================
# All settings are optional. Values shown below are the defaults.
# Resources, representations and hosted spaces are configured in the
# graph configuration, not here. Unknown keys will cause an error.

# Root configuration document, relative to the project directory.
conf_file = "sempipeconf.n3"

# ---------------------------------------------------------------------------
# Parallel builds
# ---------------------------------------------------------------------------
[processing]
# Maximum number of resources built at the same time.
# Omit to use one worker per CPU core. Larger values are clamped down.
# max_processes = 4

# ---------------------------------------------------------------------------
# Transformation steps
# ---------------------------------------------------------------------------
[transform]
# Command run for each semp:transformation step. The document is piped to
# stdin and the result read from stdout. {stylesheet} is replaced by the
# step (a local path for file: IRIs).
command = ["xsltproc", "{stylesheet}", "-"]
"##
}
