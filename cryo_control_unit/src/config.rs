//! TOML configuration loader with validation.
//!
//! One file carries the `[shared]` service section and the tuning sections
//! of `CryoConfig` (`[controller]`, `[planner]`, `[detector]`, `[history]`,
//! `[cycle]`). Every section and field is optional.

use std::path::Path;

use cryo_common::config::SharedConfig;
use cryo_common::control_unit::config::CryoConfig;
use serde::Deserialize;
use thiserror::Error;

// ─── Error Type ─────────────────────────────────────────────────────

/// Configuration loading/validation error.
#[derive(Debug, Error)]
pub enum LoadError {
    /// File I/O error.
    #[error("config I/O error: {0}")]
    Io(String),
    /// TOML parse error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Parameter validation error.
    #[error("config validation: {0}")]
    Validation(String),
}

// ─── Loaded Config Bundle ───────────────────────────────────────────

/// Complete validated configuration bundle, ready for runtime use.
#[derive(Debug, Clone, Default)]
pub struct LoadedConfig {
    pub shared: SharedConfig,
    pub cryo: CryoConfig,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    shared: SharedConfig,
    #[serde(flatten)]
    cryo: CryoConfig,
}

// ─── Loading Functions ──────────────────────────────────────────────

/// Load and validate the configuration file at `path`.
pub fn load_config(path: &Path) -> Result<LoadedConfig, LoadError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| LoadError::Io(format!("failed to read {}: {e}", path.display())))?;
    load_config_from_str(&text)
}

/// Load and validate configuration from a TOML string.
pub fn load_config_from_str(text: &str) -> Result<LoadedConfig, LoadError> {
    let file: ConfigFile = toml::from_str(text).map_err(|e| LoadError::Parse(e.to_string()))?;

    file.shared
        .validate()
        .map_err(|e| LoadError::Validation(e.to_string()))?;
    file.cryo.validate().map_err(LoadError::Validation)?;

    Ok(LoadedConfig {
        shared: file.shared,
        cryo: file.cryo,
    })
}
