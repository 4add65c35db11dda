//! Configuration schema for the data manager
//!
//! Configuration is stored at `~/.config/tts-mcp/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Durable storage settings
    pub storage: StorageConfig,

    /// Propagation settings
    pub propagation: PropagationConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Durable storage configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding store and session records (defaults to the
    /// platform state directory)
    pub data_dir: Option<PathBuf>,
}

/// Propagation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PropagationConfig {
    /// Recompute dependents automatically after each write
    pub enabled: bool,

    /// Timeout for a single compute hook call, in milliseconds
    pub hook_timeout_ms: u64,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            hook_timeout_ms: 10_000,
        }
    }
}
