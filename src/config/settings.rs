//! User settings and preferences
//!
//! Manages settings stored in ~/.sqlhint/config.toml

use crate::error::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Engine and CLI settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Catalog to assume when the backend cannot report its default
    #[serde(default)]
    pub fallback_catalog: Option<String>,

    /// Schema to assume when the backend cannot report its default
    #[serde(default)]
    pub fallback_schema: Option<String>,

    /// Functions suggested in addition to the built-in list
    #[serde(default)]
    pub extra_functions: Vec<String>,

    /// `tracing` filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_catalog: None,
            fallback_schema: None,
            extra_functions: Vec::new(),
            log_filter: default_log_filter(),
        }
    }
}

/// Get the config directory path (~/.sqlhint/)
pub fn config_dir() -> ConfigResult<PathBuf> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join(".sqlhint"))
}

/// Load settings from the default config file
pub fn load_settings() -> ConfigResult<Settings> {
    load_settings_from(&config_dir()?.join("config.toml"))
}

/// Load settings from `path`; a missing file yields the defaults
pub fn load_settings_from(path: &Path) -> ConfigResult<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::NotFound(format!("Failed to read {}: {}", path.display(), e)))?;
    let settings: Settings = toml::from_str(&content)?;
    if settings.log_filter.trim().is_empty() {
        return Err(ConfigError::Invalid("log_filter must not be empty".into()));
    }
    Ok(settings)
}
