//! Configuration management
//!
//! Handles loading user settings from `~/.sqlhint/config.toml`.

pub mod settings;

pub use settings::{Settings, config_dir, load_settings, load_settings_from};
