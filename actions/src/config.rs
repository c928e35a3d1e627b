//! Configuration loaded from an `actions.toml` file.
//!
//! ```toml
//! [details]
//! max_entries = 4
//! separator = ", "
//! ellipsis = "..."
//!
//! [side_effects]
//! suspended = ["auto-save"]
//! ```
//!
//! Every table and key is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ActionsConfig {
    pub details: DetailFormat,
    pub side_effects: SideEffectsConfig,
}

/// How detailed descriptions join sub-action details.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DetailFormat {
    /// Distinct details listed before the ellipsis.
    pub max_entries: usize,
    pub separator: String,
    pub ellipsis: String,
}

impl Default for DetailFormat {
    fn default() -> Self {
        Self {
            max_entries: 4,
            separator: ", ".into(),
            ellipsis: "...".into(),
        }
    }
}

/// Side-effect registry settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SideEffectsConfig {
    /// Effects that start suspended when they register.
    pub suspended: Vec<String>,
}

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
}

impl ActionsConfig {
    /// Parses configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

/// Loads configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ActionsConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    ActionsConfig::from_toml_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads configuration, falling back to defaults if the file is missing
/// or invalid.
pub fn load_or_default(path: &Path) -> ActionsConfig {
    match load_config(path) {
        Ok(config) => {
            log::info!(
                "Loaded action config from {} ({} suspended side effects)",
                path.display(),
                config.side_effects.suspended.len()
            );
            config
        }
        Err(e) => {
            log::warn!("No action config ({e}), using defaults");
            ActionsConfig::default()
        }
    }
}
