use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, warn};

use super::defaults::*;
use crate::consts::{CONFIG_PATH_ENV, DEFAULT_CONFIG_FILE};
use crate::engine::Generation;
use crate::error::ConfigError;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `v2_key`; unset means `KEY_ROOT`
    pub key_root: Option<PathBuf>,
    pub legacy_keys: Vec<LegacyKey>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LegacyKey {
    pub generation: Generation,
    /// Absolute, or relative to the key root
    pub path: PathBuf,
}

impl Config {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Load config from `ENCRYPTED_SECRET_CONFIG` (or `encrypted-secret.toml`),
/// falling back to built-in defaults when the file is absent
pub fn load() -> Result<Config, ConfigError> {
    let explicit = std::env::var_os(CONFIG_PATH_ENV).filter(|v| !v.is_empty());
    let config_path = explicit
        .clone()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

    if !config_path.exists() {
        if explicit.is_some() {
            warn!("{} not found, using built-in defaults", config_path.display());
        } else {
            debug!("{} not found, using built-in defaults", config_path.display());
        }
        return Ok(default_config());
    }

    Config::from_file(&config_path)
}
