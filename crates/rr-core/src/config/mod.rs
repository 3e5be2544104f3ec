//! Configuration management for run-remote

mod deploy;
pub mod serde_utils;

pub use deploy::{BuildConfig, DeployConfig, LaunchConfig, RemoteConfig};

use crate::error::ConfigError;
use std::path::{Path, PathBuf};

/// Config file picked up from the working directory when none is named
pub const DEFAULT_CONFIG_FILE: &str = "run-remote.toml";

/// Get the default configuration file path
pub fn default_config_path() -> PathBuf {
    PathBuf::from(DEFAULT_CONFIG_FILE)
}

/// Load configuration from a file
pub fn load_config<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }

    let content = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Invalid(format!("Failed to read config: {}", e)))?;

    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.message().to_string(),
    })
}

/// Resolve the deployment configuration
///
/// An explicitly named file must exist. Without one, `run-remote.toml` in
/// the working directory is used if present, otherwise the defaults.
pub fn resolve_config(explicit: Option<&Path>) -> Result<DeployConfig, ConfigError> {
    let config: DeployConfig = match explicit {
        Some(path) => load_config(path)?,
        None => {
            let path = default_config_path();
            if path.exists() {
                load_config(&path)?
            } else {
                DeployConfig::default()
            }
        }
    };
    config.validate()?;
    Ok(config)
}
