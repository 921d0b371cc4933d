//! Configuration management.

pub mod paths;
pub mod settings;

pub use paths::config_file;
pub use settings::{
    ApiConfig, AppConfig, AuthorizationConfig, FreeboxConfig, SessionConfig, DEFAULT_API_BASE_URL,
};

use std::path::Path;

use crate::error::{FreeboxError, Result};

/// Load configuration from the default config file.
///
/// If the config file doesn't exist, returns default configuration.
pub fn load_config() -> Result<FreeboxConfig> {
    let path = config_file()?;
    load_config_from(&path)
}

/// Load configuration from a specific path.
///
/// If the file doesn't exist, returns default configuration.
pub fn load_config_from(path: &Path) -> Result<FreeboxConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no configuration file, using defaults");
        return Ok(FreeboxConfig::default().with_env_overrides());
    }

    let contents = std::fs::read_to_string(path)?;
    let config: FreeboxConfig = toml::from_str(&contents)
        .map_err(|e| FreeboxError::ConfigRead(format!("{}: {e}", path.display())))?;

    Ok(config.with_env_overrides())
}
