//! Platform-specific path utilities.

use std::path::PathBuf;

use crate::error::{FreeboxError, Result};

/// Get the configuration directory.
///
/// - Linux: `~/.config/freebox`
/// - macOS: `~/Library/Application Support/freebox`
/// - Windows: `%APPDATA%\freebox`
pub fn config_dir() -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| FreeboxError::Config("Cannot determine config directory".to_string()))?;
    Ok(base.join("freebox"))
}

/// Get the main configuration file path.
pub fn config_file() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}
