//! Configuration file loading.
//!
//! Loads hostguard configuration from TOML files at XDG-compliant locations.

use crate::config::types::HostGuardConfig;
use crate::error::HostGuardError;
use std::path::{Path, PathBuf};

/// Default configuration file name for project-local config.
const LOCAL_CONFIG_NAME: &str = "hostguard.toml";

/// Default configuration file name within XDG config directory.
const XDG_CONFIG_NAME: &str = "config.toml";

/// Application name for XDG directory lookup.
const APP_NAME: &str = "hostguard";

/// Loads configuration from the default search paths.
///
/// Search order:
/// 1. `./hostguard.toml` (project-local)
/// 2. `~/.config/hostguard/config.toml` (XDG config)
///
/// Returns the default configuration if no config file is found.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be parsed.
pub fn load() -> Result<HostGuardConfig, HostGuardError> {
    for path in search_paths() {
        if path.exists() {
            return from_path(&path);
        }
    }

    Ok(HostGuardConfig::default())
}

/// Loads configuration from a specific file path.
///
/// # Errors
///
/// Returns an error if the file cannot be read, contains invalid TOML, or
/// does not match the expected schema.
pub fn from_path(path: &Path) -> Result<HostGuardConfig, HostGuardError> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        HostGuardError::configuration(
            "config_file",
            format!("failed to read '{}': {}", path.display(), e),
        )
    })?;

    from_str(&contents).map_err(|e| {
        HostGuardError::configuration(
            "config_file",
            format!("failed to parse '{}': {}", path.display(), e),
        )
    })
}

/// Parses configuration from a TOML string.
///
/// # Errors
///
/// Returns an error if the TOML is invalid or doesn't match the schema.
pub fn from_str(toml_str: &str) -> Result<HostGuardConfig, HostGuardError> {
    toml::from_str(toml_str)
        .map_err(|e| HostGuardError::configuration("config", format!("invalid TOML: {e}")))
}

/// Returns the paths that would be searched for configuration files.
#[must_use]
pub fn search_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from(LOCAL_CONFIG_NAME)];

    if let Some(dir) = xdg_config_dir() {
        paths.push(dir.join(XDG_CONFIG_NAME));
    }

    paths
}

/// Returns the path to the XDG config directory for hostguard.
///
/// This is `~/.config/hostguard` on most systems.
#[must_use]
pub fn xdg_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME))
}
