//! Configuration loading and data directory resolution

use std::path::PathBuf;

use crate::{Error, Result};

/// Environment variable naming the data directory
pub const DATA_DIR_ENV: &str = "ANIDOJO_DATA_DIR";

/// Data directory resolution, priority order:
/// 1. Explicit argument from the embedding application (highest priority)
/// 2. `ANIDOJO_DATA_DIR` environment variable
/// 3. `data_dir` key in the TOML config file
/// 4. OS-dependent default (fallback)
///
/// The four persisted regions live as JSON files inside this directory.
pub fn resolve_data_dir(explicit: Option<&str>) -> Result<PathBuf> {
    // Priority 1: explicit argument
    if let Some(path) = explicit {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: environment variable
    if let Ok(path) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Ok(config_path) = find_config_file() {
        if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
            if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                if let Some(data_dir) = config.get("data_dir").and_then(|v| v.as_str()) {
                    return Ok(PathBuf::from(data_dir));
                }
            }
        }
    }

    // Priority 4: OS-dependent default
    Ok(default_data_dir())
}

/// Locate the per-user config file (`<config dir>/anidojo/config.toml`)
fn find_config_file() -> Result<PathBuf> {
    let path = dirs::config_dir()
        .map(|d| d.join("anidojo").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {:?}", path)))
    }
}

/// OS-dependent default data directory
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("anidojo"))
        .unwrap_or_else(|| PathBuf::from("./anidojo_data"))
}
