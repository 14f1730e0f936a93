//! Loading the engine configuration.
//!
//! Lookup order: an explicit `--config` file, then
//! `{config_dir}/config.json` in the platform project directory
//! (`~/.config/homeward/config.json` on Linux), then built-in defaults.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use homeward_core::{ConfigError, TrackingConfig};
use log::{debug, info, warn};

use crate::error::HostError;

const CONFIG_FILE: &str = "config.json";

pub fn get_project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "homeward-nav", "homeward")
}

/// Platform location of the user configuration file
pub fn default_config_path() -> Option<PathBuf> {
    get_project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE))
}

/// Read and validate a configuration file
pub fn read_config(path: &Path) -> Result<TrackingConfig, HostError> {
    let file = File::open(path)?;
    let config: TrackingConfig =
        serde_json::from_reader(BufReader::new(file)).map_err(ConfigError::from)?;
    config.validate()?;
    Ok(config)
}

/// Resolve the configuration for this run.
///
/// An explicit path must exist and be valid. A broken file in the default
/// location is reported and replaced by the defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<TrackingConfig, HostError> {
    if let Some(path) = explicit {
        let config = read_config(path)?;
        info!("Loaded configuration from {}", path.display());
        return Ok(config);
    }

    match default_config_path() {
        Some(path) if path.exists() => match read_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring configuration {}: {}", path.display(), e);
                Ok(TrackingConfig::default())
            }
        },
        _ => {
            debug!("No configuration file, using defaults");
            Ok(TrackingConfig::default())
        }
    }
}
