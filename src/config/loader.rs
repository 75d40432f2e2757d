//! Configuration loading from file system

use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

use super::defaults::CONFIG_PATH;
use super::types::Config;

/// Path of the config file (~/.clipfind/config.json)
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde(CONFIG_PATH).as_ref())
}

/// Load configuration from ~/.clipfind/config.json
///
/// Returns Config::default() if the file is missing or can't be parsed.
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

#[instrument(name = "load_config", skip_all, fields(path = %config_path.display()))]
pub fn load_config_from(config_path: &Path) -> Config {
    if !config_path.exists() {
        info!("Config file not found, using defaults");
        return Config::default();
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            warn!(error = %e, "Failed to read config file, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&content) {
        Ok(config) => {
            info!("Successfully loaded config");
            config
        }
        Err(e) => {
            // Common mistake: writing the poll interval as a string
            let hint = if e.to_string().contains("pollIntervalMs") {
                "pollIntervalMs must be a number of milliseconds, e.g. 500"
            } else {
                ""
            };
            warn!(error = %e, hint = %hint, "Failed to parse config JSON, using defaults");
            Config::default()
        }
    }
}
