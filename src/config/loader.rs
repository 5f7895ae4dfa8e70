//! Configuration loading from the file system
//!
//! Loads and parses ~/.clipstack/config.json.

use std::path::PathBuf;
use tracing::{info, instrument, warn};

use super::types::Config;

/// Path to the user config file (~/.clipstack/config.json)
pub fn config_path() -> PathBuf {
    PathBuf::from(shellexpand::tilde("~/.clipstack/config.json").as_ref())
}

/// Load configuration from ~/.clipstack/config.json
///
/// Returns `Config::default()` if the file is missing or fails to parse;
/// a broken config must never keep the daemon from starting.
#[instrument(name = "load_config")]
pub fn load_config() -> Config {
    load_config_from(&config_path())
}

/// Load configuration from an explicit path (test seam).
pub fn load_config_from(path: &PathBuf) -> Config {
    if !path.exists() {
        info!(path = %path.display(), "Config file not found, using defaults");
        return Config::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!(error = %e, path = %path.display(), "Failed to read config file, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str::<Config>(&contents) {
        Ok(config) => {
            info!(path = %path.display(), "Successfully loaded config");
            config
        }
        Err(e) => {
            warn!(
                error = %e,
                path = %path.display(),
                "Failed to parse config JSON, using defaults"
            );
            Config::default()
        }
    }
}
