//! Daemon configuration
//!
//! Serde-backed configuration with per-field defaults, loaded from
//! ~/.clipstack/config.json. A missing or malformed file falls back to
//! defaults rather than failing startup.
//!
//! ## Module Structure
//! - `types`: Config struct, custom detection rules, default constants
//! - `loader`: JSON file loading with fallback

mod loader;
mod types;

pub use loader::{config_path, load_config, load_config_from};
pub use types::{Config, CustomRule};

#[allow(unused_imports)]
pub use types::{
    DEFAULT_APP_SAMPLE_INTERVAL_MS, DEFAULT_DEBOUNCE_MS, DEFAULT_FOREGROUND_TIMEOUT_MS,
    DEFAULT_MAX_ITEMS, DEFAULT_MAX_TEXT_LEN, DEFAULT_POLL_INTERVAL_MS, DEFAULT_RETENTION_DAYS,
    DEFAULT_SUPPRESSION_MS,
};
