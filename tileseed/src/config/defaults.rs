//! Default values and constants for all configuration settings.

use std::path::PathBuf;

use super::file::config_directory;
use super::settings::*;

/// Default layout for file caches.
pub const DEFAULT_DIRECTORY_LAYOUT: &str = "tms";

/// Default seed engine program, looked up on `PATH`.
pub const DEFAULT_ENGINE_COMMAND: &str = "tileseed-engine";

/// Default grace period before a stopped worker is killed.
pub const DEFAULT_STOP_GRACE_SECS: u64 = 5;

/// Default log file name inside the config directory.
pub const DEFAULT_LOG_FILE: &str = "tileseed.log";

/// Default cache root: the platform cache directory, else `~/.tileseed/cache`.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("tileseed"))
        .unwrap_or_else(|| config_directory().join("cache"))
}

/// Default registry directory (`~/.tileseed/tilesets`).
pub fn default_registry_dir() -> PathBuf {
    config_directory().join("tilesets")
}

/// Default log file (`~/.tileseed/tileseed.log`).
pub fn default_log_file() -> PathBuf {
    config_directory().join(DEFAULT_LOG_FILE)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            cache: CacheSettings {
                directory: default_cache_dir(),
                directory_layout: DEFAULT_DIRECTORY_LAYOUT.to_string(),
            },
            registry: RegistrySettings {
                directory: default_registry_dir(),
            },
            engine: EngineSettings {
                command: DEFAULT_ENGINE_COMMAND.to_string(),
                args: Vec::new(),
            },
            seed: SeedSettings {
                stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
            },
            logging: LoggingSettings {
                file: default_log_file(),
            },
        }
    }
}
