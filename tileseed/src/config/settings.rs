//! Settings structs for all configuration sections.
//!
//! Each struct represents one `[section]` of the INI config file.
//! These are pure data types with no parsing or serialization logic.

use std::path::PathBuf;
use std::time::Duration;

/// Complete application configuration loaded from config.ini.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    /// Where artifacts, locks and progress logs live
    pub cache: CacheSettings,
    /// Where tileset records are read from
    pub registry: RegistrySettings,
    /// External program that produces tiles
    pub engine: EngineSettings,
    /// Job control settings
    pub seed: SeedSettings,
    /// Logging settings
    pub logging: LoggingSettings,
}

/// Cache configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheSettings {
    /// Cache root directory
    pub directory: PathBuf,
    /// Directory layout for file caches that do not name one
    pub directory_layout: String,
}

/// Tileset registry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistrySettings {
    /// Directory holding one `<id>.json` per tileset
    pub directory: PathBuf,
}

/// Seed engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineSettings {
    /// Program to run
    pub command: String,
    /// Arguments, split on whitespace in the INI file
    pub args: Vec<String>,
}

/// Job control configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SeedSettings {
    /// Seconds a stopped worker gets before SIGKILL
    pub stop_grace_secs: u64,
}

impl SeedSettings {
    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    /// Log file path
    pub file: PathBuf,
}
