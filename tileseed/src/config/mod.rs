//! Configuration for tileseed.
//!
//! User configuration lives in `~/.tileseed/config.ini`. Settings structs
//! live in [`settings`], constants in [`defaults`], parsing in `parser` and
//! serialization in `writer`. Components take these values explicitly at
//! construction; nothing reads configuration from global state.
//!
//! # Example
//!
//! ```
//! use tileseed::config::ConfigFile;
//!
//! let config = ConfigFile::default();
//! assert_eq!(config.seed.stop_grace_secs, 5);
//! ```

pub mod defaults;
mod file;
mod parser;
pub mod settings;
mod writer;

pub use defaults::*;
pub use file::{config_directory, config_file_path, ConfigFileError};
pub use settings::{
    CacheSettings, ConfigFile, EngineSettings, LoggingSettings, RegistrySettings, SeedSettings,
};
