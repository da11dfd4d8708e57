//! CLI runner for common setup and operations.
//!
//! Encapsulates config loading, logging initialization and construction of
//! the job components to reduce duplication across command handlers.

use crate::error::CliError;
use serde::Serialize;
use std::path::PathBuf;
use tileseed::config::{config_file_path, ConfigFile};
use tileseed::job::{JobKey, JobSpecBuilder};
use tileseed::lock::LockStore;
use tileseed::logging::{init_logging, LoggingGuard};
use tileseed::process::WorkerLauncher;
use tileseed::status::StatusReporter;
use tileseed::supervisor::{CommandEngine, JobSupervisor};
use tileseed::tileset::{JsonRegistry, Tileset, TilesetRegistry};
use tracing::info;

/// Runner that manages CLI lifecycle and common operations.
pub struct CliRunner {
    /// Logging guard - keeps logging active while runner exists
    #[allow(dead_code)]
    logging_guard: LoggingGuard,
    /// Loaded configuration file
    config: ConfigFile,
    /// Config file given on the command line, passed on to workers
    config_path: Option<PathBuf>,
    debug: bool,
}

impl CliRunner {
    /// Create a new CLI runner, loading config and initializing logging.
    ///
    /// # Arguments
    ///
    /// * `config_path` - Config file to load instead of ~/.tileseed/config.ini
    /// * `debug` - When true, enables debug-level logging regardless of RUST_LOG
    /// * `console` - Mirror logs to stderr
    pub fn new(config_path: Option<PathBuf>, debug: bool, console: bool) -> Result<Self, CliError> {
        let path = config_path.clone().unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&path)?;

        let logging_guard = init_logging(&config.logging.file, console, debug)
            .map_err(|e| CliError::LoggingInit(e.to_string()))?;

        Ok(Self {
            logging_guard,
            config,
            config_path,
            debug,
        })
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    /// Log startup information for a command.
    pub fn log_startup(&self, command: &str) {
        info!("tileseed v{}", tileseed::VERSION);
        info!("tileseed CLI: {} command", command);
    }

    pub fn registry(&self) -> JsonRegistry {
        JsonRegistry::new(&self.config.registry.directory)
    }

    pub fn load_tileset(&self, id: &JobKey) -> Result<Tileset, CliError> {
        Ok(self.registry().load(id)?)
    }

    pub fn lock_store(&self) -> LockStore {
        LockStore::new(&self.config.cache.directory)
    }

    pub fn spec_builder(&self) -> JobSpecBuilder {
        JobSpecBuilder::new(
            &self.config.cache.directory,
            &self.config.cache.directory_layout,
        )
    }

    pub fn engine(&self) -> CommandEngine {
        CommandEngine::new(&self.config.engine.command, self.config.engine.args.clone())
    }

    pub fn reporter(&self) -> StatusReporter {
        StatusReporter::new(self.lock_store(), self.spec_builder())
    }

    /// Supervisor whose workers re-run this executable as `tileseed worker`.
    pub fn supervisor(&self) -> Result<JobSupervisor, CliError> {
        let exe = std::env::current_exe()
            .map_err(|e| CliError::Config(format!("cannot locate tileseed executable: {}", e)))?;

        let mut args = Vec::new();
        if let Some(path) = &self.config_path {
            args.push("--config".to_string());
            args.push(path.display().to_string());
        }
        if self.debug {
            args.push("--debug".to_string());
        }
        args.push("worker".to_string());

        Ok(JobSupervisor::new(
            self.lock_store(),
            self.spec_builder(),
            WorkerLauncher::new(exe, args),
        )
        .with_stop_grace(self.config.seed.stop_grace()))
    }

    /// Print a command result as pretty JSON on stdout.
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }
}
