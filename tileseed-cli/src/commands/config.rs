//! Configuration management CLI commands.
//!
//! Provides `config path`, `config init` and `config show`.

use clap::Subcommand;
use std::path::PathBuf;
use tileseed::config::{config_file_path, ConfigFile};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Show the configuration file path
    Path,

    /// Write a default configuration file if none exists
    Init,

    /// Show the effective configuration
    Show,
}

/// Run a config subcommand.
///
/// `config_path` overrides the default location.
pub fn run(command: ConfigCommands, config_path: Option<PathBuf>) -> Result<(), CliError> {
    let path = config_path.unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Path => {
            println!("{}", path.display());
            Ok(())
        }
        ConfigCommands::Init => run_init(&path),
        ConfigCommands::Show => run_show(&path),
    }
}

fn run_init(path: &std::path::Path) -> Result<(), CliError> {
    if ConfigFile::ensure_exists(path)? {
        println!("Created {}", path.display());
    } else {
        println!("Configuration already exists at {}", path.display());
    }
    Ok(())
}

fn run_show(path: &std::path::Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;

    println!("Configuration: {}", path.display());
    println!();
    println!("[cache]");
    println!("  directory        = {}", config.cache.directory.display());
    println!("  directory_layout = {}", config.cache.directory_layout);
    println!("[registry]");
    println!("  directory        = {}", config.registry.directory.display());
    println!("[engine]");
    println!("  command          = {}", config.engine.command);
    println!("  args             = {}", config.engine.args.join(" "));
    println!("[seed]");
    println!("  stop_grace_secs  = {}", config.seed.stop_grace_secs);
    println!("[logging]");
    println!("  file             = {}", config.logging.file.display());
    Ok(())
}
