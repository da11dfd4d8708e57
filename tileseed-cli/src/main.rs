//! tileseed CLI - Command-line interface
//!
//! Starts, stops and inspects tile cache seeding jobs. Every command prints
//! its result as JSON on stdout; logs go to the configured log file.

mod commands;
mod error;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tileseed::job::JobKey;

use commands::config::ConfigCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Parser)]
#[command(name = "tileseed")]
#[command(version = tileseed::VERSION)]
#[command(about = "Seed tile caches for registered tilesets", long_about = None)]
struct Cli {
    /// Configuration file (default: ~/.tileseed/config.ini)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging and mirror logs to stderr
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start seeding a tileset in the background
    Seed {
        /// Tileset id
        id: JobKey,
    },

    /// Stop a running or starting seed job
    Stop {
        /// Tileset id
        id: JobKey,
    },

    /// Show artifact and job status for a tileset
    Status {
        /// Tileset id
        id: JobKey,
    },

    /// List registered tilesets
    List,

    /// Configuration file management
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Run a seed job handed over by `seed` (internal)
    #[command(hide = true)]
    Worker,
}

fn main() {
    let cli = Cli::parse();
    let (config, debug) = (cli.config, cli.debug);

    let result = match cli.command {
        Commands::Seed { id } => with_runner(config, debug, |r| commands::seed::run(r, &id)),
        Commands::Stop { id } => with_runner(config, debug, |r| commands::stop::run(r, &id)),
        Commands::Status { id } => with_runner(config, debug, |r| commands::status::run(r, &id)),
        Commands::List => with_runner(config, debug, commands::list::run),
        Commands::Config { command } => commands::config::run(command, config),
        Commands::Worker => CliRunner::new(config, debug, false)
            .and_then(|runner| commands::worker::run(&runner)),
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Set up config and logging, then run `command`.
fn with_runner<F>(config: Option<PathBuf>, debug: bool, command: F) -> Result<(), CliError>
where
    F: FnOnce(&CliRunner) -> Result<(), CliError>,
{
    let runner = CliRunner::new(config, debug, debug)?;
    command(&runner)
}
