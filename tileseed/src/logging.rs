//! Logging infrastructure for tileseed.
//!
//! Provides structured logging with file output and optional console output:
//! - Appends to the configured log file, which the CLI and its detached
//!   workers share
//! - Optionally mirrors to stderr, keeping stdout free for command output
//! - Multi-line pretty format for readability
//! - Configurable via RUST_LOG environment variable

use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Guard that must be kept alive for the duration of logging.
///
/// Dropping this guard will flush and close the log file writer.
pub struct LoggingGuard {
    _file_guard: WorkerGuard,
}

/// Initialize logging system.
///
/// Creates the log directory if needed and appends to the log file.
///
/// # Arguments
///
/// * `log_path` - Log file (e.g., `~/.tileseed/tileseed.log`)
/// * `console` - Also write to stderr
/// * `debug` - Default to debug level when RUST_LOG is not set
///
/// # Returns
///
/// LoggingGuard that must be kept alive for logging to work
///
/// # Errors
///
/// Returns error if the log directory or file cannot be created
pub fn init_logging(log_path: &Path, console: bool, debug: bool) -> Result<LoggingGuard, io::Error> {
    let (log_dir, log_file) = prepare_log_file(log_path)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_file);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false) // No ANSI colors in file
        .with_span_events(FmtSpan::CLOSE)
        .pretty();

    let console_layer = console.then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .with_ansi(true)
            .compact()
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(debug)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .init();

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

/// Create the log file's directory and the file itself without truncating it.
///
/// Returns the directory and file name the appender should use.
fn prepare_log_file(log_path: &Path) -> Result<(&Path, &std::ffi::OsStr), io::Error> {
    let log_file = log_path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("log path {} has no file name", log_path.display()),
        )
    })?;
    let log_dir = match log_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    fs::create_dir_all(log_dir)?;
    OpenOptions::new().create(true).append(true).open(log_path)?;
    Ok((log_dir, log_file))
}

/// Filter used when RUST_LOG is not set.
fn default_directive(debug: bool) -> &'static str {
    if debug {
        "debug"
    } else {
        "info"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_directive() {
        assert_eq!(default_directive(false), "info");
        assert_eq!(default_directive(true), "debug");
    }

    #[test]
    fn test_creates_directory_and_file() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("nested").join("tileseed.log");

        let (dir, file) = prepare_log_file(&log_path).unwrap();

        assert_eq!(dir, temp.path().join("nested"));
        assert_eq!(file, "tileseed.log");
        assert!(log_path.exists(), "Log file should be created");
    }

    #[test]
    fn test_keeps_existing_content() {
        let temp = TempDir::new().unwrap();
        let log_path = temp.path().join("tileseed.log");
        fs::write(&log_path, "worker output\n").unwrap();

        prepare_log_file(&log_path).unwrap();

        assert_eq!(fs::read_to_string(&log_path).unwrap(), "worker output\n");
    }

    #[test]
    fn test_path_without_file_name_is_rejected() {
        assert!(prepare_log_file(Path::new("/")).is_err());
    }
}
