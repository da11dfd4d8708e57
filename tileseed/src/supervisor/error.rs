use crate::job::JobKey;
use crate::lock::LockError;
use crate::process::ProcessError;
use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

/// Failures of the orchestrating side. Contention and invalid tilesets are
/// outcomes, not errors.
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Lock(#[from] LockError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("failed to prepare {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode job description: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Failures inside a worker process.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("job {0} was cancelled before this worker owned its lock")]
    Cancelled(JobKey),

    #[error("job description missing from environment variable {0}")]
    MissingJob(&'static str),

    #[error("invalid job description: {0}")]
    InvalidJob(#[from] serde_json::Error),

    #[error("failed to run seed engine {program}: {source}")]
    EngineLaunch {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("seed engine {program} failed: {status}")]
    EngineFailed { program: String, status: ExitStatus },

    #[error("seed engine produced no output at {0}")]
    MissingOutput(PathBuf),

    #[error("failed to promote artifact {path}: {source}")]
    Promote {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Lock(#[from] LockError),
}
