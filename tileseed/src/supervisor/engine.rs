use super::WorkerError;
use crate::job::JobSpec;
use crate::process::JOB_ENV;
use std::process::{Command, Stdio};
use tracing::info;

/// Environment variable naming where the engine must write the artifact.
pub const OUTPUT_ENV: &str = "TILESEED_OUTPUT";

/// Produces the tiles for a job into `spec.output()`.
pub trait SeedEngine {
    fn seed(&self, spec: &JobSpec) -> Result<(), WorkerError>;
}

/// Runs an external seeding program.
///
/// The program receives the job as JSON in `TILESEED_JOB` and the output
/// location in `TILESEED_OUTPUT`. Its stdout and stderr are inherited, so
/// inside a worker they land in the progress log.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: String,
    args: Vec<String>,
}

impl CommandEngine {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl SeedEngine for CommandEngine {
    fn seed(&self, spec: &JobSpec) -> Result<(), WorkerError> {
        let job_json = serde_json::to_string(spec)?;
        info!(
            key = %spec.key,
            program = %self.program,
            zoom_start = spec.seed.zoom.start,
            zoom_stop = spec.seed.zoom.stop,
            "Running seed engine"
        );

        let status = Command::new(&self.program)
            .args(&self.args)
            .env(JOB_ENV, job_json)
            .env(OUTPUT_ENV, spec.output())
            .stdin(Stdio::null())
            .status()
            .map_err(|source| WorkerError::EngineLaunch {
                program: self.program.clone(),
                source,
            })?;

        if status.success() {
            Ok(())
        } else {
            Err(WorkerError::EngineFailed {
                program: self.program.clone(),
                status,
            })
        }
    }
}
