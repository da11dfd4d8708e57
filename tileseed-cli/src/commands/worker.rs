//! `tileseed worker` - runs inside the detached worker process.
//!
//! stdout and stderr are the job's progress log, so this command prints
//! nothing of its own; diagnostics go to the log file.

use tileseed::supervisor::{run_worker, spec_from_env};
use tracing::error;

use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    runner.log_startup("worker");
    let spec = spec_from_env().inspect_err(|e| error!(error = %e, "Worker has no job"))?;
    let registry = runner.registry();
    run_worker(&spec, &runner.engine(), Some(&registry))?;
    Ok(())
}
