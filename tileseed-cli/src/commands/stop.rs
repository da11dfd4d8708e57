//! `tileseed stop <id>`

use tileseed::job::JobKey;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Stop a tileset's job and print the outcome.
///
/// The tileset does not need to be in the registry; a job for a removed
/// tileset can still be stopped.
pub fn run(runner: &CliRunner, id: &JobKey) -> Result<(), CliError> {
    runner.log_startup("stop");
    let outcome = runner.supervisor()?.stop(id)?;
    runner.print_json(&outcome)
}
