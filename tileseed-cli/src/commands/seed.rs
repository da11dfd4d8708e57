//! `tileseed seed <id>`

use tileseed::job::JobKey;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Start seeding a tileset and print the outcome.
pub fn run(runner: &CliRunner, id: &JobKey) -> Result<(), CliError> {
    runner.log_startup("seed");
    let tileset = runner.load_tileset(id)?;
    let outcome = runner.supervisor()?.seed(&tileset)?;
    runner.print_json(&outcome)
}
