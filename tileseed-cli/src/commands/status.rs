//! `tileseed status <id>`

use tileseed::job::JobKey;

use crate::error::CliError;
use crate::runner::CliRunner;

pub fn run(runner: &CliRunner, id: &JobKey) -> Result<(), CliError> {
    let tileset = runner.load_tileset(id)?;
    let snapshot = runner.reporter().status(&tileset)?;
    runner.print_json(&snapshot)
}
