//! `tileseed list`

use serde::Serialize;
use tileseed::job::JobKey;
use tileseed::status::StatusSnapshot;
use tileseed::tileset::{CacheKind, SourceKind, TilesetRegistry};
use tracing::warn;

use crate::error::CliError;
use crate::runner::CliRunner;

#[derive(Debug, Serialize)]
struct TilesetSummary {
    id: JobKey,
    name: String,
    source_type: SourceKind,
    cache_type: CacheKind,
    zoom: [u8; 2],
    /// Absent when status could not be determined
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<StatusSnapshot>,
}

/// Print every registered tileset with its current status.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    let reporter = runner.reporter();
    let tilesets = runner.registry().list()?;

    let summaries: Vec<TilesetSummary> = tilesets
        .into_iter()
        .map(|tileset| {
            let status = match reporter.status(&tileset) {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    warn!(id = %tileset.id, error = %e, "Failed to read tileset status");
                    None
                }
            };
            TilesetSummary {
                zoom: [tileset.layer_zoom_start, tileset.layer_zoom_stop],
                id: tileset.id,
                name: tileset.name,
                source_type: tileset.source_type,
                cache_type: tileset.cache_type,
                status,
            }
        })
        .collect();

    runner.print_json(&summaries)
}
