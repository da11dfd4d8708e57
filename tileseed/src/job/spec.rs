use super::{JobKey, JobPaths};
use crate::coord::{BoundingBox, Srs};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Fully resolved description of one seeding run.
///
/// Built by [`JobSpecBuilder`](super::JobSpecBuilder) and handed to the
/// worker process as JSON, so it carries everything the worker needs
/// without consulting the registry again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    pub key: JobKey,
    pub name: String,
    /// Layer the engine exposes for the seed
    pub layer: LayerSpec,
    pub cache: CacheBackend,
    pub source: SourceBackend,
    /// Basic auth for the upstream source
    pub auth: Option<HttpAuth>,
    pub grid: GridSpec,
    pub seed: SeedCoverage,
    pub paths: JobPaths,
}

impl JobSpec {
    /// Where the engine writes its output.
    pub fn output(&self) -> &PathBuf {
        &self.paths.generating
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerSpec {
    pub name: String,
    pub title: String,
}

/// Artifact storage handed to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum CacheBackend {
    /// Tile files under `directory` using the named directory layout
    File {
        directory: PathBuf,
        directory_layout: String,
    },
    /// GeoPackage file with tiles stored in `table_name`
    Gpkg { filename: PathBuf, table_name: String },
}

/// Upstream tile source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceBackend {
    Wms {
        url: String,
        layers: Vec<String>,
        transparent: bool,
    },
    Tile {
        url: String,
    },
    Mapnik {
        mapfile: PathBuf,
        layers: Vec<String>,
        transparent: bool,
        /// Area the style renders, in grid coordinates
        coverage: BoundingBox,
    },
}

/// HTTP options for sources behind basic auth.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpAuth {
    /// `Basic <base64(user:password)>`
    pub authorization: String,
    pub ssl_no_cert_checks: bool,
}

impl fmt::Debug for HttpAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpAuth")
            .field("authorization", &"<redacted>")
            .field("ssl_no_cert_checks", &self.ssl_no_cert_checks)
            .finish()
    }
}

/// Tiling grid. Tile rows count down from the north-west corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub srs: Srs,
    pub origin: GridOrigin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GridOrigin {
    NorthWest,
    SouthWest,
}

/// Inclusive zoom range, `start <= stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoomRange {
    pub start: u8,
    pub stop: u8,
}

impl ZoomRange {
    pub fn levels(&self) -> std::ops::RangeInclusive<u8> {
        self.start..=self.stop
    }
}

/// What area to seed and how stale existing tiles may be.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeedCoverage {
    /// Coverage in grid coordinates
    pub bbox: BoundingBox,
    pub zoom: ZoomRange,
    /// Tiles older than this are re-fetched; 0 refreshes everything
    pub refresh_before_minutes: u32,
}
