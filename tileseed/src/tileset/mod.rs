//! Tileset definitions and the registry they are loaded from.
//!
//! A [`Tileset`] is the record a seeding job is built from: what to fetch
//! (source kind, server, layer), where (bounding box, zoom range) and how to
//! store it (cache kind). The registry also carries the size and timestamp
//! of the last promoted artifact.

mod registry;

pub use registry::{JsonRegistry, RegistryError, TilesetRegistry};

use crate::coord::Srs;
use crate::job::JobKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of upstream source tiles are fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// OGC Web Map Service
    Wms,
    /// XYZ tile server (URL template)
    Tile,
    /// Local Mapnik style rendering
    Mapnik,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SourceKind::Wms => "wms",
            SourceKind::Tile => "tile",
            SourceKind::Mapnik => "mapnik",
        };
        f.write_str(name)
    }
}

/// Storage format of the generated artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheKind {
    /// Directory tree of tile files
    File,
    /// Single GeoPackage file
    #[default]
    #[serde(alias = "geopackage")]
    Gpkg,
}

/// A tileset record as stored in the registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tileset {
    pub id: JobKey,
    pub name: String,
    pub source_type: SourceKind,
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub server_username: Option<String>,
    #[serde(default)]
    pub server_password: Option<String>,
    #[serde(default)]
    pub layer_name: String,
    #[serde(default)]
    pub layer_zoom_start: u8,
    pub layer_zoom_stop: u8,
    pub bbox_x0: f64,
    pub bbox_y0: f64,
    pub bbox_x1: f64,
    pub bbox_y1: f64,
    /// Reference system of the `bbox_*` corners
    #[serde(default = "default_srs")]
    pub srs: Srs,
    #[serde(default)]
    pub cache_type: CacheKind,
    /// File cache directory layout; the configured default when absent
    #[serde(default)]
    pub directory_layout: Option<String>,
    /// Style file for Mapnik sources
    #[serde(default)]
    pub mapfile: Option<PathBuf>,
    /// Size in bytes of the last promoted artifact
    #[serde(default)]
    pub filesize: Option<u64>,
    /// Modification time of the last promoted artifact
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

fn default_srs() -> Srs {
    Srs::Wgs84
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_record_uses_defaults() {
        let json = r#"{
            "id": 3,
            "name": "boston",
            "source_type": "tile",
            "server_url": "http://tiles.example.com/{z}/{x}/{y}.png",
            "layer_zoom_stop": 8,
            "bbox_x0": -71.2, "bbox_y0": 42.2, "bbox_x1": -70.9, "bbox_y1": 42.5
        }"#;

        let tileset: Tileset = serde_json::from_str(json).unwrap();

        assert_eq!(tileset.id.as_str(), "3");
        assert_eq!(tileset.source_type, SourceKind::Tile);
        assert_eq!(tileset.layer_zoom_start, 0);
        assert_eq!(tileset.srs, Srs::Wgs84);
        assert_eq!(tileset.cache_type, CacheKind::Gpkg);
        assert!(tileset.filesize.is_none());
    }

    #[test]
    fn test_unknown_source_kind_is_rejected() {
        let json = r#"{
            "id": 3, "name": "x", "source_type": "ftp", "layer_zoom_stop": 1,
            "bbox_x0": 0, "bbox_y0": 0, "bbox_x1": 1, "bbox_y1": 1
        }"#;
        assert!(serde_json::from_str::<Tileset>(json).is_err());
    }

    #[test]
    fn test_cache_kind_accepts_geopackage_alias() {
        let kind: CacheKind = serde_json::from_str("\"geopackage\"").unwrap();
        assert_eq!(kind, CacheKind::Gpkg);
    }
}
