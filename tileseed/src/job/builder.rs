//! Turns a tileset record into a [`JobSpec`].

use super::{
    CacheBackend, ConfigurationError, GridOrigin, GridSpec, HttpAuth, JobPaths, JobSpec,
    LayerSpec, SeedCoverage, SourceBackend, ZoomRange,
};
use crate::coord::{reproject, BoundingBox, Srs};
use crate::tileset::{CacheKind, SourceKind, Tileset};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};

/// Directory layouts accepted for file caches.
pub const DIRECTORY_LAYOUTS: &[&str] = &["tc", "mp", "tms", "reverse_tms", "quadkey", "arcgis"];

/// Grid every job seeds into.
pub const GRID_SRS: Srs = Srs::WebMercator;

/// Builds seeding jobs for tilesets stored under one cache root.
#[derive(Debug, Clone)]
pub struct JobSpecBuilder {
    cache_root: PathBuf,
    default_layout: String,
}

impl JobSpecBuilder {
    /// `default_layout` applies to file caches whose tileset names none.
    pub fn new(cache_root: impl Into<PathBuf>, default_layout: impl Into<String>) -> Self {
        Self {
            cache_root: cache_root.into(),
            default_layout: default_layout.into(),
        }
    }

    pub fn cache_root(&self) -> &Path {
        &self.cache_root
    }

    /// Paths a tileset's job uses, after checking its name.
    pub fn paths_for(&self, tileset: &Tileset) -> Result<JobPaths, ConfigurationError> {
        check_name(&tileset.name)?;
        Ok(JobPaths::new(
            &self.cache_root,
            &tileset.id,
            &tileset.name,
            tileset.cache_type,
        ))
    }

    /// Build the job for `tileset`.
    ///
    /// Touches no files. Every validation failure is a
    /// [`ConfigurationError`].
    pub fn build(&self, tileset: &Tileset) -> Result<JobSpec, ConfigurationError> {
        if tileset.layer_zoom_start > tileset.layer_zoom_stop {
            return Err(ConfigurationError::InvalidZoomRange {
                start: tileset.layer_zoom_start,
                stop: tileset.layer_zoom_stop,
            });
        }
        let zoom = ZoomRange {
            start: tileset.layer_zoom_start,
            stop: tileset.layer_zoom_stop,
        };

        let paths = self.paths_for(tileset)?;

        let bbox = BoundingBox::from_corners(
            tileset.bbox_x0,
            tileset.bbox_y0,
            tileset.bbox_x1,
            tileset.bbox_y1,
            tileset.srs,
        )
        .and_then(|b| reproject(&b, GRID_SRS))
        .map_err(|e| ConfigurationError::InvalidBoundingBox(e.to_string()))?;

        let cache = match tileset.cache_type {
            CacheKind::File => {
                let layout = tileset
                    .directory_layout
                    .clone()
                    .unwrap_or_else(|| self.default_layout.clone());
                if !DIRECTORY_LAYOUTS.contains(&layout.as_str()) {
                    return Err(ConfigurationError::InvalidDirectoryLayout(layout));
                }
                CacheBackend::File {
                    directory: paths.generating.clone(),
                    directory_layout: layout,
                }
            }
            CacheKind::Gpkg => CacheBackend::Gpkg {
                filename: paths.generating.clone(),
                table_name: table_name(&tileset.name),
            },
        };

        let source = source_backend(tileset, &bbox)?;

        let layer_name = if tileset.layer_name.is_empty() {
            tileset.name.clone()
        } else {
            tileset.layer_name.clone()
        };

        Ok(JobSpec {
            key: tileset.id.clone(),
            name: tileset.name.clone(),
            layer: LayerSpec {
                title: layer_name.clone(),
                name: layer_name,
            },
            cache,
            source,
            auth: http_auth(tileset),
            grid: GridSpec {
                srs: GRID_SRS,
                origin: GridOrigin::NorthWest,
            },
            seed: SeedCoverage {
                bbox,
                zoom,
                refresh_before_minutes: 0,
            },
            paths,
        })
    }
}

fn source_backend(
    tileset: &Tileset,
    coverage: &BoundingBox,
) -> Result<SourceBackend, ConfigurationError> {
    let missing = |parameter| ConfigurationError::MissingSourceParameter {
        source_kind: tileset.source_type,
        parameter,
    };

    match tileset.source_type {
        SourceKind::Wms => {
            if tileset.server_url.is_empty() {
                return Err(missing("server_url"));
            }
            if tileset.layer_name.is_empty() {
                return Err(missing("layer_name"));
            }
            Ok(SourceBackend::Wms {
                url: tileset.server_url.clone(),
                layers: vec![tileset.layer_name.clone()],
                transparent: true,
            })
        }
        SourceKind::Tile => {
            if tileset.server_url.is_empty() {
                return Err(missing("server_url"));
            }
            Ok(SourceBackend::Tile {
                url: tileset.server_url.clone(),
            })
        }
        SourceKind::Mapnik => {
            let mapfile = tileset.mapfile.clone().ok_or_else(|| missing("mapfile"))?;
            let layers = if tileset.layer_name.is_empty() {
                Vec::new()
            } else {
                vec![tileset.layer_name.clone()]
            };
            Ok(SourceBackend::Mapnik {
                mapfile,
                layers,
                transparent: true,
                coverage: *coverage,
            })
        }
    }
}

/// Basic auth when both username and password are set.
fn http_auth(tileset: &Tileset) -> Option<HttpAuth> {
    let user = tileset.server_username.as_deref().filter(|u| !u.is_empty())?;
    let password = tileset.server_password.as_deref().filter(|p| !p.is_empty())?;
    let token = STANDARD.encode(format!("{}:{}", user, password));
    Some(HttpAuth {
        authorization: format!("Basic {}", token),
        ssl_no_cert_checks: true,
    })
}

/// Reject names that would escape the cache root or collide with its files.
pub fn check_name(name: &str) -> Result<(), ConfigurationError> {
    let unsafe_name = name.is_empty()
        || name == "."
        || name == ".."
        || name.starts_with('.')
        || name.chars().any(|c| matches!(c, '/' | '\\' | '\0') || c.is_control());
    if unsafe_name {
        return Err(ConfigurationError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// GeoPackage table name: the slugified tileset name with `_` separators.
pub fn table_name(name: &str) -> String {
    slugify(name).replace('-', "_")
}

/// Lowercase, drop punctuation, collapse whitespace and hyphen runs to `-`.
fn slugify(value: &str) -> String {
    let mut slug = String::with_capacity(value.len());
    let mut pending_separator = false;

    for c in value.chars() {
        if c.is_whitespace() || c == '-' {
            pending_separator = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        }
    }

    slug.trim_matches(|c| c == '-' || c == '_').to_string()
}
