//! Coordinate reprojection module
//!
//! Converts seed coverage boxes between geographic WGS84 coordinates and the
//! spherical Web Mercator system used by the tiling grid.

mod types;

pub use types::{BoundingBox, CoordError, Srs, EARTH_RADIUS_M, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

use std::f64::consts::PI;

/// Reprojects a bounding box from `bbox.srs` into `to`.
///
/// Latitudes beyond the Web Mercator limit (±85.05112878°) are clamped to it,
/// since the poles are not representable in the projection.
pub fn reproject(bbox: &BoundingBox, to: Srs) -> Result<BoundingBox, CoordError> {
    match (bbox.srs, to) {
        (Srs::Wgs84, Srs::WebMercator) => {
            let (min_x, min_y) = lon_lat_to_mercator(bbox.min_x, bbox.min_y)?;
            let (max_x, max_y) = lon_lat_to_mercator(bbox.max_x, bbox.max_y)?;
            BoundingBox::from_corners(min_x, min_y, max_x, max_y, Srs::WebMercator)
        }
        (Srs::WebMercator, Srs::Wgs84) => {
            let (min_x, min_y) = mercator_to_lon_lat(bbox.min_x, bbox.min_y);
            let (max_x, max_y) = mercator_to_lon_lat(bbox.max_x, bbox.max_y);
            BoundingBox::from_corners(min_x, min_y, max_x, max_y, Srs::Wgs84)
        }
        _ => Ok(*bbox),
    }
}

/// Projects a WGS84 point into Web Mercator metres.
#[inline]
pub fn lon_lat_to_mercator(lon: f64, lat: f64) -> Result<(f64, f64), CoordError> {
    if !(MIN_LON..=MAX_LON).contains(&lon) {
        return Err(CoordError::InvalidLongitude(lon));
    }
    if !(-90.0..=90.0).contains(&lat) {
        return Err(CoordError::InvalidLatitude(lat));
    }

    let lat = lat.clamp(MIN_LAT, MAX_LAT);
    let x = lon * PI / 180.0 * EARTH_RADIUS_M;
    let lat_rad = lat * PI / 180.0;
    let y = (PI / 4.0 + lat_rad / 2.0).tan().ln() * EARTH_RADIUS_M;

    Ok((x, y))
}

/// Inverse of [`lon_lat_to_mercator`].
#[inline]
pub fn mercator_to_lon_lat(x: f64, y: f64) -> (f64, f64) {
    let lon = x / EARTH_RADIUS_M * 180.0 / PI;
    let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - PI / 2.0) * 180.0 / PI;
    (lon, lat)
}
