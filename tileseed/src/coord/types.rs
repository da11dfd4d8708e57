//! Coordinate type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Web Mercator valid latitude range
pub const MIN_LAT: f64 = -85.05112878;
pub const MAX_LAT: f64 = 85.05112878;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// WGS84 semi-major axis used by the spherical Web Mercator projection.
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Spatial reference systems understood by the seeder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Srs {
    /// Geographic WGS84 (longitude/latitude degrees)
    Wgs84,
    /// Spherical Web Mercator (metres), also known as EPSG:900913
    WebMercator,
}

impl Srs {
    /// EPSG code string, e.g. `EPSG:4326`.
    pub fn code(&self) -> &'static str {
        match self {
            Srs::Wgs84 => "EPSG:4326",
            Srs::WebMercator => "EPSG:3857",
        }
    }
}

impl fmt::Display for Srs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Srs {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "EPSG:4326" | "WGS84" => Ok(Srs::Wgs84),
            "EPSG:3857" | "EPSG:900913" | "EPSG:3785" => Ok(Srs::WebMercator),
            other => Err(CoordError::UnsupportedSrs(other.to_string())),
        }
    }
}

impl TryFrom<String> for Srs {
    type Error = CoordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Srs> for String {
    fn from(srs: Srs) -> Self {
        srs.code().to_string()
    }
}

/// Axis-aligned bounding box tagged with its reference system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub srs: Srs,
}

impl BoundingBox {
    /// Build a box from two opposite corners given in any order.
    pub fn from_corners(x0: f64, y0: f64, x1: f64, y1: f64, srs: Srs) -> Result<Self, CoordError> {
        for v in [x0, y0, x1, y1] {
            if !v.is_finite() {
                return Err(CoordError::NonFinite(v));
            }
        }
        Ok(Self {
            min_x: x0.min(x1),
            min_y: y0.min(y1),
            max_x: x0.max(x1),
            max_y: y0.max(y1),
            srs,
        })
    }

    /// Corners as `[min_x, min_y, max_x, max_y]`.
    pub fn as_array(&self) -> [f64; 4] {
        [self.min_x, self.min_y, self.max_x, self.max_y]
    }
}

/// Errors that can occur during coordinate conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Latitude is outside -90..=90
    InvalidLatitude(f64),
    /// Longitude is outside valid range (-180.0 to 180.0)
    InvalidLongitude(f64),
    /// A coordinate is NaN or infinite
    NonFinite(f64),
    /// SRS code is not one of the supported systems
    UnsupportedSrs(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidLatitude(lat) => {
                write!(f, "Invalid latitude: {} (must be between -90 and 90)", lat)
            }
            CoordError::InvalidLongitude(lon) => {
                write!(
                    f,
                    "Invalid longitude: {} (must be between {} and {})",
                    lon, MIN_LON, MAX_LON
                )
            }
            CoordError::NonFinite(v) => write!(f, "Coordinate is not a finite number: {}", v),
            CoordError::UnsupportedSrs(code) => {
                write!(
                    f,
                    "Unsupported SRS '{}' (expected EPSG:4326 or EPSG:3857)",
                    code
                )
            }
        }
    }
}

impl std::error::Error for CoordError {}
