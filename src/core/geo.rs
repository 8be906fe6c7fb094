use crate::core::constants::{DEGREE_PRECISION, MAX_ZOOM, MIN_ZOOM};
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Represents a geographical coordinate with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    /// Creates a new LatLng coordinate
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Validates that the coordinates are finite and within valid ranges
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    /// Drops everything past [`DEGREE_PRECISION`] decimal places.
    ///
    /// Truncates toward zero, so two points that only differ beyond the
    /// fourth decimal collapse onto the same tile key.
    pub fn truncated(&self) -> Self {
        Self::new(
            truncate_degrees(self.lat, DEGREE_PRECISION),
            truncate_degrees(self.lng, DEGREE_PRECISION),
        )
    }
}

impl Default for LatLng {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl fmt::Display for LatLng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6},{:.6}", self.lat, self.lng)
    }
}

/// Truncates `value` toward zero to `digits` decimal places.
///
/// Never returns `-0.0`, which would format differently from `0.0`.
pub fn truncate_degrees(value: f64, digits: u32) -> f64 {
    let scale = 10_f64.powi(digits as i32);
    (value * scale).trunc() / scale + 0.0
}

/// Integer zoom level in `[MIN_ZOOM, MAX_ZOOM]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ZoomLevel(u8);

impl ZoomLevel {
    pub fn new(level: u8) -> Result<Self> {
        if (MIN_ZOOM..=MAX_ZOOM).contains(&level) {
            Ok(Self(level))
        } else {
            Err(MapError::invalid(format!(
                "zoom {} outside [{}, {}]",
                level, MIN_ZOOM, MAX_ZOOM
            )))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// One level closer, or `None` at the maximum.
    pub fn zoomed_in(self) -> Option<Self> {
        Self::new(self.0.checked_add(1)?).ok()
    }

    /// One level further out, or `None` at zero.
    pub fn zoomed_out(self) -> Option<Self> {
        Self::new(self.0.checked_sub(1)?).ok()
    }
}

/// Street-level zoom.
impl Default for ZoomLevel {
    fn default() -> Self {
        Self(15)
    }
}

impl TryFrom<u8> for ZoomLevel {
    type Error = MapError;

    fn try_from(level: u8) -> Result<Self> {
        Self::new(level)
    }
}

impl From<ZoomLevel> for u8 {
    fn from(zoom: ZoomLevel) -> u8 {
        zoom.0
    }
}

impl fmt::Display for ZoomLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Map type understood by the static-map service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapStyle {
    #[default]
    Roadmap,
    Terrain,
    Satellite,
    Hybrid,
}

impl MapStyle {
    pub const ALL: [MapStyle; 4] = [
        MapStyle::Roadmap,
        MapStyle::Terrain,
        MapStyle::Satellite,
        MapStyle::Hybrid,
    ];

    /// The `maptype` value sent to the service and embedded in cache keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            MapStyle::Roadmap => "roadmap",
            MapStyle::Terrain => "terrain",
            MapStyle::Satellite => "satellite",
            MapStyle::Hybrid => "hybrid",
        }
    }
}

impl fmt::Display for MapStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MapStyle {
    type Err = MapError;

    fn from_str(s: &str) -> Result<Self> {
        MapStyle::ALL
            .into_iter()
            .find(|style| style.as_str() == s)
            .ok_or_else(|| MapError::invalid(format!("unknown map style '{}'", s)))
    }
}

/// Geographic extent of a stitched composite, taken from its corner tiles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub northwest: LatLng,
    pub southeast: LatLng,
}

impl BoundingBox {
    pub fn new(northwest: LatLng, southeast: LatLng) -> Self {
        Self {
            northwest,
            southeast,
        }
    }

    pub fn north(&self) -> f64 {
        self.northwest.lat
    }

    pub fn west(&self) -> f64 {
        self.northwest.lng
    }

    pub fn south(&self) -> f64 {
        self.southeast.lat
    }

    pub fn east(&self) -> f64 {
        self.southeast.lng
    }

    /// Checks if the box contains a point
    pub fn contains(&self, point: &LatLng) -> bool {
        point.lat <= self.north()
            && point.lat >= self.south()
            && point.lng >= self.west()
            && point.lng <= self.east()
    }
}
