//! Configuration objects for fetching tiles and building map sessions
//!
//! Everything the core needs is passed in explicitly through these structs;
//! nothing is read from process-wide state. All of them deserialize from JSON
//! with defaults for any missing field.

use crate::core::constants::{
    DEFAULT_BASE_URL, DEFAULT_CACHE_DIR, DEFAULT_MAX_TILE_COUNT, GRAB_RATE, TILE_SIZE,
};
use crate::core::geo::{LatLng, MapStyle, ZoomLevel};
use crate::core::projection::compute_tile_count;
use crate::core::viewport::EdgePolicy;
use crate::{MapError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How tiles are requested from the remote service and cached on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Directory holding one file per tile; created on first write.
    pub cache_dir: PathBuf,
    /// Appended to every request as `&key=...` when present.
    pub api_key: Option<String>,
    /// Service root; `/staticmap` is appended.
    pub base_url: String,
    /// Pause after every network fetch.
    pub throttle_ms: u64,
    /// Per-request timeout. `None` waits indefinitely.
    pub request_timeout_secs: Option<u64>,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from(DEFAULT_CACHE_DIR),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            throttle_ms: 1000 / GRAB_RATE,
            request_timeout_secs: None,
            user_agent: format!("mapstitch/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl FetchConfig {
    /// Default settings rooted at `cache_dir`.
    pub fn with_cache_dir(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            ..Self::default()
        }
    }

    /// No throttling; for offline transports and tests.
    pub fn for_testing(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            throttle_ms: 0,
            ..Self::with_cache_dir(cache_dir)
        }
    }

    pub fn throttle(&self) -> Duration {
        Duration::from_millis(self.throttle_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }
}

/// Parameters of one map session. Changing any of them means a full rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapParams {
    pub display_width: u32,
    pub display_height: u32,
    pub center: LatLng,
    pub zoom: ZoomLevel,
    pub style: MapStyle,
    /// Ground distance the grid must cover from the center.
    pub radius_meters: f64,
    pub tile_size: u32,
    pub edge_policy: EdgePolicy,
    /// Largest accepted grid side, guarding against runaway composites.
    pub max_tile_count: u32,
}

impl Default for MapParams {
    fn default() -> Self {
        Self {
            display_width: 800,
            display_height: 500,
            center: LatLng::new(37.7913838, -79.44398934),
            zoom: ZoomLevel::default(),
            style: MapStyle::Roadmap,
            radius_meters: 2000.0,
            tile_size: TILE_SIZE,
            edge_policy: EdgePolicy::default(),
            max_tile_count: DEFAULT_MAX_TILE_COUNT,
        }
    }
}

impl MapParams {
    pub fn new(
        display_width: u32,
        display_height: u32,
        center: LatLng,
        zoom: ZoomLevel,
        style: MapStyle,
        radius_meters: f64,
    ) -> Self {
        Self {
            display_width,
            display_height,
            center,
            zoom,
            style,
            radius_meters,
            ..Self::default()
        }
    }

    pub fn with_tile_size(mut self, tile_size: u32) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    /// Center after truncation to the cache-key precision.
    pub fn truncated_center(&self) -> LatLng {
        self.center.truncated()
    }

    /// Checks every parameter and returns the grid side length.
    pub fn validate(&self) -> Result<u32> {
        if self.display_width == 0 || self.display_height == 0 {
            return Err(MapError::invalid(format!(
                "display size {}x{} must be non-zero",
                self.display_width, self.display_height
            )));
        }
        if !self.center.is_valid() {
            return Err(MapError::invalid(format!(
                "center ({}, {}) is not a valid coordinate",
                self.center.lat, self.center.lng
            )));
        }
        if !(self.radius_meters.is_finite() && self.radius_meters > 0.0) {
            return Err(MapError::invalid(format!(
                "radius {} m must be positive",
                self.radius_meters
            )));
        }
        if self.tile_size == 0 {
            return Err(MapError::invalid("tile size must be non-zero"));
        }

        let center = self.truncated_center();
        let count = compute_tile_count(center.lat, self.zoom, self.radius_meters, self.tile_size);
        if count < 1 {
            return Err(MapError::invalid(format!(
                "radius {} m at zoom {} needs no tiles of {} px",
                self.radius_meters, self.zoom, self.tile_size
            )));
        }
        if count > self.max_tile_count as i64 {
            return Err(MapError::invalid(format!(
                "radius {} m at zoom {} needs {} tiles per side (limit {})",
                self.radius_meters, self.zoom, count, self.max_tile_count
            )));
        }
        let count = count as u32;
        if count.checked_mul(self.tile_size).is_none() {
            return Err(MapError::invalid("composite size overflows"));
        }
        if count.checked_mul(count).is_none() {
            return Err(MapError::invalid(format!("{} tiles per side overflows the tile total", count)));
        }
        Ok(count)
    }
}

/// Top-level configuration file for the map stitcher.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub fetch: FetchConfig,
    pub map: MapParams,
}

impl AppConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
