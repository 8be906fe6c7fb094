use crate::core::config::FetchConfig;
use crate::core::geo::{LatLng, MapStyle, ZoomLevel};
use std::fmt;

/// Identity of one static-map tile.
///
/// The center is truncated on construction, so keys built from points that
/// only differ past the fourth decimal compare (and format) equal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileKey {
    pub center: LatLng,
    pub zoom: ZoomLevel,
    pub style: MapStyle,
    pub tile_size: u32,
}

impl TileKey {
    pub fn new(center: LatLng, zoom: ZoomLevel, style: MapStyle, tile_size: u32) -> Self {
        Self {
            center: center.truncated(),
            zoom,
            style,
            tile_size,
        }
    }

    /// Cache file name: `{lat}_{lon}_{zoom}_{style}_{size}_{size}.jpg`.
    pub fn file_name(&self) -> String {
        format!("{}.jpg", self)
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.6}_{:.6}_{}_{}_{}_{}",
            self.center.lat, self.center.lng, self.zoom, self.style, self.tile_size, self.tile_size
        )
    }
}

/// Trait representing anything that can produce tile URLs for a given key.
pub trait TileSource: Send + Sync {
    /// Build a URL for the requested `key`.
    fn url(&self, key: &TileKey) -> String;
}

/// Static-map endpoint returning one JPEG per request.
#[derive(Debug, Clone)]
pub struct StaticMapSource {
    base_url: String,
    api_key: Option<String>,
}

impl StaticMapSource {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.is_empty()),
        }
    }

    pub fn from_config(config: &FetchConfig) -> Self {
        Self::new(config.base_url.clone(), config.api_key.clone())
    }
}

impl TileSource for StaticMapSource {
    fn url(&self, key: &TileKey) -> String {
        let mut url = format!(
            "{}/staticmap?center={:.6},{:.6}&zoom={}&maptype={}&size={}x{}&format=jpg",
            self.base_url,
            key.center.lat,
            key.center.lng,
            key.zoom,
            key.style,
            key.tile_size,
            key.tile_size
        );
        if let Some(api_key) = &self.api_key {
            url.push_str("&key=");
            url.push_str(api_key);
        }
        url
    }
}
