//! Web Mercator math for the static-map tile grid.
//!
//! Global pixel coordinates are measured at [`REFERENCE_ZOOM`], where half
//! the earth's circumference spans [`EARTH_PIX`] pixels. Tiles at a coarser
//! zoom are placed by scaling their pixel offsets up to that reference.

use crate::core::constants::{
    EARTH_PIX, METERS_PER_PIXEL_ZOOM0, PIXEL_RADIUS, REFERENCE_ZOOM,
};
use crate::core::geo::{LatLng, ZoomLevel};
use std::f64::consts::FRAC_PI_2;

/// Rescales a pixel offset at `zoom` to the equivalent offset at the
/// reference zoom: `pixels * 2^(21 - zoom)`.
pub fn pixels_for_degrees(pixels: f64, zoom: ZoomLevel) -> f64 {
    pixels * 2_f64.powi(REFERENCE_ZOOM as i32 - zoom.get() as i32)
}

/// Longitude to global pixel x.
pub fn lng_to_global_pixel(lng: f64) -> f64 {
    EARTH_PIX + lng * PIXEL_RADIUS.to_radians()
}

/// Latitude to global pixel y (forward Web Mercator, y grows southward).
pub fn lat_to_global_pixel(lat: f64) -> f64 {
    let sin_lat = lat.to_radians().sin();
    EARTH_PIX - PIXEL_RADIUS * ((1.0 + sin_lat) / (1.0 - sin_lat)).ln() / 2.0
}

/// Global pixel x back to longitude.
pub fn global_pixel_to_lng(pixel: f64) -> f64 {
    ((pixel - EARTH_PIX) / PIXEL_RADIUS).to_degrees()
}

/// Global pixel y back to latitude (inverse Web Mercator).
pub fn global_pixel_to_lat(pixel: f64) -> f64 {
    (FRAC_PI_2 - 2.0 * ((pixel - EARTH_PIX) / PIXEL_RADIUS).exp().atan()).to_degrees()
}

/// Global pixel position of a geographic point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelOrigin {
    pub x: f64,
    pub y: f64,
}

impl PixelOrigin {
    pub fn of(point: &LatLng) -> Self {
        Self {
            x: lng_to_global_pixel(point.lng),
            y: lat_to_global_pixel(point.lat),
        }
    }
}

/// Global pixel offset of grid index `index` from the axis origin.
///
/// Index `tile_count / 2` (integer halving) sits on the origin itself.
fn tile_offset(index: u32, tile_count: u32, tile_size: u32, zoom: ZoomLevel) -> f64 {
    let steps = index as i64 - (tile_count / 2) as i64;
    pixels_for_degrees((steps * tile_size as i64) as f64, zoom)
}

/// Longitude at the center of grid column `index`.
pub fn tile_center_to_lng(
    index: u32,
    origin_pixel: f64,
    tile_count: u32,
    tile_size: u32,
    zoom: ZoomLevel,
) -> f64 {
    global_pixel_to_lng(origin_pixel + tile_offset(index, tile_count, tile_size, zoom))
}

/// Latitude at the center of grid row `index`.
pub fn tile_center_to_lat(
    index: u32,
    origin_pixel: f64,
    tile_count: u32,
    tile_size: u32,
    zoom: ZoomLevel,
) -> f64 {
    global_pixel_to_lat(origin_pixel + tile_offset(index, tile_count, tile_size, zoom))
}

/// Geographic center of the tile at grid column `column` and row `row`.
pub fn tile_center(
    column: u32,
    row: u32,
    origin: PixelOrigin,
    tile_count: u32,
    tile_size: u32,
    zoom: ZoomLevel,
) -> LatLng {
    LatLng::new(
        tile_center_to_lat(row, origin.y, tile_count, tile_size, zoom),
        tile_center_to_lng(column, origin.x, tile_count, tile_size, zoom),
    )
}

/// Ground pixels per meter at `latitude` and `zoom`.
pub fn pixels_per_meter(latitude: f64, zoom: ZoomLevel) -> f64 {
    2_f64.powi(zoom.get() as i32) / (METERS_PER_PIXEL_ZOOM0 * latitude.to_radians().cos())
}

/// Number of tiles per grid side needed to cover `radius_meters` around a
/// center at `latitude`.
///
/// May be zero (or nonsensical for non-positive radii); callers validate the
/// result before building a grid.
pub fn compute_tile_count(latitude: f64, zoom: ZoomLevel, radius_meters: f64, tile_size: u32) -> i64 {
    let tile_half_span = tile_size as f64 / 2.0 / radius_meters;
    let count = (2.0 * pixels_per_meter(latitude, zoom) / tile_half_span).round();
    if count.is_finite() {
        count as i64
    } else {
        0
    }
}
