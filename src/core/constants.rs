//! Engine-wide constants for the static-map tile grid.
//! Keeping them in a single place makes it easier to tweak the magic numbers.

/// Number of pixels in half the earth's circumference at the reference zoom.
pub const EARTH_PIX: f64 = 268_435_456.0;

/// Zoom level at which global pixel coordinates are measured.
pub const REFERENCE_ZOOM: u8 = 21;

/// Pixel radius of the earth at the reference zoom (`EARTH_PIX / π`).
pub const PIXEL_RADIUS: f64 = EARTH_PIX / std::f64::consts::PI;

/// Number of decimal places kept when keying tiles by coordinate.
pub const DEGREE_PRECISION: u32 = 4;

/// Largest square tile the static-map service hands out for free.
pub const TILE_SIZE: u32 = 640;

/// Fastest rate (requests per second) at which tiles may be downloaded.
pub const GRAB_RATE: u64 = 4;

/// Ground resolution in meters per pixel at zoom 0 on the equator.
pub const METERS_PER_PIXEL_ZOOM0: f64 = 156_543.033_92;

/// Lowest zoom level accepted by the static-map service.
pub const MIN_ZOOM: u8 = 0;

/// Highest zoom level accepted by the static-map service.
pub const MAX_ZOOM: u8 = 22;

/// Upper bound on tiles per grid side unless configured otherwise.
pub const DEFAULT_MAX_TILE_COUNT: u32 = 32;

/// Default directory for the on-disk tile cache.
pub const DEFAULT_CACHE_DIR: &str = "mapscache";

/// Default static-map endpoint, without the `/staticmap` path.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
