//! # mapstitch
//!
//! Builds one large, pannable raster map for an arbitrary center, zoom level
//! and map style by downloading fixed-size tiles from a static-map image
//! service and stitching them together.
//!
//! Tiles are cached on disk keyed by their request parameters, so repeated
//! sessions over the same area never hit the network twice. Fetches are
//! strictly sequential and throttled.

pub mod background;
pub mod core;
pub mod tiles;
pub mod traits;
pub mod prelude;

pub use crate::core::constants;

// Re-export public API
pub use crate::core::{
    config::{AppConfig, FetchConfig, MapParams},
    geo::{BoundingBox, LatLng, MapStyle, ZoomLevel},
    map::MapSession,
    viewport::{EdgePolicy, Viewport},
};

pub use crate::background::{spawn_session, AssemblyHandle, ChannelReporter, ProgressEvent};

pub use crate::tiles::{
    cache::DiskTileCache,
    fetcher::{FetchStats, Tile, TileFetcher},
    grid::{assemble, Composite},
    loader::{HttpTransport, TileTransport},
    source::{StaticMapSource, TileKey, TileSource},
};

pub use crate::traits::{LogReporter, NoopReporter, ProgressReporter};

use std::path::PathBuf;

/// Result type used throughout the library
pub type Result<T> = std::result::Result<T, MapError>;

/// Common error types
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    /// Rejected before any network activity.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Network failure, bad HTTP status, or a body that is not an image.
    #[error("Failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },

    /// The tile cache could not be written.
    #[error("Failed to store tile at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Background assembly error: {0}")]
    Background(String),
}

impl MapError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn fetch(url: &str, reason: impl ToString) -> Self {
        Self::Fetch {
            url: url.to_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Error type alias for convenience
pub type Error = MapError;

/// Initializes `env_logger` from the `RUST_LOG` environment variable.
///
/// Safe to call more than once; later calls are ignored.
#[cfg(feature = "debug")]
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info"),
    )
    .try_init();
}
