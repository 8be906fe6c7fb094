//! Prelude module for common mapstitch types and traits
//!
//! This module re-exports the most commonly used types, traits, and functions
//! for easy importing with `use mapstitch::prelude::*;`

pub use crate::core::{
    config::{AppConfig, FetchConfig, MapParams},
    geo::{BoundingBox, LatLng, MapStyle, ZoomLevel},
    map::MapSession,
    viewport::{EdgePolicy, Viewport},
};

pub use crate::tiles::{
    fetcher::{FetchStats, TileFetcher},
    grid::Composite,
    loader::TileTransport,
    source::TileSource,
};

pub use crate::background::{spawn_session, AssemblyHandle, ProgressEvent};

pub use crate::traits::{LogReporter, NoopReporter, ProgressReporter};

pub use crate::{MapError, Result};
