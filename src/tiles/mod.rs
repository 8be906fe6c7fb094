pub mod cache;
pub mod fetcher;
pub mod grid;
pub mod loader;
pub mod source;

// Re-exports for convenience
pub use cache::DiskTileCache;
pub use fetcher::{FetchStats, Tile, TileFetcher};
pub use grid::{assemble, Composite};
pub use loader::{HttpTransport, TileTransport};
pub use source::{StaticMapSource, TileKey, TileSource};
