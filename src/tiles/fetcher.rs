use super::cache::DiskTileCache;
use super::loader::{HttpTransport, TileTransport};
use super::source::{StaticMapSource, TileKey, TileSource};
use crate::core::config::FetchConfig;
use crate::core::geo::{LatLng, MapStyle, ZoomLevel};
use crate::{MapError, Result};
use image::RgbImage;
use std::time::Duration;

/// A decoded tile together with the key it was fetched under.
#[derive(Debug, Clone)]
pub struct Tile {
    pub key: TileKey,
    pub image: RgbImage,
}

/// Counters kept by a [`TileFetcher`] over its lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchStats {
    pub cache_hits: u64,
    pub network_fetches: u64,
    pub storage_failures: u64,
}

/// Serves tiles from the disk cache, falling back to the remote service.
///
/// Every network fetch is followed by a fixed pause, which bounds the
/// request rate as long as fetches stay sequential.
pub struct TileFetcher {
    cache: DiskTileCache,
    source: Box<dyn TileSource>,
    transport: Box<dyn TileTransport>,
    throttle: Duration,
    stats: FetchStats,
}

impl std::fmt::Debug for TileFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileFetcher")
            .field("cache", &self.cache)
            .field("throttle", &self.throttle)
            .field("stats", &self.stats)
            .finish()
    }
}

impl TileFetcher {
    /// Fetcher talking HTTP to the configured static-map service.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        Ok(Self::with_transport(config, HttpTransport::from_config(config)?))
    }

    /// Fetcher using `transport` in place of HTTP.
    pub fn with_transport(config: &FetchConfig, transport: impl TileTransport + 'static) -> Self {
        Self {
            cache: DiskTileCache::new(config.cache_dir.clone()),
            source: Box::new(StaticMapSource::from_config(config)),
            transport: Box::new(transport),
            throttle: config.throttle(),
            stats: FetchStats::default(),
        }
    }

    /// Replaces the URL builder.
    pub fn with_source(mut self, source: impl TileSource + 'static) -> Self {
        self.source = Box::new(source);
        self
    }

    pub fn cache(&self) -> &DiskTileCache {
        &self.cache
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }

    /// Returns the tile centered on `center`, truncated to the key precision.
    ///
    /// A cache hit costs no network access and no delay. A miss downloads,
    /// decodes and stores the tile, then sleeps for the throttle interval.
    /// Failing to store is logged and otherwise ignored; the tile is still
    /// returned.
    pub fn fetch_tile(
        &mut self,
        center: LatLng,
        zoom: ZoomLevel,
        style: MapStyle,
        tile_size: u32,
    ) -> Result<Tile> {
        let key = TileKey::new(center, zoom, style, tile_size);

        if let Some(image) = self.cache.load(&key) {
            log::debug!("cache hit {}", key);
            self.stats.cache_hits += 1;
            return Ok(Tile { key, image });
        }

        let url = self.source.url(&key);
        log::debug!("fetching {}", url);
        let bytes = self.transport.get(&url)?;
        self.stats.network_fetches += 1;

        let image = image::load_from_memory(&bytes)
            .map_err(|e| MapError::fetch(&url, format!("undecodable response: {}", e)))?
            .to_rgb8();
        if image.dimensions() != (tile_size, tile_size) {
            log::warn!(
                "tile {} is {}x{}, expected {}x{}",
                key,
                image.width(),
                image.height(),
                tile_size,
                tile_size
            );
        }
        log::info!("downloaded tile {} ({} bytes)", key, bytes.len());

        if let Err(e) = self.cache.store(&key, &bytes) {
            self.stats.storage_failures += 1;
            log::warn!("{}", e);
        }

        if !self.throttle.is_zero() {
            std::thread::sleep(self.throttle);
        }

        Ok(Tile { key, image })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Instant;
    use tempfile::TempDir;

    fn png_tile(size: u32, color: Rgb<u8>) -> Vec<u8> {
        let mut bytes = Vec::new();
        RgbImage::from_pixel(size, size, color)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    fn counting_transport(calls: Arc<AtomicUsize>) -> impl TileTransport {
        move |_: &str| -> Result<Vec<u8>> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(png_tile(8, Rgb([200, 100, 50])))
        }
    }

    fn zoom() -> ZoomLevel {
        ZoomLevel::new(15).unwrap()
    }

    #[test]
    fn test_second_fetch_served_from_cache() {
        let temp_dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            counting_transport(calls.clone()),
        );

        let first = fetcher.fetch_tile(LatLng::new(37.79131, -79.4439), zoom(), MapStyle::Roadmap, 8).unwrap();
        let second = fetcher.fetch_tile(LatLng::new(37.79138, -79.4439), zoom(), MapStyle::Roadmap, 8).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(first.key, second.key);
        assert_eq!(second.image.get_pixel(0, 0), &Rgb([200, 100, 50]));
        assert_eq!(
            fetcher.stats(),
            FetchStats { cache_hits: 1, network_fetches: 1, storage_failures: 0 }
        );
    }

    #[test]
    fn test_cache_survives_new_fetcher() {
        let temp_dir = TempDir::new().unwrap();
        let config = FetchConfig::for_testing(temp_dir.path());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut first = TileFetcher::with_transport(&config, counting_transport(calls.clone()));
        first.fetch_tile(LatLng::new(1.0, 2.0), zoom(), MapStyle::Satellite, 8).unwrap();
        let mut second = TileFetcher::with_transport(&config, counting_transport(calls.clone()));
        second.fetch_tile(LatLng::new(1.0, 2.0), zoom(), MapStyle::Satellite, 8).unwrap();
        // A different style is a different key.
        second.fetch_tile(LatLng::new(1.0, 2.0), zoom(), MapStyle::Terrain, 8).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(second.stats().cache_hits, 1);
    }

    #[test]
    fn test_request_url_carries_key_fields() {
        let temp_dir = TempDir::new().unwrap();
        let config = FetchConfig {
            api_key: Some("k3y".to_string()),
            base_url: "https://tiles.test/api".to_string(),
            ..FetchConfig::for_testing(temp_dir.path())
        };
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_by_transport = seen.clone();
        let mut fetcher = TileFetcher::with_transport(&config, move |url: &str| -> Result<Vec<u8>> {
            seen_by_transport.lock().unwrap().push(url.to_string());
            Ok(png_tile(8, Rgb([0, 0, 0])))
        });

        fetcher.fetch_tile(LatLng::new(-33.86889, 151.20939), zoom(), MapStyle::Hybrid, 8).unwrap();

        assert_eq!(
            seen.lock().unwrap().as_slice(),
            ["https://tiles.test/api/staticmap?center=-33.868800,151.209300\
              &zoom=15&maptype=hybrid&size=8x8&format=jpg&key=k3y"]
        );
    }

    #[test]
    fn test_network_failure_is_fetch_error() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            |url: &str| -> Result<Vec<u8>> { Err(MapError::fetch(url, "connection reset")) },
        );
        let result = fetcher.fetch_tile(LatLng::new(0.0, 0.0), zoom(), MapStyle::Roadmap, 8);
        assert!(matches!(result, Err(MapError::Fetch { .. })));
        assert_eq!(fetcher.stats().network_fetches, 0);
    }

    #[test]
    fn test_undecodable_body_is_fetch_error_and_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let mut fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            |_: &str| -> Result<Vec<u8>> { Ok(b"<html>quota exceeded</html>".to_vec()) },
        );
        let result = fetcher.fetch_tile(LatLng::new(0.0, 0.0), zoom(), MapStyle::Roadmap, 8);
        assert!(matches!(result, Err(MapError::Fetch { .. })));
        assert_eq!(fs_entries(temp_dir.path()), 0);
    }

    #[test]
    fn test_storage_failure_still_returns_tile() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut fetcher =
            TileFetcher::with_transport(&FetchConfig::for_testing(&blocker), counting_transport(calls.clone()));

        let tile = fetcher.fetch_tile(LatLng::new(0.0, 0.0), zoom(), MapStyle::Roadmap, 8).unwrap();
        assert_eq!(tile.image.dimensions(), (8, 8));
        assert_eq!(fetcher.stats().storage_failures, 1);

        // Nothing was persisted, so the next call goes back to the network.
        fetcher.fetch_tile(LatLng::new(0.0, 0.0), zoom(), MapStyle::Roadmap, 8).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_throttle_applies_to_misses_only() {
        let temp_dir = TempDir::new().unwrap();
        let config = FetchConfig {
            throttle_ms: 60,
            ..FetchConfig::with_cache_dir(temp_dir.path())
        };
        let mut fetcher = TileFetcher::with_transport(&config, counting_transport(Arc::new(AtomicUsize::new(0))));

        let start = Instant::now();
        fetcher.fetch_tile(LatLng::new(5.0, 5.0), zoom(), MapStyle::Roadmap, 8).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(60));

        let start = Instant::now();
        fetcher.fetch_tile(LatLng::new(5.0, 5.0), zoom(), MapStyle::Roadmap, 8).unwrap();
        assert!(start.elapsed() < Duration::from_millis(60));
    }

    fn fs_entries(dir: &std::path::Path) -> usize {
        std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
    }
}
