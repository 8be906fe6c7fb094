use crate::core::config::MapParams;
use crate::core::geo::{BoundingBox, MapStyle, ZoomLevel};
use crate::core::viewport::Viewport;
use crate::tiles::fetcher::{FetchStats, TileFetcher};
use crate::tiles::grid::{assemble, Composite};
use crate::traits::{NoopReporter, ProgressReporter};
use crate::Result;
use image::RgbImage;

/// A pannable map built from one set of [`MapParams`].
///
/// Construction fetches and stitches the whole grid. Changing zoom, style or
/// any other parameter goes through [`MapSession::rebuild`], which replaces
/// the composite and viewport in one step or not at all.
pub struct MapSession {
    params: MapParams,
    fetcher: TileFetcher,
    viewport: Viewport,
    reporter: Box<dyn ProgressReporter + Send>,
}

impl std::fmt::Debug for MapSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MapSession")
            .field("params", &self.params)
            .field("fetcher", &self.fetcher)
            .field("offset", &self.viewport.offset())
            .finish()
    }
}

impl MapSession {
    /// Builds a session without progress reporting.
    pub fn new(params: MapParams, fetcher: TileFetcher) -> Result<Self> {
        Self::with_reporter(params, fetcher, NoopReporter)
    }

    /// Builds a session that reports progress of this and every later rebuild.
    pub fn with_reporter(
        params: MapParams,
        mut fetcher: TileFetcher,
        reporter: impl ProgressReporter + Send + 'static,
    ) -> Result<Self> {
        let mut reporter: Box<dyn ProgressReporter + Send> = Box::new(reporter);
        let viewport = build_viewport(&mut fetcher, &params, reporter.as_mut())?;
        Ok(Self {
            params,
            fetcher,
            viewport,
            reporter,
        })
    }

    /// Moves the visible window by `(dx, dy)` pixels; see [`Viewport::pan`].
    pub fn pan(&mut self, dx: i32, dy: i32) {
        self.viewport.pan(dx, dy);
    }

    /// The display-sized image currently visible.
    pub fn current_image(&self) -> &RgbImage {
        self.viewport.visible_image()
    }

    pub fn bounds(&self) -> BoundingBox {
        self.viewport.composite().bounds()
    }

    pub fn composite(&self) -> &Composite {
        self.viewport.composite()
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn offset(&self) -> (i64, i64) {
        self.viewport.offset()
    }

    pub fn params(&self) -> &MapParams {
        &self.params
    }

    pub fn fetcher_stats(&self) -> FetchStats {
        self.fetcher.stats()
    }

    pub fn set_reporter(&mut self, reporter: impl ProgressReporter + Send + 'static) {
        self.reporter = Box::new(reporter);
    }

    /// Rebuilds everything for `params`.
    ///
    /// On success the new composite replaces the old one and the window is
    /// re-centered. On failure the session is left exactly as it was.
    pub fn rebuild(&mut self, params: MapParams) -> Result<()> {
        let viewport = build_viewport(&mut self.fetcher, &params, self.reporter.as_mut())?;
        self.viewport = viewport;
        self.params = params;
        Ok(())
    }

    pub fn change_style(&mut self, style: MapStyle) -> Result<()> {
        self.rebuild(MapParams {
            style,
            ..self.params.clone()
        })
    }

    pub fn change_zoom(&mut self, zoom: ZoomLevel) -> Result<()> {
        self.rebuild(MapParams {
            zoom,
            ..self.params.clone()
        })
    }

    /// Zooms in one level. Returns `Ok(false)` when already at the maximum.
    pub fn zoom_in(&mut self) -> Result<bool> {
        match self.params.zoom.zoomed_in() {
            Some(zoom) => self.change_zoom(zoom).map(|_| true),
            None => Ok(false),
        }
    }

    /// Zooms out one level. Returns `Ok(false)` when already at zero.
    pub fn zoom_out(&mut self) -> Result<bool> {
        match self.params.zoom.zoomed_out() {
            Some(zoom) => self.change_zoom(zoom).map(|_| true),
            None => Ok(false),
        }
    }

    /// Gives the fetcher back, e.g. to start a session elsewhere.
    pub fn into_fetcher(self) -> TileFetcher {
        self.fetcher
    }
}

fn build_viewport(
    fetcher: &mut TileFetcher,
    params: &MapParams,
    reporter: &mut dyn ProgressReporter,
) -> Result<Viewport> {
    let composite = assemble(fetcher, params, reporter)?;
    Ok(Viewport::new(params.display_width, params.display_height, composite)
        .with_edge_policy(params.edge_policy))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FetchConfig;
    use crate::core::geo::LatLng;
    use crate::{MapError, TileTransport};
    use image::{ImageOutputFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    const TILE: u32 = 16;

    fn params() -> MapParams {
        MapParams {
            center: LatLng::new(0.0, 0.0),
            zoom: ZoomLevel::new(15).unwrap(),
            radius_meters: 58.0,
            tile_size: TILE,
            display_width: 20,
            display_height: 12,
            ..MapParams::default()
        }
    }

    /// Colors tiles by style so rebuilds are visible in the pixels.
    fn styled_tiles(calls: Arc<AtomicUsize>, broken: Arc<AtomicBool>) -> impl TileTransport {
        move |url: &str| -> crate::Result<Vec<u8>> {
            calls.fetch_add(1, Ordering::SeqCst);
            if broken.load(Ordering::SeqCst) {
                return Err(MapError::fetch(url, "offline"));
            }
            let shade = if url.contains("maptype=satellite") { 200 } else { 50 };
            let mut bytes = Vec::new();
            RgbImage::from_pixel(TILE, TILE, Rgb([shade, shade, shade]))
                .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
                .unwrap();
            Ok(bytes)
        }
    }

    fn session(temp_dir: &TempDir) -> (MapSession, Arc<AtomicUsize>, Arc<AtomicBool>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let broken = Arc::new(AtomicBool::new(false));
        let fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            styled_tiles(calls.clone(), broken.clone()),
        );
        (MapSession::new(params(), fetcher).unwrap(), calls, broken)
    }

    #[test]
    fn test_session_starts_centered() {
        let temp_dir = TempDir::new().unwrap();
        let (session, calls, _) = session(&temp_dir);
        assert_eq!(calls.load(Ordering::SeqCst), 9);
        assert_eq!(session.composite().width(), 48);
        assert_eq!(session.offset(), (14, 18));
        assert_eq!(session.current_image().dimensions(), (20, 12));
        assert_eq!(session.current_image().get_pixel(0, 0), &Rgb([50, 50, 50]));
    }

    #[test]
    fn test_pan_moves_window() {
        let temp_dir = TempDir::new().unwrap();
        let (mut session, _, _) = session(&temp_dir);
        session.pan(3, -4);
        assert_eq!(session.offset(), (17, 14));
        session.pan(100, 0);
        assert_eq!(session.offset(), (17, 14));
    }

    #[test]
    fn test_change_style_rebuilds() {
        let temp_dir = TempDir::new().unwrap();
        let (mut session, calls, _) = session(&temp_dir);
        session.pan(5, 5);

        session.change_style(MapStyle::Satellite).unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 18);
        assert_eq!(session.params().style, MapStyle::Satellite);
        assert_eq!(session.offset(), (14, 18));
        assert_eq!(session.current_image().get_pixel(0, 0), &Rgb([200, 200, 200]));

        // Going back is served entirely from the disk cache.
        session.change_style(MapStyle::Roadmap).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 18);
        assert_eq!(session.fetcher_stats().cache_hits, 9);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_state() {
        let temp_dir = TempDir::new().unwrap();
        let (mut session, _, broken) = session(&temp_dir);
        session.pan(2, 2);
        let bounds = session.bounds();
        broken.store(true, Ordering::SeqCst);

        let result = session.change_zoom(ZoomLevel::new(16).unwrap());

        assert!(matches!(result, Err(MapError::Fetch { .. })));
        assert_eq!(session.params().zoom.get(), 15);
        assert_eq!(session.offset(), (16, 20));
        assert_eq!(session.bounds(), bounds);
    }

    #[test]
    fn test_invalid_rebuild_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let (mut session, calls, _) = session(&temp_dir);
        let result = session.rebuild(MapParams {
            radius_meters: -1.0,
            ..params()
        });
        assert!(matches!(result, Err(MapError::InvalidConfiguration(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 9);
    }

    #[test]
    fn test_zoom_steps_rebuild_grid() {
        let temp_dir = TempDir::new().unwrap();
        let (mut session, _, _) = session(&temp_dir);

        assert!(session.zoom_out().unwrap());
        assert_eq!(session.params().zoom.get(), 14);
        assert_eq!(session.composite().tile_count(), 2);

        assert!(session.zoom_in().unwrap());
        assert!(session.zoom_in().unwrap());
        assert_eq!(session.params().zoom.get(), 16);
        assert_eq!(session.composite().tile_count(), 6);
    }

    #[test]
    fn test_zoom_in_stops_at_maximum() {
        let temp_dir = TempDir::new().unwrap();
        let fetcher = TileFetcher::with_transport(
            &FetchConfig::for_testing(temp_dir.path()),
            styled_tiles(Arc::new(AtomicUsize::new(0)), Arc::new(AtomicBool::new(false))),
        );
        let params = MapParams {
            zoom: ZoomLevel::new(crate::constants::MAX_ZOOM).unwrap(),
            radius_meters: 0.3,
            ..params()
        };
        let mut session = MapSession::new(params, fetcher).unwrap();
        assert!(!session.zoom_in().unwrap());
        assert_eq!(session.params().zoom.get(), crate::constants::MAX_ZOOM);
    }
}
