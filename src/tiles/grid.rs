//! Stitches a square grid of static-map tiles into one composite image.

use super::fetcher::TileFetcher;
use crate::core::config::MapParams;
use crate::core::geo::{BoundingBox, LatLng};
use crate::core::projection::{tile_center, tile_center_to_lat, tile_center_to_lng, PixelOrigin};
use crate::traits::ProgressReporter;
use crate::Result;
use image::{imageops, RgbImage};

/// A stitched grid of tiles and the geographic extent of its corner tiles.
#[derive(Debug, Clone)]
pub struct Composite {
    image: RgbImage,
    bounds: BoundingBox,
    tile_count: u32,
    tile_size: u32,
}

impl Composite {
    pub fn new(image: RgbImage, bounds: BoundingBox, tile_count: u32, tile_size: u32) -> Self {
        Self {
            image,
            bounds,
            tile_count,
            tile_size,
        }
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Centers of the northwest and southeast corner tiles.
    pub fn bounds(&self) -> BoundingBox {
        self.bounds
    }

    /// Tiles per side.
    pub fn tile_count(&self) -> u32 {
        self.tile_count
    }

    pub fn tile_size(&self) -> u32 {
        self.tile_size
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Fetches every tile of the grid described by `params` and pastes it into
/// a single image.
///
/// Tiles are fetched one at a time, column by column (west to east), each
/// column north to south. The first failing tile aborts the whole assembly
/// and no partial composite is returned. `reporter` sees `start` before the
/// first tile, `update` after each one, and `stop` at the end either way.
pub fn assemble(
    fetcher: &mut TileFetcher,
    params: &MapParams,
    reporter: &mut dyn ProgressReporter,
) -> Result<Composite> {
    let tile_count = params.validate()?;
    let tile_size = params.tile_size;
    let center = params.truncated_center();
    let origin = PixelOrigin::of(&center);
    let side = tile_count * tile_size;

    log::info!(
        "assembling {}x{} {} tiles around {} at zoom {}",
        tile_count,
        tile_count,
        params.style,
        center,
        params.zoom
    );

    reporter.start(tile_count * tile_count);
    let result = paste_tiles(fetcher, params, origin, tile_count, side, reporter);
    reporter.stop();
    let image = result?;

    let corner = |column: u32, row: u32| {
        LatLng::new(
            tile_center_to_lat(row, origin.y, tile_count, tile_size, params.zoom),
            tile_center_to_lng(column, origin.x, tile_count, tile_size, params.zoom),
        )
    };
    let bounds = BoundingBox::new(corner(0, 0), corner(tile_count - 1, tile_count - 1));

    Ok(Composite::new(image, bounds, tile_count, tile_size))
}

fn paste_tiles(
    fetcher: &mut TileFetcher,
    params: &MapParams,
    origin: PixelOrigin,
    tile_count: u32,
    side: u32,
    reporter: &mut dyn ProgressReporter,
) -> Result<RgbImage> {
    let tile_size = params.tile_size;
    let mut image = RgbImage::new(side, side);
    let mut completed = 0;

    for column in 0..tile_count {
        for row in 0..tile_count {
            let center = tile_center(column, row, origin, tile_count, tile_size, params.zoom);
            let tile = fetcher.fetch_tile(center, params.zoom, params.style, tile_size)?;
            completed += 1;
            reporter.update(completed);
            imageops::replace(
                &mut image,
                &tile.image,
                (column * tile_size) as i64,
                (row * tile_size) as i64,
            );
        }
    }

    Ok(image)
}
