use crate::tiles::grid::Composite;
use image::{imageops, RgbImage};
use serde::{Deserialize, Serialize};

/// Which edge offsets a pan may land on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    /// `0 <= offset <= max`: the composite's edges can be reached.
    #[default]
    Inclusive,
    /// `0 < offset < max`: the outermost pixel on each edge stays out of reach.
    Exclusive,
}

impl EdgePolicy {
    fn accepts(self, offset: i64, max: i64) -> bool {
        match self {
            EdgePolicy::Inclusive => (0..=max).contains(&offset),
            EdgePolicy::Exclusive => offset > 0 && offset < max,
        }
    }
}

/// A display-sized window onto a stitched composite.
///
/// The offset is the top-left pixel of the window inside the composite. On
/// an axis where the composite is at least as large as the display it always
/// stays in `[0, composite - display]`. On an axis where the composite is
/// smaller it is pinned at the centered (negative) value and the window is
/// letterboxed.
#[derive(Debug, Clone)]
pub struct Viewport {
    composite: Composite,
    display_width: u32,
    display_height: u32,
    offset_x: i64,
    offset_y: i64,
    edge_policy: EdgePolicy,
    /// Visible pixels, refreshed whenever the offset moves.
    window: RgbImage,
}

impl Viewport {
    /// Creates a viewport centered on `composite`.
    pub fn new(display_width: u32, display_height: u32, composite: Composite) -> Self {
        let offset_x = centered(composite.width(), display_width);
        let offset_y = centered(composite.height(), display_height);
        let mut viewport = Self {
            composite,
            display_width,
            display_height,
            offset_x,
            offset_y,
            edge_policy: EdgePolicy::default(),
            window: RgbImage::new(display_width, display_height),
        };
        viewport.refresh_window();
        viewport
    }

    pub fn with_edge_policy(mut self, edge_policy: EdgePolicy) -> Self {
        self.edge_policy = edge_policy;
        self
    }

    /// Moves the window by `(dx, dy)` pixels.
    ///
    /// Each axis is handled on its own: a move that would leave the allowed
    /// range is dropped for that axis, the other axis still moves.
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let x = self.constrain(self.offset_x, dx, self.max_offset_x());
        let y = self.constrain(self.offset_y, dy, self.max_offset_y());
        if (x, y) != (self.offset_x, self.offset_y) {
            self.offset_x = x;
            self.offset_y = y;
            self.refresh_window();
        }
    }

    /// The display-sized crop of the composite at the current offset.
    pub fn visible_image(&self) -> &RgbImage {
        &self.window
    }

    /// Top-left pixel of the window inside the composite.
    pub fn offset(&self) -> (i64, i64) {
        (self.offset_x, self.offset_y)
    }

    /// Largest reachable offset on each axis; negative when the composite is
    /// smaller than the display on that axis.
    pub fn max_offset(&self) -> (i64, i64) {
        (self.max_offset_x(), self.max_offset_y())
    }

    pub fn display_size(&self) -> (u32, u32) {
        (self.display_width, self.display_height)
    }

    pub fn edge_policy(&self) -> EdgePolicy {
        self.edge_policy
    }

    pub fn composite(&self) -> &Composite {
        &self.composite
    }

    pub fn into_composite(self) -> Composite {
        self.composite
    }

    fn max_offset_x(&self) -> i64 {
        self.composite.width() as i64 - self.display_width as i64
    }

    fn max_offset_y(&self) -> i64 {
        self.composite.height() as i64 - self.display_height as i64
    }

    fn constrain(&self, old: i64, delta: i32, max: i64) -> i64 {
        if max < 0 {
            return old;
        }
        let proposed = old + delta as i64;
        if self.edge_policy.accepts(proposed, max) {
            proposed
        } else {
            old
        }
    }

    fn refresh_window(&mut self) {
        imageops::replace(
            &mut self.window,
            self.composite.image(),
            -self.offset_x,
            -self.offset_y,
        );
    }
}

/// Offset that centers `display` within `composite`, rounded toward negative infinity.
fn centered(composite: u32, display: u32) -> i64 {
    (composite as i64 - display as i64).div_euclid(2)
}
