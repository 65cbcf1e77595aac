//! Region of interest placement.
//!
//! The ROI is recomputed for every frame from the frame's current size. It is
//! anchored at a fraction of the frame width and a fixed top offset, sized to a
//! fixed square and clamped so it always lies inside the frame.

use crate::config::RoiSettings;

/// Rectangle in pixel coordinates. `x2`/`y2` are exclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Roi {
    pub x1: u32,
    pub y1: u32,
    pub x2: u32,
    pub y2: u32,
}

impl Roi {
    /// Place the ROI inside a `width` x `height` frame.
    ///
    /// For any frame with at least one pixel the result satisfies
    /// `x1 < x2 <= width` and `y1 < y2 <= height`. A zero-sized frame yields an
    /// empty ROI.
    pub fn compute(settings: &RoiSettings, width: u32, height: u32) -> Self {
        if width == 0 || height == 0 {
            return Self {
                x1: 0,
                y1: 0,
                x2: 0,
                y2: 0,
            };
        }

        let anchor = (f64::from(width) * f64::from(settings.anchor_x)).floor() as u32;
        let x1 = anchor.min(width - 1);
        let y1 = settings.top.min(height - 1);
        let x2 = x1.saturating_add(settings.size).min(width);
        let y2 = y1.saturating_add(settings.size).min(height);

        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> u32 {
        self.x2.saturating_sub(self.x1)
    }

    pub fn height(&self) -> u32 {
        self.y2.saturating_sub(self.y1)
    }

    pub fn is_empty(&self) -> bool {
        self.width() == 0 || self.height() == 0
    }
}
