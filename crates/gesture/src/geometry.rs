//! Panel coordinate geometry the sweep zones and tap regions are cut from.
use crate::TouchSample;

/// Coordinate maxima of the reference 1440x2560 panel.
pub const REFERENCE_MAX_X: i32 = 1439;
pub const REFERENCE_MAX_Y: i32 = 2559;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub max_x: i32,
    pub max_y: i32,
    /// Width of the band along each panel edge
    pub edge: i32,
    /// Anchors left of this sweep right, anchors at or right of it sweep left
    pub x_split: i32,
    pub x_barrier_1: i32,
    pub x_barrier_2: i32,
    /// Distance of the terminal zone from either side of the panel
    pub x_final: i32,
    /// Anchors above this sweep down, anchors below it sweep up
    pub y_split: i32,
    pub y_step: i32,
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        ScreenGeometry {
            max_x: REFERENCE_MAX_X,
            max_y: REFERENCE_MAX_Y,
            edge: 130,
            x_split: 720,
            x_barrier_1: 532,
            x_barrier_2: 960,
            x_final: 360,
            y_split: 1066,
            y_step: 180,
        }
    }
}

impl ScreenGeometry {
    /// Scale the reference layout onto a panel with the given coordinate maxima
    pub fn scaled(max_x: i32, max_y: i32) -> Self {
        let reference = ScreenGeometry::default();
        if max_x <= 0 || max_y <= 0 {
            return reference;
        }

        let sx = |v: i32| (v as i64 * max_x as i64 / REFERENCE_MAX_X as i64) as i32;
        let sy = |v: i32| (v as i64 * max_y as i64 / REFERENCE_MAX_Y as i64) as i32;

        ScreenGeometry {
            max_x,
            max_y,
            edge: sx(reference.edge).min(sy(reference.edge)),
            x_split: sx(reference.x_split),
            x_barrier_1: sx(reference.x_barrier_1),
            x_barrier_2: sx(reference.x_barrier_2),
            x_final: sx(reference.x_final),
            y_split: sy(reference.y_split),
            y_step: sy(reference.y_step),
        }
    }

    pub fn x_limit(&self) -> i32 {
        self.max_x - self.edge
    }

    pub fn y_limit(&self) -> i32 {
        self.max_y - self.edge
    }

    /// The bottom band sleep sweeps have to travel along
    pub fn in_sleep_sweep_band(&self, sample: &TouchSample) -> bool {
        sample.y >= self.y_limit()
    }

    /// Anywhere on the panel except the edge band
    pub fn in_wake_tap_region(&self, sample: &TouchSample) -> bool {
        (self.edge..=self.x_limit()).contains(&sample.x)
            && (self.edge..=self.y_limit()).contains(&sample.y)
    }
}
