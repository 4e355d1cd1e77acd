//! Zone-crossing sweep recognition along a single axis.
//!
//! A sweep is anchored at its first sample. The anchor picks the direction
//! of travel and the four checkpoints the touch has to move past in order:
//! it must be seen between the first two, then between the second and third,
//! then beyond both the third and the terminal edge.
use tracing::debug;

use crate::{
    config::{SweepDirection, SweepDirections},
    geometry::ScreenGeometry,
    Tick, TouchSample,
};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Travel {
    Increasing,
    Decreasing,
}

impl Travel {
    /// Strictly between `from` and `to`, in the direction of travel
    fn between(self, v: i32, from: i32, to: i32) -> bool {
        match self {
            Travel::Increasing => v > from && v < to,
            Travel::Decreasing => v < from && v > to,
        }
    }

    fn beyond(self, v: i32, mark: i32) -> bool {
        match self {
            Travel::Increasing => v > mark,
            Travel::Decreasing => v < mark,
        }
    }
}

/// Checkpoints along the axis for one direction of travel
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SweepPath {
    pub travel: Travel,
    pub checkpoints: [i32; 4],
}

impl Axis {
    fn coordinate(self, sample: &TouchSample) -> i32 {
        match self {
            Axis::Horizontal => sample.x,
            Axis::Vertical => sample.y,
        }
    }

    fn direction(self, travel: Travel) -> SweepDirection {
        match (self, travel) {
            (Axis::Horizontal, Travel::Increasing) => SweepDirection::Right,
            (Axis::Horizontal, Travel::Decreasing) => SweepDirection::Left,
            (Axis::Vertical, Travel::Increasing) => SweepDirection::Down,
            (Axis::Vertical, Travel::Decreasing) => SweepDirection::Up,
        }
    }

    /// Horizontal sweeps use fixed zones across the panel, vertical sweeps
    /// step away from wherever they were anchored
    pub fn path(self, anchor: i32, geometry: &ScreenGeometry) -> SweepPath {
        match self {
            Axis::Horizontal => {
                let terminal = geometry.max_x - geometry.x_final;
                if anchor < geometry.x_split {
                    SweepPath {
                        travel: Travel::Increasing,
                        checkpoints: [0, geometry.x_barrier_1, geometry.x_barrier_2, terminal],
                    }
                } else {
                    SweepPath {
                        travel: Travel::Decreasing,
                        checkpoints: [
                            terminal,
                            geometry.x_barrier_2,
                            geometry.x_barrier_1,
                            geometry.x_final,
                        ],
                    }
                }
            }
            Axis::Vertical => {
                let step = geometry.y_step;
                if anchor <= geometry.y_split {
                    SweepPath {
                        travel: Travel::Increasing,
                        checkpoints: [anchor, anchor + step, anchor + 2 * step, anchor + 3 * step],
                    }
                } else {
                    SweepPath {
                        travel: Travel::Decreasing,
                        checkpoints: [anchor, anchor - step, anchor - 2 * step, anchor - 3 * step],
                    }
                }
            }
        }
    }
}

/// Per-session progress of one axis in one mode
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AxisSweepState {
    pub anchor: Option<i32>,
    pub anchor_time: Tick,
    pub barrier: [bool; 2],
    /// Cleared once the session has fired
    pub armed: bool,
}

impl Default for AxisSweepState {
    fn default() -> Self {
        AxisSweepState {
            anchor: None,
            anchor_time: 0,
            barrier: [false, false],
            armed: true,
        }
    }
}

impl AxisSweepState {
    pub fn reset(&mut self) {
        *self = AxisSweepState::default();
    }

    /// Feed one coordinate, returning the path travelled if this sample
    /// completes the sweep
    fn advance(
        &mut self,
        axis: Axis,
        coordinate: i32,
        now: Tick,
        geometry: &ScreenGeometry,
        timeout_ms: Tick,
    ) -> Option<Travel> {
        let anchor = match self.anchor {
            Some(anchor) => anchor,
            None => {
                self.anchor = Some(coordinate);
                self.anchor_time = now;
                return None;
            }
        };

        let SweepPath {
            travel,
            checkpoints: [c0, c1, c2, terminal],
        } = axis.path(anchor, geometry);

        if !(self.barrier[0] || travel.between(coordinate, c0, c1)) {
            return None;
        }
        self.barrier[0] = true;

        if !(self.barrier[1] || travel.between(coordinate, c1, c2)) {
            return None;
        }
        self.barrier[1] = true;

        if !(travel.beyond(coordinate, c2) && travel.beyond(coordinate, terminal)) {
            return None;
        }

        let elapsed = now.saturating_sub(self.anchor_time);
        if !self.armed || elapsed >= timeout_ms {
            debug!(?axis, elapsed, armed = self.armed, "sweep reached the edge too late");
            return None;
        }

        self.armed = false;
        Some(travel)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SweepMode {
    Wake,
    Sleep,
}

/// One axis, tracked separately for the wake and sleep interpretations
#[derive(Debug, Clone)]
pub struct SweepDetector {
    axis: Axis,
    wake: AxisSweepState,
    sleep: AxisSweepState,
}

impl SweepDetector {
    pub fn new(axis: Axis) -> Self {
        SweepDetector {
            axis,
            wake: AxisSweepState::default(),
            sleep: AxisSweepState::default(),
        }
    }

    pub fn state(&self, mode: SweepMode) -> &AxisSweepState {
        match mode {
            SweepMode::Wake => &self.wake,
            SweepMode::Sleep => &self.sleep,
        }
    }

    pub fn reset(&mut self) {
        self.wake.reset();
        self.sleep.reset();
    }

    /// Evaluate a sample the caller has already found eligible for `mode`
    pub fn evaluate(
        &mut self,
        mode: SweepMode,
        sample: &TouchSample,
        now: Tick,
        geometry: &ScreenGeometry,
        enabled: SweepDirections,
        timeout_ms: Tick,
    ) -> Option<SweepDirection> {
        if !sample.is_single_touch || enabled.is_empty() {
            return None;
        }

        let axis = self.axis;
        let state = match mode {
            SweepMode::Wake => &mut self.wake,
            SweepMode::Sleep => &mut self.sleep,
        };

        // Only the direction the anchor implies is tracked at all
        if let Some(anchor) = state.anchor {
            let direction = axis.direction(axis.path(anchor, geometry).travel);
            if !enabled.contains(direction.flag()) {
                return None;
            }
        }

        let travel = state.advance(axis, axis.coordinate(sample), now, geometry, timeout_ms)?;
        let direction = axis.direction(travel);
        debug!(?mode, ?direction, "sweep");
        Some(direction)
    }
}
