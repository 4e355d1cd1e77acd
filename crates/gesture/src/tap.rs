use tracing::debug;

use crate::{config::TapWindow, Tick, TouchSample};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TapState {
    pub prev_xy: Option<(i32, i32)>,
    pub prev_time: Tick,
    pub count: u32,
}

/// Pairs two taps landing close together in place and time.
///
/// There is a single session shared by the wake and sleep interpretations;
/// the caller decides which window applies from the display state.
#[derive(Debug, Clone)]
pub struct DoubleTapDetector {
    state: TapState,
    /// Set on lift, consumed by the first tap evaluated afterwards
    rearmed: bool,
}

impl Default for DoubleTapDetector {
    fn default() -> Self {
        DoubleTapDetector {
            state: TapState::default(),
            rearmed: true,
        }
    }
}

impl DoubleTapDetector {
    pub fn state(&self) -> &TapState {
        &self.state
    }

    pub fn reset(&mut self) {
        self.state = TapState::default();
    }

    pub fn rearm(&mut self) {
        self.rearmed = true;
    }

    /// Returns true when `sample` completes a double tap
    pub fn evaluate(&mut self, sample: &TouchSample, now: Tick, window: TapWindow) -> bool {
        if !sample.is_single_touch || !self.rearmed {
            return false;
        }
        self.rearmed = false;

        match (self.state.count, self.state.prev_xy) {
            (0, _) => self.new_tap(sample, now),
            (1, Some((x, y))) => {
                let drift = (sample.x - x).abs().max((sample.y - y).abs());
                let elapsed = now.saturating_sub(self.state.prev_time);
                if drift < window.feather && elapsed < window.window_ms {
                    self.state.count += 1;
                } else {
                    debug!(drift, elapsed, "taps too far apart, restarting");
                    self.reset();
                    self.new_tap(sample, now);
                }
            }
            _ => {
                self.reset();
                self.new_tap(sample, now);
            }
        }

        if self.state.count >= 2 {
            debug!(x = sample.x, y = sample.y, "double tap");
            self.reset();
            true
        } else {
            false
        }
    }

    fn new_tap(&mut self, sample: &TouchSample, now: Tick) {
        self.state.prev_xy = Some((sample.x, sample.y));
        self.state.prev_time = now;
        self.state.count += 1;
    }
}
