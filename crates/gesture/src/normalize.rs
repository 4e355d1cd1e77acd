//! Coalesces per-axis touch updates into complete samples.

/// Raw multitouch updates as delivered by the input device
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TouchEvent {
    SlotChange,
    PositionX(i32),
    PositionY(i32),
    /// The tracking id of the contact became invalid
    Lift,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TouchSample {
    pub x: i32,
    pub y: i32,
    pub is_single_touch: bool,
}

/// What a single raw event amounted to
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// Still waiting on the other axis
    Pending,
    /// Drop all in-flight gesture state
    Reset,
    /// The contact moved
    Motion(TouchSample),
    /// The contact went away at the last known position
    Lift(Option<TouchSample>),
}

#[derive(Debug, Default, Clone)]
pub struct Normalizer {
    x: Option<i32>,
    y: Option<i32>,
    x_fresh: bool,
    y_fresh: bool,
}

impl Normalizer {
    /// While the display is on, an X update alone is enough to emit a sample
    pub fn feed(&mut self, event: TouchEvent, display_on: bool) -> Normalized {
        match event {
            TouchEvent::SlotChange => {
                self.clear_fresh();
                Normalized::Reset
            }
            TouchEvent::Lift => {
                self.clear_fresh();
                Normalized::Lift(self.last_sample())
            }
            TouchEvent::PositionX(x) => {
                self.x = Some(x);
                self.x_fresh = true;
                self.try_emit(display_on)
            }
            TouchEvent::PositionY(y) => {
                self.y = Some(y);
                self.y_fresh = true;
                self.try_emit(display_on)
            }
        }
    }

    fn try_emit(&mut self, display_on: bool) -> Normalized {
        let complete = self.x_fresh && (self.y_fresh || display_on);
        if !complete {
            return Normalized::Pending;
        }

        self.clear_fresh();
        match self.last_sample() {
            Some(sample) => Normalized::Motion(sample),
            None => Normalized::Pending,
        }
    }

    fn clear_fresh(&mut self) {
        self.x_fresh = false;
        self.y_fresh = false;
    }

    fn last_sample(&self) -> Option<TouchSample> {
        Some(TouchSample {
            x: self.x?,
            y: self.y?,
            is_single_touch: true,
        })
    }
}
