//! Gesture enable switches and tuning constants.
//!
//! Setters take the raw integer a user wrote and clamp it the way the
//! configuration surface promises: out-of-range values fall back to a safe
//! default instead of being rejected, and the corrected value is what gets
//! read back.
use bitflags::bitflags;
use tracing::warn;

use crate::Tick;

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct SweepDirections: u8 {
        const RIGHT = 1;
        const LEFT = 2;
        const UP = 4;
        const DOWN = 8;
    }
}

impl SweepDirections {
    /// Directions a sleep sweep can travel in
    pub const SLEEP: SweepDirections = SweepDirections::RIGHT.union(SweepDirections::LEFT);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SweepDirection {
    Right,
    Left,
    Up,
    Down,
}

impl SweepDirection {
    pub fn flag(self) -> SweepDirections {
        match self {
            SweepDirection::Right => SweepDirections::RIGHT,
            SweepDirection::Left => SweepDirections::LEFT,
            SweepDirection::Up => SweepDirections::UP,
            SweepDirection::Down => SweepDirections::DOWN,
        }
    }
}

/// How far apart, in distance and time, two taps may land and still pair up
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TapWindow {
    pub feather: i32,
    pub window_ms: Tick,
}

impl TapWindow {
    pub const WAKE: TapWindow = TapWindow {
        feather: 200,
        window_ms: 700,
    };

    pub const SLEEP: TapWindow = TapWindow {
        feather: 150,
        window_ms: 250,
    };
}

/// Top-left anchored rectangle the sleep double-tap has to land in
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TapRegion {
    pub max_x: i32,
    pub max_y: i32,
}

impl Default for TapRegion {
    fn default() -> Self {
        TapRegion {
            max_x: 1440,
            max_y: 100,
        }
    }
}

impl TapRegion {
    pub fn contains(&self, x: i32, y: i32) -> bool {
        x <= self.max_x && y <= self.max_y
    }
}

/// What the touchwake window does when the display comes back on
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum ResumePolicy {
    /// Cancel the pending expiry and leave the armed flag as it was
    #[default]
    Keep,
    /// Cancel the pending expiry and arm again
    Rearm,
}

pub const DEFAULT_VIBRATION_STRENGTH: u8 = 20;
pub const MAX_VIBRATION_STRENGTH: u8 = 90;
pub const SWEEP_TIMEOUT_MS: Tick = 300;
pub const TRIGGER_DEBOUNCE_MS: Tick = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GestureConfig {
    pub sweep_wake: SweepDirections,
    pub sweep_sleep: SweepDirections,
    pub doubletap_wake: bool,
    pub doubletap_sleep: bool,
    pub sleep_tap_region: TapRegion,
    pub wake_tap: TapWindow,
    pub sleep_tap: TapWindow,
    pub sweep_timeout_ms: Tick,
    pub trigger_debounce_ms: Tick,
    /// Zero keeps wake gestures armed for as long as the display is off
    pub touchwake_timeout_ms: Tick,
    pub touchwake_resume: ResumePolicy,
    pub vibration_strength: u8,
    /// Report gestures as synthetic events instead of pressing power
    pub notification_mode: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            sweep_wake: SweepDirections::empty(),
            sweep_sleep: SweepDirections::empty(),
            doubletap_wake: false,
            doubletap_sleep: false,
            sleep_tap_region: TapRegion::default(),
            wake_tap: TapWindow::WAKE,
            sleep_tap: TapWindow::SLEEP,
            sweep_timeout_ms: SWEEP_TIMEOUT_MS,
            trigger_debounce_ms: TRIGGER_DEBOUNCE_MS,
            touchwake_timeout_ms: 0,
            touchwake_resume: ResumePolicy::default(),
            vibration_strength: DEFAULT_VIBRATION_STRENGTH,
            notification_mode: false,
        }
    }
}

impl GestureConfig {
    /// Enabling any wake sweep turns double-tap-to-wake off
    pub fn set_sweep_wake(&mut self, raw: i64) {
        self.sweep_wake = match u8::try_from(raw)
            .ok()
            .and_then(SweepDirections::from_bits)
        {
            Some(directions) => directions,
            None => {
                warn!("sweep2wake={raw} out of range, disabling");
                SweepDirections::empty()
            }
        };

        if !self.sweep_wake.is_empty() {
            self.doubletap_wake = false;
        }
    }

    pub fn set_sweep_sleep(&mut self, raw: i64) {
        self.sweep_sleep = match u8::try_from(raw)
            .ok()
            .and_then(SweepDirections::from_bits)
            .filter(|directions| SweepDirections::SLEEP.contains(*directions))
        {
            Some(directions) => directions,
            None => {
                warn!("sweep2sleep={raw} out of range, disabling");
                SweepDirections::empty()
            }
        };
    }

    /// Enabling double-tap-to-wake turns every wake sweep off
    pub fn set_doubletap_wake(&mut self, raw: i64) {
        self.doubletap_wake = switch("doubletap2wake", raw);
        if self.doubletap_wake {
            self.sweep_wake = SweepDirections::empty();
        }
    }

    pub fn set_doubletap_sleep(&mut self, raw: i64) {
        self.doubletap_sleep = switch("doubletap2sleep", raw);
    }

    pub fn set_sleep_tap_x(&mut self, raw: i64) {
        self.sleep_tap_region.max_x = saturate(raw);
    }

    pub fn set_sleep_tap_y(&mut self, raw: i64) {
        self.sleep_tap_region.max_y = saturate(raw);
    }

    pub fn set_touchwake_timeout(&mut self, raw: i64) {
        self.touchwake_timeout_ms = if raw < 0 {
            warn!("wake_timeout={raw} is negative, disabling touchwake");
            0
        } else {
            raw as Tick
        };
    }

    pub fn set_touchwake_resume(&mut self, raw: i64) {
        self.touchwake_resume = if switch("touchwake_rearm_on_resume", raw) {
            ResumePolicy::Rearm
        } else {
            ResumePolicy::Keep
        };
    }

    pub fn set_vibration_strength(&mut self, raw: i64) {
        self.vibration_strength = match u8::try_from(raw) {
            Ok(strength) if strength <= MAX_VIBRATION_STRENGTH => strength,
            _ => {
                warn!("vib_strength={raw} out of range, using {DEFAULT_VIBRATION_STRENGTH}");
                DEFAULT_VIBRATION_STRENGTH
            }
        };
    }

    pub fn set_notification_mode(&mut self, raw: i64) {
        self.notification_mode = switch("wake_gestures", raw);
    }
}

fn switch(name: &str, raw: i64) -> bool {
    match raw {
        0 => false,
        1 => true,
        _ => {
            warn!("{name}={raw} out of range, disabling");
            false
        }
    }
}

fn saturate(raw: i64) -> i32 {
    raw.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}
