//! Turning a recognized gesture into exactly one effect.
use std::{
    sync::{Mutex, TryLockError},
    time::Duration,
};

use tracing::{error, info, warn};

use crate::{
    config::{GestureConfig, SweepDirection},
    Tick,
};

/// How long the synthesized power key is held down, and released
pub const POWER_KEY_HOLD: Duration = Duration::from_millis(60);

/// Every gesture the engine can recognize, numbered by the code it is
/// reported with
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Gesture {
    SweepRight = 1,
    SweepLeft = 2,
    SweepUp = 3,
    SweepDown = 4,
    DoubleTapWake = 5,
    DoubleTapSleep = 6,
    SweepSleepRight = 7,
    SweepSleepLeft = 8,
}

impl Gesture {
    pub fn wake_sweep(direction: SweepDirection) -> Self {
        match direction {
            SweepDirection::Right => Gesture::SweepRight,
            SweepDirection::Left => Gesture::SweepLeft,
            SweepDirection::Up => Gesture::SweepUp,
            SweepDirection::Down => Gesture::SweepDown,
        }
    }

    /// Sleep sweeps only travel horizontally
    pub fn sleep_sweep(direction: SweepDirection) -> Option<Self> {
        match direction {
            SweepDirection::Right => Some(Gesture::SweepSleepRight),
            SweepDirection::Left => Some(Gesture::SweepSleepLeft),
            SweepDirection::Up | SweepDirection::Down => None,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    /// Sleep sweeps always press power, even in notification mode
    pub fn reportable(self) -> bool {
        !matches!(self, Gesture::SweepSleepRight | Gesture::SweepSleepLeft)
    }
}

/// The two most recent attempts at a trigger
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct TriggerDebounce {
    pub last_trigger: Option<Tick>,
    pub prev_trigger: Option<Tick>,
}

impl TriggerDebounce {
    /// Record an attempt at `now`, returning whether it is far enough from
    /// the previous one to go through. Rejected attempts still count.
    pub fn attempt(&mut self, now: Tick, window_ms: Tick) -> bool {
        self.prev_trigger = self.last_trigger;
        self.last_trigger = Some(now);

        match self.prev_trigger {
            Some(prev) => now.saturating_sub(prev) >= window_ms,
            None => true,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Vibrate at the given strength, then press power
    PressPower { vibration: u8 },
    /// Emit a synthetic relative event carrying the gesture code
    Report { code: i32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Action {
    pub gesture: Gesture,
    pub effect: Effect,
}

/// The outside world the dispatcher acts on
pub trait Effectors {
    fn vibrate(&mut self, strength: u8);
    fn press_power_key(&mut self);
    fn report_gesture(&mut self, code: i32);
}

impl Action {
    pub fn perform<E: Effectors + ?Sized>(&self, effectors: &mut E) {
        match self.effect {
            Effect::PressPower { vibration } => {
                if vibration > 0 {
                    effectors.vibrate(vibration);
                }
                effectors.press_power_key();
            }
            Effect::Report { code } => effectors.report_gesture(code),
        }
    }
}

/// Debounces gestures into actions. Power presses and gesture reports are
/// debounced independently.
#[derive(Debug, Default, Clone)]
pub struct Dispatcher {
    power: TriggerDebounce,
    report: TriggerDebounce,
}

impl Dispatcher {
    pub fn trigger(&mut self, gesture: Gesture, config: &GestureConfig, now: Tick) -> Option<Action> {
        let window = config.trigger_debounce_ms;

        let effect = if config.notification_mode && gesture.reportable() {
            if !self.report.attempt(now, window) {
                return None;
            }
            Effect::Report {
                code: gesture.code(),
            }
        } else {
            if !self.power.attempt(now, window) {
                return None;
            }
            Effect::PressPower {
                vibration: config.vibration_strength,
            }
        };

        info!(?gesture, ?effect, "gesture triggered");
        Some(Action { gesture, effect })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum KeyEvent {
    PowerDown,
    PowerUp,
    Sync,
}

/// Something power key events can be written into
pub trait KeyInjector {
    fn emit(&mut self, event: KeyEvent) -> std::io::Result<()>;
}

/// The timed down/up power key sequence. A press that finds another one
/// already in flight is dropped rather than queued.
#[derive(Debug)]
pub struct PowerKeySequence<K> {
    injector: Mutex<K>,
    hold: Duration,
}

impl<K: KeyInjector> PowerKeySequence<K> {
    pub fn new(injector: K) -> Self {
        PowerKeySequence::with_hold(injector, POWER_KEY_HOLD)
    }

    pub fn with_hold(injector: K, hold: Duration) -> Self {
        PowerKeySequence {
            injector: Mutex::new(injector),
            hold,
        }
    }

    /// Returns false when the press was dropped
    pub fn press(&self) -> bool {
        let mut injector = match self.injector.try_lock() {
            Ok(injector) => injector,
            Err(TryLockError::WouldBlock) => {
                warn!("power key sequence already in flight, dropping press");
                return false;
            }
            Err(TryLockError::Poisoned(poisoned)) => poisoned.into_inner(),
        };

        let mut step = |event: KeyEvent| {
            if let Err(err) = injector.emit(event) {
                error!("Failed to emit {event:?}: {err}");
            }
        };

        step(KeyEvent::PowerDown);
        step(KeyEvent::Sync);
        std::thread::sleep(self.hold);
        step(KeyEvent::PowerUp);
        step(KeyEvent::Sync);
        std::thread::sleep(self.hold);

        true
    }

    pub fn into_inner(self) -> K {
        match self.injector.into_inner() {
            Ok(injector) => injector,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
