//! Wake and sleep gesture recognition for a touch panel whose display may be
//! off.
//!
//! Raw multitouch updates go through the [`Normalizer`] into complete
//! samples, which the [`GestureEngine`] runs past the sweep and double-tap
//! detectors. Anything recognized comes out as an [`Action`] for the host to
//! perform against its [`Effectors`]. Nothing in here touches a device or a
//! clock: time is passed in as a [`Tick`].
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod geometry;
pub mod normalize;
pub mod sweep;
pub mod tap;
pub mod touchwake;

pub use config::{GestureConfig, ResumePolicy, SweepDirection, SweepDirections, TapRegion, TapWindow};
pub use dispatch::{
    Action, Effect, Effectors, Gesture, KeyEvent, KeyInjector, PowerKeySequence, POWER_KEY_HOLD,
};
pub use engine::{DisplayState, GestureEngine};
pub use geometry::ScreenGeometry;
pub use normalize::{Normalized, Normalizer, TouchEvent, TouchSample};
pub use touchwake::{GateState, TouchwakeGate};

/// Milliseconds on a monotonic clock
pub type Tick = u64;
