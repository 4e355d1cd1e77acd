use tracing::{debug, info};

use crate::{
    config::GestureConfig,
    dispatch::{Action, Dispatcher, Effect, Gesture},
    geometry::ScreenGeometry,
    normalize::{Normalized, Normalizer, TouchEvent},
    sweep::{Axis, SweepDetector, SweepMode},
    tap::DoubleTapDetector,
    touchwake::TouchwakeGate,
    Tick, TouchSample,
};

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct DisplayState {
    pub suspended: bool,
    pub suspended_at: Option<Tick>,
}

/// Owns every piece of gesture state. All calls are expected to come from a
/// single thread.
#[derive(Debug, Clone)]
pub struct GestureEngine {
    config: GestureConfig,
    geometry: ScreenGeometry,
    normalizer: Normalizer,
    horizontal: SweepDetector,
    vertical: SweepDetector,
    taps: DoubleTapDetector,
    gate: TouchwakeGate,
    display: DisplayState,
    proximity_covered: bool,
    last_power_press: Option<Tick>,
    dispatcher: Dispatcher,
}

impl Default for GestureEngine {
    fn default() -> Self {
        GestureEngine::new(GestureConfig::default(), ScreenGeometry::default())
    }
}

impl GestureEngine {
    pub fn new(config: GestureConfig, geometry: ScreenGeometry) -> Self {
        let gate = TouchwakeGate::new(config.touchwake_timeout_ms, config.touchwake_resume);
        GestureEngine {
            config,
            geometry,
            normalizer: Normalizer::default(),
            horizontal: SweepDetector::new(Axis::Horizontal),
            vertical: SweepDetector::new(Axis::Vertical),
            taps: DoubleTapDetector::default(),
            gate,
            display: DisplayState::default(),
            proximity_covered: false,
            last_power_press: None,
            dispatcher: Dispatcher::default(),
        }
    }

    pub fn display(&self) -> DisplayState {
        self.display
    }

    pub fn gate(&self) -> &TouchwakeGate {
        &self.gate
    }

    pub fn set_config(&mut self, config: GestureConfig) {
        self.gate
            .configure(config.touchwake_timeout_ms, config.touchwake_resume);
        self.config = config;
    }

    pub fn set_geometry(&mut self, geometry: ScreenGeometry) {
        self.geometry = geometry;
        self.reset_session();
    }

    pub fn handle_event(&mut self, event: TouchEvent, now: Tick) -> Option<Action> {
        match self.normalizer.feed(event, !self.display.suspended) {
            Normalized::Pending => None,
            Normalized::Reset => {
                self.reset_session();
                None
            }
            Normalized::Motion(sample) => self.on_motion(&sample, now),
            Normalized::Lift(sample) => {
                self.horizontal.reset();
                self.vertical.reset();
                self.taps.rearm();
                self.on_tap(&sample?, now)
            }
        }
    }

    pub fn suspend(&mut self, now: Tick) {
        if self.display.suspended {
            return;
        }

        info!("display suspended");
        self.display = DisplayState {
            suspended: true,
            suspended_at: Some(now),
        };
        self.reset_session();
        self.gate
            .suspend(now, self.last_power_press, self.proximity_covered);
    }

    pub fn resume(&mut self, now: Tick) {
        if !self.display.suspended {
            return;
        }

        let asleep_ms = self
            .display
            .suspended_at
            .map(|at| now.saturating_sub(at))
            .unwrap_or(0);
        info!(asleep_ms, "display resumed");
        self.display = DisplayState::default();
        self.reset_session();
        self.gate.resume();
    }

    pub fn set_proximity(&mut self, covered: bool) {
        debug!(covered, "proximity");
        self.proximity_covered = covered;
    }

    /// A physical press of the power button
    pub fn power_key_pressed(&mut self, now: Tick) {
        self.last_power_press = Some(now);
    }

    pub fn touchwake_deadline(&self) -> Option<Tick> {
        self.gate.deadline()
    }

    pub fn poll_touchwake(&mut self, now: Tick) -> bool {
        self.gate.poll(now)
    }

    fn reset_session(&mut self) {
        self.horizontal.reset();
        self.vertical.reset();
        self.taps.reset();
    }

    fn on_motion(&mut self, sample: &TouchSample, now: Tick) -> Option<Action> {
        let GestureEngine {
            config,
            geometry,
            horizontal,
            vertical,
            gate,
            display,
            ..
        } = self;

        let mut fired = Vec::with_capacity(2);

        if display.suspended {
            if config.sweep_wake.is_empty() || !gate.is_armed(now) {
                return None;
            }

            for detector in [horizontal, vertical] {
                if let Some(direction) = detector.evaluate(
                    SweepMode::Wake,
                    sample,
                    now,
                    geometry,
                    config.sweep_wake,
                    config.sweep_timeout_ms,
                ) {
                    fired.push(Gesture::wake_sweep(direction));
                }
            }
        } else {
            if config.sweep_sleep.is_empty() || !geometry.in_sleep_sweep_band(sample) {
                return None;
            }

            if let Some(gesture) = horizontal
                .evaluate(
                    SweepMode::Sleep,
                    sample,
                    now,
                    geometry,
                    config.sweep_sleep,
                    config.sweep_timeout_ms,
                )
                .and_then(Gesture::sleep_sweep)
            {
                fired.push(gesture);
            }
        }

        self.dispatch(&fired, now)
    }

    fn on_tap(&mut self, sample: &TouchSample, now: Tick) -> Option<Action> {
        let (window, gesture) = if self.display.suspended {
            if !self.config.doubletap_wake
                || !self.gate.is_armed(now)
                || !self.geometry.in_wake_tap_region(sample)
            {
                return None;
            }
            (self.config.wake_tap, Gesture::DoubleTapWake)
        } else {
            if !self.config.doubletap_sleep
                || !self.config.sleep_tap_region.contains(sample.x, sample.y)
            {
                return None;
            }
            (self.config.sleep_tap, Gesture::DoubleTapSleep)
        };

        if self.taps.evaluate(sample, now, window) {
            self.dispatch(&[gesture], now)
        } else {
            None
        }
    }

    /// Every fired gesture goes through the debounce, the first one to make
    /// it out becomes the action
    fn dispatch(&mut self, fired: &[Gesture], now: Tick) -> Option<Action> {
        let mut action = None;
        for gesture in fired {
            let triggered = self.dispatcher.trigger(*gesture, &self.config, now);
            if action.is_none() {
                action = triggered;
            }
        }

        if let Some(Action {
            effect: Effect::PressPower { .. },
            ..
        }) = action
        {
            self.last_power_press = Some(now);
        }

        action
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::SweepDirections,
        dispatch::Effectors,
        touchwake::GateState,
    };

    #[derive(Debug, Default)]
    struct Recorder {
        presses: usize,
        vibrations: Vec<u8>,
        reports: Vec<i32>,
    }

    impl Effectors for Recorder {
        fn vibrate(&mut self, strength: u8) {
            self.vibrations.push(strength);
        }

        fn press_power_key(&mut self) {
            self.presses += 1;
        }

        fn report_gesture(&mut self, code: i32) {
            self.reports.push(code);
        }
    }

    /// Y first, so the X update completes exactly one sample whether the
    /// display is on or off
    fn touch(engine: &mut GestureEngine, x: i32, y: i32, now: Tick) -> Vec<Action> {
        [TouchEvent::PositionY(y), TouchEvent::PositionX(x)]
            .into_iter()
            .filter_map(|event| engine.handle_event(event, now))
            .collect()
    }

    fn tap(engine: &mut GestureEngine, x: i32, y: i32, now: Tick) -> Vec<Action> {
        let mut actions = touch(engine, x, y, now);
        actions.extend(engine.handle_event(TouchEvent::Lift, now));
        actions
    }

    fn sweep(engine: &mut GestureEngine, points: &[(i32, i32)], start: Tick) -> Vec<Action> {
        points
            .iter()
            .enumerate()
            .flat_map(|(i, (x, y))| touch(engine, *x, *y, start + i as Tick * 10))
            .collect()
    }

    fn perform(actions: &[Action]) -> Recorder {
        let mut recorder = Recorder::default();
        for action in actions {
            action.perform(&mut recorder);
        }
        recorder
    }

    fn config(f: impl FnOnce(&mut GestureConfig)) -> GestureConfig {
        let mut config = GestureConfig::default();
        f(&mut config);
        config
    }

    #[test]
    fn right_sweep_reports_once_in_notification_mode() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_sweep_wake(SweepDirections::RIGHT.bits() as i64);
                c.set_notification_mode(1);
            }),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        let points: Vec<_> = [100, 150, 400, 600, 1100]
            .iter()
            .map(|x| (*x, 1500))
            .collect();
        let actions = sweep(&mut engine, &points, 20_000);
        let recorder = perform(&actions);

        assert_eq!(recorder.reports, vec![1]);
        assert_eq!(recorder.presses, 0);
    }

    #[test]
    fn right_sweep_presses_power_without_notification_mode() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_sweep_wake(SweepDirections::RIGHT.bits() as i64)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        let actions = sweep(
            &mut engine,
            &[(100, 1500), (400, 1500), (700, 1500), (1200, 1500)],
            20_000,
        );
        let recorder = perform(&actions);

        assert_eq!(recorder.presses, 1);
        assert_eq!(recorder.vibrations, vec![20]);
    }

    #[test]
    fn sweep_fires_once_per_session_until_lift() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_sweep_wake(SweepDirections::RIGHT.bits() as i64)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        let points = [(100, 1500), (400, 1500), (700, 1500), (1200, 1500)];
        assert_eq!(sweep(&mut engine, &points, 20_000).len(), 1);
        // Same session, well past the debounce window
        assert!(sweep(&mut engine, &[(1300, 1500), (1400, 1500)], 30_000).is_empty());

        engine.handle_event(TouchEvent::Lift, 30_100);
        assert_eq!(sweep(&mut engine, &points, 40_000).len(), 1);
    }

    #[test]
    fn slot_change_abandons_a_sweep() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_sweep_wake(SweepDirections::RIGHT.bits() as i64)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        sweep(&mut engine, &[(100, 1500), (400, 1500), (700, 1500)], 20_000);
        engine.handle_event(TouchEvent::SlotChange, 20_030);
        // The next sample becomes a fresh anchor beyond the split
        assert!(sweep(&mut engine, &[(1200, 1500)], 20_040).is_empty());
    }

    #[test]
    fn diagonal_sweep_collapses_into_one_action() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_sweep_wake((SweepDirections::RIGHT | SweepDirections::DOWN).bits() as i64)
            }),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        let actions = sweep(
            &mut engine,
            &[(100, 400), (300, 500), (700, 650), (1200, 1000)],
            20_000,
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].gesture, Gesture::SweepRight);
    }

    #[test]
    fn wake_sweeps_ignored_while_awake() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_sweep_wake(SweepDirections::all().bits() as i64)),
            ScreenGeometry::default(),
        );
        let actions = sweep(
            &mut engine,
            &[(100, 1500), (400, 1500), (700, 1500), (1200, 1500)],
            20_000,
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn sleep_sweep_along_the_bottom_edge() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_sweep_sleep(3);
                c.set_notification_mode(1);
            }),
            ScreenGeometry::default(),
        );

        let actions = sweep(
            &mut engine,
            &[(1300, 2500), (1000, 2500), (800, 2500), (300, 2500)],
            20_000,
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].gesture, Gesture::SweepSleepLeft);
        assert!(matches!(actions[0].effect, Effect::PressPower { .. }));
    }

    #[test]
    fn leaving_the_sleep_band_keeps_progress() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_sweep_sleep(1)),
            ScreenGeometry::default(),
        );

        let actions = sweep(
            &mut engine,
            &[(100, 2500), (400, 2500), (700, 1800), (700, 2500), (1200, 2500)],
            20_000,
        );
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].gesture, Gesture::SweepSleepRight);
    }

    #[test]
    fn double_tap_wake_then_fresh_session() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_wake(1)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        assert!(tap(&mut engine, 500, 500, 20_000).is_empty());
        let actions = tap(&mut engine, 520, 510, 20_100);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].gesture, Gesture::DoubleTapWake);

        assert!(tap(&mut engine, 800, 800, 20_500).is_empty());
    }

    #[test]
    fn double_tap_wake_reports_code_five() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_notification_mode(1);
            }),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        let mut actions = tap(&mut engine, 500, 500, 20_000);
        actions.extend(tap(&mut engine, 520, 510, 20_100));
        assert_eq!(perform(&actions).reports, vec![5]);
    }

    #[test]
    fn double_tap_wake_ignores_the_edge_band() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_wake(1)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        tap(&mut engine, 50, 500, 20_000);
        assert!(tap(&mut engine, 50, 500, 20_100).is_empty());
    }

    #[test]
    fn double_tap_sleep_inside_region() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_sleep(1)),
            ScreenGeometry::default(),
        );

        assert!(tap(&mut engine, 700, 50, 20_000).is_empty());
        let actions = tap(&mut engine, 710, 60, 20_100);
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].gesture, Gesture::DoubleTapSleep);
    }

    #[test]
    fn double_tap_sleep_outside_region_is_ignored() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_sleep(1)),
            ScreenGeometry::default(),
        );

        tap(&mut engine, 700, 900, 20_000);
        assert!(tap(&mut engine, 700, 900, 20_100).is_empty());
    }

    #[test]
    fn moving_within_one_touch_is_not_a_double_tap() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_wake(1)),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);

        touch(&mut engine, 500, 500, 20_000);
        touch(&mut engine, 505, 505, 20_010);
        assert!(engine.handle_event(TouchEvent::Lift, 20_020).is_none());
    }

    #[test]
    fn touchwake_window_closes() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_touchwake_timeout(3_000);
            }),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);
        assert_eq!(engine.touchwake_deadline(), Some(13_000));

        tap(&mut engine, 500, 500, 12_000);
        assert_eq!(tap(&mut engine, 500, 500, 12_100).len(), 1);

        assert!(engine.poll_touchwake(13_000));
        assert_eq!(engine.gate().state(13_000), GateState::Expired);
        tap(&mut engine, 500, 500, 14_000);
        assert!(tap(&mut engine, 500, 500, 14_100).is_empty());
    }

    #[test]
    fn own_power_press_before_suspend_disarms_wake() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_sleep(1);
                c.set_sweep_wake(SweepDirections::RIGHT.bits() as i64);
                c.set_touchwake_timeout(3_000);
            }),
            ScreenGeometry::default(),
        );

        tap(&mut engine, 700, 50, 20_000);
        assert_eq!(tap(&mut engine, 700, 50, 20_100).len(), 1);

        engine.suspend(20_500);
        assert_eq!(engine.touchwake_deadline(), None);
        let actions = sweep(
            &mut engine,
            &[(100, 1500), (400, 1500), (700, 1500), (1200, 1500)],
            21_000,
        );
        assert!(actions.is_empty());
    }

    #[test]
    fn proximity_keeps_wake_armed() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_touchwake_timeout(1_000);
            }),
            ScreenGeometry::default(),
        );
        engine.set_proximity(true);
        engine.suspend(10_000);
        assert_eq!(engine.touchwake_deadline(), None);

        tap(&mut engine, 500, 500, 60_000);
        assert_eq!(tap(&mut engine, 500, 500, 60_100).len(), 1);
    }

    #[test]
    fn resume_cancels_touchwake_and_clears_taps() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_doubletap_sleep(1);
                c.set_sleep_tap_y(400);
                c.set_touchwake_timeout(3_000);
            }),
            ScreenGeometry::default(),
        );
        engine.suspend(10_000);
        tap(&mut engine, 500, 300, 11_000);
        assert_eq!(engine.taps.state().count, 1);
        assert_eq!(engine.display().suspended_at, Some(10_000));
        engine.resume(11_050);

        assert_eq!(engine.touchwake_deadline(), None);
        assert_eq!(engine.display(), DisplayState::default());
        // The tap from before resume does not pair with this one
        assert!(tap(&mut engine, 500, 300, 11_100).is_empty());
    }

    fn expire_then_resume(engine: &mut GestureEngine) {
        engine.suspend(10_000);
        assert!(engine.poll_touchwake(11_000));
        engine.resume(12_000);
    }

    #[test]
    fn covered_suspend_keeps_an_expired_window_by_default() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_touchwake_timeout(1_000);
            }),
            ScreenGeometry::default(),
        );
        expire_then_resume(&mut engine);

        engine.set_proximity(true);
        engine.suspend(20_000);
        tap(&mut engine, 500, 500, 30_000);
        assert!(tap(&mut engine, 500, 500, 30_100).is_empty());
    }

    #[test]
    fn covered_suspend_wakes_after_a_rearming_resume() {
        let mut engine = GestureEngine::new(
            config(|c| {
                c.set_doubletap_wake(1);
                c.set_touchwake_timeout(1_000);
                c.set_touchwake_resume(1);
            }),
            ScreenGeometry::default(),
        );
        expire_then_resume(&mut engine);

        engine.set_proximity(true);
        engine.suspend(20_000);
        tap(&mut engine, 500, 500, 30_000);
        assert_eq!(tap(&mut engine, 500, 500, 30_100).len(), 1);
    }

    #[test]
    fn uncovered_suspend_opens_a_window_under_either_policy() {
        for rearm in [0, 1] {
            let mut engine = GestureEngine::new(
                config(|c| {
                    c.set_doubletap_wake(1);
                    c.set_touchwake_timeout(1_000);
                    c.set_touchwake_resume(rearm);
                }),
                ScreenGeometry::default(),
            );
            expire_then_resume(&mut engine);

            engine.suspend(20_000);
            tap(&mut engine, 500, 500, 20_200);
            assert_eq!(tap(&mut engine, 500, 500, 20_300).len(), 1);
        }
    }

    #[test]
    fn raising_the_timeout_while_suspended_keeps_wake_armed() {
        let mut engine = GestureEngine::new(
            config(|c| c.set_doubletap_wake(1)),
            ScreenGeometry::default(),
        );
        engine.suspend(1_000);
        engine.set_config(config(|c| {
            c.set_doubletap_wake(1);
            c.set_touchwake_timeout(60_000);
        }));

        tap(&mut engine, 500, 500, 2_000);
        assert_eq!(tap(&mut engine, 500, 500, 2_100).len(), 1);
        assert_eq!(engine.touchwake_deadline(), None);
    }

    #[test]
    fn reconfiguring_touchwake_applies_on_next_suspend() {
        let mut engine = GestureEngine::default();
        engine.set_config(config(|c| c.set_touchwake_timeout(2_000)));
        engine.suspend(5_000);
        assert_eq!(engine.touchwake_deadline(), Some(7_000));
    }
}
