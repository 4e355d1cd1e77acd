//! Time-bounded arming of wake gestures after the display goes off.
use tracing::{debug, info};

use crate::{config::ResumePolicy, Tick};

/// A power press this close before a suspend means the user turned the
/// display off on purpose
pub const INTENTIONAL_SLEEP_MS: Tick = 1200;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum GateState {
    Armed,
    Expired,
}

#[derive(Debug, Clone)]
pub struct TouchwakeGate {
    /// Configured timeout, adopted at the next suspend
    timeout_ms: Tick,
    /// Timeout the current suspend was armed with
    active_timeout_ms: Tick,
    expired: bool,
    deadline: Option<Tick>,
    resume_policy: ResumePolicy,
}

impl Default for TouchwakeGate {
    fn default() -> Self {
        TouchwakeGate::new(0, ResumePolicy::default())
    }
}

impl TouchwakeGate {
    pub fn new(timeout_ms: Tick, resume_policy: ResumePolicy) -> Self {
        TouchwakeGate {
            timeout_ms,
            active_timeout_ms: timeout_ms,
            expired: false,
            deadline: None,
            resume_policy,
        }
    }

    /// The timeout takes effect from the next suspend, the policy from the next resume
    pub fn configure(&mut self, timeout_ms: Tick, resume_policy: ResumePolicy) {
        if timeout_ms != self.active_timeout_ms {
            debug!("touchwake - timeout {timeout_ms} ms pending until next suspend");
        }
        self.timeout_ms = timeout_ms;
        self.resume_policy = resume_policy;
    }

    pub fn suspend(&mut self, now: Tick, last_power_press: Option<Tick>, proximity_covered: bool) {
        self.deadline = None;
        self.active_timeout_ms = self.timeout_ms;

        if self.active_timeout_ms == 0 {
            return;
        }

        // Covered suspends start no timer and leave the previous expiry alone
        if proximity_covered {
            info!("touchwake - proximity covered, not scheduling timeout");
            return;
        }

        let intentional = last_power_press
            .map(|pressed| now.saturating_sub(pressed) < INTENTIONAL_SLEEP_MS)
            .unwrap_or(false);

        if intentional {
            info!("touchwake - power pressed before suspend, expiring");
            self.expired = true;
        } else {
            info!(
                "touchwake - scheduling timeout in {} ms",
                self.active_timeout_ms
            );
            self.expired = false;
            self.deadline = Some(now + self.active_timeout_ms);
        }
    }

    /// Cancels the pending expiry before returning
    pub fn resume(&mut self) {
        if self.deadline.take().is_some() {
            debug!("touchwake - cancelled pending timeout");
        }

        if self.resume_policy == ResumePolicy::Rearm {
            self.expired = false;
        }
    }

    /// When the pending expiry is due, if any
    pub fn deadline(&self) -> Option<Tick> {
        self.deadline
    }

    /// Fire the pending expiry if it is due, returning whether it fired
    pub fn poll(&mut self, now: Tick) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                info!("touchwake - timed out");
                self.deadline = None;
                self.expired = true;
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, now: Tick) -> GateState {
        let due = self.deadline.map(|deadline| now >= deadline).unwrap_or(false);
        if self.expired || due {
            GateState::Expired
        } else {
            GateState::Armed
        }
    }

    pub fn is_armed(&self, now: Tick) -> bool {
        self.active_timeout_ms == 0 || self.state(now) == GateState::Armed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_gate_stays_armed() {
        let mut gate = TouchwakeGate::new(0, ResumePolicy::Keep);
        gate.suspend(10_000, Some(9_990), false);
        assert!(gate.is_armed(10_000));
        assert!(gate.is_armed(10_000_000));
        assert_eq!(gate.deadline(), None);
    }

    #[test]
    fn disarms_exactly_at_timeout() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, Some(5_000), false);
        assert_eq!(gate.deadline(), Some(13_000));
        assert!(gate.is_armed(12_999));
        assert!(!gate.is_armed(13_000));
    }

    #[test]
    fn poll_expires_once() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        assert!(!gate.poll(12_000));
        assert!(gate.poll(13_000));
        assert!(!gate.poll(14_000));
        assert_eq!(gate.state(14_000), GateState::Expired);
    }

    #[test]
    fn recent_power_press_expires_immediately() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, Some(9_000), false);
        assert!(!gate.is_armed(10_000));
        assert_eq!(gate.deadline(), None);
    }

    #[test]
    fn power_press_at_the_boundary_is_not_intentional() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, Some(8_800), false);
        assert!(gate.is_armed(10_000));
    }

    #[test]
    fn proximity_keeps_armed_without_timer() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, true);
        assert_eq!(gate.deadline(), None);
        assert!(gate.is_armed(1_000_000));
    }

    #[test]
    fn resume_cancels_pending_timeout() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        gate.resume();
        assert_eq!(gate.deadline(), None);
        assert!(!gate.poll(20_000));
    }

    #[test]
    fn covered_suspend_after_keep_resume_stays_expired() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        gate.poll(13_000);
        gate.resume();
        gate.suspend(20_000, None, true);
        assert!(!gate.is_armed(20_000));
    }

    #[test]
    fn covered_suspend_after_rearm_resume_is_armed() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Rearm);
        gate.suspend(10_000, None, false);
        gate.poll(13_000);
        gate.resume();
        gate.suspend(20_000, None, true);
        assert!(gate.is_armed(20_000));
        assert_eq!(gate.deadline(), None);
    }

    #[test]
    fn new_timeout_waits_for_the_next_suspend() {
        let mut gate = TouchwakeGate::new(0, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        gate.configure(3_000, ResumePolicy::Keep);
        assert!(gate.is_armed(1_000_000));
        assert_eq!(gate.deadline(), None);

        gate.resume();
        gate.suspend(2_000_000, None, false);
        assert_eq!(gate.deadline(), Some(2_003_000));
    }

    #[test]
    fn dropping_the_timeout_keeps_the_running_window() {
        let mut gate = TouchwakeGate::new(3_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        gate.configure(0, ResumePolicy::Keep);
        assert!(gate.poll(13_000));
        assert!(!gate.is_armed(13_000));
    }

    #[test]
    fn a_new_suspend_reopens_the_window() {
        let mut gate = TouchwakeGate::new(1_000, ResumePolicy::Keep);
        gate.suspend(10_000, None, false);
        gate.poll(11_000);
        gate.resume();
        gate.suspend(20_000, None, false);
        assert!(gate.is_armed(20_500));
        assert!(!gate.is_armed(21_000));
    }
}
