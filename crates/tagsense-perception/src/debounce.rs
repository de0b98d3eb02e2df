//! [`ProximityDebouncer`] – consecutive-count hysteresis for the proximity
//! indicator.
//!
//! # Algorithm
//!
//! Every frame reports whether any marker is closer than the near threshold.
//! A close frame increments `close_count` and zeroes `far_count`; a far frame
//! does the opposite. The indicator turns on once `close_count` reaches the
//! threshold while off, and turns off once `far_count` reaches it while on.
//! Single-frame detection flicker therefore never flips the indicator.
//!
//! # Example
//!
//! ```rust
//! use tagsense_perception::debounce::ProximityDebouncer;
//! use tagsense_types::ActuatorTransition;
//!
//! let mut deb = ProximityDebouncer::new(3);
//!
//! assert_eq!(deb.update(true), None);
//! assert_eq!(deb.update(true), None);
//! assert_eq!(deb.update(true), Some(ActuatorTransition::TurnOn));
//! assert_eq!(deb.update(true), None); // already on
//! ```

use tagsense_types::{ActuatorTransition, ProximityState};

/// Consecutive frames required before the indicator flips.
pub const DEFAULT_DEBOUNCE_THRESHOLD: u32 = 3;

/// Forward distance (meters) under which a marker counts as close.
pub const DEFAULT_NEAR_THRESHOLD_M: f64 = 4.0;

/// Hysteresis filter over a per-frame "something is close" flag.
#[derive(Debug, Clone)]
pub struct ProximityDebouncer {
    threshold: u32,
    close_count: u32,
    far_count: u32,
    state: ProximityState,
}

impl ProximityDebouncer {
    /// Create a debouncer in the [`ProximityState::Far`] state.
    ///
    /// A `threshold` of zero is treated as one.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            close_count: 0,
            far_count: 0,
            state: ProximityState::Far,
        }
    }

    /// Feed one frame's observation.
    ///
    /// Returns a transition only when the debounced state actually changes.
    pub fn update(&mut self, any_close: bool) -> Option<ActuatorTransition> {
        if any_close {
            self.close_count = self.close_count.saturating_add(1);
            self.far_count = 0;
        } else {
            self.far_count = self.far_count.saturating_add(1);
            self.close_count = 0;
        }

        match self.state {
            ProximityState::Far if self.close_count >= self.threshold => {
                self.state = ProximityState::Close;
                Some(ActuatorTransition::TurnOn)
            }
            ProximityState::Close if self.far_count >= self.threshold => {
                self.state = ProximityState::Far;
                Some(ActuatorTransition::TurnOff)
            }
            _ => None,
        }
    }

    pub fn state(&self) -> ProximityState {
        self.state
    }

    /// Current `(close_count, far_count)`.
    pub fn counters(&self) -> (u32, u32) {
        (self.close_count, self.far_count)
    }

    /// Return to the initial far state with cleared counters.
    pub fn reset(&mut self) {
        self.close_count = 0;
        self.far_count = 0;
        self.state = ProximityState::Far;
    }
}

impl Default for ProximityDebouncer {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turns_on_after_threshold_close_frames() {
        let mut deb = ProximityDebouncer::new(3);
        assert_eq!(deb.update(true), None);
        assert_eq!(deb.update(true), None);
        assert_eq!(deb.update(true), Some(ActuatorTransition::TurnOn));
        assert_eq!(deb.state(), ProximityState::Close);
    }

    #[test]
    fn turn_on_fires_once() {
        let mut deb = ProximityDebouncer::new(3);
        let events: Vec<_> = (0..10).filter_map(|_| deb.update(true)).collect();
        assert_eq!(events, vec![ActuatorTransition::TurnOn]);
    }

    #[test]
    fn alternating_input_never_flips() {
        let mut deb = ProximityDebouncer::new(3);
        for i in 0..50 {
            assert_eq!(deb.update(i % 2 == 0), None);
        }
        assert_eq!(deb.state(), ProximityState::Far);
    }

    #[test]
    fn two_close_then_far_resets_streak() {
        let mut deb = ProximityDebouncer::new(3);
        deb.update(true);
        deb.update(true);
        deb.update(false);
        assert_eq!(deb.counters(), (0, 1));
        assert_eq!(deb.update(true), None);
        assert_eq!(deb.update(true), None);
        assert_eq!(deb.update(true), Some(ActuatorTransition::TurnOn));
    }

    #[test]
    fn turns_off_after_threshold_far_frames() {
        let mut deb = ProximityDebouncer::new(3);
        for _ in 0..3 {
            deb.update(true);
        }
        assert_eq!(deb.update(false), None);
        assert_eq!(deb.update(false), None);
        assert_eq!(deb.update(false), Some(ActuatorTransition::TurnOff));
        assert_eq!(deb.update(false), None);
        assert_eq!(deb.state(), ProximityState::Far);
    }

    #[test]
    fn far_frames_while_off_emit_nothing() {
        let mut deb = ProximityDebouncer::default();
        for _ in 0..10 {
            assert_eq!(deb.update(false), None);
        }
    }

    #[test]
    fn reset_returns_to_far() {
        let mut deb = ProximityDebouncer::new(1);
        assert_eq!(deb.update(true), Some(ActuatorTransition::TurnOn));
        deb.reset();
        assert_eq!(deb.state(), ProximityState::Far);
        assert_eq!(deb.counters(), (0, 0));
    }
}
