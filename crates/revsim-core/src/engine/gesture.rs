//! Throttle gesture detection
//!
//! Two detectors over the raw throttle stream: a rapid rise ("flick
//! up") that triggers the accel burst, and a rapid fall from high
//! throttle ("flick down") that arms the decel pop. Both distinguish
//! deliberate flicks from gradual pedal movement by bounding the time
//! window of the change.

use std::collections::VecDeque;

use crate::config::{AccelBurstConfig, DecelPopConfig};
use crate::types::Seconds;

/// Recognizes a quick throttle stab from low to near-full.
pub struct AccelFlickDetector {
    config: AccelBurstConfig,
    /// Rolling (time, throttle) samples, pruned to the history window
    history: VecDeque<(Seconds, f64)>,
}

impl AccelFlickDetector {
    pub fn new(config: AccelBurstConfig) -> Self {
        Self {
            config,
            history: VecDeque::new(),
        }
    }

    /// Feed a throttle sample; returns true if this sample completes a
    /// flick (the caller decides whether an effect actually fires).
    pub fn record(&mut self, now: Seconds, throttle: f64) -> bool {
        while let Some(&(t, _)) = self.history.front() {
            if now - t > self.config.history_window {
                self.history.pop_front();
            } else {
                break;
            }
        }

        let flick = throttle >= self.config.min_end_throttle
            && self.history.iter().any(|&(t, v)| {
                now - t <= self.config.flick_window
                    && v <= self.config.max_start_throttle
                    && throttle - v >= self.config.min_jump
            });

        self.history.push_back((now, throttle));
        flick
    }

    /// Drop the history (after a burst fires, so one stab can't match twice).
    pub fn clear(&mut self) {
        self.history.clear();
    }
}

/// Recognizes a quick throttle release from high to near-closed and
/// holds the result armed until consumed, cancelled, or timed out.
pub struct DecelDropDetector {
    config: DecelPopConfig,
    /// Latched (time, value) of the most recent high-throttle sample
    last_high: Option<(Seconds, f64)>,
    prev_throttle: f64,
    armed: Option<Seconds>,
}

impl DecelDropDetector {
    pub fn new(config: DecelPopConfig) -> Self {
        Self {
            config,
            last_high: None,
            prev_throttle: 0.0,
            armed: None,
        }
    }

    /// Feed a throttle sample; arming and cancellation both happen here.
    pub fn record(&mut self, now: Seconds, throttle: f64) {
        if throttle >= self.config.high_threshold {
            self.last_high = Some((now, throttle));
        }

        let crossed_down = self.prev_throttle > self.config.low_threshold
            && throttle <= self.config.low_threshold;

        if crossed_down && self.armed.is_none() {
            if let Some((high_t, high_v)) = self.last_high {
                if now - high_t <= self.config.max_flick_duration
                    && high_v - throttle >= self.config.min_drop
                {
                    self.armed = Some(now);
                    // Require a fresh high before the next arm
                    self.last_high = None;
                }
            }
        } else if self.armed.is_some()
            && throttle > self.config.low_threshold + self.config.cancel_hysteresis
        {
            self.armed = None;
        }

        self.prev_throttle = throttle;
    }

    /// When the current gesture was armed, if any
    pub fn armed_since(&self) -> Option<Seconds> {
        self.armed
    }

    /// Consume or expire the armed gesture.
    pub fn clear_armed(&mut self) {
        self.armed = None;
    }

    /// Forget everything (phase change).
    pub fn reset(&mut self) {
        self.last_high = None;
        self.armed = None;
        self.prev_throttle = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accel() -> AccelFlickDetector {
        AccelFlickDetector::new(AccelBurstConfig::default())
    }

    fn decel() -> DecelDropDetector {
        DecelDropDetector::new(DecelPopConfig::default())
    }

    #[test]
    fn test_accel_flick_detected() {
        let mut det = accel();
        assert!(!det.record(0.0, 0.2));
        assert!(det.record(0.1, 0.95));
    }

    #[test]
    fn test_accel_slow_ramp_ignored() {
        let mut det = accel();
        // Same endpoints, but spread past the flick window
        assert!(!det.record(0.0, 0.2));
        assert!(!det.record(0.2, 0.5));
        assert!(!det.record(0.4, 0.95));
    }

    #[test]
    fn test_accel_small_jump_ignored() {
        let mut det = accel();
        assert!(!det.record(0.0, 0.5));
        assert!(!det.record(0.1, 0.9));
    }

    #[test]
    fn test_accel_history_pruned() {
        let mut det = accel();
        det.record(0.0, 0.2);
        // Keep feeding mid values until the low sample ages out
        det.record(0.5, 0.5);
        assert!(!det.record(0.6, 0.95));
    }

    #[test]
    fn test_accel_clear_prevents_double_match() {
        let mut det = accel();
        det.record(0.0, 0.2);
        assert!(det.record(0.1, 0.95));
        det.clear();
        assert!(!det.record(0.15, 0.96));
    }

    #[test]
    fn test_decel_drop_arms() {
        let mut det = decel();
        det.record(0.0, 0.9);
        det.record(0.2, 0.1);
        assert_eq!(det.armed_since(), Some(0.2));
    }

    #[test]
    fn test_decel_slow_release_ignored() {
        let mut det = decel();
        det.record(0.0, 0.9);
        det.record(0.8, 0.1);
        assert_eq!(det.armed_since(), None);
    }

    #[test]
    fn test_decel_cancelled_by_reopened_throttle() {
        let mut det = decel();
        det.record(0.0, 0.9);
        det.record(0.2, 0.1);
        assert!(det.armed_since().is_some());

        det.record(0.3, 0.25);
        assert_eq!(det.armed_since(), None);
    }

    #[test]
    fn test_decel_needs_fresh_high_to_rearm() {
        let mut det = decel();
        det.record(0.0, 0.9);
        det.record(0.2, 0.1);
        det.clear_armed();

        // Bounce around low throttle: latch was consumed, no re-arm
        det.record(0.3, 0.3);
        det.record(0.4, 0.1);
        assert_eq!(det.armed_since(), None);

        det.record(0.5, 0.9);
        det.record(0.7, 0.1);
        assert_eq!(det.armed_since(), Some(0.7));
    }
}
