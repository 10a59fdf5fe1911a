//! Cruise-mode detection
//!
//! Wide-open throttle held long enough, at redline-adjacent RPM, on the
//! high-RPM loop, swaps the banded loop for the dedicated cruise
//! ambience. Any exit tears the whole arm state down; re-entering
//! always costs the full sustain period again.

use crate::config::CruiseConfig;
use crate::types::Seconds;

pub struct CruiseDetector {
    config: CruiseConfig,
    /// Rising-edge time of sustained high throttle
    arm_time: Option<Seconds>,
    eligible: bool,
    active: bool,
}

impl CruiseDetector {
    pub fn new(config: CruiseConfig) -> Self {
        Self {
            config,
            arm_time: None,
            eligible: false,
            active: false,
        }
    }

    /// Evaluate cruise conditions for this tick. `on_high_loop` means
    /// the high-RPM loop is confirmed playing, not mid-crossfade.
    pub fn update(&mut self, now: Seconds, throttle: f64, rpm: f64, on_high_loop: bool) {
        if !self.config.enabled {
            self.cancel();
            return;
        }

        if self.active {
            if throttle < self.config.maintain_threshold {
                self.cancel();
            }
            return;
        }

        if throttle >= self.config.enter_threshold {
            let armed = *self.arm_time.get_or_insert(now);
            if now - armed >= self.config.sustain {
                self.eligible = true;
                if on_high_loop && rpm >= self.config.rpm_threshold {
                    self.active = true;
                    log::debug!("Cruise engaged at {:.0} RPM", rpm);
                }
            }
        } else {
            self.arm_time = None;
            self.eligible = false;
        }
    }

    /// Drop out of cruise and disarm entirely.
    pub fn cancel(&mut self) {
        if self.active {
            log::debug!("Cruise cancelled");
        }
        self.arm_time = None;
        self.eligible = false;
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    #[cfg(test)]
    pub(crate) fn is_eligible(&self) -> bool {
        self.eligible
    }
}
