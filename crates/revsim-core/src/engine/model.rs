//! Engine model
//!
//! The top-level state machine: consumes throttle samples and tick
//! deltas, produces RPM and an engine phase, and drives the audio
//! director. Time is an internal f64 clock advanced only by
//! [`EngineModel::update`]; nothing in here reads a wall clock, which
//! is what lets the tests run the whole simulation synthetically.
//!
//! Each tick: integrate RPM toward the throttle-derived target, step
//! the phase machine, consume any armed decel gesture, evaluate cruise,
//! pick the loop key, hand it to the director.

use crate::audio::Voice;
use crate::config::EngineConfig;
use crate::director::AudioDirector;
use crate::types::{EnginePhase, Seconds, SoundKey};

use super::cruise::CruiseDetector;
use super::gesture::{AccelFlickDetector, DecelDropDetector};

pub struct EngineModel<V: Voice> {
    config: EngineConfig,
    director: AudioDirector<V>,

    /// Simulation clock, seconds since construction
    clock: Seconds,
    phase: EnginePhase,
    phase_entry: Seconds,

    rpm: f64,
    previous_rpm: f64,
    rpm_rate: f64,
    throttle: f64,
    starter_playing: bool,

    accel: AccelFlickDetector,
    decel: DecelDropDetector,
    cruise: CruiseDetector,

    /// End of the accel-burst override window
    accel_effect_until: Seconds,
    /// End of the post-pop linger window
    decel_linger_until: Seconds,
    /// Loop forced while lingering with the throttle closed
    decel_background: Option<SoundKey>,
}

impl<V: Voice> EngineModel<V> {
    pub fn new(director: AudioDirector<V>, config: EngineConfig) -> Self {
        Self {
            accel: AccelFlickDetector::new(config.accel_burst.clone()),
            decel: DecelDropDetector::new(config.decel_pop.clone()),
            cruise: CruiseDetector::new(config.cruise.clone()),
            config,
            director,
            clock: 0.0,
            phase: EnginePhase::Off,
            phase_entry: 0.0,
            rpm: 0.0,
            previous_rpm: 0.0,
            rpm_rate: 0.0,
            throttle: 0.0,
            starter_playing: false,
            accel_effect_until: 0.0,
            decel_linger_until: 0.0,
            decel_background: None,
        }
    }

    /// Crank the engine. Only meaningful from Off.
    pub fn start_engine(&mut self) {
        if self.phase != EnginePhase::Off {
            return;
        }
        let now = self.clock;
        self.rpm = 0.0;
        self.previous_rpm = 0.0;
        self.rpm_rate = 0.0;
        self.reset_gesture_state(now);
        self.director.play_transition(SoundKey::Starter, now);
        self.starter_playing = true;
        self.enter_phase(EnginePhase::Starting, now);
        log::info!("Engine starting");
    }

    /// Shut the engine down. Only meaningful from Idle or Running.
    pub fn stop_engine(&mut self) {
        if !matches!(self.phase, EnginePhase::Idle | EnginePhase::Running) {
            return;
        }
        let now = self.clock;
        self.director.fade_out_loops(now);
        self.director.play_transition(SoundKey::Shutdown, now);
        self.reset_gesture_state(now);
        self.enter_phase(EnginePhase::ShuttingDown, now);
        log::info!("Engine shutting down");
    }

    /// Feed a throttle sample. Clamped to [0, 1]; gesture bookkeeping
    /// only runs while the engine is Idle or Running.
    pub fn set_throttle(&mut self, value: f64) {
        let throttle = value.clamp(0.0, 1.0);
        self.throttle = throttle;

        if !matches!(self.phase, EnginePhase::Idle | EnginePhase::Running) {
            return;
        }
        let now = self.clock;

        if self.config.accel_burst.enabled {
            let flick = self.accel.record(now, throttle);
            if flick && now >= self.accel_effect_until {
                let mult = self.config.accel_burst.volume_multiplier as f32;
                let cooldown = self.config.accel_burst.cooldown;
                let window = self.config.durations.accel_burst
                    * self.config.accel_burst.effect_duration_multiplier;
                if self
                    .director
                    .try_play_sfx(SoundKey::AccelBurst, mult, cooldown, now)
                {
                    self.accel_effect_until = now + window;
                    self.accel.clear();
                    // A burst is incompatible with steady cruising
                    self.cruise.cancel();
                }
            }
        }

        if self.config.decel_pop.enabled {
            self.decel.record(now, throttle);
        }
    }

    /// Advance the simulation by `dt` seconds.
    pub fn update(&mut self, dt: Seconds) {
        let dt = dt.max(0.0);
        self.clock += dt;
        let now = self.clock;

        self.step_phase(dt, now);

        if dt > 0.0 {
            self.rpm_rate = (self.rpm - self.previous_rpm) / dt;
        }
        self.previous_rpm = self.rpm;

        if matches!(self.phase, EnginePhase::Idle | EnginePhase::Running) {
            self.consume_decel_gesture(now);

            if self.phase == EnginePhase::Running {
                let on_high = !self.director.is_crossfading()
                    && self.director.effective_loop_key() == Some(SoundKey::HighRpm);
                self.cruise.update(now, self.throttle, self.rpm, on_high);
            } else {
                self.cruise.cancel();
            }

            let key = self.select_sound_key(now);
            self.director.request_loop(key, now);
        } else {
            self.cruise.cancel();
            if self.phase == EnginePhase::Off && self.director.effective_loop_key().is_some() {
                // Loops must never outlive the engine
                self.director.fade_out_loops(now);
            }
        }

        self.director.tick(now);
    }

    fn step_phase(&mut self, dt: Seconds, now: Seconds) {
        let time_in = now - self.phase_entry;
        match self.phase {
            EnginePhase::Off => {}

            EnginePhase::Starting => {
                // Linear crank ramp, timed to land just before the
                // starter clip runs out
                let ramp = (self.config.durations.starter - 0.3).max(0.1);
                self.rpm = self.config.rpm.idle * (time_in / ramp).clamp(0.0, 1.0);

                let caught = self.starter_playing
                    && !self.director.transition_busy()
                    && time_in > 0.5
                    && self.rpm >= self.config.rpm.idle;
                if caught || time_in > self.config.starter_timeout() {
                    self.rpm = self.config.rpm.idle;
                    self.starter_playing = false;
                    self.enter_phase(EnginePhase::Idle, now);
                }
            }

            EnginePhase::Idle => {
                self.integrate_rpm(dt, now);
                if self.throttle > self.config.throttle.effectively_zero {
                    self.enter_phase(EnginePhase::Running, now);
                }
            }

            EnginePhase::Running => {
                self.integrate_rpm(dt, now);
                let effects_clear =
                    now >= self.accel_effect_until && now >= self.decel_linger_until;
                if self.throttle < self.config.throttle.effectively_zero
                    && self.rpm <= self.config.rpm.idle + 1.0
                    && effects_clear
                {
                    self.rpm = self.config.rpm.idle;
                    self.decel_background = None;
                    self.enter_phase(EnginePhase::Idle, now);
                }
            }

            EnginePhase::ShuttingDown => {
                self.rpm = (self.rpm - self.config.rpm.decel_rate * 2.0 * dt).max(0.0);
                let spun_down = self.rpm <= 5.0
                    || (!self.director.transition_busy()
                        && time_in > 0.5
                        && self.rpm < self.config.rpm.min / 4.0);
                if spun_down || time_in > self.config.shutdown_timeout() {
                    self.rpm = 0.0;
                    self.enter_phase(EnginePhase::Off, now);
                }
            }
        }
    }

    /// Move RPM toward the throttle-derived target. Idle/Running only.
    fn integrate_rpm(&mut self, dt: Seconds, now: Seconds) {
        let rpm_cfg = &self.config.rpm;
        let throttle = self.throttle;

        let wide_open = throttle >= self.config.cruise.enter_threshold
            || (self.cruise.is_active() && throttle >= self.config.cruise.maintain_threshold);
        let target = if throttle <= self.config.throttle.effectively_zero {
            rpm_cfg.idle
        } else if wide_open {
            rpm_cfg.max
        } else {
            // Concave response: most of the range arrives early
            rpm_cfg.idle + (rpm_cfg.max - rpm_cfg.idle) * throttle.powf(0.7)
        };

        if self.rpm < target {
            self.rpm = (self.rpm + rpm_cfg.accel_rate * dt).min(target);
        } else if self.rpm > target {
            let mut rate = if throttle < self.config.throttle.effectively_zero {
                rpm_cfg.idle_return_rate
            } else {
                rpm_cfg.decel_rate
            };
            // Post-pop hang: the engine audibly holds its revs a moment
            if now < self.decel_linger_until
                && throttle < self.config.throttle.effectively_zero
            {
                rate *= self.config.decel_pop.fall_rate_modifier;
            }
            self.rpm = (self.rpm - rate * dt).max(target);
        }

        let floor = if self.phase == EnginePhase::Idle {
            rpm_cfg.idle
        } else {
            rpm_cfg.min
        };
        self.rpm = self.rpm.clamp(floor, rpm_cfg.max);
    }

    fn consume_decel_gesture(&mut self, now: Seconds) {
        let cfg = &self.config.decel_pop;
        if !cfg.enabled {
            self.decel.clear_armed();
            return;
        }

        // A driver getting back on the throttle ends the linger early
        if now < self.decel_linger_until
            && self.throttle >= self.config.throttle.significantly_open
        {
            self.decel_linger_until = now;
            self.decel_background = None;
        }

        let Some(armed_at) = self.decel.armed_since() else {
            return;
        };
        if now - armed_at > cfg.rpm_check_window {
            self.decel.clear_armed();
            return;
        }
        if self.rpm <= cfg.rpm_threshold {
            return;
        }

        let fires = cfg.chance >= 1.0 || rand::random::<f64>() < cfg.chance;
        if fires
            && self.director.try_play_sfx(
                SoundKey::DecelPop,
                cfg.volume_multiplier as f32,
                cfg.cooldown,
                now,
            )
        {
            self.decel_linger_until = now + cfg.linger_duration;
            self.decel_background = match self.director.effective_loop_key() {
                Some(
                    SoundKey::Idle | SoundKey::MidRpm | SoundKey::HighRpm | SoundKey::Cruise,
                ) => Some(SoundKey::LowRpm),
                other => other,
            };
            self.cruise.cancel();
            self.decel.clear_armed();
        }
        // A failed roll or busy voice leaves the gesture armed; the
        // window timeout is the only other way out
    }

    /// RPM-to-band mapping with hysteresis: the loop already heading to
    /// the listener is held inside a widened window before a fresh pick.
    /// Hold windows anchor on the neighboring band's edges, so each loop
    /// rides well into the overlap before handing off.
    fn banded_key(&self) -> SoundKey {
        let bands = &self.config.bands;
        if let Some(current) = self.director.effective_loop_key() {
            let hold = match current {
                SoundKey::Idle => self.rpm <= bands.low.1 * bands.hold_lower,
                SoundKey::LowRpm => {
                    self.rpm >= bands.low.0 * bands.low_hold_floor
                        && self.rpm <= bands.mid.0 * bands.hold_upper
                }
                SoundKey::MidRpm => {
                    self.rpm >= bands.mid.0 * bands.hold_lower
                        && self.rpm <= bands.high.0 * bands.hold_upper
                }
                SoundKey::HighRpm => self.rpm >= bands.high.0 * bands.hold_lower,
                _ => false,
            };
            if hold {
                return current;
            }
        }

        if self.rpm < bands.low.0 + bands.idle_edge_pad {
            SoundKey::Idle
        } else if self.rpm < bands.low.1 - bands.low_edge_pad {
            SoundKey::LowRpm
        } else if self.rpm < bands.mid.1 - bands.mid_edge_pad {
            SoundKey::MidRpm
        } else {
            SoundKey::HighRpm
        }
    }

    /// Loop selection with the override chain: cruise beats the accel
    /// window, which beats the decel linger.
    fn select_sound_key(&self, now: Seconds) -> SoundKey {
        if self.cruise.is_active() {
            return SoundKey::Cruise;
        }

        let mut key = self.banded_key();
        if now < self.accel_effect_until {
            // The burst clip already covers the top end
            if matches!(key, SoundKey::HighRpm | SoundKey::Cruise) {
                key = SoundKey::MidRpm;
            }
        } else if now < self.decel_linger_until
            && self.throttle < self.config.throttle.effectively_zero
        {
            key = match self.decel_background {
                Some(background) => background,
                None => {
                    if matches!(key, SoundKey::Idle | SoundKey::Cruise) {
                        SoundKey::LowRpm
                    } else {
                        key
                    }
                }
            };
        }
        key
    }

    fn reset_gesture_state(&mut self, now: Seconds) {
        self.accel.clear();
        self.decel.reset();
        self.cruise.cancel();
        self.accel_effect_until = now;
        self.decel_linger_until = now;
        self.decel_background = None;
    }

    fn enter_phase(&mut self, phase: EnginePhase, now: Seconds) {
        log::debug!("Phase {} -> {}", self.phase.label(), phase.label());
        self.phase = phase;
        self.phase_entry = now;
    }

    pub fn rpm(&self) -> f64 {
        self.rpm
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn throttle(&self) -> f64 {
        self.throttle
    }

    /// RPM change per second, from the last tick
    pub fn rpm_rate(&self) -> f64 {
        self.rpm_rate
    }

    pub fn is_cruising(&self) -> bool {
        self.cruise.is_active()
    }

    pub fn director(&self) -> &AudioDirector<V> {
        &self.director
    }

    pub fn director_mut(&mut self) -> &mut AudioDirector<V> {
        &mut self.director
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::MockVoice;
    use crate::config::LevelConfig;

    fn model_with(config: EngineConfig) -> EngineModel<MockVoice> {
        let director = AudioDirector::new(
            MockVoice::new(),
            MockVoice::new(),
            MockVoice::new(),
            MockVoice::new(),
            &LevelConfig::default(),
        );
        EngineModel::new(director, config)
    }

    fn model() -> EngineModel<MockVoice> {
        let mut config = EngineConfig::default();
        // Deterministic pops for tests
        config.decel_pop.chance = 1.0;
        model_with(config)
    }

    /// Crank up and ride through Starting into Idle
    fn run_to_idle(m: &mut EngineModel<MockVoice>) {
        m.start_engine();
        for _ in 0..62 {
            m.update(0.1);
        }
        assert_eq!(m.phase(), EnginePhase::Idle);
    }

    fn run_to_running(m: &mut EngineModel<MockVoice>, throttle: f64) {
        run_to_idle(m);
        m.set_throttle(throttle);
        m.update(0.05);
        assert_eq!(m.phase(), EnginePhase::Running);
    }

    #[test]
    fn test_throttle_clamped() {
        let mut m = model();
        m.set_throttle(1.7);
        assert_eq!(m.throttle(), 1.0);
        m.set_throttle(-0.3);
        assert_eq!(m.throttle(), 0.0);
        m.set_throttle(0.42);
        assert_eq!(m.throttle(), 0.42);
    }

    #[test]
    fn test_cold_start_reaches_idle() {
        let mut m = model();
        assert_eq!(m.phase(), EnginePhase::Off);

        m.start_engine();
        assert_eq!(m.phase(), EnginePhase::Starting);
        assert_eq!(m.rpm(), 0.0);
        assert!(m.director().transition_busy());

        for _ in 0..62 {
            m.update(0.1);
        }
        assert_eq!(m.phase(), EnginePhase::Idle);
        assert_eq!(m.rpm(), m.config().rpm.idle);
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::Idle));
    }

    #[test]
    fn test_start_only_from_off() {
        let mut m = model();
        run_to_running(&mut m, 0.5);
        let plays = m
            .director_mut()
            .sfx_mut()
            .transition_voice()
            .play_count(SoundKey::Starter);
        m.start_engine();
        assert_eq!(m.phase(), EnginePhase::Running);
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .transition_voice()
                .play_count(SoundKey::Starter),
            plays
        );
    }

    #[test]
    fn test_shutdown_reaches_off() {
        let mut m = model();
        run_to_running(&mut m, 0.5);

        m.stop_engine();
        assert_eq!(m.phase(), EnginePhase::ShuttingDown);
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .transition_voice()
                .play_count(SoundKey::Shutdown),
            1
        );

        for _ in 0..20 {
            m.update(0.1);
        }
        assert_eq!(m.phase(), EnginePhase::Off);
        assert_eq!(m.rpm(), 0.0);
        // stop_engine from Off is a no-op
        m.stop_engine();
        assert_eq!(m.phase(), EnginePhase::Off);
    }

    #[test]
    fn test_idle_running_round_trip() {
        let mut m = model();
        run_to_running(&mut m, 0.5);

        m.set_throttle(0.0);
        for _ in 0..60 {
            m.update(0.1);
        }
        assert_eq!(m.phase(), EnginePhase::Idle);
        assert_eq!(m.rpm(), m.config().rpm.idle);
    }

    #[test]
    fn test_rpm_never_exceeds_bounds() {
        let mut m = model();
        run_to_running(&mut m, 1.0);
        for _ in 0..100 {
            m.set_throttle(1.0);
            m.update(0.05);
            assert!(m.rpm() <= m.config().rpm.max);
        }
        assert_eq!(m.rpm(), m.config().rpm.max);

        m.set_throttle(0.06);
        for _ in 0..200 {
            m.update(0.05);
            assert!(m.rpm() >= m.config().rpm.min);
        }
    }

    #[test]
    fn test_accel_flick_fires_burst_and_caps_loop() {
        let mut m = model();
        run_to_running(&mut m, 0.2);

        m.set_throttle(0.95);
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .effect_voice()
                .play_count(SoundKey::AccelBurst),
            1
        );

        // For the whole effect window the loop stays off high_rpm and
        // cruise, even as RPM climbs
        for _ in 0..40 {
            m.update(0.05);
            let key = m.director().effective_loop_key().unwrap();
            assert_ne!(key, SoundKey::HighRpm);
            assert_ne!(key, SoundKey::Cruise);
        }

        // A second flick inside the window is ignored
        m.set_throttle(0.2);
        m.set_throttle(0.96);
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .effect_voice()
                .play_count(SoundKey::AccelBurst),
            1
        );
    }

    #[test]
    fn test_decel_pop_fires_and_lingers() {
        let mut m = model();
        run_to_running(&mut m, 1.0);
        for _ in 0..40 {
            m.set_throttle(1.0);
            m.update(0.05);
        }
        assert!(m.rpm() > m.config().decel_pop.rpm_threshold);

        m.set_throttle(0.0);
        m.update(0.05);
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .effect_voice()
                .play_count(SoundKey::DecelPop),
            1
        );

        // Linger forces the background loop while the throttle is closed
        m.update(0.05);
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::LowRpm));

        // And the revs hang: fall rate is reduced
        let before = m.rpm();
        m.update(0.1);
        let fallen = before - m.rpm();
        let normal = m.config().rpm.idle_return_rate * 0.1;
        assert!(fallen < normal * 0.6, "fell {} in 0.1s", fallen);
    }

    #[test]
    fn test_reopened_throttle_clears_linger() {
        let mut m = model();
        run_to_running(&mut m, 1.0);
        for _ in 0..40 {
            m.set_throttle(1.0);
            m.update(0.05);
        }
        m.set_throttle(0.0);
        m.update(0.05);
        m.update(0.05);
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::LowRpm));

        m.set_throttle(0.5);
        m.update(0.05);
        assert_ne!(m.director().effective_loop_key(), Some(SoundKey::LowRpm));
    }

    #[test]
    fn test_decel_gesture_times_out_without_play() {
        let mut m = model();
        run_to_idle(&mut m);
        // Flick down while RPM sits at idle, below the pop threshold
        m.set_throttle(0.9);
        m.set_throttle(0.0);
        m.update(1.1);

        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .effect_voice()
                .play_count(SoundKey::DecelPop),
            0
        );
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::Idle));

        // Window expired: revving up later must not fire the stale gesture
        for _ in 0..40 {
            m.set_throttle(1.0);
            m.update(0.05);
        }
        assert_eq!(
            m.director_mut()
                .sfx_mut()
                .effect_voice()
                .play_count(SoundKey::DecelPop),
            0
        );
    }

    #[test]
    fn test_cruise_entry_and_exit() {
        let mut m = model();
        run_to_running(&mut m, 1.0);
        for _ in 0..200 {
            m.set_throttle(1.0);
            m.update(0.05);
        }
        assert!(m.is_cruising());
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::Cruise));

        m.set_throttle(0.9);
        m.update(0.05);
        assert!(!m.is_cruising());
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::HighRpm));
    }

    #[test]
    fn test_cruise_ends_with_phase() {
        let mut m = model();
        run_to_running(&mut m, 1.0);
        for _ in 0..200 {
            m.set_throttle(1.0);
            m.update(0.05);
        }
        assert!(m.is_cruising());

        m.stop_engine();
        assert!(!m.is_cruising());
    }

    #[test]
    fn test_idle_loop_holds_deep_into_low_band() {
        let mut m = model();
        run_to_running(&mut m, 0.5);
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::Idle));

        // Climb in small steps; the idle loop must stay well past the
        // low band's lower edge
        for _ in 0..400 {
            if m.rpm() >= 2000.0 {
                break;
            }
            m.update(0.005);
        }
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::Idle));

        let mut handoff = 0.0;
        for _ in 0..400 {
            m.update(0.005);
            if m.director().effective_loop_key() != Some(SoundKey::Idle) {
                handoff = m.rpm();
                break;
            }
        }
        assert!(handoff > 2600.0, "idle handed off at {}", handoff);
        assert_eq!(m.director().effective_loop_key(), Some(SoundKey::LowRpm));
    }

    #[test]
    fn test_loops_silenced_after_shutdown() {
        let mut m = model();
        run_to_running(&mut m, 0.5);
        assert!(m.director().is_engine_loop_active());

        m.stop_engine();
        for _ in 0..20 {
            m.update(0.1);
        }
        assert_eq!(m.phase(), EnginePhase::Off);
        assert!(!m.director().is_engine_loop_active());
        assert_eq!(m.director().current_loop_key(), None);
    }

    #[test]
    fn test_quick_spindown_does_not_strand_loops() {
        let mut m = model();
        run_to_idle(&mut m);
        assert!(m.director().is_engine_loop_active());

        // Idle RPM spins down faster than the loop fade; Off arrives
        // with the fade still in flight
        m.stop_engine();
        for _ in 0..4 {
            m.update(0.02);
        }
        assert_eq!(m.phase(), EnginePhase::Off);
        assert!(m.director().effective_loop_key().is_some());

        for _ in 0..20 {
            m.update(0.02);
        }
        assert!(!m.director().is_engine_loop_active());
        assert_eq!(m.director().current_loop_key(), None);
    }
}
