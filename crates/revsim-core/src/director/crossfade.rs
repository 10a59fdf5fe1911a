//! Two-voice loop crossfader
//!
//! The engine loop always lives on one of two voices; switching loops
//! swaps which voice is "active", starts the new loop at gain 0 on it,
//! and ramps gains linearly so the old and new gains always sum to the
//! engine volume. Re-targeting mid-fade hard-stops both voices and
//! starts a fresh fade from the last confirmed loop, so a fade never
//! chases a moving target.

use crate::audio::Voice;
use crate::types::{Seconds, SoundKey};

/// An in-progress loop transition
#[derive(Debug, Clone, Copy)]
struct Crossfade {
    /// Loop fading out; `None` on a cold start interrupted mid-fade
    from: Option<SoundKey>,
    /// Loop fading in
    to: SoundKey,
    start: Seconds,
}

/// A ramp to silence, used when the engine shuts down
#[derive(Debug, Clone, Copy)]
struct FadeOut {
    start: Seconds,
    duration: Seconds,
}

/// Drives the two alternating engine-loop voices.
pub struct CrossfadeEngine<V: Voice> {
    voices: [V; 2],
    /// Index of the voice hosting (or fading in) the target loop
    active: usize,
    /// Last loop confirmed audible at full gain
    current: Option<SoundKey>,
    fade: Option<Crossfade>,
    fade_out: Option<FadeOut>,
    engine_volume: f32,
    duration: Seconds,
}

impl<V: Voice> CrossfadeEngine<V> {
    pub fn new(voices: [V; 2], engine_volume: f32, crossfade_duration: Seconds) -> Self {
        Self {
            voices,
            active: 0,
            current: None,
            fade: None,
            fade_out: None,
            engine_volume,
            duration: crossfade_duration.max(0.01),
        }
    }

    /// Ask that `key` become (or remain) the audible engine loop.
    pub fn request_loop(&mut self, key: SoundKey, now: Seconds) {
        self.fade_out = None;

        if let Some(fade) = self.fade {
            if fade.to == key {
                return;
            }
            // Re-target: drop both voices and fade in fresh from the
            // last confirmed loop
            log::debug!(
                "Crossfade to {} interrupted by request for {}",
                fade.to,
                key
            );
            self.voices[0].stop();
            self.voices[1].stop();
            self.fade = None;
            self.start_crossfade(self.current, key, now);
            return;
        }

        if self.current == Some(key) {
            // Same loop; make sure the backend is actually playing it
            let voice = &mut self.voices[self.active];
            if voice.current() != Some(key) || !voice.is_busy() {
                log::debug!("Loop {} dropped by backend, restarting", key);
                voice.play(key, true);
            }
            voice.set_gain(self.engine_volume);
            return;
        }

        if self.current.is_none() {
            // First loop ever: no fade, straight in at full volume
            let voice = &mut self.voices[self.active];
            voice.play(key, true);
            voice.set_gain(self.engine_volume);
            self.current = Some(key);
            log::debug!("Loop {} started directly", key);
            return;
        }

        self.start_crossfade(self.current, key, now);
    }

    fn start_crossfade(&mut self, from: Option<SoundKey>, to: SoundKey, now: Seconds) {
        // The voice that will host `to` becomes active
        self.active = 1 - self.active;
        let inactive = 1 - self.active;

        self.voices[self.active].stop();
        self.voices[self.active].play(to, true);
        self.voices[self.active].set_gain(0.0);

        match from {
            Some(from_key) => {
                let voice = &mut self.voices[inactive];
                if voice.current() != Some(from_key) || !voice.is_busy() {
                    voice.play(from_key, true);
                }
                voice.set_gain(self.engine_volume);
            }
            None => self.voices[inactive].stop(),
        }

        self.fade = Some(Crossfade { from, to, start: now });
        log::debug!(
            "Crossfade {} -> {}",
            from.map(|k| k.name()).unwrap_or("(silence)"),
            to
        );
    }

    /// Advance any in-progress fade.
    pub fn tick(&mut self, now: Seconds) {
        if let Some(fo) = self.fade_out {
            let progress = ((now - fo.start) / fo.duration).clamp(0.0, 1.0);
            let gain = self.engine_volume * (1.0 - progress) as f32;
            self.voices[0].set_gain(gain);
            self.voices[1].set_gain(gain);
            if progress >= 1.0 {
                self.voices[0].stop();
                self.voices[1].stop();
                self.fade_out = None;
                self.current = None;
                log::debug!("Loop fade-out complete");
            }
            return;
        }

        let Some(fade) = self.fade else {
            return;
        };

        let progress = ((now - fade.start) / self.duration).clamp(0.0, 1.0);
        let gain_to = self.engine_volume * progress as f32;
        let gain_from = self.engine_volume * (1.0 - progress) as f32;
        let inactive = 1 - self.active;

        // Self-heal: a backend may silently drop a voice; force the
        // expected clip back before applying gain
        if self.voices[self.active].current() != Some(fade.to) {
            self.voices[self.active].play(fade.to, true);
        }
        self.voices[self.active].set_gain(gain_to);

        if let Some(from_key) = fade.from {
            if self.voices[inactive].current() != Some(from_key) {
                self.voices[inactive].play(from_key, true);
            }
            self.voices[inactive].set_gain(gain_from);
        }

        if progress >= 1.0 {
            if fade.from.is_some() {
                self.voices[inactive].stop();
            }
            self.voices[self.active].set_gain(self.engine_volume);
            self.current = Some(fade.to);
            self.fade = None;
            log::debug!("Crossfade to {} complete", fade.to);
        }
    }

    /// Ramp both loop voices to silence over half a crossfade.
    ///
    /// A repeat call while a fade-out is already running is a no-op;
    /// restarting the ramp would pin the gains back at full volume.
    pub fn fade_out(&mut self, now: Seconds) {
        if self.fade_out.is_some() {
            return;
        }
        if self.fade.is_some() || self.current.is_some() {
            self.fade = None;
            self.fade_out = Some(FadeOut {
                start: now,
                duration: self.duration / 2.0,
            });
        }
    }

    /// Hard-stop both voices and forget everything.
    pub fn stop_all(&mut self) {
        self.voices[0].stop();
        self.voices[1].stop();
        self.fade = None;
        self.fade_out = None;
        self.current = None;
    }

    /// Last loop confirmed playing at full gain
    pub fn current_loop_key(&self) -> Option<SoundKey> {
        self.current
    }

    /// The loop the listener is headed toward: the fade target if a
    /// fade is in flight, otherwise the confirmed loop
    pub fn effective_loop_key(&self) -> Option<SoundKey> {
        self.fade.map(|f| f.to).or(self.current)
    }

    pub fn is_crossfading(&self) -> bool {
        self.fade.is_some()
    }

    /// Whether any loop voice is doing something
    pub fn is_engine_loop_active(&self) -> bool {
        self.fade.is_some() || self.voices.iter().any(|v| v.is_busy())
    }

    #[cfg(test)]
    pub(crate) fn voices(&self) -> &[V; 2] {
        &self.voices
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{MockVoice, VoiceEvent};

    const VOL: f32 = 0.7;
    const DUR: Seconds = 0.45;

    fn engine() -> CrossfadeEngine<MockVoice> {
        CrossfadeEngine::new([MockVoice::new(), MockVoice::new()], VOL, DUR)
    }

    #[test]
    fn test_first_request_plays_directly() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);

        assert!(!xf.is_crossfading());
        assert_eq!(xf.current_loop_key(), Some(SoundKey::Idle));
        assert_eq!(xf.voices()[0].current, Some(SoundKey::Idle));
        assert_eq!(xf.voices()[0].gain, VOL);
    }

    #[test]
    fn test_same_target_request_is_idempotent() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        let plays = xf.voices()[0].play_count(SoundKey::Idle);

        for i in 0..5 {
            xf.request_loop(SoundKey::Idle, i as f64 * 0.1);
        }
        assert!(!xf.is_crossfading());
        assert_eq!(xf.voices()[0].play_count(SoundKey::Idle), plays);
    }

    #[test]
    fn test_gains_conserve_engine_volume_mid_fade() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.request_loop(SoundKey::LowRpm, 1.0);
        assert!(xf.is_crossfading());

        for step in 1..=8 {
            let now = 1.0 + DUR * step as f64 / 10.0;
            xf.tick(now);
            let sum = xf.voices()[0].gain + xf.voices()[1].gain;
            assert!((sum - VOL).abs() < 1e-4, "gain sum {} at {}", sum, now);
        }
    }

    #[test]
    fn test_fade_completion_stops_old_voice() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.request_loop(SoundKey::LowRpm, 1.0);
        xf.tick(1.0 + DUR + 0.01);

        assert!(!xf.is_crossfading());
        assert_eq!(xf.current_loop_key(), Some(SoundKey::LowRpm));
        // Old voice (index 0 hosted idle) stopped, new voice at full gain
        assert!(!xf.voices()[0].busy);
        assert_eq!(xf.voices()[1].current, Some(SoundKey::LowRpm));
        assert_eq!(xf.voices()[1].gain, VOL);
    }

    #[test]
    fn test_interruption_fades_from_last_confirmed() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.request_loop(SoundKey::MidRpm, 1.0);
        xf.tick(1.1);

        // Re-target mid-fade; the new fade's source is idle, not mid_rpm
        xf.request_loop(SoundKey::LowRpm, 1.2);
        assert!(xf.is_crossfading());
        assert_eq!(xf.effective_loop_key(), Some(SoundKey::LowRpm));

        xf.tick(1.2 + DUR + 0.01);
        assert_eq!(xf.current_loop_key(), Some(SoundKey::LowRpm));
        let full: Vec<f32> = xf.voices().iter().map(|v| v.gain).collect();
        assert_eq!(full.iter().filter(|&&g| g >= VOL - 1e-4).count(), 1);
    }

    #[test]
    fn test_retarget_to_inflight_key_is_noop() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.request_loop(SoundKey::LowRpm, 1.0);
        let stops = xf.voices()[0].events.iter().filter(|e| **e == VoiceEvent::Stop).count();

        xf.request_loop(SoundKey::LowRpm, 1.1);
        let stops_after =
            xf.voices()[0].events.iter().filter(|e| **e == VoiceEvent::Stop).count();
        assert_eq!(stops, stops_after);
    }

    #[test]
    fn test_self_heal_restarts_dropped_loop() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);

        // Backend silently loses the voice
        xf.voices[0].busy = false;
        xf.voices[0].current = None;

        xf.request_loop(SoundKey::Idle, 2.0);
        assert_eq!(xf.voices()[0].current, Some(SoundKey::Idle));
        assert!(xf.voices()[0].busy);
    }

    #[test]
    fn test_fade_out_silences_and_clears() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.fade_out(5.0);

        xf.tick(5.0 + DUR);
        assert_eq!(xf.current_loop_key(), None);
        assert!(!xf.voices()[0].busy);
        assert!(!xf.voices()[1].busy);
    }

    #[test]
    fn test_repeated_fade_out_calls_do_not_restart_ramp() {
        let mut xf = engine();
        xf.request_loop(SoundKey::Idle, 0.0);
        xf.fade_out(5.0);

        // Keep requesting the fade while it runs; progress must not reset
        for step in 1..=4 {
            let now = 5.0 + DUR / 16.0 * step as f64;
            xf.fade_out(now);
            xf.tick(now);
            assert!(xf.voices()[0].gain < VOL, "gain reset at {}", now);
        }

        xf.fade_out(5.0 + DUR);
        xf.tick(5.0 + DUR);
        assert_eq!(xf.current_loop_key(), None);
        assert!(!xf.voices()[0].busy);
        assert!(!xf.voices()[1].busy);
    }
}
