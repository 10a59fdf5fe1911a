//! One-shot effect arbitration
//!
//! Two dedicated voices: starter and shutdown share the transition
//! voice, accel-burst and decel-pop share the effect voice. Effects are
//! fire-and-forget: a trigger that loses to a busy voice or a cooldown
//! is dropped, never queued, because it represents a driver gesture
//! that already passed.

use std::collections::HashMap;

use crate::audio::Voice;
use crate::types::{Seconds, SoundKey};

pub struct SfxArbiter<V: Voice> {
    /// Starter / shutdown voice
    transition: V,
    /// Accel-burst / decel-pop voice
    effect: V,
    /// Per-key time of the last successful play
    last_played: HashMap<SoundKey, Seconds>,
    sfx_volume: f32,
}

impl<V: Voice> SfxArbiter<V> {
    pub fn new(transition: V, effect: V, sfx_volume: f32) -> Self {
        Self {
            transition,
            effect,
            last_played: HashMap::new(),
            sfx_volume,
        }
    }

    fn voice_for(&mut self, key: SoundKey) -> &mut V {
        match key {
            SoundKey::Starter | SoundKey::Shutdown => &mut self.transition,
            _ => &mut self.effect,
        }
    }

    /// Try to fire a one-shot. Returns false (no side effect) if the
    /// key's voice is busy or the key is still cooling down.
    pub fn try_play(
        &mut self,
        key: SoundKey,
        volume_multiplier: f32,
        cooldown: Seconds,
        now: Seconds,
    ) -> bool {
        if let Some(&last) = self.last_played.get(&key) {
            if now - last < cooldown {
                return false;
            }
        }
        let gain = self.sfx_volume * volume_multiplier;
        let voice = self.voice_for(key);
        if voice.is_busy() {
            return false;
        }
        voice.set_gain(gain);
        voice.play(key, false);
        self.last_played.insert(key, now);
        log::debug!("SFX {} fired", key);
        true
    }

    /// Play a starter/shutdown one-shot, replacing whatever is on the
    /// transition voice.
    pub fn play_transition(&mut self, key: SoundKey, now: Seconds) {
        self.transition.stop();
        self.transition.set_gain(self.sfx_volume);
        self.transition.play(key, false);
        self.last_played.insert(key, now);
        log::debug!("SFX {} fired (transition)", key);
    }

    /// Whether the starter/shutdown voice is still sounding
    pub fn transition_busy(&self) -> bool {
        self.transition.is_busy()
    }

    /// Whether the burst/pop voice is still sounding
    pub fn effect_busy(&self) -> bool {
        self.effect.is_busy()
    }

    /// Stop both one-shot voices.
    pub fn stop_all(&mut self) {
        self.transition.stop();
        self.effect.stop();
    }

    #[cfg(test)]
    pub(crate) fn effect_voice(&mut self) -> &mut V {
        &mut self.effect
    }

    #[cfg(test)]
    pub(crate) fn transition_voice(&mut self) -> &mut V {
        &mut self.transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::MockVoice;

    fn arbiter() -> SfxArbiter<MockVoice> {
        SfxArbiter::new(MockVoice::new(), MockVoice::new(), 0.8)
    }

    #[test]
    fn test_cooldown_blocks_second_play() {
        let mut sfx = arbiter();
        assert!(sfx.try_play(SoundKey::DecelPop, 0.7, 0.2, 10.0));
        sfx.effect_voice().finish_one_shot();

        // Within cooldown: dropped without touching the voice
        let events = sfx.effect_voice().events.len();
        assert!(!sfx.try_play(SoundKey::DecelPop, 0.7, 0.2, 10.1));
        assert_eq!(sfx.effect_voice().events.len(), events);

        assert!(sfx.try_play(SoundKey::DecelPop, 0.7, 0.2, 10.3));
    }

    #[test]
    fn test_busy_voice_blocks_other_key() {
        let mut sfx = arbiter();
        assert!(sfx.try_play(SoundKey::AccelBurst, 0.9, 0.3, 0.0));
        // Pop shares the voice with the burst still ringing
        assert!(!sfx.try_play(SoundKey::DecelPop, 0.7, 0.2, 0.1));

        sfx.effect_voice().finish_one_shot();
        assert!(sfx.try_play(SoundKey::DecelPop, 0.7, 0.2, 0.2));
    }

    #[test]
    fn test_transition_replaces_ringing_voice() {
        let mut sfx = arbiter();
        sfx.play_transition(SoundKey::Starter, 0.0);
        assert!(sfx.transition_busy());

        // Shutdown requested while the starter still rings: it wins
        sfx.play_transition(SoundKey::Shutdown, 0.5);
        assert_eq!(sfx.transition_voice().current, Some(SoundKey::Shutdown));
    }

    #[test]
    fn test_gain_scales_with_multiplier() {
        let mut sfx = arbiter();
        sfx.try_play(SoundKey::AccelBurst, 0.9, 0.3, 0.0);
        let gain = sfx.effect_voice().gain;
        assert!((gain - 0.8 * 0.9).abs() < 1e-6);
    }
}
