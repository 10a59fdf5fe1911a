//! Audio Director
//!
//! Maps the engine model's decisions onto the fixed voice set. Owns the
//! loop crossfader and the one-shot arbiter; the engine model never
//! touches a [`Voice`] directly.

mod crossfade;
mod sfx;

pub use crossfade::CrossfadeEngine;
pub use sfx::SfxArbiter;

use crate::audio::Voice;
use crate::config::LevelConfig;
use crate::types::{Seconds, SoundKey};

/// Loop crossfading plus SFX arbitration behind one surface.
///
/// Takes the four mixer voices in their fixed roles: two loop voices,
/// the starter/shutdown voice, the burst/pop voice.
pub struct AudioDirector<V: Voice> {
    loops: CrossfadeEngine<V>,
    sfx: SfxArbiter<V>,
}

impl<V: Voice> AudioDirector<V> {
    pub fn new(loop_a: V, loop_b: V, transition: V, effect: V, levels: &LevelConfig) -> Self {
        Self {
            loops: CrossfadeEngine::new(
                [loop_a, loop_b],
                levels.engine_volume,
                levels.crossfade_duration,
            ),
            sfx: SfxArbiter::new(transition, effect, levels.sfx_volume),
        }
    }

    /// Ask that `key` become (or remain) the audible engine loop.
    pub fn request_loop(&mut self, key: SoundKey, now: Seconds) {
        self.loops.request_loop(key, now);
    }

    /// Advance crossfades. Call once per simulation tick.
    pub fn tick(&mut self, now: Seconds) {
        self.loops.tick(now);
    }

    /// Try to fire a one-shot effect; see [`SfxArbiter::try_play`].
    pub fn try_play_sfx(
        &mut self,
        key: SoundKey,
        volume_multiplier: f32,
        cooldown: Seconds,
        now: Seconds,
    ) -> bool {
        self.sfx.try_play(key, volume_multiplier, cooldown, now)
    }

    /// Fire the starter or shutdown one-shot, replacing whatever is on
    /// the transition voice.
    pub fn play_transition(&mut self, key: SoundKey, now: Seconds) {
        self.sfx.play_transition(key, now);
    }

    /// Fade the engine loops to silence (shutdown).
    pub fn fade_out_loops(&mut self, now: Seconds) {
        self.loops.fade_out(now);
    }

    /// Hard-stop every voice and forget the loop state.
    pub fn stop_all(&mut self) {
        self.loops.stop_all();
        self.sfx.stop_all();
    }

    pub fn current_loop_key(&self) -> Option<SoundKey> {
        self.loops.current_loop_key()
    }

    /// The loop the listener is headed toward (fade target wins)
    pub fn effective_loop_key(&self) -> Option<SoundKey> {
        self.loops.effective_loop_key()
    }

    pub fn is_crossfading(&self) -> bool {
        self.loops.is_crossfading()
    }

    pub fn is_engine_loop_active(&self) -> bool {
        self.loops.is_engine_loop_active()
    }

    /// Whether the starter/shutdown voice is still sounding
    pub fn transition_busy(&self) -> bool {
        self.sfx.transition_busy()
    }

    /// Whether the burst/pop voice is still sounding
    pub fn effect_busy(&self) -> bool {
        self.sfx.effect_busy()
    }

    #[cfg(test)]
    pub(crate) fn sfx_mut(&mut self) -> &mut SfxArbiter<V> {
        &mut self.sfx
    }
}
