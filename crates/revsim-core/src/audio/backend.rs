//! Playback voice abstraction
//!
//! The core drives audio exclusively through [`Voice`]: an independent
//! playback channel that can play one clip at a time, looped or
//! one-shot, with a scalar gain. Platform adapters (the CPAL mixer,
//! the silent fallback) implement it; the engine model and audio
//! director never see devices, streams, or sample data.
//!
//! Voices are assigned once at startup (loop pair, transition voice,
//! effect voice) and never reassigned at runtime.

use crate::types::SoundKey;

/// One playback channel of the audio backend.
///
/// Playing a key whose clip failed to load must be a silent no-op: the
/// voice stays idle (`is_busy() == false`, `current() == None`). The
/// simulation degrades to silence rather than failing.
pub trait Voice {
    /// Start playing the clip for `key`, replacing whatever the voice
    /// was doing. `looping` repeats the clip until stopped.
    fn play(&mut self, key: SoundKey, looping: bool);

    /// Stop playback immediately.
    fn stop(&mut self);

    /// Set the voice gain (0.0..=1.0, applied multiplicatively to the clip).
    fn set_gain(&mut self, gain: f32);

    /// Whether the voice is currently producing sound. Looped voices
    /// stay busy until stopped; one-shots go idle after the clip ends.
    fn is_busy(&self) -> bool;

    /// The key the voice is currently playing, if any.
    fn current(&self) -> Option<SoundKey>;
}

impl Voice for Box<dyn Voice + Send> {
    fn play(&mut self, key: SoundKey, looping: bool) {
        (**self).play(key, looping)
    }

    fn stop(&mut self) {
        (**self).stop()
    }

    fn set_gain(&mut self, gain: f32) {
        (**self).set_gain(gain)
    }

    fn is_busy(&self) -> bool {
        (**self).is_busy()
    }

    fn current(&self) -> Option<SoundKey> {
        (**self).current()
    }
}
