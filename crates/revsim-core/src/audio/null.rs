//! Silent fallback voice
//!
//! Used when the audio backend fails to start (UI-only mode): the
//! simulation runs normally, it just plays nothing. One-shots report
//! idle immediately, so timeout-free phase transitions still work.

use crate::types::SoundKey;

use super::backend::Voice;

/// A voice that swallows every command
#[derive(Debug, Default)]
pub struct NullVoice {
    current: Option<SoundKey>,
    looping: bool,
}

impl NullVoice {
    /// Create a silent voice
    pub fn new() -> Self {
        Self::default()
    }
}

impl Voice for NullVoice {
    fn play(&mut self, key: SoundKey, looping: bool) {
        self.current = Some(key);
        self.looping = looping;
    }

    fn stop(&mut self) {
        self.current = None;
        self.looping = false;
    }

    fn set_gain(&mut self, _gain: f32) {}

    fn is_busy(&self) -> bool {
        // One-shots "finish" instantly; loops stay nominally busy so the
        // crossfade bookkeeping behaves the same as with real audio
        self.looping && self.current.is_some()
    }

    fn current(&self) -> Option<SoundKey> {
        self.current
    }
}
