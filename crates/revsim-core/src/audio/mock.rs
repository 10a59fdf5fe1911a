//! Recording voice for tests

use crate::types::SoundKey;

use super::backend::Voice;

/// What a [`MockVoice`] was asked to do, in order
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceEvent {
    Play(SoundKey, bool),
    Stop,
    Gain(f32),
}

/// A voice that records every command and lets tests script busy-ness.
///
/// `play` marks the voice busy; a one-shot stays busy until the test
/// calls [`MockVoice::finish_one_shot`], standing in for the clip
/// running out on real hardware.
#[derive(Debug, Default)]
pub struct MockVoice {
    pub events: Vec<VoiceEvent>,
    pub current: Option<SoundKey>,
    pub looping: bool,
    pub busy: bool,
    pub gain: f32,
}

impl MockVoice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate a one-shot clip reaching its end
    pub fn finish_one_shot(&mut self) {
        if !self.looping {
            self.busy = false;
            self.current = None;
        }
    }

    /// Count of Play events for `key`
    pub fn play_count(&self, key: SoundKey) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, VoiceEvent::Play(k, _) if *k == key))
            .count()
    }
}

impl Voice for MockVoice {
    fn play(&mut self, key: SoundKey, looping: bool) {
        self.events.push(VoiceEvent::Play(key, looping));
        self.current = Some(key);
        self.looping = looping;
        self.busy = true;
    }

    fn stop(&mut self) {
        self.events.push(VoiceEvent::Stop);
        self.current = None;
        self.busy = false;
    }

    fn set_gain(&mut self, gain: f32) {
        self.events.push(VoiceEvent::Gain(gain));
        self.gain = gain;
    }

    fn is_busy(&self) -> bool {
        self.busy
    }

    fn current(&self) -> Option<SoundKey> {
        self.current
    }
}
