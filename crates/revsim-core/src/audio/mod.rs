//! Audio playback layer
//!
//! The simulation talks to audio through the [`Voice`] trait: a handle
//! to one mixer channel that can play, stop and set gain. Everything
//! above this module is backend-agnostic and runs identically against
//! real hardware, the silent fallback, or a test double.
//!
//! - [`cpal_backend`] opens the default output device and runs a small
//!   software mixer over [`NUM_VOICES`](crate::types::NUM_VOICES)
//!   channels
//! - [`NullVoice`] is the fallback when no audio device is available
//! - [`ClipBank`] loads the WAV clip set once at startup

mod backend;
mod clip;
mod error;
mod null;

mod cpal_backend;

#[cfg(test)]
pub(crate) mod mock;

pub use backend::Voice;
pub use clip::{Clip, ClipBank};
pub use cpal_backend::{start_audio_system, CpalAudioHandle, CpalVoiceHandle};
pub use error::{AudioError, AudioResult};
pub use null::NullVoice;
