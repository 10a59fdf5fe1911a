//! CPAL audio backend
//!
//! One output stream running a small software mixer over the fixed
//! voice set (loop A, loop B, starter/shutdown, burst/pop). Control
//! code talks to [`CpalVoiceHandle`]s; the audio callback reads the
//! shared voice state and sums frames.
//!
//! Voice state crosses the thread boundary through relaxed atomics
//! (gain bits, playing flag, playhead) plus a mutex that is only taken
//! when a clip is swapped in. The callback uses `try_lock` on that
//! mutex, so a swap in progress costs one buffer of silence on that
//! voice, never a blocked audio thread.

use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, Stream, StreamConfig};

use crate::types::{SoundKey, NUM_VOICES};

use super::backend::Voice;
use super::clip::{Clip, ClipBank};
use super::error::{AudioError, AudioResult};

/// Per-voice state shared with the audio callback
struct VoiceShared {
    /// Clip being played; swapped under the mutex, read with try_lock
    clip: Mutex<Option<Arc<Clip>>>,
    /// Playhead in frames
    position: AtomicUsize,
    /// Whether the voice should produce sound
    playing: AtomicBool,
    /// Whether to wrap at the clip end
    looping: AtomicBool,
    /// Gain as f32 bits
    gain_bits: AtomicU32,
}

impl VoiceShared {
    fn new() -> Self {
        Self {
            clip: Mutex::new(None),
            position: AtomicUsize::new(0),
            playing: AtomicBool::new(false),
            looping: AtomicBool::new(false),
            gain_bits: AtomicU32::new(1.0f32.to_bits()),
        }
    }

    fn gain(&self) -> f32 {
        f32::from_bits(self.gain_bits.load(Ordering::Relaxed))
    }
}

/// Control-side handle to one mixer voice
pub struct CpalVoiceHandle {
    shared: Arc<VoiceShared>,
    bank: Arc<ClipBank>,
    /// Key last handed to `play`; cleared on stop
    key: Option<SoundKey>,
}

impl Voice for CpalVoiceHandle {
    fn play(&mut self, key: SoundKey, looping: bool) {
        let Some(clip) = self.bank.get(key) else {
            // Missing asset: degrade to silence, keep the voice idle
            log::debug!("play {}: clip not loaded, skipping", key);
            self.stop();
            return;
        };

        {
            let mut slot = self.shared.clip.lock().unwrap();
            *slot = Some(clip);
        }
        self.shared.position.store(0, Ordering::Relaxed);
        self.shared.looping.store(looping, Ordering::Relaxed);
        self.shared.playing.store(true, Ordering::Relaxed);
        self.key = Some(key);
    }

    fn stop(&mut self) {
        self.shared.playing.store(false, Ordering::Relaxed);
        self.shared.position.store(0, Ordering::Relaxed);
        self.key = None;
    }

    fn set_gain(&mut self, gain: f32) {
        self.shared
            .gain_bits
            .store(gain.clamp(0.0, 1.0).to_bits(), Ordering::Relaxed);
    }

    fn is_busy(&self) -> bool {
        self.shared.playing.load(Ordering::Relaxed)
    }

    fn current(&self) -> Option<SoundKey> {
        if self.is_busy() {
            self.key
        } else {
            None
        }
    }
}

/// Keeps the output stream alive. Drop this to stop audio.
pub struct CpalAudioHandle {
    _stream: Stream,
    sample_rate: u32,
}

impl CpalAudioHandle {
    /// Sample rate of the output stream
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }
}

/// Start the audio system: open the default output device and return
/// the stream handle plus the fixed voice set.
pub fn start_audio_system(
    bank: ClipBank,
) -> AudioResult<(CpalAudioHandle, Vec<CpalVoiceHandle>)> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or(AudioError::NoDevices)?;

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    log::info!("Using audio device: {}", device_name);

    let supported = device
        .default_output_config()
        .map_err(|e| AudioError::ConfigError(e.to_string()))?;

    if supported.sample_format() != SampleFormat::F32 {
        return Err(AudioError::StreamBuildError(format!(
            "device wants {:?}, only f32 output is supported",
            supported.sample_format()
        )));
    }

    let stream_config: StreamConfig = supported.config();
    let channels = stream_config.channels as usize;
    let sample_rate = stream_config.sample_rate.0;

    if bank.sample_rate() != sample_rate {
        log::warn!(
            "Clip bank is {}Hz but the stream runs at {}Hz; clips will play pitch-shifted",
            bank.sample_rate(),
            sample_rate
        );
    }

    log::info!(
        "Audio config: {} channels, {}Hz, {} clips loaded",
        channels,
        sample_rate,
        bank.len()
    );

    let bank = Arc::new(bank);
    let shared: Vec<Arc<VoiceShared>> = (0..NUM_VOICES)
        .map(|_| Arc::new(VoiceShared::new()))
        .collect();

    let handles: Vec<CpalVoiceHandle> = shared
        .iter()
        .map(|s| CpalVoiceHandle {
            shared: Arc::clone(s),
            bank: Arc::clone(&bank),
            key: None,
        })
        .collect();

    let callback_voices = shared;
    let stream = device
        .build_output_stream(
            &stream_config,
            move |data: &mut [f32], _info: &cpal::OutputCallbackInfo| {
                mix_into(data, channels, &callback_voices);
            },
            |err| {
                log::error!("Audio stream error: {}", err);
            },
            None,
        )
        .map_err(|e| AudioError::StreamBuildError(e.to_string()))?;

    stream
        .play()
        .map_err(|e| AudioError::StreamPlayError(e.to_string()))?;

    log::info!("Audio stream started ({} mixer voices)", NUM_VOICES);

    Ok((
        CpalAudioHandle {
            _stream: stream,
            sample_rate,
        },
        handles,
    ))
}

/// Sum all playing voices into the interleaved output buffer
fn mix_into(data: &mut [f32], channels: usize, voices: &[Arc<VoiceShared>]) {
    data.fill(0.0);
    let n_frames = data.len() / channels;

    for voice in voices {
        if !voice.playing.load(Ordering::Relaxed) {
            continue;
        }

        // A control-thread clip swap in progress skips this buffer
        let Ok(slot) = voice.clip.try_lock() else {
            continue;
        };
        let Some(clip) = slot.as_ref() else {
            continue;
        };

        let gain = voice.gain();
        let looping = voice.looping.load(Ordering::Relaxed);
        let total = clip.len_frames();
        if total == 0 {
            voice.playing.store(false, Ordering::Relaxed);
            continue;
        }

        let mut pos = voice.position.load(Ordering::Relaxed);
        for frame in 0..n_frames {
            if pos >= total {
                if looping {
                    pos = 0;
                } else {
                    voice.playing.store(false, Ordering::Relaxed);
                    break;
                }
            }

            let left = clip.frames[pos * 2] * gain;
            let right = clip.frames[pos * 2 + 1] * gain;
            let out = &mut data[frame * channels..(frame + 1) * channels];
            match channels {
                1 => out[0] += 0.5 * (left + right),
                _ => {
                    out[0] += left;
                    out[1] += right;
                }
            }
            pos += 1;
        }
        voice.position.store(pos, Ordering::Relaxed);
    }
}
