//! Startup clip loading
//!
//! Reads the WAV clip set into memory once at startup. This is the only
//! place the repository touches sample data on disk; everything past
//! here works with ready-to-play [`Clip`] handles.
//!
//! A missing or unreadable file is a degradation, not a failure: the
//! key is simply absent from the bank and any request to play it
//! becomes a silent no-op.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::types::SoundKey;

use super::error::{AudioError, AudioResult};

/// A decoded clip: interleaved stereo f32 frames
#[derive(Debug)]
pub struct Clip {
    /// Which key this clip belongs to
    pub key: SoundKey,
    /// Interleaved stereo samples (left, right, left, right, ...)
    pub frames: Vec<f32>,
    /// Source file sample rate
    pub sample_rate: u32,
}

impl Clip {
    /// Number of stereo frames
    pub fn len_frames(&self) -> usize {
        self.frames.len() / 2
    }

    /// Clip duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.len_frames() as f64 / self.sample_rate as f64
    }
}

/// All loaded clips, keyed by [`SoundKey`]
#[derive(Debug)]
pub struct ClipBank {
    clips: HashMap<SoundKey, Arc<Clip>>,
    /// Sample rate shared by the loaded clips (rate of the first clip)
    sample_rate: u32,
}

impl ClipBank {
    /// Load every known clip from `dir` using the canonical file names.
    ///
    /// Fails only if the directory itself is missing; individual clip
    /// failures are logged and tolerated.
    pub fn load_dir(dir: &Path) -> AudioResult<Self> {
        if !dir.is_dir() {
            return Err(AudioError::SoundsDirMissing(dir.display().to_string()));
        }

        let mut clips = HashMap::new();
        let mut sample_rate = 0u32;

        for key in SoundKey::ALL {
            let path = dir.join(key.file_name());
            match load_wav(key, &path) {
                Ok(clip) => {
                    if sample_rate == 0 {
                        sample_rate = clip.sample_rate;
                    } else if clip.sample_rate != sample_rate {
                        // The mixer plays frames 1:1; mismatched rates will
                        // sound pitch-shifted until the clip is re-exported
                        log::warn!(
                            "Clip {} is {}Hz but the bank is {}Hz",
                            key,
                            clip.sample_rate,
                            sample_rate
                        );
                    }
                    log::info!("Loaded clip {} ({:.2}s)", key, clip.duration_secs());
                    clips.insert(key, Arc::new(clip));
                }
                Err(e) => {
                    log::warn!("Clip {} unavailable: {}", key, e);
                }
            }
        }

        if sample_rate == 0 {
            // Nothing loaded at all; pick a sane stream rate anyway
            sample_rate = 44100;
            log::warn!("No clips loaded from {:?}; running silent", dir);
        }

        Ok(Self { clips, sample_rate })
    }

    /// An empty bank (UI-only mode)
    pub fn empty() -> Self {
        Self {
            clips: HashMap::new(),
            sample_rate: 44100,
        }
    }

    /// Get a clip by key
    pub fn get(&self, key: SoundKey) -> Option<Arc<Clip>> {
        self.clips.get(&key).cloned()
    }

    /// Whether a clip loaded for this key
    pub fn contains(&self, key: SoundKey) -> bool {
        self.clips.contains_key(&key)
    }

    /// Sample rate the output stream should run at
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of loaded clips
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    /// True if no clips loaded
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }
}

/// Decode one WAV file to interleaved stereo f32.
///
/// Mono sources are duplicated into both channels; sources with more
/// than two channels keep the first two.
fn load_wav(key: SoundKey, path: &Path) -> AudioResult<Clip> {
    let mut reader = hound::WavReader::open(path).map_err(|e| AudioError::ClipLoadError {
        key: key.name(),
        reason: e.to_string(),
    })?;

    let spec = reader.spec();
    let channels = spec.channels as usize;

    let samples: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader
            .samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| AudioError::ClipLoadError {
                key: key.name(),
                reason: e.to_string(),
            })?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<_, _>>()
                .map_err(|e| AudioError::ClipLoadError {
                    key: key.name(),
                    reason: e.to_string(),
                })?
        }
    };

    let mut frames = Vec::with_capacity(samples.len() / channels * 2);
    for frame in samples.chunks_exact(channels) {
        match channels {
            1 => {
                frames.push(frame[0]);
                frames.push(frame[0]);
            }
            _ => {
                frames.push(frame[0]);
                frames.push(frame[1]);
            }
        }
    }

    Ok(Clip {
        key,
        frames,
        sample_rate: spec.sample_rate,
    })
}
