//! Audio backend error types

use thiserror::Error;

/// Errors that can occur while bringing up audio or loading clips.
///
/// These are startup-time faults surfaced to the adapter layer; the
/// simulation core itself never produces them. Missing clips degrade
/// to silence instead of erroring.
#[derive(Error, Debug)]
pub enum AudioError {
    /// No audio output devices available
    #[error("No audio output devices found")]
    NoDevices,

    /// Failed to get default device
    #[error("Failed to get default audio device: {0}")]
    NoDefaultDevice(String),

    /// Failed to get device configuration
    #[error("Failed to get device config: {0}")]
    ConfigError(String),

    /// Failed to build audio stream
    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    /// Failed to start/play stream
    #[error("Failed to start audio stream: {0}")]
    StreamPlayError(String),

    /// Sounds directory missing entirely
    #[error("Sounds directory not found: {0}")]
    SoundsDirMissing(String),

    /// A clip file failed to decode
    #[error("Failed to load clip {key}: {reason}")]
    ClipLoadError { key: &'static str, reason: String },
}

/// Result type for audio operations
pub type AudioResult<T> = Result<T, AudioError>;
