//! Common types for Revsim
//!
//! This module contains the fundamental identifiers shared between the
//! engine model, the audio director, and the platform adapters.

/// Simulation time in seconds.
///
/// The core never reads a wall clock; the frontend advances time by
/// passing `dt` into [`crate::engine::EngineModel::update`].
pub type Seconds = f64;

/// Number of mixer voices the platform backend provides
/// (loop A, loop B, starter/shutdown, burst/pop)
pub const NUM_VOICES: usize = 4;

/// Identifier for every clip the simulator can play.
///
/// A closed enumeration instead of string keys: sound-selection logic
/// matches exhaustively, so "key not found" is not a runtime concern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKey {
    /// Starter motor one-shot, played while entering Idle
    Starter,
    /// Spin-down one-shot, played while shutting off
    Shutdown,
    /// Idle loop
    Idle,
    /// Low-RPM loop
    LowRpm,
    /// Mid-RPM loop
    MidRpm,
    /// High-RPM loop
    HighRpm,
    /// Sustained full-throttle ambient loop
    Cruise,
    /// One-shot for a quick throttle flick up
    AccelBurst,
    /// Exhaust pop one-shot for a quick throttle drop
    DecelPop,
}

impl SoundKey {
    /// All keys in canonical order
    pub const ALL: [SoundKey; 9] = [
        SoundKey::Starter,
        SoundKey::Shutdown,
        SoundKey::Idle,
        SoundKey::LowRpm,
        SoundKey::MidRpm,
        SoundKey::HighRpm,
        SoundKey::Cruise,
        SoundKey::AccelBurst,
        SoundKey::DecelPop,
    ];

    /// Short display name
    pub fn name(&self) -> &'static str {
        match self {
            SoundKey::Starter => "starter",
            SoundKey::Shutdown => "shutdown",
            SoundKey::Idle => "idle",
            SoundKey::LowRpm => "low_rpm",
            SoundKey::MidRpm => "mid_rpm",
            SoundKey::HighRpm => "high_rpm",
            SoundKey::Cruise => "cruise",
            SoundKey::AccelBurst => "accel_burst",
            SoundKey::DecelPop => "decel_pop",
        }
    }

    /// Canonical clip file name inside the sounds directory
    pub fn file_name(&self) -> &'static str {
        match self {
            SoundKey::Starter => "engine_starter.wav",
            SoundKey::Shutdown => "engine_shutdown.wav",
            SoundKey::Idle => "engine_idle_loop.wav",
            SoundKey::LowRpm => "engine_low_rpm_loop.wav",
            SoundKey::MidRpm => "engine_mid_rpm_loop.wav",
            SoundKey::HighRpm => "engine_high_rpm_loop.wav",
            SoundKey::Cruise => "cruise.wav",
            SoundKey::AccelBurst => "quick_accel_burst.wav",
            SoundKey::DecelPop => "decel_pop1.wav",
        }
    }

    /// Whether this key names an engine loop (as opposed to a one-shot)
    pub fn is_loop(&self) -> bool {
        matches!(
            self,
            SoundKey::Idle
                | SoundKey::LowRpm
                | SoundKey::MidRpm
                | SoundKey::HighRpm
                | SoundKey::Cruise
        )
    }
}

impl std::fmt::Display for SoundKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Engine lifecycle phase. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnginePhase {
    /// Engine off, silent
    #[default]
    Off,
    /// Starter clip playing, RPM ramping to idle
    Starting,
    /// Idling with the throttle closed
    Idle,
    /// Throttle open, RPM tracking the throttle curve
    Running,
    /// Shutdown clip playing, RPM decaying to zero
    ShuttingDown,
}

impl EnginePhase {
    /// Human-readable label for display
    pub fn label(&self) -> &'static str {
        match self {
            EnginePhase::Off => "OFF",
            EnginePhase::Starting => "STARTING",
            EnginePhase::Idle => "IDLE",
            EnginePhase::Running => "RUNNING",
            EnginePhase::ShuttingDown => "SHUTTING DOWN",
        }
    }

    /// Whether the engine is producing a loop sound in this phase
    pub fn is_audible(&self) -> bool {
        matches!(self, EnginePhase::Idle | EnginePhase::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sound_key_loops() {
        assert!(SoundKey::Idle.is_loop());
        assert!(SoundKey::Cruise.is_loop());
        assert!(!SoundKey::Starter.is_loop());
        assert!(!SoundKey::DecelPop.is_loop());
    }

    #[test]
    fn test_all_keys_have_distinct_files() {
        for (i, a) in SoundKey::ALL.iter().enumerate() {
            for b in &SoundKey::ALL[i + 1..] {
                assert_ne!(a.file_name(), b.file_name());
            }
        }
    }
}
