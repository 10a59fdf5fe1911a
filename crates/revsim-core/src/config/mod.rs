//! Simulation tuning configuration
//!
//! All thresholds, rates, and durations the engine model and audio
//! director consume. The whole tree is serde-enabled so it can live in
//! the player's YAML config; defaults reproduce the tuning the clip set
//! was calibrated against. There is no ambient/global configuration —
//! an [`EngineConfig`] value is passed into the constructors that need it.

mod io;

pub use io::{load_config, save_config};

use serde::{Deserialize, Serialize};

use crate::types::SoundKey;

/// RPM bounds and integration rates
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpmConfig {
    /// Absolute floor while Running
    pub min: f64,
    /// Absolute ceiling
    pub max: f64,
    /// Idle speed; floor while Idle and the snap target on idle return
    pub idle: f64,
    /// RPM per second while rising toward target
    pub accel_rate: f64,
    /// RPM per second while falling toward target
    pub decel_rate: f64,
    /// RPM per second while coasting back to idle with the throttle closed
    pub idle_return_rate: f64,
}

impl Default for RpmConfig {
    fn default() -> Self {
        Self {
            min: 800.0,
            max: 7000.0,
            idle: 900.0,
            accel_rate: 7000.0,
            decel_rate: 6000.0,
            idle_return_rate: 1500.0,
        }
    }
}

/// RPM bands for loop selection, with tunable hysteresis.
///
/// Bands overlap on purpose; the pads and hold factors keep the
/// selected loop stable near band edges. The hold factors are
/// calibration knobs, not load-bearing constants — adjust them against
/// the actual clip transition points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BandConfig {
    /// Idle band (lower, upper)
    pub idle: (f64, f64),
    /// Low-RPM band
    pub low: (f64, f64),
    /// Mid-RPM band
    pub mid: (f64, f64),
    /// High-RPM band
    pub high: (f64, f64),
    /// Added to the low band's lower edge before leaving idle
    pub idle_edge_pad: f64,
    /// Subtracted from the low band's upper edge before entering mid
    pub low_edge_pad: f64,
    /// Subtracted from the mid band's upper edge before entering high
    pub mid_edge_pad: f64,
    /// Scale (<1) on the anchor edge widening a hold window downward
    pub hold_lower: f64,
    /// Scale (>1) extending a hold past the next band's lower edge
    pub hold_upper: f64,
    /// Extra slack below the low band while holding the low loop
    pub low_hold_floor: f64,
}

impl Default for BandConfig {
    fn default() -> Self {
        Self {
            idle: (800.0, 1200.0),
            low: (1000.0, 2800.0),
            mid: (2500.0, 4800.0),
            high: (4500.0, 7000.0),
            idle_edge_pad: 50.0,
            low_edge_pad: 100.0,
            mid_edge_pad: 150.0,
            hold_lower: 0.95,
            hold_upper: 1.05,
            low_hold_floor: 0.9,
        }
    }
}

/// Throttle jitter tolerances
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Below this the throttle is treated as closed
    pub effectively_zero: f64,
    /// Above this the driver is clearly back on the throttle
    pub significantly_open: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            effectively_zero: 0.05,
            significantly_open: 0.10,
        }
    }
}

/// Accel-burst ("flick up") gesture tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccelBurstConfig {
    pub enabled: bool,
    /// Rolling throttle-history window in seconds
    pub history_window: f64,
    /// How far back a low sample may be to count as the flick start
    pub flick_window: f64,
    /// New throttle must reach at least this
    pub min_end_throttle: f64,
    /// The old sample must have been at or below this
    pub max_start_throttle: f64,
    /// Minimum jump between the old sample and the new throttle
    pub min_jump: f64,
    /// SFX cooldown in seconds
    pub cooldown: f64,
    /// Effect window = burst clip duration times this
    pub effect_duration_multiplier: f64,
    /// Scales the SFX volume for this clip
    pub volume_multiplier: f64,
}

impl Default for AccelBurstConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            history_window: 0.3,
            flick_window: 0.25,
            min_end_throttle: 0.7,
            max_start_throttle: 0.3,
            min_jump: 0.45,
            cooldown: 0.3,
            effect_duration_multiplier: 0.85,
            volume_multiplier: 1.15,
        }
    }
}

/// Decel-pop ("flick down") gesture tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DecelPopConfig {
    pub enabled: bool,
    /// Throttle at or above this latches the "was high" precondition
    pub high_threshold: f64,
    /// Crossing down to at or below this completes the drop
    pub low_threshold: f64,
    /// Rising back above low_threshold + this cancels an armed gesture
    pub cancel_hysteresis: f64,
    /// Maximum time between the high latch and the drop
    pub max_flick_duration: f64,
    /// Minimum throttle drop size
    pub min_drop: f64,
    /// How long after arming the RPM condition may still fire the pop
    pub rpm_check_window: f64,
    /// RPM must exceed this when the gesture is consumed
    pub rpm_threshold: f64,
    /// Probability the pop actually plays (1.0 = deterministic)
    pub chance: f64,
    /// SFX cooldown in seconds
    pub cooldown: f64,
    /// Length of the post-pop linger window
    pub linger_duration: f64,
    /// Multiplier (<1) on the RPM fall rates while lingering
    pub fall_rate_modifier: f64,
    /// Scales the SFX volume for this clip
    pub volume_multiplier: f64,
}

impl Default for DecelPopConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            high_threshold: 0.7,
            low_threshold: 0.15,
            cancel_hysteresis: 0.05,
            max_flick_duration: 0.5,
            min_drop: 0.5,
            rpm_check_window: 1.0,
            rpm_threshold: 1500.0,
            chance: 0.75,
            cooldown: 0.2,
            linger_duration: 4.8,
            fall_rate_modifier: 0.45,
            volume_multiplier: 0.7,
        }
    }
}

/// Cruise-mode tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CruiseConfig {
    pub enabled: bool,
    /// Throttle at or above this starts the sustain timer
    pub enter_threshold: f64,
    /// Throttle below this exits cruise
    pub maintain_threshold: f64,
    /// RPM must be at or above this for cruise
    pub rpm_threshold: f64,
    /// Seconds the enter conditions must hold on the high_rpm loop
    pub sustain: f64,
}

impl Default for CruiseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            enter_threshold: 0.98,
            maintain_threshold: 0.95,
            rpm_threshold: 6850.0,
            sustain: 8.5,
        }
    }
}

/// Playback levels and crossfade timing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Gain for the engine loop voices
    pub engine_volume: f32,
    /// Base gain for one-shot effects
    pub sfx_volume: f32,
    /// Loop crossfade duration in seconds
    pub crossfade_duration: f64,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            engine_volume: 0.7,
            sfx_volume: 0.8,
            crossfade_duration: 0.45,
        }
    }
}

/// Approximate clip lengths in seconds.
///
/// Used only for timing decisions (starter ramp, effect windows,
/// shutdown timeout) — never for decoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClipDurations {
    pub starter: f64,
    pub shutdown: f64,
    pub idle: f64,
    pub low_rpm: f64,
    pub mid_rpm: f64,
    pub high_rpm: f64,
    pub cruise: f64,
    pub accel_burst: f64,
    pub decel_pop: f64,
}

impl Default for ClipDurations {
    fn default() -> Self {
        Self {
            starter: 5.37,
            shutdown: 5.37,
            idle: 9.91,
            low_rpm: 5.14,
            mid_rpm: 10.38,
            high_rpm: 10.64,
            cruise: 21.0,
            accel_burst: 3.57,
            decel_pop: 6.74,
        }
    }
}

impl ClipDurations {
    /// Duration estimate for a key
    pub fn get(&self, key: SoundKey) -> f64 {
        match key {
            SoundKey::Starter => self.starter,
            SoundKey::Shutdown => self.shutdown,
            SoundKey::Idle => self.idle,
            SoundKey::LowRpm => self.low_rpm,
            SoundKey::MidRpm => self.mid_rpm,
            SoundKey::HighRpm => self.high_rpm,
            SoundKey::Cruise => self.cruise,
            SoundKey::AccelBurst => self.accel_burst,
            SoundKey::DecelPop => self.decel_pop,
        }
    }
}

/// Root tuning tree for the engine model and audio director
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rpm: RpmConfig,
    pub bands: BandConfig,
    pub throttle: ThrottleConfig,
    pub accel_burst: AccelBurstConfig,
    pub decel_pop: DecelPopConfig,
    pub cruise: CruiseConfig,
    pub levels: LevelConfig,
    pub durations: ClipDurations,
}

impl EngineConfig {
    /// Hard deadline for leaving the Starting phase
    pub fn starter_timeout(&self) -> f64 {
        self.durations.starter + 0.5
    }

    /// Hard deadline for leaving the ShuttingDown phase
    pub fn shutdown_timeout(&self) -> f64 {
        self.durations.shutdown + 2.0
    }
}
