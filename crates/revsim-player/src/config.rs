//! Player configuration
//!
//! Stored as YAML in the user's config directory, default
//! `~/.config/revsim/config.yaml`. The engine tuning tree rides along
//! so clip calibration can be adjusted without rebuilding.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use revsim_core::config::EngineConfig;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Directory holding the engine WAV clip set
    pub sounds_dir: PathBuf,
    /// Simulation tuning passed through to the core
    pub engine: EngineConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        let sounds_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("revsim")
            .join("sounds");
        Self {
            sounds_dir,
            engine: EngineConfig::default(),
        }
    }
}

/// Get the default config file path
///
/// Returns: ~/.config/revsim/config.yaml
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
        .join("revsim")
        .join("config.yaml")
}

/// Load the player config, falling back to defaults on a missing or
/// unparseable file.
pub fn load_config(path: &Path) -> PlayerConfig {
    revsim_core::config::load_config(path)
}

/// Save the player config, creating parent directories if needed.
pub fn save_config(config: &PlayerConfig, path: &Path) -> anyhow::Result<()> {
    revsim_core::config::save_config(config, path)
}
