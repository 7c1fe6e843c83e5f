//! User configuration: `~/.stepline/config.yaml`. Every field is optional.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub const CONFIG_DIR: &str = ".stepline";
pub const CONFIG_FILE: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub bpm: u32,
    pub key: String,
    pub scale: String,
    /// Kit directory. `None` uses the built-in kit.
    pub kit: Option<PathBuf>,
    /// Seed for probability and octave draws.
    pub seed: Option<u64>,
    /// Frames rendered per block.
    pub block_size: u32,
    /// How far rendering runs ahead of the device.
    pub lookahead_ms: u32,
    /// Sample rate for offline rendering. Live playback uses the device's.
    pub sample_rate: u32,
    pub beats_per_bar: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bpm: 120,
            key: "C".into(),
            scale: "major".into(),
            kit: None,
            seed: None,
            block_size: 512,
            lookahead_ms: 100,
            sample_rate: 44100,
            beats_per_bar: 4,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(PathBuf, std::io::Error),
    Yaml(PathBuf, serde_yaml::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(path, e) => write!(f, "cannot read {}: {e}", path.display()),
            ConfigError::Yaml(path, e) => write!(f, "malformed config {}: {e}", path.display()),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(_, e) => Some(e),
            ConfigError::Yaml(_, e) => Some(e),
        }
    }
}

/// `~/.stepline/config.yaml`, if there is a home directory.
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(CONFIG_DIR).join(CONFIG_FILE))
}

impl Config {
    /// Load from the default location. No file means defaults.
    pub fn load() -> Result<Self, ConfigError> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load from `path`. A missing file means defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(ConfigError::Io(path.to_path_buf(), e)),
        };
        Self::parse(&content).map_err(|e| ConfigError::Yaml(path.to_path_buf(), e))
    }

    pub fn parse(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }

    /// Frames of render-ahead at `sample_rate`.
    pub fn lookahead_frames(&self, sample_rate: u32) -> u64 {
        self.lookahead_ms as u64 * sample_rate as u64 / 1000
    }
}
