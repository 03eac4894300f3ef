//! Encoder configuration
//!
//! [`EncodeOptions`] describes one input stream and the output requested
//! from the backend. [`AppConfig`] persists the defaults used when the input
//! turns out to be headerless PCM (`<config dir>/config.toml`).

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::constants::*;
use crate::error::ConfigError;

/// Options for a single encode run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EncodeOptions {
    /// Input samples are big-endian
    pub in_big_endian: bool,
    /// Input sample rate in Hz
    pub in_sample_rate: u32,
    /// Input channel count (1 or 2)
    pub in_channels: u16,
    /// Bits per input sample (only 16 is supported)
    pub in_bits_per_sample: u16,
    /// Output sample rate in Hz, 0 inherits the input rate
    pub out_sample_rate: u32,
    /// Output channel count, 0 inherits the input channel count
    pub out_channels: u16,
    /// 0 is the highest quality, 9 the lowest
    pub out_quality: u8,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            in_big_endian: false,
            in_sample_rate: DEFAULT_SAMPLE_RATE,
            in_channels: DEFAULT_CHANNELS,
            in_bits_per_sample: BITS_PER_SAMPLE,
            out_sample_rate: 0,
            out_channels: 0,
            out_quality: BEST_QUALITY,
        }
    }
}

impl EncodeOptions {
    /// Check every field against the supported ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.in_sample_rate == 0 {
            return Err(ConfigError::InvalidSampleRate(self.in_sample_rate));
        }
        if !matches!(self.in_channels, 1 | 2) {
            return Err(ConfigError::UnsupportedChannels(self.in_channels));
        }
        if self.in_bits_per_sample != BITS_PER_SAMPLE {
            return Err(ConfigError::UnsupportedBitsPerSample(self.in_bits_per_sample));
        }
        if self.out_channels > 2 {
            return Err(ConfigError::UnsupportedOutputChannels(self.out_channels));
        }
        if self.out_quality > WORST_QUALITY {
            return Err(ConfigError::InvalidQuality(self.out_quality));
        }
        Ok(())
    }

    /// Copy with the "inherit input" zeroes replaced by input values
    pub fn resolved(&self) -> Self {
        let mut resolved = *self;
        if resolved.out_sample_rate == 0 {
            resolved.out_sample_rate = resolved.in_sample_rate;
        }
        if resolved.out_channels == 0 {
            resolved.out_channels = resolved.in_channels;
        }
        resolved
    }

    /// Whether both inherit-defaults have been applied
    pub fn is_resolved(&self) -> bool {
        self.out_sample_rate > 0 && self.out_channels > 0
    }

    /// Bytes of input PCM per sample frame (all channels)
    pub fn block_align(&self) -> usize {
        usize::from(self.in_channels) * usize::from(self.in_bits_per_sample / 8)
    }
}

/// Persistent application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Options assumed for input without a WAV header
    #[serde(default)]
    pub pcm: EncodeOptions,
}

impl AppConfig {
    /// Load from the platform config directory, falling back to defaults
    pub fn load() -> Self {
        let Some(path) = default_config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        match Self::load_from(&path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Ignoring config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load from an explicit TOML file
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    /// Write as TOML, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        let io_err = |source| ConfigError::File {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(path, content).map_err(io_err)
    }
}

/// Platform config directory for this tool
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mp3-stream-encoder")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// `<config dir>/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}
