use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading an [`EngineConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("buffer side length must be at least 2, got {0}")]
    SideLengthTooSmall(usize),
    #[error("buffer side length {0} makes the arenas larger than the address space")]
    SideLengthTooLarge(usize),
    #[error("max entity count must be non-zero")]
    NoEntities,
}

/// Startup configuration for the memory arenas and the component tables.
///
/// Every field has a default so partial YAML files are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Side length of the square texture the GPU instance buffer doubles as.
    pub buffer_side_length: usize,
    /// Upper bound on instances per component type. Every class-shared
    /// buffer view is pre-sized for this many rows.
    pub max_entity_count: u32,
    /// Byte order used by accessors when encoding and decoding values.
    pub little_endian: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            buffer_side_length: 1 << 10,
            max_entity_count: 100_000,
            little_endian: true,
        }
    }
}

impl EngineConfig {
    /// Parse a config from YAML text and validate it.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a YAML config file from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_side_length < 2 {
            return Err(ConfigError::SideLengthTooSmall(self.buffer_side_length));
        }
        // Each arena holds side * side texels of 4 channels x 8 bytes.
        let side = self.buffer_side_length;
        if side.checked_mul(side).and_then(|n| n.checked_mul(32)).is_none() {
            return Err(ConfigError::SideLengthTooLarge(side));
        }
        if self.max_entity_count == 0 {
            return Err(ConfigError::NoEntities);
        }
        Ok(())
    }
}
