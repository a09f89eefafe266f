// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration.
//!
//! Stored as RON. Every field is optional in the file; missing ones take
//! their default values.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Error while loading or saving a configuration
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// File is not valid RON for this structure
    #[error("Parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Configuration could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version
    #[error("Config version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this build reads
        supported: u32,
    },

    /// Width bounds are inconsistent
    #[error("Invalid node width bounds: min {min} > max {max}")]
    InvalidNodeWidth {
        /// Configured minimum
        min: f32,
        /// Configured maximum
        max: f32,
    },
}

/// Editor-wide settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version
    pub version: u32,
    /// Width of freshly created nodes
    pub default_node_width: f32,
    /// Smallest width a node can be resized to
    pub min_node_width: f32,
    /// Largest width a node can be resized to
    pub max_node_width: f32,
    /// Canvas size in graph units
    pub canvas_size: [f32; 2],
    /// Outline layout boxes when rendering
    pub debug_outline: bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            default_node_width: 120.0,
            min_node_width: 100.0,
            max_node_width: 240.0,
            canvas_size: [4000.0, 4000.0],
            debug_outline: false,
        }
    }
}

impl EditorConfig {
    /// Parse from RON and validate
    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::default().struct_names(true);
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    /// Load from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_ron(&content)?;
        tracing::info!("Loaded editor config from {:?}", path);
        Ok(config)
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        tracing::info!("Saved editor config to {:?}", path);
        Ok(())
    }

    /// Check the settings for consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: self.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }
        if self.min_node_width > self.max_node_width {
            return Err(ConfigError::InvalidNodeWidth {
                min: self.min_node_width,
                max: self.max_node_width,
            });
        }
        Ok(())
    }

    /// Default node width, clamped into the configured bounds
    pub fn initial_node_width(&self) -> f32 {
        self.default_node_width
            .max(self.min_node_width)
            .min(self.max_node_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EditorConfig::default();
        assert_eq!(config.version, CONFIG_FORMAT_VERSION);
        assert_eq!(config.initial_node_width(), 120.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_serialization() {
        let mut config = EditorConfig::default();
        config.max_node_width = 300.0;
        let ron_str = config.to_ron().unwrap();
        let loaded = EditorConfig::from_ron(&ron_str).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_fields_use_defaults() {
        let config = EditorConfig::from_ron("(debug_outline: true)").unwrap();
        assert!(config.debug_outline);
        assert_eq!(config.min_node_width, 100.0);
    }

    #[test]
    fn test_rejects_inconsistent_bounds() {
        let err = EditorConfig::from_ron("(min_node_width: 300.0, max_node_width: 200.0)");
        assert!(matches!(err, Err(ConfigError::InvalidNodeWidth { .. })));
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = EditorConfig::from_ron("(version: 99)");
        assert!(matches!(err, Err(ConfigError::UnsupportedVersion { found: 99, .. })));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("nodeflow-config-{}.ron", uuid::Uuid::new_v4()));
        let config = EditorConfig {
            debug_outline: true,
            ..EditorConfig::default()
        };
        config.save(&path).unwrap();
        let loaded = EditorConfig::load(&path).unwrap();
        let _ = std::fs::remove_file(&path);
        assert_eq!(loaded, config);
    }
}
