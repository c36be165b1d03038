//! Configuration types for layout computation.
//!
//! All types implement [`serde::Deserialize`] with every field defaulted, so a
//! TOML file only needs the values it wants to change:
//!
//! ```toml
//! [layout]
//! rank_dir = "top-to-bottom"
//! node_gap = 40.0
//!
//! [layout.metrics]
//! char_width = 7.0
//! ```

use std::fs;
use std::path::Path;

use log::info;
use serde::Deserialize;

use crate::layout::RankDir;
use crate::measure::TextMetrics;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
}

impl AppConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from an explicit path; a missing file is an error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        info!(path = path.display().to_string(); "Loading configuration");
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Spacing and ordering parameters of the layout engine.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub rank_dir: RankDir,
    /// Minimum horizontal distance between nodes of one layer.
    pub node_gap: f64,
    /// Distance between consecutive layers.
    pub layer_gap: f64,
    /// Space around the whole drawing.
    pub margin: f64,
    /// Down/up barycenter sweep pairs.
    pub sweeps: usize,
    pub align_passes: usize,
    /// Fallback estimate for nodes the renderer has not measured.
    pub metrics: TextMetrics,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            rank_dir: RankDir::BottomToTop,
            node_gap: 60.0,
            layer_gap: 80.0,
            margin: 40.0,
            sweeps: 4,
            align_passes: 4,
            metrics: TextMetrics::default(),
        }
    }
}
