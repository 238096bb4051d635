//! Engine configuration.
//!
//! Every budget and visual knob in one serde struct with documented
//! defaults. A config file is optional; a partial JSON file overrides only
//! the fields it names.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Tunables for the cache, scanner and raster builder.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Radius (in tiles) of the round-robin scan window around the viewer.
    pub scan_radius: i32,

    /// Raster rows rebuilt per tick.
    pub rows_per_tick: usize,

    /// Raster rows rebuilt per tick while boost is requested (fast pans).
    pub boost_rows_per_tick: usize,

    /// Completed rows accumulated between display publishes.
    pub publish_every_rows: usize,

    /// Zoom clamp: most zoomed-in blocks-per-pixel.
    pub min_blocks_per_pixel: i32,

    /// Zoom clamp: most zoomed-out blocks-per-pixel.
    pub max_blocks_per_pixel: i32,

    /// Global brightness multiplier applied by the sampler.
    pub brightness: f32,

    /// Blend water samples toward the fixed blue tint.
    pub water_tint: bool,

    /// Ticks between eviction passes over the in-memory tile store.
    /// 0 disables eviction.
    pub evict_every_ticks: u64,

    /// Tiles within this Chebyshev radius of the viewer survive eviction.
    pub keep_radius_tiles: i32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scan_radius: 6,
            rows_per_tick: 16,
            boost_rows_per_tick: 48,
            publish_every_rows: 8,
            min_blocks_per_pixel: 1,
            max_blocks_per_pixel: 8,
            brightness: 1.10,
            water_tint: true,
            evict_every_ticks: 600,
            keep_radius_tiles: 96,
        }
    }
}

impl EngineConfig {
    /// Load from a JSON file; fields absent from the file keep defaults.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: EngineConfig = serde_json::from_str(&text)?;
        Ok(config)
    }
}

/// Configuration load failure.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "config I/O error: {}", e),
            ConfigError::Parse(e) => write!(f, "config parse error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Parse(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.scan_radius, 6);
        assert_eq!(config.min_blocks_per_pixel, 1);
        assert_eq!(config.max_blocks_per_pixel, 8);
        assert!(config.rows_per_tick < config.boost_rows_per_tick);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "rows_per_tick": 4, "scan_radius": 2 }"#).unwrap();
        assert_eq!(config.rows_per_tick, 4);
        assert_eq!(config.scan_radius, 2);
        assert_eq!(config.publish_every_rows, EngineConfig::default().publish_every_rows);
    }

    #[test]
    fn test_round_trip_json() {
        let config = EngineConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        let back: EngineConfig = serde_json::from_str(&text).unwrap();
        assert_eq!(back.rows_per_tick, config.rows_per_tick);
        assert_eq!(back.keep_radius_tiles, config.keep_radius_tiles);
    }
}
