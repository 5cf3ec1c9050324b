//! Game configuration
//!
//! One RON file, `stardrift.ron`, holding engine tuning and world generation
//! settings. Every field has a default, so a partial file (or none at all)
//! is fine.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE: &str = "stardrift.ron";

/// Limits for sanity checking loaded values
pub mod limits {
    /// Largest accepted world extent on either axis
    pub const MAX_WORLD_EXTENT: f32 = 10_000_000.0;
    /// Largest accepted planet count
    pub const MAX_PLANETS: usize = 100_000;
    /// Largest accepted background grid (columns * rows)
    pub const MAX_BACKGROUND_TILES: usize = 1_000_000;
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[error("serialize error: {0}")]
    Serialize(#[from] ron::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub engine: EngineConfig,
    pub space: SpaceConfig,
}

/// Scheduler tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Delta ceiling in seconds; a stalled tab resumes with this step
    pub max_delta_seconds: f32,
    /// Weight of the newest sample in the rolling fps average, in (0, 1]
    pub fps_smoothing: f32,
    /// Screen-space border (px) counted as visible
    pub viewport_margin: f32,
    /// Minimum seconds between firings of a cooldown action
    pub action_cooldown_seconds: f64,
    /// Tombstone count that triggers registry compaction
    pub compact_threshold: usize,
    /// Default tracing directive, overridden by RUST_LOG
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_delta_seconds: 0.1,
            fps_smoothing: 0.05,
            viewport_margin: 256.0,
            action_cooldown_seconds: 1.0,
            compact_threshold: 4096,
            log_filter: "info".to_string(),
        }
    }
}

/// World generation settings for the space game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpaceConfig {
    pub planet_amount: usize,
    pub planet_min_size: f32,
    pub planet_max_size: f32,
    /// World spans (0, 0) to `world_size` on both axes
    pub world_size: (f32, f32),
    /// Radians per second
    pub min_rotation_speed: f32,
    pub max_rotation_speed: f32,
    /// Fixed RNG seed; a fresh one is picked per launch when absent
    pub seed: Option<u64>,
    pub background_tile_size: f32,
}

impl Default for SpaceConfig {
    fn default() -> Self {
        Self {
            planet_amount: 1000,
            planet_min_size: 200.0,
            planet_max_size: 500.0,
            world_size: (100_000.0, 100_000.0),
            min_rotation_speed: -0.1,
            max_rotation_speed: 0.1,
            seed: None,
            background_tile_size: 1000.0,
        }
    }
}

fn positive(name: &str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)))
    }
}

impl GameConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.space.validate()
    }

    /// Load and validate a config file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron(&contents)
    }

    pub fn from_ron(s: &str) -> Result<Self, ConfigError> {
        let config: GameConfig = ron::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .indentor("  ".to_string());
        Ok(ron::ser::to_string_pretty(self, pretty)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("max_delta_seconds", self.max_delta_seconds)?;
        if !(self.fps_smoothing > 0.0 && self.fps_smoothing <= 1.0) {
            return Err(ConfigError::Invalid(format!(
                "fps_smoothing must be in (0, 1], got {}",
                self.fps_smoothing
            )));
        }
        if !self.viewport_margin.is_finite() || self.viewport_margin < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "viewport_margin must be non-negative, got {}",
                self.viewport_margin
            )));
        }
        if !self.action_cooldown_seconds.is_finite() || self.action_cooldown_seconds < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "action_cooldown_seconds must be non-negative, got {}",
                self.action_cooldown_seconds
            )));
        }
        Ok(())
    }
}

impl SpaceConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.planet_amount > limits::MAX_PLANETS {
            return Err(ConfigError::Invalid(format!(
                "planet_amount {} exceeds {}",
                self.planet_amount,
                limits::MAX_PLANETS
            )));
        }
        positive("planet_min_size", self.planet_min_size)?;
        positive("planet_max_size", self.planet_max_size)?;
        if self.planet_min_size > self.planet_max_size {
            return Err(ConfigError::Invalid(
                "planet_min_size is larger than planet_max_size".to_string(),
            ));
        }
        for (axis, extent) in [("x", self.world_size.0), ("y", self.world_size.1)] {
            positive(&format!("world_size.{}", axis), extent)?;
            if extent > limits::MAX_WORLD_EXTENT {
                return Err(ConfigError::Invalid(format!("world_size.{} is too large", axis)));
            }
        }
        if !self.min_rotation_speed.is_finite()
            || !self.max_rotation_speed.is_finite()
            || self.min_rotation_speed > self.max_rotation_speed
        {
            return Err(ConfigError::Invalid("rotation speed range is malformed".to_string()));
        }
        positive("background_tile_size", self.background_tile_size)?;
        let (columns, rows) = self.background_grid();
        if columns * rows > limits::MAX_BACKGROUND_TILES as f64 {
            return Err(ConfigError::Invalid(format!(
                "background_tile_size {} gives a {}x{} grid, over {} tiles",
                self.background_tile_size,
                columns,
                rows,
                limits::MAX_BACKGROUND_TILES
            )));
        }
        Ok(())
    }

    /// Background tiles needed to cover the world on each axis
    pub fn background_grid(&self) -> (f64, f64) {
        let tile = f64::from(self.background_tile_size);
        (
            (f64::from(self.world_size.0) / tile).ceil(),
            (f64::from(self.world_size.1) / tile).ceil(),
        )
    }

    /// Center of the world
    pub fn world_center(&self) -> (f32, f32) {
        (self.world_size.0 / 2.0, self.world_size.1 / 2.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = GameConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.action_cooldown_seconds, 1.0);
        assert_eq!(config.space.planet_amount, 1000);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let config = GameConfig::from_ron("(engine: (viewport_margin: 64.0))").unwrap();
        assert_eq!(config.engine.viewport_margin, 64.0);
        assert_eq!(config.engine.max_delta_seconds, 0.1);
        assert_eq!(config.space, SpaceConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameConfig::from_ron("(engine: (fps_smoothing: 0.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_ron("(space: (planet_min_size: 600.0))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_ron("(space: (world_size: (0.0, 100.0)))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_background_grid_is_bounded() {
        let err = GameConfig::from_ron(
            "(space: (background_tile_size: 0.0000001, world_size: (10000000.0, 10000000.0)))",
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let err = GameConfig::from_ron("(space: (background_tile_size: 1.0, world_size: (2000.0, 1000.0)))").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        // 1000 x 1000 tiles is the largest accepted grid
        let config =
            GameConfig::from_ron("(space: (background_tile_size: 10.0, world_size: (10000.0, 10000.0)))").unwrap();
        assert_eq!(config.space.background_grid(), (1000.0, 1000.0));
    }

    #[test]
    fn test_parse_error() {
        let err = GameConfig::from_ron("(engine: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_save_and_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = GameConfig::default();
        config.space.planet_amount = 25;
        config.space.seed = Some(7);
        config.engine.log_filter = "stardrift=debug".to_string();
        config.save(&path).unwrap();

        let loaded = GameConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = GameConfig::load(dir.path().join("nope.ron")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
