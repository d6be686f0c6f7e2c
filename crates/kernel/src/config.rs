use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors from loading a [`WorldConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tunables for the world model. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    pub obstacle_capacity: usize,
    pub building_capacity: usize,
    pub structure_capacity: usize,
    pub decal_capacity: usize,
    /// Ticks between integrity scans.
    pub integrity_interval: u64,
    /// Spacing of the ground grid, world units.
    pub grid_size: f32,
    /// Seconds a ceiling stays "seen" after the viewer leaves it.
    pub ceiling_vision_hold: f32,
    /// Obstacle alpha change per second while fading in or out.
    pub obstacle_fade_rate: f32,
    /// Alpha floors of the default integrity policy.
    pub particle_alpha_floor: f32,
    pub obstacle_alpha_floor: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            obstacle_capacity: 2048,
            building_capacity: 256,
            structure_capacity: 64,
            decal_capacity: 512,
            integrity_interval: 180,
            grid_size: 16.0,
            ceiling_vision_hold: 0.1,
            obstacle_fade_rate: 4.0,
            particle_alpha_floor: 0.5,
            obstacle_alpha_floor: 0.5,
        }
    }
}

impl WorldConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = WorldConfig::default();
        assert_eq!(config.integrity_interval, 180);
        assert_eq!(config.grid_size, 16.0);
        assert_eq!(config.building_capacity, 256);
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = WorldConfig::from_json(r#"{"building_capacity": 8}"#).unwrap();
        assert_eq!(config.building_capacity, 8);
        assert_eq!(config.integrity_interval, 180);
    }

    #[test]
    fn load_from_file() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        write!(tmp, r#"{{"integrity_interval": 60, "grid_size": 32.0}}"#).unwrap();
        let config = WorldConfig::load(tmp.path()).unwrap();
        assert_eq!(config.integrity_interval, 60);
        assert_eq!(config.grid_size, 32.0);
    }

    #[test]
    fn bad_json_is_an_error() {
        assert!(matches!(
            WorldConfig::from_json("{not json"),
            Err(ConfigError::Json(_))
        ));
    }
}
