use isleworld_common::{Color, SurfaceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::DefsError;

/// Ground colours of a biome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Palette {
    pub background: Color,
    pub water: Color,
    pub water_ripple: Color,
    pub beach: Color,
    pub riverbank: Color,
    pub grass: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiomeSound {
    /// Surface reported for grass that lies on a river bank.
    pub river_shore: SurfaceKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BiomeParticles {
    /// Ambient emitter that follows the camera, if the biome has one.
    pub camera: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Biome {
    pub colors: Palette,
    pub sound: BiomeSound,
    #[serde(default)]
    pub particles: BiomeParticles,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameMode {
    pub faction_mode: bool,
    pub perk_mode: bool,
    pub turkey_mode: bool,
}

/// Static definition of a map, looked up by the name in the load message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapDef {
    pub name: String,
    pub biome: Biome,
    #[serde(default)]
    pub game_mode: GameMode,
}

/// Registry of map definitions keyed by name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MapDefs {
    maps: BTreeMap<String, MapDef>,
}

impl MapDefs {
    pub fn new() -> Self {
        Self::default()
    }

    /// The maps every build knows about.
    pub fn builtin() -> Self {
        let main_palette = Palette {
            background: Color(0x20536e),
            water: Color(0x3282ab),
            water_ripple: Color(0xb3f0ff),
            beach: Color(0xcdb35b),
            riverbank: Color(0x905e24),
            grass: Color(0x80af49),
        };
        let main = MapDef {
            name: "main".into(),
            biome: Biome {
                colors: main_palette.clone(),
                sound: BiomeSound {
                    river_shore: SurfaceKind::Sand,
                },
                particles: BiomeParticles::default(),
            },
            game_mode: GameMode::default(),
        };
        let spring = MapDef {
            name: "main_spring".into(),
            biome: Biome {
                colors: Palette {
                    grass: Color(0x6ea634),
                    riverbank: Color(0x7c5a2f),
                    ..main_palette.clone()
                },
                sound: BiomeSound {
                    river_shore: SurfaceKind::StoneStep,
                },
                particles: BiomeParticles {
                    camera: Some("falling_leaf_spring".into()),
                },
            },
            game_mode: GameMode::default(),
        };
        let desert = MapDef {
            name: "desert".into(),
            biome: Biome {
                colors: Palette {
                    background: Color(0x6e4f20),
                    water: Color(0x4b8ab0),
                    water_ripple: Color(0xa9dff2),
                    beach: Color(0xd8b36b),
                    riverbank: Color(0xa36a2c),
                    grass: Color(0xdbae5f),
                },
                sound: BiomeSound {
                    river_shore: SurfaceKind::Sand,
                },
                particles: BiomeParticles::default(),
            },
            game_mode: GameMode::default(),
        };
        let faction = MapDef {
            name: "faction".into(),
            biome: main.biome.clone(),
            game_mode: GameMode {
                faction_mode: true,
                ..GameMode::default()
            },
        };

        let mut defs = Self::new();
        for def in [main, spring, desert, faction] {
            defs.insert(def);
        }
        defs
    }

    /// Add or replace a definition under its own name.
    pub fn insert(&mut self, def: MapDef) {
        self.maps.insert(def.name.clone(), def);
    }

    /// Look up a map by name. An unknown name is fatal for map load.
    pub fn get(&self, name: &str) -> Result<&MapDef, DefsError> {
        self.maps
            .get(name)
            .ok_or_else(|| DefsError::UnknownMap(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.maps.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.maps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.is_empty()
    }

    /// Parse a JSON array of map definitions.
    pub fn from_json(json: &str) -> Result<Self, DefsError> {
        let list: Vec<MapDef> = serde_json::from_str(json)?;
        let mut defs = Self::new();
        for def in list {
            defs.insert(def);
        }
        Ok(defs)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefsError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let defs = Self::from_json(&data)?;
        tracing::debug!(path = %path.as_ref().display(), maps = defs.len(), "loaded map defs");
        Ok(defs)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DefsError> {
        let list: Vec<&MapDef> = self.maps.values().collect();
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &list)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_has_main_maps() {
        let defs = MapDefs::builtin();
        assert!(defs.get("main").is_ok());
        let spring = defs.get("main_spring").unwrap();
        assert_eq!(spring.biome.sound.river_shore, SurfaceKind::StoneStep);
        assert!(defs.get("faction").unwrap().game_mode.faction_mode);
    }

    #[test]
    fn unknown_map_is_an_error() {
        let defs = MapDefs::builtin();
        match defs.get("atlantis") {
            Err(DefsError::UnknownMap(name)) => assert_eq!(name, "atlantis"),
            other => panic!("expected UnknownMap, got {other:?}"),
        }
    }

    #[test]
    fn save_and_load() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let defs = MapDefs::builtin();
        defs.save(tmp.path()).unwrap();

        let loaded = MapDefs::load(tmp.path()).unwrap();
        assert_eq!(loaded.len(), defs.len());
        assert_eq!(loaded.get("desert").unwrap(), defs.get("desert").unwrap());
    }

    #[test]
    fn game_mode_defaults_when_missing() {
        let json = r#"[{
            "name": "tiny",
            "biome": {
                "colors": {"background": 1, "water": 2, "water_ripple": 3,
                           "beach": 4, "riverbank": 5, "grass": 6},
                "sound": {"river_shore": "stone"}
            }
        }]"#;
        let defs = MapDefs::from_json(json).unwrap();
        let tiny = defs.get("tiny").unwrap();
        assert_eq!(tiny.game_mode, GameMode::default());
        assert!(tiny.biome.particles.camera.is_none());
        assert_eq!(tiny.biome.sound.river_shore, SurfaceKind::Stone);
    }
}
