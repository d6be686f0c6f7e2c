use std::sync::Arc;

use glam::Vec2;
use isleworld_common::Transform;
use isleworld_defs::MapDef;
use isleworld_terrain::{GroundPatch, GroundPatchSet, RiverSpec, TerrainModel, TerrainSpec};
use serde::{Deserialize, Serialize};

/// Named location shown on the minimap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub pos: Vec2,
}

/// Static object placement listed in the map message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapObject {
    #[serde(rename = "type")]
    pub type_name: String,
    pub pos: Vec2,
    #[serde(default)]
    pub ori: u8,
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl MapObject {
    pub fn transform(&self) -> Transform {
        Transform {
            pos: self.pos,
            ori: self.ori,
            scale: self.scale,
        }
    }
}

/// The map-load message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMsg {
    pub map_name: String,
    pub seed: u32,
    pub width: f32,
    pub height: f32,
    pub shore_inset: f32,
    pub grass_inset: f32,
    #[serde(default)]
    pub rivers: Vec<RiverSpec>,
    #[serde(default)]
    pub places: Vec<Place>,
    #[serde(default)]
    pub objects: Vec<MapObject>,
    #[serde(default)]
    pub ground_patches: Vec<GroundPatch>,
}

impl MapMsg {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn terrain_spec(&self) -> TerrainSpec {
        TerrainSpec {
            width: self.width,
            height: self.height,
            seed: self.seed,
            shore_inset: self.shore_inset,
            grass_inset: self.grass_inset,
            rivers: self.rivers.clone(),
        }
    }
}

/// Everything derived from a map message. Immutable until the next load;
/// terrain and patches are shared so readers can hold them past a reload.
#[derive(Debug, Clone)]
pub struct LoadedMap {
    pub def: MapDef,
    pub seed: u32,
    pub width: f32,
    pub height: f32,
    pub terrain: Arc<TerrainModel>,
    pub patches: Arc<GroundPatchSet>,
    pub places: Vec<Place>,
    pub objects: Vec<MapObject>,
}

impl LoadedMap {
    pub fn from_msg(msg: &MapMsg, def: MapDef) -> Self {
        Self {
            def,
            seed: msg.seed,
            width: msg.width,
            height: msg.height,
            terrain: Arc::new(TerrainModel::generate(&msg.terrain_spec())),
            patches: Arc::new(GroundPatchSet::generate(&msg.ground_patches, msg.seed)),
            places: msg.places.clone(),
            objects: msg.objects.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }
}
