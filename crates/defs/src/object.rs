use glam::Vec2;
use isleworld_common::{Collider, Color, SurfaceData, SurfaceKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::DefsError;

/// Camera zoom region of a building; `zoom_in` doubles as its ceiling footprint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ZoomRegion {
    pub zoom_in: Option<Collider>,
    pub zoom_out: Option<Collider>,
}

/// One floor region of a building, in definition space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FloorDef {
    pub kind: SurfaceKind,
    #[serde(default)]
    pub data: SurfaceData,
    pub colliders: Vec<Collider>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectKind {
    Obstacle {
        collision: Collider,
        #[serde(default)]
        img_z_idx: i32,
    },
    Building {
        #[serde(default)]
        z_idx: i32,
        #[serde(default)]
        zoom_regions: Vec<ZoomRegion>,
        /// Tight box around everything the building draws.
        bounds: Collider,
        /// Floor regions, checked in order by surface queries.
        #[serde(default)]
        floor: Vec<FloorDef>,
        /// Stair regions that also reveal the ceiling.
        #[serde(default)]
        stairs: Vec<Collider>,
    },
    Structure {
        bounds: Collider,
        #[serde(default)]
        stairs: Vec<Collider>,
        /// Regions hidden from a viewer on the other layer.
        #[serde(default)]
        masks: Vec<Collider>,
    },
}

/// One explicit minimap shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapShape {
    pub collider: Collider,
    pub color: Color,
    #[serde(default)]
    pub scale: Option<f32>,
}

/// How an object appears on the minimap.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MinimapDef {
    /// Explicit shapes; when absent a single shape is derived from the
    /// object's footprint.
    #[serde(default)]
    pub shapes: Option<Vec<MapShape>>,
    #[serde(default)]
    pub scale: Option<f32>,
    #[serde(default)]
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub kind: ObjectKind,
    #[serde(default)]
    pub map: MinimapDef,
}

impl ObjectDef {
    pub fn is_building(&self) -> bool {
        matches!(self.kind, ObjectKind::Building { .. })
    }
}

/// Registry of map object definitions keyed by object type.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectDefs {
    objects: BTreeMap<String, ObjectDef>,
}

impl ObjectDefs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut defs = Self::new();
        defs.insert(
            "tree_01",
            ObjectDef {
                kind: ObjectKind::Obstacle {
                    collision: Collider::circle(Vec2::ZERO, 1.6),
                    img_z_idx: 10,
                },
                map: MinimapDef {
                    scale: Some(2.5),
                    color: Color(0x244a1a),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "crate_01",
            ObjectDef {
                kind: ObjectKind::Obstacle {
                    collision: Collider::aabb(Vec2::splat(-2.25), Vec2::splat(2.25)),
                    img_z_idx: 0,
                },
                map: MinimapDef {
                    color: Color(0x663300),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "stone_01",
            ObjectDef {
                kind: ObjectKind::Obstacle {
                    collision: Collider::circle(Vec2::ZERO, 2.9),
                    img_z_idx: 0,
                },
                map: MinimapDef {
                    scale: Some(1.0),
                    color: Color(0x5b5b5b),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "house_red_01",
            ObjectDef {
                kind: ObjectKind::Building {
                    z_idx: 1,
                    zoom_regions: vec![ZoomRegion {
                        zoom_in: Some(aabb(-14.0, -9.0, 14.0, 9.0)),
                        zoom_out: None,
                    }],
                    bounds: aabb(-16.0, -11.0, 16.0, 11.0),
                    floor: vec![
                        floor(SurfaceKind::Wood, aabb(-14.0, -9.0, 14.0, 9.0)),
                        floor(SurfaceKind::Stone, aabb(-4.0, -11.0, 4.0, -9.0)),
                    ],
                    stairs: Vec::new(),
                },
                map: MinimapDef {
                    shapes: Some(vec![
                        MapShape {
                            collider: aabb(-14.0, -9.0, 14.0, 9.0),
                            color: Color(0x643200),
                            scale: None,
                        },
                        MapShape {
                            collider: aabb(-4.0, -9.0, 4.0, 9.0),
                            color: Color(0x7a4b20),
                            scale: None,
                        },
                    ]),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "warehouse_01",
            ObjectDef {
                kind: ObjectKind::Building {
                    z_idx: 0,
                    zoom_regions: Vec::new(),
                    bounds: aabb(-25.0, -12.0, 25.0, 12.0),
                    floor: vec![floor(SurfaceKind::Metal, aabb(-24.0, -11.0, 24.0, 11.0))],
                    stairs: Vec::new(),
                },
                map: MinimapDef {
                    color: Color(0x444444),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "bunker_entrance_01",
            ObjectDef {
                kind: ObjectKind::Building {
                    z_idx: 0,
                    zoom_regions: vec![ZoomRegion {
                        zoom_in: Some(aabb(-6.0, -4.0, 6.0, 4.0)),
                        zoom_out: None,
                    }],
                    bounds: aabb(-7.0, -9.0, 7.0, 5.0),
                    floor: vec![
                        floor(SurfaceKind::Bunker, aabb(-6.0, -4.0, 6.0, 4.0)),
                        floor(SurfaceKind::StoneStep, aabb(-2.0, -8.0, 2.0, -4.0)),
                    ],
                    stairs: vec![aabb(-2.0, -8.0, 2.0, -4.0)],
                },
                map: MinimapDef {
                    color: Color(0x3a3a3a),
                    ..MinimapDef::default()
                },
            },
        );
        defs.insert(
            "bunker_structure_01",
            ObjectDef {
                kind: ObjectKind::Structure {
                    bounds: aabb(-10.0, -8.0, 10.0, 8.0),
                    stairs: vec![aabb(-2.0, -8.0, 2.0, -4.0)],
                    masks: vec![aabb(-10.0, -8.0, 10.0, 8.0)],
                },
                map: MinimapDef {
                    color: Color(0x2a2a2a),
                    ..MinimapDef::default()
                },
            },
        );
        defs
    }

    pub fn insert(&mut self, type_name: impl Into<String>, def: ObjectDef) {
        self.objects.insert(type_name.into(), def);
    }

    pub fn get(&self, type_name: &str) -> Result<&ObjectDef, DefsError> {
        self.objects
            .get(type_name)
            .ok_or_else(|| DefsError::UnknownObject(type_name.to_string()))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Parse a JSON object mapping type names to definitions.
    pub fn from_json(json: &str) -> Result<Self, DefsError> {
        let objects: BTreeMap<String, ObjectDef> = serde_json::from_str(json)?;
        Ok(Self { objects })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, DefsError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let defs = Self::from_json(&data)?;
        tracing::debug!(
            path = %path.as_ref().display(),
            objects = defs.len(),
            "loaded object defs"
        );
        Ok(defs)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), DefsError> {
        let file = std::fs::File::create(path)?;
        serde_json::to_writer_pretty(file, &self.objects)?;
        Ok(())
    }
}

fn aabb(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Collider {
    Collider::aabb(Vec2::new(min_x, min_y), Vec2::new(max_x, max_y))
}

fn floor(kind: SurfaceKind, collider: Collider) -> FloorDef {
    FloorDef {
        kind,
        data: SurfaceData::default(),
        colliders: vec![collider],
    }
}
