use glam::Vec2;
use isleworld_common::{Layer, SurfaceData, SurfaceKind, point_in_polygon};
use isleworld_defs::Biome;
use isleworld_pool::EntityPool;
use isleworld_terrain::TerrainModel;
use serde::{Deserialize, Serialize};

use crate::entities::{Building, Decal, Surface, SurfacePayload};

/// What the ground is made of at a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundSurface {
    pub kind: SurfaceKind,
    pub data: SurfaceData,
}

/// Answers "what surface is at (pos, layer)".
///
/// Priority: decal surfaces, then building floors, then river water, then
/// the terrain itself (grass, sand, ocean).
pub struct GroundSurfaceClassifier<'a> {
    terrain: &'a TerrainModel,
    biome: &'a Biome,
    decals: &'a EntityPool<Decal>,
    buildings: &'a EntityPool<Building>,
}

impl<'a> GroundSurfaceClassifier<'a> {
    pub fn new(
        terrain: &'a TerrainModel,
        biome: &'a Biome,
        decals: &'a EntityPool<Decal>,
        buildings: &'a EntityPool<Building>,
    ) -> Self {
        Self {
            terrain,
            biome,
            decals,
            buildings,
        }
    }

    pub fn classify(&self, pos: Vec2, layer: Layer) -> GroundSurface {
        if let Some(payload) = self.decal_surface(pos, layer) {
            return self.finish(payload.kind, payload.data.clone());
        }
        if let Some(surface) = self.building_surface(pos, layer) {
            return self.finish(surface.kind, surface.data.clone());
        }

        let mut on_river_shore = false;
        if layer != Layer::UNDERGROUND {
            for (index, river) in self.terrain.rivers.iter().enumerate() {
                if !river.on_shore(pos) {
                    continue;
                }
                on_river_shore = true;
                if river.in_water(pos) {
                    let data = SurfaceData {
                        river: Some(index),
                        ..SurfaceData::default()
                    };
                    return self.finish(SurfaceKind::Water, data);
                }
            }
        }

        let kind = if point_in_polygon(pos, &self.terrain.grass) {
            if on_river_shore {
                self.biome.sound.river_shore
            } else {
                SurfaceKind::Grass
            }
        } else if point_in_polygon(pos, &self.terrain.shore) {
            SurfaceKind::Sand
        } else {
            SurfaceKind::Water
        };
        self.finish(kind, SurfaceData::default())
    }

    /// First live decal carrying a surface that covers `pos` on a compatible layer.
    fn decal_surface(&self, pos: Vec2, layer: Layer) -> Option<&'a SurfacePayload> {
        self.decals.active_entries().find_map(|(_, decal)| {
            let surface = decal.surface.as_ref()?;
            (decal.layer.compatible(layer) && decal.collider.contains_point(pos)).then_some(surface)
        })
    }

    /// Floor of the highest-`z_idx` building covering `pos`. On stairs, layer 1
    /// buildings are ignored so ground floors win.
    fn building_surface(&self, pos: Vec2, layer: Layer) -> Option<&'a Surface> {
        let on_stairs = layer.on_stairs();
        let mut best: Option<(i32, &'a Surface)> = None;
        for (_, building) in self.buildings.active_entries() {
            let layer_ok = if on_stairs {
                building.layer != Layer::UNDERGROUND
            } else {
                building.layer == layer
            };
            if !layer_ok || best.is_some_and(|(z, _)| building.z_idx <= z) {
                continue;
            }
            if let Some(surface) = building.surfaces.iter().find(|s| s.contains_point(pos)) {
                best = Some((building.z_idx, surface));
            }
        }
        best.map(|(_, surface)| surface)
    }

    fn finish(&self, kind: SurfaceKind, mut data: SurfaceData) -> GroundSurface {
        if kind == SurfaceKind::Water {
            let colors = &self.biome.colors;
            data.water_color.get_or_insert(colors.water);
            data.ripple_color.get_or_insert(colors.water_ripple);
        }
        GroundSurface { kind, data }
    }
}
