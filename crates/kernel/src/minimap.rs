use isleworld_common::{Collider, Color, Transform};
use isleworld_defs::{DefsError, ObjectDefs, ObjectKind};
use serde::{Deserialize, Serialize};

use crate::map::MapObject;

/// Buildings draw above every obstacle on the minimap.
pub const BUILDING_MINIMAP_Z: i32 = 750;

/// A shape in definition space plus its minimap styling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MinimapShape {
    pub collider: Collider,
    pub scale: f32,
    pub color: Color,
}

impl MinimapShape {
    /// The shape placed at `transform` with its own scale applied about its centre.
    pub fn world_collider(&self, transform: &Transform) -> Collider {
        let placed = self.collider.transform(transform);
        match placed {
            Collider::Circle { pos, rad } => Collider::circle(pos, rad * self.scale),
            Collider::Aabb { min, max } => {
                let center = (min + max) * 0.5;
                let half = (max - min) * 0.5 * self.scale;
                Collider::aabb(center - half, center + half)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinimapRender {
    pub z_idx: i32,
    pub shapes: Vec<MinimapShape>,
}

/// Draw order and shapes of one map object.
///
/// Explicit shapes from the definition win; otherwise a single shape is
/// derived from the obstacle collision, the building's first zoom-in region
/// (or its bounds), or the structure bounds.
pub fn minimap_render(object: &MapObject, defs: &ObjectDefs) -> Result<MinimapRender, DefsError> {
    let def = defs.get(&object.type_name)?;
    let z_idx = match &def.kind {
        ObjectKind::Building { z_idx, .. } => BUILDING_MINIMAP_Z + z_idx,
        ObjectKind::Obstacle { img_z_idx, .. } => *img_z_idx,
        ObjectKind::Structure { .. } => 0,
    };

    let shapes = match &def.map.shapes {
        Some(shapes) => shapes
            .iter()
            .map(|s| MinimapShape {
                collider: s.collider,
                scale: s.scale.unwrap_or(1.0),
                color: s.color,
            })
            .collect(),
        None => {
            let footprint = match &def.kind {
                ObjectKind::Obstacle { collision, .. } => *collision,
                ObjectKind::Building {
                    zoom_regions, bounds, ..
                } => zoom_regions.iter().find_map(|r| r.zoom_in).unwrap_or(*bounds),
                ObjectKind::Structure { bounds, .. } => *bounds,
            };
            vec![MinimapShape {
                collider: footprint,
                scale: def.map.scale.unwrap_or(1.0),
                color: def.map.color,
            }]
        }
    };

    Ok(MinimapRender { z_idx, shapes })
}

/// Render descriptors for every object, stably sorted by ascending `z_idx`.
pub fn minimap_renders<'a>(
    objects: &'a [MapObject],
    defs: &ObjectDefs,
) -> Result<Vec<(&'a MapObject, MinimapRender)>, DefsError> {
    let mut renders = objects
        .iter()
        .map(|o| minimap_render(o, defs).map(|r| (o, r)))
        .collect::<Result<Vec<_>, _>>()?;
    renders.sort_by_key(|(_, r)| r.z_idx);
    Ok(renders)
}
