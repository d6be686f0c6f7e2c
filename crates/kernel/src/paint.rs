use std::borrow::Cow;

use glam::Vec2;
use isleworld_common::Color;
use isleworld_terrain::PatchOrder;

use crate::map::LoadedMap;

/// How far the background border reaches past the map edge.
pub const PAINT_MARGIN: f32 = 120.0;
pub const GRID_ALPHA: f32 = 0.15;

/// One fill or stroke of the ground layer, in paint order.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintStep<'a> {
    Rect {
        color: Color,
        min: Vec2,
        max: Vec2,
    },
    Polygon {
        color: Color,
        points: Cow<'a, [Vec2]>,
        hole: Option<&'a [Vec2]>,
    },
    GridLines {
        spacing: f32,
        width: f32,
        height: f32,
        alpha: f32,
    },
}

/// Ordered ground paint for `map`: background border, beach, grass (canvas
/// mode only), below-grid patches, river banks, river water, ocean, grid,
/// above-grid patches. With `map_render` only patches flagged as map shapes
/// are painted.
pub fn ground_paint_plan(
    map: &LoadedMap,
    grid_size: f32,
    canvas_mode: bool,
    map_render: bool,
) -> Vec<PaintStep<'_>> {
    let colors = &map.def.biome.colors;
    let terrain = &map.terrain;
    let (w, h, m) = (map.width, map.height, PAINT_MARGIN);
    let mut steps = Vec::new();

    for (min, max) in [
        (Vec2::new(-m, -m), Vec2::new(w + m, 0.0)),
        (Vec2::new(-m, h), Vec2::new(w + m, h + m)),
        (Vec2::new(-m, -m), Vec2::new(0.0, h + m)),
        (Vec2::new(w, -m), Vec2::new(w + m, h + m)),
    ] {
        steps.push(PaintStep::Rect {
            color: colors.background,
            min,
            max,
        });
    }

    steps.push(PaintStep::Polygon {
        color: colors.beach,
        points: Cow::Borrowed(terrain.shore.as_slice()),
        hole: Some(terrain.grass.as_slice()),
    });
    if canvas_mode {
        steps.push(PaintStep::Polygon {
            color: colors.grass,
            points: Cow::Borrowed(terrain.grass.as_slice()),
            hole: None,
        });
    }

    push_patches(&mut steps, map, PatchOrder::BelowGrid, map_render);

    for river in &terrain.rivers {
        steps.push(PaintStep::Polygon {
            color: colors.riverbank,
            points: Cow::Borrowed(river.shore_poly.as_slice()),
            hole: None,
        });
    }
    for river in &terrain.rivers {
        steps.push(PaintStep::Polygon {
            color: colors.water,
            points: Cow::Borrowed(river.water_poly.as_slice()),
            hole: None,
        });
    }

    steps.push(PaintStep::Polygon {
        color: colors.water,
        points: Cow::Owned(vec![
            Vec2::new(0.0, h),
            Vec2::new(w, h),
            Vec2::new(w, 0.0),
            Vec2::ZERO,
        ]),
        hole: Some(terrain.shore.as_slice()),
    });
    steps.push(PaintStep::GridLines {
        spacing: grid_size,
        width: w,
        height: h,
        alpha: GRID_ALPHA,
    });

    push_patches(&mut steps, map, PatchOrder::AboveGrid, map_render);
    steps
}

fn push_patches<'a>(
    steps: &mut Vec<PaintStep<'a>>,
    map: &'a LoadedMap,
    order: PatchOrder,
    map_render: bool,
) {
    for shaped in map.patches.pass(order, map_render) {
        steps.push(PaintStep::Polygon {
            color: shaped.patch.color,
            points: Cow::Borrowed(shaped.points.as_slice()),
            hole: None,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::MapMsg;
    use isleworld_defs::MapDefs;
    use isleworld_terrain::{GroundPatch, RiverSpec};

    fn map(patches: Vec<GroundPatch>) -> LoadedMap {
        let msg = MapMsg {
            map_name: "main".into(),
            seed: 3,
            width: 256.0,
            height: 256.0,
            shore_inset: 24.0,
            grass_inset: 12.0,
            rivers: vec![RiverSpec {
                points: vec![Vec2::new(40.0, 128.0), Vec2::new(216.0, 128.0)],
                width: 6.0,
                looped: false,
            }],
            places: Vec::new(),
            objects: Vec::new(),
            ground_patches: patches,
        };
        LoadedMap::from_msg(&msg, MapDefs::builtin().get("main").unwrap().clone())
    }

    fn patch(order: PatchOrder, use_as_map_shape: bool) -> GroundPatch {
        GroundPatch {
            min: Vec2::new(60.0, 60.0),
            max: Vec2::new(90.0, 80.0),
            color: Color(0x123456),
            roughness: 0.5,
            offset_dist: 2.0,
            order,
            use_as_map_shape,
        }
    }

    fn label(step: &PaintStep<'_>, map: &LoadedMap) -> &'static str {
        let colors = &map.def.biome.colors;
        match step {
            PaintStep::Rect { .. } => "border",
            PaintStep::GridLines { .. } => "grid",
            PaintStep::Polygon { color, hole, .. } => match *color {
                c if c == colors.beach => "beach",
                c if c == colors.grass => "grass",
                c if c == colors.riverbank => "bank",
                c if c == colors.water && hole.is_some() => "ocean",
                c if c == colors.water => "river",
                _ => "patch",
            },
        }
    }

    #[test]
    fn paint_order() {
        let map = map(vec![
            patch(PatchOrder::AboveGrid, false),
            patch(PatchOrder::BelowGrid, false),
        ]);
        let steps = ground_paint_plan(&map, 16.0, false, false);
        let labels: Vec<&str> = steps.iter().map(|s| label(s, &map)).collect();
        assert_eq!(
            labels,
            [
                "border", "border", "border", "border", "beach", "patch", "bank", "river",
                "ocean", "grid", "patch"
            ]
        );
    }

    #[test]
    fn canvas_mode_adds_grass() {
        let map = map(Vec::new());
        let steps = ground_paint_plan(&map, 16.0, true, false);
        assert_eq!(steps.iter().filter(|s| label(s, &map) == "grass").count(), 1);
    }

    #[test]
    fn map_render_keeps_only_map_shapes() {
        let map = map(vec![
            patch(PatchOrder::BelowGrid, false),
            patch(PatchOrder::AboveGrid, true),
        ]);
        let steps = ground_paint_plan(&map, 16.0, false, true);
        assert_eq!(steps.iter().filter(|s| label(s, &map) == "patch").count(), 1);
        assert!(matches!(steps.last(), Some(PaintStep::Polygon { .. })));
    }

    #[test]
    fn grid_uses_configured_spacing() {
        let map = map(Vec::new());
        let steps = ground_paint_plan(&map, 32.0, false, false);
        assert!(steps.iter().any(|s| matches!(
            s,
            PaintStep::GridLines { spacing, alpha, .. } if *spacing == 32.0 && *alpha == GRID_ALPHA
        )));
    }
}
