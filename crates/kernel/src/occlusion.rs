use isleworld_common::{Collider, EntityId};
use isleworld_pool::EntityPool;

use crate::entities::{Building, Structure};

/// Read-only occlusion queries over buildings and structures.
///
/// Query shapes are anything convertible into a [`Collider`]: a point, a box, or
/// a collider itself.
#[derive(Clone, Copy)]
pub struct Occlusion<'a> {
    buildings: &'a EntityPool<Building>,
    structures: &'a EntityPool<Structure>,
}

impl<'a> Occlusion<'a> {
    pub fn new(
        buildings: &'a EntityPool<Building>,
        structures: &'a EntityPool<Structure>,
    ) -> Self {
        Self {
            buildings,
            structures,
        }
    }

    pub fn inside_structure_stairs(&self, shape: impl Into<Collider>) -> bool {
        let shape = shape.into();
        self.structures
            .active_entries()
            .any(|(_, s)| s.inside_stairs(&shape))
    }

    pub fn inside_structure_mask(&self, shape: impl Into<Collider>) -> bool {
        let shape = shape.into();
        self.structures
            .active_entries()
            .any(|(_, s)| s.inside_mask(&shape))
    }

    /// Whether `shape` lies under a building ceiling. With `check_visible`,
    /// only ceilings the viewer currently sees under (positive vision
    /// ticker, not destroyed) count.
    pub fn inside_building_ceiling(
        &self,
        shape: impl Into<Collider>,
        check_visible: bool,
    ) -> bool {
        let shape = shape.into();
        self.buildings.active_entries().any(|(_, b)| {
            (!check_visible || b.ceiling_visible()) && b.is_inside_ceiling(&shape)
        })
    }

    pub fn building_by_id(&self, id: EntityId) -> Option<&'a Building> {
        self.buildings.get_by_id(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::entities::{Ceiling, TickContext};
    use glam::Vec2;
    use isleworld_common::{Aabb, Layer, Transform};
    use isleworld_pool::PoolEntity;

    fn building_with_mask(min: Vec2, max: Vec2) -> Building {
        Building {
            type_name: "hut".into(),
            transform: Transform::default(),
            layer: Layer::GROUND,
            z_idx: 0,
            surfaces: Vec::new(),
            ceiling: Ceiling {
                masks: vec![Collider::aabb(min, max)],
                ..Ceiling::default()
            },
        }
    }

    fn structure() -> Structure {
        Structure {
            type_name: "bunker".into(),
            transform: Transform::default(),
            layer: Layer::GROUND,
            stairs: vec![Collider::aabb(Vec2::new(0.0, 0.0), Vec2::new(4.0, 8.0))],
            masks: vec![Collider::circle(Vec2::new(30.0, 30.0), 10.0)],
            viewer_on_stairs: false,
        }
    }

    #[test]
    fn ceiling_needs_visibility_when_asked() {
        let mut buildings = EntityPool::with_capacity(4);
        let structures = EntityPool::with_capacity(4);
        let handle = buildings
            .spawn(|_| building_with_mask(Vec2::ZERO, Vec2::splat(10.0)))
            .unwrap();

        let occ = Occlusion::new(&buildings, &structures);
        let p = Vec2::new(5.0, 5.0);
        assert!(occ.inside_building_ceiling(p, false));
        // Ticker starts at zero: not visible yet.
        assert!(!occ.inside_building_ceiling(p, true));

        let ctx = TickContext::new(p, Layer::GROUND, &WorldConfig::default());
        buildings.get_mut(handle).unwrap().update(0.016, &ctx);
        let occ = Occlusion::new(&buildings, &structures);
        assert!(occ.inside_building_ceiling(p, true));
        assert!(!occ.inside_building_ceiling(Vec2::new(50.0, 50.0), false));
    }

    #[test]
    fn structure_queries_accept_points_and_boxes() {
        let buildings = EntityPool::with_capacity(1);
        let mut structures = EntityPool::with_capacity(1);
        structures.spawn(|_| structure());
        let occ = Occlusion::new(&buildings, &structures);

        assert!(occ.inside_structure_stairs(Vec2::new(2.0, 2.0)));
        assert!(!occ.inside_structure_stairs(Vec2::new(20.0, 2.0)));
        assert!(occ.inside_structure_stairs(Aabb::new(Vec2::new(3.0, 7.0), Vec2::new(6.0, 12.0))));
        assert!(occ.inside_structure_mask(Collider::circle(Vec2::new(42.0, 30.0), 3.0)));
        assert!(!occ.inside_structure_mask(Vec2::new(2.0, 2.0)));
    }

    #[test]
    fn building_lookup_by_id() {
        let mut buildings = EntityPool::with_capacity(2);
        let structures = EntityPool::with_capacity(1);
        let handle = buildings
            .spawn(|_| building_with_mask(Vec2::ZERO, Vec2::ONE))
            .unwrap();
        let id = buildings.id_of(handle).unwrap();
        let occ = Occlusion::new(&buildings, &structures);
        assert_eq!(occ.building_by_id(id).map(|b| b.type_name.as_str()), Some("hut"));

        buildings.despawn(handle);
        let occ = Occlusion::new(&buildings, &structures);
        assert!(occ.building_by_id(id).is_none());
    }
}
