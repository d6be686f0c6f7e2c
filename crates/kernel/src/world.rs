use std::sync::Arc;

use glam::Vec2;
use isleworld_common::{EntityId, Layer};
use isleworld_defs::{DefsError, MapDef, MapDefs, ObjectDefs, ObjectKind};
use isleworld_pool::{EntityHandle, EntityPool};
use isleworld_terrain::{GroundPatchSet, TerrainModel};

use crate::config::WorldConfig;
use crate::entities::{Building, Decal, Obstacle, Structure, TickContext};
use crate::integrity::{
    AlphaFloorPolicy, AlphaPolicy, AlphaSample, IntegrityMonitor, IntegritySink, ScanReport,
};
use crate::map::{LoadedMap, MapMsg, MapObject};
use crate::minimap::{MinimapRender, minimap_renders};
use crate::occlusion::Occlusion;
use crate::paint::{PaintStep, ground_paint_plan};
use crate::surface::{GroundSurface, GroundSurfaceClassifier};

#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("no map loaded")]
    NotLoaded,
    #[error(transparent)]
    Defs(#[from] DefsError),
}

/// The client-side world: the loaded map plus pooled entities.
///
/// Terrain queries fail with [`MapError::NotLoaded`] until
/// [`World::load_map`] succeeds. Loading a map clears every pool.
#[derive(Debug)]
pub struct World {
    config: WorldConfig,
    map: Option<LoadedMap>,
    obstacles: EntityPool<Obstacle>,
    buildings: EntityPool<Building>,
    structures: EntityPool<Structure>,
    decals: EntityPool<Decal>,
    integrity: IntegrityMonitor,
    tick: u64,
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default())
    }
}

impl World {
    pub fn new(config: WorldConfig) -> Self {
        let integrity = IntegrityMonitor::from_config(&config);
        Self::with_monitor(config, integrity)
    }

    /// A world whose integrity scans use `policy` and report into `sink`.
    pub fn with_integrity(
        config: WorldConfig,
        policy: Box<dyn AlphaPolicy>,
        sink: Arc<dyn IntegritySink>,
    ) -> Self {
        let integrity = IntegrityMonitor::new(config.integrity_interval, policy, sink);
        Self::with_monitor(config, integrity)
    }

    fn with_monitor(config: WorldConfig, integrity: IntegrityMonitor) -> Self {
        Self {
            map: None,
            obstacles: EntityPool::with_capacity(config.obstacle_capacity),
            buildings: EntityPool::with_capacity(config.building_capacity),
            structures: EntityPool::with_capacity(config.structure_capacity),
            decals: EntityPool::with_capacity(config.decal_capacity),
            integrity,
            tick: 0,
            config,
        }
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Generate terrain and ground patches from a map-load message.
    ///
    /// An unknown map name is an error and leaves the world untouched.
    pub fn load_map(&mut self, msg: &MapMsg, maps: &MapDefs) -> Result<&LoadedMap, MapError> {
        let _span = tracing::info_span!("load_map", map = %msg.map_name, seed = msg.seed).entered();
        let def = maps.get(&msg.map_name)?.clone();
        let loaded = LoadedMap::from_msg(msg, def);
        self.clear_entities();
        tracing::info!(
            rivers = loaded.terrain.rivers.len(),
            patches = loaded.patches.len(),
            objects = loaded.objects.len(),
            vertices = loaded.terrain.vertex_count(),
            fingerprint = %format!("{:016x}", loaded.terrain.fingerprint()),
            "map loaded"
        );
        Ok(&*self.map.insert(loaded))
    }

    /// Drop the map and every pooled entity.
    pub fn unload(&mut self) {
        if let Some(map) = self.map.take() {
            tracing::debug!(map = map.name(), "map unloaded");
        }
        self.clear_entities();
    }

    fn clear_entities(&mut self) {
        self.obstacles.clear();
        self.buildings.clear();
        self.structures.clear();
        self.decals.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.map.is_some()
    }

    pub fn map(&self) -> Result<&LoadedMap, MapError> {
        self.map.as_ref().ok_or(MapError::NotLoaded)
    }

    pub fn map_def(&self) -> Result<&MapDef, MapError> {
        Ok(&self.map()?.def)
    }

    pub fn terrain(&self) -> Result<&TerrainModel, MapError> {
        Ok(&self.map()?.terrain)
    }

    pub fn ground_patches(&self) -> Result<&GroundPatchSet, MapError> {
        Ok(&self.map()?.patches)
    }

    /// A shared handle to the terrain, valid past the next load.
    pub fn shared_terrain(&self) -> Result<Arc<TerrainModel>, MapError> {
        Ok(Arc::clone(&self.map()?.terrain))
    }

    pub fn spawn_obstacle(&mut self, obstacle: Obstacle) -> Option<EntityHandle> {
        self.obstacles.spawn(|_| obstacle)
    }

    pub fn spawn_building(&mut self, building: Building) -> Option<EntityHandle> {
        self.buildings.spawn(|_| building)
    }

    pub fn spawn_structure(&mut self, structure: Structure) -> Option<EntityHandle> {
        self.structures.spawn(|_| structure)
    }

    pub fn spawn_decal(&mut self, decal: Decal) -> Option<EntityHandle> {
        self.decals.spawn(|_| decal)
    }

    /// Instantiate one map object into the pool its definition kind selects.
    /// `Ok(None)` when that pool is full.
    pub fn spawn_object(
        &mut self,
        object: &MapObject,
        defs: &ObjectDefs,
        layer: Layer,
    ) -> Result<Option<EntityHandle>, MapError> {
        let def = defs.get(&object.type_name)?;
        let name = object.type_name.as_str();
        let transform = object.transform();
        let handle = match &def.kind {
            ObjectKind::Obstacle { .. } => Obstacle::from_def(name, def, transform, layer)
                .and_then(|o| self.spawn_obstacle(o)),
            ObjectKind::Building { .. } => Building::from_def(name, def, transform, layer)
                .and_then(|b| self.spawn_building(b)),
            ObjectKind::Structure { .. } => Structure::from_def(name, def, transform, layer)
                .and_then(|s| self.spawn_structure(s)),
        };
        Ok(handle)
    }

    /// Spawn every object of the loaded map on the ground layer. Returns the
    /// number spawned; objects whose pool is full are skipped.
    pub fn spawn_map_objects(&mut self, defs: &ObjectDefs) -> Result<usize, MapError> {
        let objects = self.map()?.objects.clone();
        let mut spawned = 0;
        for object in &objects {
            if self.spawn_object(object, defs, Layer::GROUND)?.is_some() {
                spawned += 1;
            } else {
                tracing::debug!(object = %object.type_name, "pool full, object not spawned");
            }
        }
        Ok(spawned)
    }

    pub fn obstacles(&self) -> &EntityPool<Obstacle> {
        &self.obstacles
    }

    pub fn obstacles_mut(&mut self) -> &mut EntityPool<Obstacle> {
        &mut self.obstacles
    }

    pub fn buildings(&self) -> &EntityPool<Building> {
        &self.buildings
    }

    pub fn buildings_mut(&mut self) -> &mut EntityPool<Building> {
        &mut self.buildings
    }

    pub fn structures(&self) -> &EntityPool<Structure> {
        &self.structures
    }

    pub fn structures_mut(&mut self) -> &mut EntityPool<Structure> {
        &mut self.structures
    }

    pub fn decals(&self) -> &EntityPool<Decal> {
        &self.decals
    }

    pub fn decals_mut(&mut self) -> &mut EntityPool<Decal> {
        &mut self.decals
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn tick_context(&self, viewer_pos: Vec2, viewer_layer: Layer) -> TickContext {
        TickContext::new(viewer_pos, viewer_layer, &self.config)
    }

    /// Advance every pool by `dt`, reap expired entries, then run the
    /// integrity monitor over `particles` and the live obstacles.
    pub fn update<'p, P>(
        &mut self,
        dt: f32,
        ctx: &TickContext,
        particles: impl IntoIterator<Item = &'p P>,
    ) -> Option<ScanReport>
    where
        P: AlphaSample + 'p,
    {
        self.tick += 1;
        let _span = tracing::trace_span!("world_update", tick = self.tick).entered();
        self.obstacles.update_active(dt, ctx);
        self.buildings.update_active(dt, ctx);
        self.structures.update_active(dt, ctx);
        let reaped = self.decals.update_active(dt, ctx);
        if reaped > 0 {
            tracing::trace!(reaped, "decals expired");
        }
        self.integrity
            .tick(particles, self.obstacles.active_entries().map(|(_, o)| o))
    }

    pub fn surfaces(&self) -> Result<GroundSurfaceClassifier<'_>, MapError> {
        let map = self.map()?;
        Ok(GroundSurfaceClassifier::new(
            &map.terrain,
            &map.def.biome,
            &self.decals,
            &self.buildings,
        ))
    }

    pub fn ground_surface(&self, pos: Vec2, layer: Layer) -> Result<GroundSurface, MapError> {
        Ok(self.surfaces()?.classify(pos, layer))
    }

    pub fn occlusion(&self) -> Occlusion<'_> {
        Occlusion::new(&self.buildings, &self.structures)
    }

    pub fn building_by_id(&self, id: EntityId) -> Option<&Building> {
        self.buildings.get_by_id(id)
    }

    pub fn is_in_ocean(&self, pos: Vec2) -> Result<bool, MapError> {
        Ok(self.terrain()?.is_in_ocean(pos))
    }

    pub fn distance_to_shore(&self, pos: Vec2) -> Result<f32, MapError> {
        Ok(self.terrain()?.distance_to_shore(pos))
    }

    pub fn ground_paint_plan(
        &self,
        canvas_mode: bool,
        map_render: bool,
    ) -> Result<Vec<PaintStep<'_>>, MapError> {
        Ok(ground_paint_plan(
            self.map()?,
            self.config.grid_size,
            canvas_mode,
            map_render,
        ))
    }

    pub fn minimap_renders(
        &self,
        defs: &ObjectDefs,
    ) -> Result<Vec<(&MapObject, MinimapRender)>, MapError> {
        Ok(minimap_renders(&self.map()?.objects, defs)?)
    }

    pub fn integrity(&self) -> &IntegrityMonitor {
        &self.integrity
    }

    pub fn integrity_flagged(&self) -> bool {
        self.integrity.is_flagged()
    }

    /// Swap the integrity policy, e.g. when the server pushes a new one.
    pub fn set_alpha_policy(&mut self, policy: Box<dyn AlphaPolicy>) {
        self.integrity.set_policy(policy);
    }

    /// Restore the floor policy from the current config.
    pub fn reset_alpha_policy(&mut self) {
        let policy = AlphaFloorPolicy::from_config(&self.config);
        self.integrity.set_policy(Box::new(policy));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Particle;
    use isleworld_common::{Collider, SurfaceKind, Transform};

    fn msg(map_name: &str) -> MapMsg {
        MapMsg {
            map_name: map_name.into(),
            seed: 7,
            width: 300.0,
            height: 300.0,
            shore_inset: 30.0,
            grass_inset: 12.0,
            rivers: Vec::new(),
            places: Vec::new(),
            objects: Vec::new(),
            ground_patches: Vec::new(),
        }
    }

    #[test]
    fn queries_before_load_fail() {
        let world = World::default();
        assert!(!world.is_loaded());
        assert!(matches!(
            world.ground_surface(Vec2::ZERO, Layer::GROUND),
            Err(MapError::NotLoaded)
        ));
        assert!(matches!(world.is_in_ocean(Vec2::ZERO), Err(MapError::NotLoaded)));
        assert!(world.ground_paint_plan(false, false).is_err());
    }

    #[test]
    fn unknown_map_is_rejected() {
        let mut world = World::default();
        let err = world.load_map(&msg("atlantis"), &MapDefs::builtin()).unwrap_err();
        assert!(matches!(err, MapError::Defs(DefsError::UnknownMap(_))));
        assert!(!world.is_loaded());
    }

    #[test]
    fn load_clears_pools() {
        let mut world = World::default();
        let defs = ObjectDefs::builtin();
        let tree = Obstacle::from_def(
            "tree_01",
            defs.get("tree_01").unwrap(),
            Transform::at(Vec2::new(100.0, 100.0)),
            Layer::GROUND,
        )
        .unwrap();
        world.spawn_obstacle(tree);
        assert_eq!(world.obstacles().len(), 1);

        world.load_map(&msg("main"), &MapDefs::builtin()).unwrap();
        assert!(world.obstacles().is_empty());
        assert!(world.is_in_ocean(Vec2::new(5.0, 5.0)).unwrap());
        assert!(!world.is_in_ocean(Vec2::new(150.0, 150.0)).unwrap());
        assert!(world.distance_to_shore(Vec2::new(150.0, 150.0)).unwrap() > 90.0);
        assert!(world.ground_patches().unwrap().is_empty());
    }

    #[test]
    fn update_runs_integrity_on_interval() {
        let config = WorldConfig {
            integrity_interval: 3,
            ..WorldConfig::default()
        };
        let mut world = World::new(config);
        world.load_map(&msg("main"), &MapDefs::builtin()).unwrap();
        let ctx = world.tick_context(Vec2::new(150.0, 150.0), Layer::GROUND);
        let bad = [Particle {
            active: true,
            fade: false,
            alpha: 0.0,
        }];
        assert!(world.update(0.016, &ctx, &bad).is_none());
        assert!(world.update(0.016, &ctx, &bad).is_none());
        let report = world.update(0.016, &ctx, &bad).unwrap();
        assert_eq!(report.particle_failures, 1);
        assert!(world.integrity_flagged());
        assert_eq!(world.tick(), 3);
    }

    #[test]
    fn building_floor_through_world() {
        let mut world = World::default();
        world.load_map(&msg("main"), &MapDefs::builtin()).unwrap();
        let defs = ObjectDefs::builtin();
        let house = Building::from_def(
            "house_red_01",
            defs.get("house_red_01").unwrap(),
            Transform::at(Vec2::new(150.0, 150.0)),
            Layer::GROUND,
        )
        .unwrap();
        let handle = world.spawn_building(house).unwrap();
        let id = world.buildings().id_of(handle).unwrap();

        let s = world.ground_surface(Vec2::new(155.0, 150.0), Layer::GROUND).unwrap();
        assert_eq!(s.kind, SurfaceKind::Wood);
        let porch = world.ground_surface(Vec2::new(150.0, 140.0), Layer::GROUND).unwrap();
        assert_eq!(porch.kind, SurfaceKind::Stone);
        assert_eq!(world.building_by_id(id).unwrap().z_idx, 1);
        assert!(world.occlusion().inside_building_ceiling(Vec2::new(150.0, 150.0), false));
    }

    fn object(type_name: &str, pos: Vec2) -> MapObject {
        MapObject {
            type_name: type_name.into(),
            pos,
            ori: 0,
            scale: 1.0,
        }
    }

    #[test]
    fn spawn_object_routes_by_kind() {
        let mut world = World::default();
        world.load_map(&msg("main"), &MapDefs::builtin()).unwrap();
        let defs = ObjectDefs::builtin();
        let at = Vec2::new(150.0, 150.0);
        for name in ["tree_01", "warehouse_01", "bunker_structure_01"] {
            let handle = world.spawn_object(&object(name, at), &defs, Layer::GROUND).unwrap();
            assert!(handle.is_some(), "{name}");
        }
        assert_eq!(world.obstacles().len(), 1);
        assert_eq!(world.buildings().len(), 1);
        assert_eq!(world.structures().len(), 1);

        let floor = world.ground_surface(at, Layer::GROUND).unwrap();
        assert_eq!(floor.kind, SurfaceKind::Metal);
        assert!(world.occlusion().inside_structure_stairs(Vec2::new(150.0, 144.0)));
    }

    #[test]
    fn spawn_object_rejects_unknown_type() {
        let mut world = World::default();
        let err = world
            .spawn_object(&object("spaceship", Vec2::ZERO), &ObjectDefs::builtin(), Layer::GROUND)
            .unwrap_err();
        assert!(matches!(err, MapError::Defs(DefsError::UnknownObject(_))));
    }

    #[test]
    fn spawn_map_objects_fills_pools() {
        let mut world = World::default();
        let mut m = msg("main");
        m.objects = vec![
            object("tree_01", Vec2::new(100.0, 100.0)),
            object("house_red_01", Vec2::new(200.0, 200.0)),
            object("bunker_structure_01", Vec2::new(120.0, 200.0)),
        ];
        world.load_map(&m, &MapDefs::builtin()).unwrap();
        let spawned = world.spawn_map_objects(&ObjectDefs::builtin()).unwrap();
        assert_eq!(spawned, 3);
        assert_eq!(world.structures().len(), 1);
    }
}
