//! World kernel: map load, pooled entities, and the spatial queries the
//! client runs against them.
//!
//! # Invariants
//! - Terrain and ground patches are generated once per map load and never
//!   mutated afterwards.
//! - Queries are read-only; only [`World::update`] and the spawn/despawn
//!   operations mutate entity state.
//! - Entity ids are never reused within a pool.

pub mod config;
pub mod entities;
pub mod integrity;
pub mod map;
pub mod minimap;
pub mod occlusion;
pub mod paint;
pub mod surface;
pub mod world;

pub use config::{ConfigError, WorldConfig};
pub use entities::{
    Building, Ceiling, Decal, Obstacle, Particle, Structure, Surface, SurfacePayload, TickContext,
};
pub use integrity::{
    AlphaFloorPolicy, AlphaPolicy, AlphaSample, IntegrityMonitor, IntegritySink, SampleKind,
    ScanReport, StickyFlag,
};
pub use isleworld_common::SurfaceData;
pub use map::{LoadedMap, MapMsg, MapObject, Place};
pub use minimap::{
    BUILDING_MINIMAP_Z, MinimapRender, MinimapShape, minimap_render, minimap_renders,
};
pub use occlusion::Occlusion;
pub use paint::{PaintStep, ground_paint_plan};
pub use surface::{GroundSurface, GroundSurfaceClassifier};
pub use world::{MapError, World};

pub fn crate_info() -> &'static str {
    "isleworld-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("kernel"));
    }
}
