//! Terrain generation: shore and grass polygons, rivers, jagged ground patches.
//!
//! # Invariants
//! - Generation is a pure function of its inputs; equal inputs yield
//!   bit-identical vertex sequences on every platform.
//! - Generated terrain is never mutated after map load.

mod jagged;
mod model;
mod patch;
mod rng;

pub use jagged::jagged_aabb_points;
pub use model::{River, RiverSpec, TerrainModel, TerrainParams, TerrainSpec};
pub use patch::{GroundPatch, GroundPatchSet, MIN_OFFSET_DIST, PatchOrder, ShapedPatch};
pub use rng::{SeededRand, mix_seed, splitmix64};

pub fn crate_info() -> &'static str {
    "isleworld-terrain v0.1.0"
}
