//! Shared types for the isleworld map core: geometry primitives, layers, ids.
//!
//! # Invariants
//! - Geometry is pure data; nothing here depends on a renderer.
//! - Degenerate shapes are "never contains", never an error.

pub mod geometry;
pub mod types;

pub use geometry::{
    Aabb, Collider, POINT_EPSILON, dist_to_polygon, dist_to_segment, point_in_polygon,
    rotate_quarter, signed_area,
};
pub use glam::Vec2;
pub use types::{Color, EntityId, Layer, SurfaceData, SurfaceKind, Transform};

pub fn crate_info() -> &'static str {
    "isleworld-common v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("common"));
    }
}
