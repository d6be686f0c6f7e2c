use glam::Vec2;
use isleworld_common::{Aabb, Color};
use serde::{Deserialize, Serialize};

use crate::jagged::jagged_aabb_points;
use crate::rng::{SeededRand, mix_seed};

/// Floor applied to a patch's offset distance before computing divisions.
pub const MIN_OFFSET_DIST: f32 = 0.001;

/// Cap on edge subdivisions per axis. A finer outline is not visible and
/// would cost one rng draw per vertex.
pub const MAX_DIVISIONS: u32 = 1024;

/// Which of the two paint passes a patch belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum PatchOrder {
    /// Painted before river shores and the grid.
    BelowGrid,
    /// Painted after the grid.
    AboveGrid,
}

impl TryFrom<u8> for PatchOrder {
    type Error = String;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Self::BelowGrid),
            1 => Ok(Self::AboveGrid),
            other => Err(format!("ground patch order must be 0 or 1, got {other}")),
        }
    }
}

impl From<PatchOrder> for u8 {
    fn from(order: PatchOrder) -> u8 {
        match order {
            PatchOrder::BelowGrid => 0,
            PatchOrder::AboveGrid => 1,
        }
    }
}

/// A coloured ground patch as described by the map-load message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundPatch {
    pub min: Vec2,
    pub max: Vec2,
    pub color: Color,
    pub roughness: f32,
    pub offset_dist: f32,
    pub order: PatchOrder,
    #[serde(default)]
    pub use_as_map_shape: bool,
}

impl GroundPatch {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.min, self.max)
    }

    pub fn offset(&self) -> f32 {
        self.offset_dist.max(MIN_OFFSET_DIST)
    }

    /// Edge subdivision counts along x and y.
    pub fn divisions(&self) -> (u32, u32) {
        let extent = self.aabb().extent();
        let offset = self.offset();
        let x = round_divisions(extent.x * self.roughness / offset);
        let y = round_divisions(extent.y * self.roughness / offset);
        if x > MAX_DIVISIONS || y > MAX_DIVISIONS {
            tracing::warn!(x, y, max = MAX_DIVISIONS, "ground patch divisions capped");
        }
        (x.min(MAX_DIVISIONS), y.min(MAX_DIVISIONS))
    }

    /// Seed for this patch's jitter: the map seed salted with the patch's
    /// position so neighbouring patches don't share noise phase.
    pub fn sub_seed(&self, map_seed: u32) -> u64 {
        let salt = ((self.min.x.to_bits() as u64) << 32) | self.min.y.to_bits() as u64;
        mix_seed(map_seed as u64, salt)
    }

    pub fn jagged_points(&self, map_seed: u32) -> Vec<Vec2> {
        let (dx, dy) = self.divisions();
        let mut rng = SeededRand::new(self.sub_seed(map_seed));
        jagged_aabb_points(&self.aabb(), dx, dy, self.offset(), &mut rng)
    }
}

fn round_divisions(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.round() as u32
    } else {
        0
    }
}

/// A patch with its generated outline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedPatch {
    pub patch: GroundPatch,
    pub points: Vec<Vec2>,
}

/// All ground patches of a map, outlines generated once at load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroundPatchSet {
    seed: u32,
    patches: Vec<ShapedPatch>,
}

impl GroundPatchSet {
    pub fn generate(patches: &[GroundPatch], seed: u32) -> Self {
        let patches = patches
            .iter()
            .map(|patch| ShapedPatch {
                points: patch.jagged_points(seed),
                patch: patch.clone(),
            })
            .collect();
        Self { seed, patches }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn len(&self) -> usize {
        self.patches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patches.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ShapedPatch> {
        self.patches.iter()
    }

    /// Patches of one paint order, in message order. The minimap pass only
    /// keeps patches flagged `use_as_map_shape`.
    pub fn pass(
        &self,
        order: PatchOrder,
        map_render: bool,
    ) -> impl Iterator<Item = &ShapedPatch> {
        self.patches.iter().filter(move |s| {
            s.patch.order == order && (!map_render || s.patch.use_as_map_shape)
        })
    }
}
