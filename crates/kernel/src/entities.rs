//! Pooled entity kinds the world queries run over.

use glam::Vec2;
use isleworld_common::{Collider, Layer, SurfaceData, SurfaceKind, Transform};
use isleworld_defs::{ObjectDef, ObjectKind};
use isleworld_pool::PoolEntity;
use serde::{Deserialize, Serialize};

use crate::config::WorldConfig;
use crate::integrity::AlphaSample;

/// Per-tick inputs shared by every pool update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickContext {
    pub viewer_pos: Vec2,
    pub viewer_layer: Layer,
    pub ceiling_vision_hold: f32,
    pub obstacle_fade_rate: f32,
}

impl TickContext {
    pub fn new(viewer_pos: Vec2, viewer_layer: Layer, config: &WorldConfig) -> Self {
        Self {
            viewer_pos,
            viewer_layer,
            ceiling_vision_hold: config.ceiling_vision_hold,
            obstacle_fade_rate: config.obstacle_fade_rate,
        }
    }
}

/// A surface kind with its data, as carried by decals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacePayload {
    pub kind: SurfaceKind,
    #[serde(default)]
    pub data: SurfaceData,
}

/// A floor region of a building.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Surface {
    pub kind: SurfaceKind,
    #[serde(default)]
    pub data: SurfaceData,
    pub colliders: Vec<Collider>,
}

impl Surface {
    pub fn new(kind: SurfaceKind, colliders: Vec<Collider>) -> Self {
        Self {
            kind,
            data: SurfaceData::default(),
            colliders,
        }
    }

    pub fn contains_point(&self, pos: Vec2) -> bool {
        self.colliders.iter().any(|c| c.contains_point(pos))
    }
}

/// Ceiling state of a building.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ceiling {
    /// Seconds the ceiling stays hidden; positive while the viewer is under it.
    pub vision_ticker: f32,
    pub dead: bool,
    pub masks: Vec<Collider>,
    pub stairs: Vec<Collider>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub type_name: String,
    pub transform: Transform,
    pub layer: Layer,
    pub z_idx: i32,
    pub collider: Collider,
    pub dead: bool,
    pub alpha: f32,
}

impl Obstacle {
    /// Instantiate an obstacle definition. `None` when `def` is not an obstacle.
    pub fn from_def(
        type_name: &str,
        def: &ObjectDef,
        transform: Transform,
        layer: Layer,
    ) -> Option<Self> {
        match &def.kind {
            ObjectKind::Obstacle { collision, img_z_idx } => Some(Self {
                type_name: type_name.to_string(),
                transform,
                layer,
                z_idx: *img_z_idx,
                collider: collision.transform(&transform),
                dead: false,
                alpha: 1.0,
            }),
            _ => None,
        }
    }
}

impl PoolEntity for Obstacle {
    type Context = TickContext;

    fn update(&mut self, dt: f32, ctx: &TickContext) {
        let target = if self.dead { 0.0 } else { 1.0 };
        let step = ctx.obstacle_fade_rate * dt;
        self.alpha = if self.alpha < target {
            (self.alpha + step).min(target)
        } else {
            (self.alpha - step).max(target)
        };
    }
}

impl AlphaSample for Obstacle {
    fn is_exempt(&self) -> bool {
        self.dead
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub type_name: String,
    pub transform: Transform,
    pub layer: Layer,
    pub z_idx: i32,
    pub surfaces: Vec<Surface>,
    pub ceiling: Ceiling,
}

impl Building {
    /// Instantiate a building definition. Floors and stairs are moved into
    /// world space and the zoom-in regions become the ceiling masks.
    /// `None` when `def` is not a building.
    pub fn from_def(
        type_name: &str,
        def: &ObjectDef,
        transform: Transform,
        layer: Layer,
    ) -> Option<Self> {
        let ObjectKind::Building {
            z_idx,
            zoom_regions,
            floor,
            stairs,
            ..
        } = &def.kind
        else {
            return None;
        };
        let place = |c: &Collider| c.transform(&transform);
        Some(Self {
            type_name: type_name.to_string(),
            transform,
            layer,
            z_idx: *z_idx,
            surfaces: floor
                .iter()
                .map(|f| Surface {
                    kind: f.kind,
                    data: f.data.clone(),
                    colliders: f.colliders.iter().map(place).collect(),
                })
                .collect(),
            ceiling: Ceiling {
                masks: zoom_regions
                    .iter()
                    .filter_map(|r| r.zoom_in.as_ref())
                    .map(place)
                    .collect(),
                stairs: stairs.iter().map(place).collect(),
                ..Ceiling::default()
            },
        })
    }

    pub fn is_inside_ceiling(&self, shape: &Collider) -> bool {
        self.ceiling.masks.iter().any(|m| m.intersects(shape))
    }

    /// Whether the viewer currently sees under the ceiling.
    pub fn ceiling_visible(&self) -> bool {
        !self.ceiling.dead && self.ceiling.vision_ticker > 0.0
    }

    fn viewer_inside(&self, ctx: &TickContext) -> bool {
        let viewer = Collider::point(ctx.viewer_pos);
        self.layer.compatible(ctx.viewer_layer)
            && (self.is_inside_ceiling(&viewer)
                || self.ceiling.stairs.iter().any(|s| s.intersects(&viewer)))
    }
}

impl PoolEntity for Building {
    type Context = TickContext;

    fn update(&mut self, dt: f32, ctx: &TickContext) {
        self.ceiling.vision_ticker = (self.ceiling.vision_ticker - dt).max(0.0);
        if !self.ceiling.dead && self.viewer_inside(ctx) {
            self.ceiling.vision_ticker = ctx.ceiling_vision_hold;
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Structure {
    pub type_name: String,
    pub transform: Transform,
    pub layer: Layer,
    pub stairs: Vec<Collider>,
    pub masks: Vec<Collider>,
    /// Set each tick when the viewer stands on one of the stairs.
    pub viewer_on_stairs: bool,
}

impl Structure {
    /// Instantiate a structure definition, moving its stairs and masks into
    /// world space. `None` when `def` is not a structure.
    pub fn from_def(
        type_name: &str,
        def: &ObjectDef,
        transform: Transform,
        layer: Layer,
    ) -> Option<Self> {
        let ObjectKind::Structure { stairs, masks, .. } = &def.kind else {
            return None;
        };
        Some(Self {
            type_name: type_name.to_string(),
            transform,
            layer,
            stairs: stairs.iter().map(|c| c.transform(&transform)).collect(),
            masks: masks.iter().map(|c| c.transform(&transform)).collect(),
            viewer_on_stairs: false,
        })
    }

    pub fn inside_stairs(&self, shape: &Collider) -> bool {
        self.stairs.iter().any(|s| s.intersects(shape))
    }

    pub fn inside_mask(&self, shape: &Collider) -> bool {
        self.masks.iter().any(|m| m.intersects(shape))
    }
}

impl PoolEntity for Structure {
    type Context = TickContext;

    fn update(&mut self, _dt: f32, ctx: &TickContext) {
        self.viewer_on_stairs = self.inside_stairs(&Collider::point(ctx.viewer_pos));
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decal {
    pub type_name: String,
    pub layer: Layer,
    pub collider: Collider,
    /// Surface this decal paints over the ground, if any.
    pub surface: Option<SurfacePayload>,
    /// Remaining seconds; `None` lives until despawned.
    pub life: Option<f32>,
}

impl Decal {
    pub fn new(type_name: &str, layer: Layer, collider: Collider) -> Self {
        Self {
            type_name: type_name.to_string(),
            layer,
            collider,
            surface: None,
            life: None,
        }
    }

    pub fn with_surface(mut self, kind: SurfaceKind, data: SurfaceData) -> Self {
        self.surface = Some(SurfacePayload { kind, data });
        self
    }

    pub fn with_life(mut self, seconds: f32) -> Self {
        self.life = Some(seconds);
        self
    }
}

impl PoolEntity for Decal {
    type Context = TickContext;

    fn update(&mut self, dt: f32, _ctx: &TickContext) {
        if let Some(life) = self.life.as_mut() {
            *life -= dt;
        }
    }

    fn is_active(&self) -> bool {
        self.life.is_none_or(|life| life > 0.0)
    }
}

/// Snapshot of a renderer-owned particle, as seen by the integrity monitor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub active: bool,
    /// Fading particles may legitimately reach any alpha.
    pub fade: bool,
    pub alpha: f32,
}

impl AlphaSample for Particle {
    fn is_live(&self) -> bool {
        self.active
    }

    fn is_exempt(&self) -> bool {
        self.fade
    }

    fn alpha(&self) -> f32 {
        self.alpha
    }
}
