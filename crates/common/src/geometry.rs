//! 2D geometry primitives shared by terrain generation and world queries.
//!
//! Degenerate inputs (inverted boxes, negative radii, polygons with fewer
//! than three vertices) never contain or intersect anything.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::types::Transform;

/// Radius used for point queries, so points on a shared boundary still hit.
pub const POINT_EPSILON: f32 = 0.0001;

/// Axis-aligned bounding box, inclusive on all edges.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb {
    pub fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty slice.
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut aabb = Self::new(*first, *first);
        for p in rest {
            aabb.min = aabb.min.min(*p);
            aabb.max = aabb.max.max(*p);
        }
        Some(aabb)
    }

    pub fn is_degenerate(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    pub fn extent(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains_point(&self, p: Vec2) -> bool {
        !self.is_degenerate()
            && p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Aabb) -> bool {
        !self.is_degenerate()
            && !other.is_degenerate()
            && self.min.x <= other.max.x
            && other.min.x <= self.max.x
            && self.min.y <= other.max.y
            && other.min.y <= self.max.y
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb::new(self.min.min(other.min), self.max.max(other.max))
    }
}

/// Collision shape used for containment and occlusion tests.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Collider {
    Circle { pos: Vec2, rad: f32 },
    Aabb { min: Vec2, max: Vec2 },
}

impl Collider {
    pub fn circle(pos: Vec2, rad: f32) -> Self {
        Self::Circle { pos, rad }
    }

    pub fn aabb(min: Vec2, max: Vec2) -> Self {
        Self::Aabb { min, max }
    }

    /// Zero-radius collider at `p`.
    pub fn point(p: Vec2) -> Self {
        Self::Circle { pos: p, rad: 0.0 }
    }

    pub fn is_degenerate(&self) -> bool {
        match *self {
            Self::Circle { pos, rad } => !(rad >= 0.0 && rad.is_finite() && pos.is_finite()),
            Self::Aabb { min, max } => Aabb::new(min, max).is_degenerate(),
        }
    }

    /// Circle-vs-shape intersection, touching counts.
    pub fn intersects_circle(&self, pos: Vec2, rad: f32) -> bool {
        if self.is_degenerate() || !(rad >= 0.0) {
            return false;
        }
        match *self {
            Self::Circle { pos: c, rad: r } => {
                let reach = r + rad;
                c.distance_squared(pos) <= reach * reach
            }
            Self::Aabb { min, max } => {
                let closest = pos.clamp(min, max);
                closest.distance_squared(pos) <= rad * rad
            }
        }
    }

    /// Point containment with an epsilon radius.
    pub fn contains_point(&self, p: Vec2) -> bool {
        self.intersects_circle(p, POINT_EPSILON)
    }

    pub fn intersects(&self, other: &Collider) -> bool {
        if other.is_degenerate() {
            return false;
        }
        match (*self, *other) {
            (_, Self::Circle { pos, rad }) => self.intersects_circle(pos, rad),
            (Self::Circle { pos, rad }, Self::Aabb { .. }) => other.intersects_circle(pos, rad),
            (Self::Aabb { min, max }, Self::Aabb { min: omin, max: omax }) => {
                Aabb::new(min, max).intersects(&Aabb::new(omin, omax))
            }
        }
    }

    pub fn bounds(&self) -> Aabb {
        match *self {
            Self::Circle { pos, rad } => Aabb::new(pos - Vec2::splat(rad), pos + Vec2::splat(rad)),
            Self::Aabb { min, max } => Aabb::new(min, max),
        }
    }

    /// Map a definition-space collider into world space.
    pub fn transform(&self, t: &Transform) -> Collider {
        match *self {
            Self::Circle { pos, rad } => Self::Circle {
                pos: t.pos + rotate_quarter(pos * t.scale, t.ori),
                rad: rad * t.scale,
            },
            Self::Aabb { min, max } => {
                let a = rotate_quarter(min * t.scale, t.ori);
                let b = rotate_quarter(max * t.scale, t.ori);
                Self::Aabb {
                    min: t.pos + a.min(b),
                    max: t.pos + a.max(b),
                }
            }
        }
    }
}

impl From<Vec2> for Collider {
    fn from(p: Vec2) -> Self {
        Collider::point(p)
    }
}

impl From<Aabb> for Collider {
    fn from(aabb: Aabb) -> Self {
        Collider::aabb(aabb.min, aabb.max)
    }
}

/// Rotate by `ori` quarter turns counter-clockwise, exactly.
pub fn rotate_quarter(v: Vec2, ori: u8) -> Vec2 {
    match ori % 4 {
        0 => v,
        1 => Vec2::new(-v.y, v.x),
        2 => Vec2::new(-v.x, -v.y),
        _ => Vec2::new(v.y, -v.x),
    }
}

/// Even-odd point-in-polygon test over a closed vertex loop.
pub fn point_in_polygon(p: Vec2, poly: &[Vec2]) -> bool {
    if poly.len() < 3 {
        return false;
    }
    let mut inside = false;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        let (a, b) = (poly[i], poly[j]);
        if (a.y > p.y) != (b.y > p.y) && p.x < (b.x - a.x) * (p.y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

pub fn dist_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len2 = ab.length_squared();
    let t = if len2 > 0.0 {
        ((p - a).dot(ab) / len2).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (a + ab * t).distance(p)
}

/// Distance from `p` to the nearest edge of a closed polygon.
/// Empty polygons are infinitely far away.
pub fn dist_to_polygon(p: Vec2, poly: &[Vec2]) -> f32 {
    match poly {
        [] => f32::INFINITY,
        [only] => only.distance(p),
        _ => {
            let mut best = f32::INFINITY;
            let mut j = poly.len() - 1;
            for i in 0..poly.len() {
                best = best.min(dist_to_segment(p, poly[j], poly[i]));
                j = i;
            }
            best
        }
    }
}

/// Signed area of a closed polygon; positive when counter-clockwise.
pub fn signed_area(poly: &[Vec2]) -> f32 {
    if poly.len() < 3 {
        return 0.0;
    }
    let mut twice = 0.0;
    let mut j = poly.len() - 1;
    for i in 0..poly.len() {
        twice += poly[j].x * poly[i].y - poly[i].x * poly[j].y;
        j = i;
    }
    twice * 0.5
}
