use glam::Vec2;
use isleworld_common::Aabb;

use crate::rng::SeededRand;

/// Jagged closed polygon tracing the edges of `aabb`.
///
/// Vertices run ll, lr, ur, ul. Each edge is split into `divisions` segments
/// whose interior vertices are pushed across the edge by up to `variation`.
/// With zero divisions on either axis the raw rectangle is returned.
pub fn jagged_aabb_points(
    aabb: &Aabb,
    divisions_x: u32,
    divisions_y: u32,
    variation: f32,
    rng: &mut SeededRand,
) -> Vec<Vec2> {
    let ll = aabb.min;
    let lr = Vec2::new(aabb.max.x, aabb.min.y);
    let ur = aabb.max;
    let ul = Vec2::new(aabb.min.x, aabb.max.y);

    if divisions_x == 0 || divisions_y == 0 {
        return vec![ll, lr, ur, ul];
    }

    let mut points = Vec::with_capacity(2 * (divisions_x as usize + divisions_y as usize));
    let mut edge = |from: Vec2, to: Vec2, divisions: u32, along_x: bool| {
        points.push(from);
        for i in 1..divisions {
            let pt = from.lerp(to, i as f32 / divisions as f32);
            let jitter = rng.range(-variation, variation);
            points.push(if along_x {
                Vec2::new(pt.x, pt.y + jitter)
            } else {
                Vec2::new(pt.x + jitter, pt.y)
            });
        }
    };
    edge(ll, lr, divisions_x, true);
    edge(lr, ur, divisions_y, false);
    edge(ur, ul, divisions_x, true);
    edge(ul, ll, divisions_y, false);
    points
}

#[cfg(test)]
mod tests {
    use super::*;

    fn box_100x50() -> Aabb {
        Aabb::new(Vec2::ZERO, Vec2::new(100.0, 50.0))
    }

    #[test]
    fn vertex_count_matches_divisions() {
        let mut rng = SeededRand::new(5);
        let pts = jagged_aabb_points(&box_100x50(), 20, 10, 5.0, &mut rng);
        assert_eq!(pts.len(), 60);
        assert_eq!(pts[0], Vec2::ZERO);
        assert_eq!(pts[20], Vec2::new(100.0, 0.0));
        assert_eq!(pts[30], Vec2::new(100.0, 50.0));
        assert_eq!(pts[50], Vec2::new(0.0, 50.0));
    }

    #[test]
    fn zero_divisions_is_plain_rectangle() {
        let mut rng = SeededRand::new(5);
        let pts = jagged_aabb_points(&box_100x50(), 0, 10, 5.0, &mut rng);
        assert_eq!(pts.len(), 4);
        let pts = jagged_aabb_points(&box_100x50(), 3, 0, 5.0, &mut rng);
        assert_eq!(pts.len(), 4);
    }

    #[test]
    fn jitter_stays_within_variation() {
        let mut rng = SeededRand::new(11);
        let pts = jagged_aabb_points(&box_100x50(), 20, 10, 5.0, &mut rng);
        for p in &pts[1..20] {
            assert!(p.y.abs() <= 5.0);
        }
        for p in &pts[21..30] {
            assert!((p.x - 100.0).abs() <= 5.0);
        }
    }
}
