use glam::Vec2;
use isleworld_common::{Aabb, dist_to_polygon, point_in_polygon, signed_area};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::jagged::jagged_aabb_points;
use crate::rng::SeededRand;

/// Centre line of a river as it arrives in the map-load message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiverSpec {
    pub points: Vec<Vec2>,
    pub width: f32,
    #[serde(default)]
    pub looped: bool,
}

/// Everything terrain generation depends on. Equal specs give bit-identical
/// terrain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerrainSpec {
    pub width: f32,
    pub height: f32,
    pub seed: u32,
    pub shore_inset: f32,
    pub grass_inset: f32,
    #[serde(default)]
    pub rivers: Vec<RiverSpec>,
}

/// Generator constants. The defaults are part of the determinism contract
/// between client and server; change them only in lockstep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    pub shore_divisions: u32,
    pub shore_variation: f32,
    pub grass_variation: f32,
}

/// Upper bound on the extra inward steps taken for one grass vertex.
const MAX_GRASS_NUDGES: u32 = 64;

impl TerrainParams {
    /// Smallest grass inset that keeps grass vertices clear of the jagged
    /// shore: shore jitter on both sides of an edge plus the grass jitter.
    /// Smaller requested insets are raised to this value.
    pub fn min_grass_inset(&self) -> f32 {
        2.0 * self.shore_variation + self.grass_variation
    }
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            shore_divisions: 64,
            shore_variation: 3.0,
            grass_variation: 2.0,
        }
    }
}

/// A river band: water surrounded by a walkable shore strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct River {
    pub aabb: Aabb,
    pub shore_poly: Vec<Vec2>,
    pub water_poly: Vec<Vec2>,
    pub width: f32,
    pub looped: bool,
}

impl River {
    /// Build the water and shore polygons around a centre line.
    ///
    /// Returns `None` for specs that cannot form a polygon (fewer than two
    /// points, non-positive width).
    pub fn from_spec(spec: &RiverSpec) -> Option<River> {
        if spec.points.len() < 2 || !(spec.width > 0.0 && spec.width.is_finite()) {
            return None;
        }
        let half = spec.width * 0.5;
        let shore_width = (spec.width * 0.75).clamp(4.0, 8.0);
        let (water_poly, shore_poly) = if spec.looped {
            (
                ring_band(&spec.points, half),
                ring_band(&spec.points, half + shore_width),
            )
        } else {
            (
                line_band(&spec.points, half),
                line_band(&spec.points, half + shore_width),
            )
        };
        let aabb = Aabb::from_points(&shore_poly)?;
        Some(River {
            aabb,
            shore_poly,
            water_poly,
            width: spec.width,
            looped: spec.looped,
        })
    }

    pub fn on_shore(&self, p: Vec2) -> bool {
        self.aabb.contains_point(p) && point_in_polygon(p, &self.shore_poly)
    }

    pub fn in_water(&self, p: Vec2) -> bool {
        self.aabb.contains_point(p) && point_in_polygon(p, &self.water_poly)
    }
}

fn tangent(points: &[Vec2], i: usize, looped: bool) -> Vec2 {
    let n = points.len();
    let prev = match (i, looped) {
        (0, true) => points[n - 1],
        (0, false) => points[0],
        _ => points[i - 1],
    };
    let next = match (i + 1 == n, looped) {
        (true, true) => points[0],
        (true, false) => points[i],
        _ => points[i + 1],
    };
    (next - prev).normalize_or_zero()
}

/// Polygon enclosing an open polyline at distance `dist` on both sides.
fn line_band(points: &[Vec2], dist: f32) -> Vec<Vec2> {
    let normals: Vec<Vec2> = (0..points.len())
        .map(|i| tangent(points, i, false).perp())
        .collect();
    let left = points.iter().zip(&normals).map(|(p, n)| *p + *n * dist);
    let right = points.iter().zip(&normals).rev().map(|(p, n)| *p - *n * dist);
    left.chain(right).collect()
}

/// Annulus around a closed polyline, encoded as one even-odd polygon: the
/// outer ring, a bridge, then the inner ring walked backwards. The bridge
/// edges coincide and cancel out under the even-odd rule.
fn ring_band(points: &[Vec2], dist: f32) -> Vec<Vec2> {
    let outward = if signed_area(points) > 0.0 { -1.0 } else { 1.0 };
    let normals: Vec<Vec2> = (0..points.len())
        .map(|i| tangent(points, i, true).perp() * outward)
        .collect();
    let outer: Vec<Vec2> = points
        .iter()
        .zip(&normals)
        .map(|(p, n)| *p + *n * dist)
        .collect();
    let inner: Vec<Vec2> = points
        .iter()
        .zip(&normals)
        .map(|(p, n)| *p - *n * dist)
        .collect();
    let mut poly = Vec::with_capacity(outer.len() + inner.len() + 2);
    poly.extend_from_slice(&outer);
    poly.push(outer[0]);
    poly.push(inner[0]);
    poly.extend(inner[1..].iter().rev());
    poly.push(inner[0]);
    poly
}

/// Immutable-after-load terrain: ocean shore, grass interior, rivers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainModel {
    pub width: f32,
    pub height: f32,
    pub seed: u32,
    pub shore: Vec<Vec2>,
    pub grass: Vec<Vec2>,
    pub rivers: Vec<River>,
}

impl TerrainModel {
    pub fn generate(spec: &TerrainSpec) -> Self {
        Self::generate_with(spec, &TerrainParams::default())
    }

    pub fn generate_with(spec: &TerrainSpec, params: &TerrainParams) -> Self {
        let _span = tracing::debug_span!("generate_terrain", seed = spec.seed).entered();
        let mut rng = SeededRand::new(spec.seed as u64);

        let shore_box = Aabb::new(
            Vec2::splat(spec.shore_inset),
            Vec2::new(spec.width - spec.shore_inset, spec.height - spec.shore_inset),
        );
        let shore = jagged_aabb_points(
            &shore_box,
            params.shore_divisions,
            params.shore_divisions,
            params.shore_variation,
            &mut rng,
        );

        let min_inset = params.min_grass_inset();
        let grass_inset = if spec.grass_inset < min_inset {
            tracing::warn!(
                requested = spec.grass_inset,
                min = min_inset,
                "grass inset too small, raised to keep grass inside the shore"
            );
            min_inset
        } else {
            spec.grass_inset
        };

        let center = Vec2::new(spec.width * 0.5, spec.height * 0.5);
        let step = params.shore_variation.max(1.0);
        let grass = shore
            .iter()
            .map(|p| {
                let to_center = (center - *p).normalize_or_zero();
                let jitter = rng.range(-params.grass_variation, params.grass_variation);
                let inset = (grass_inset + jitter).max(0.0);
                let mut g = *p + to_center * inset;
                // Vertices near the corners of elongated maps move mostly
                // along the edge; push them on until they clear the shore.
                let mut nudges = 0;
                while !point_in_polygon(g, &shore) && nudges < MAX_GRASS_NUDGES {
                    g += to_center * step;
                    nudges += 1;
                }
                g
            })
            .collect();

        let rivers = spec
            .rivers
            .iter()
            .enumerate()
            .filter_map(|(i, r)| {
                let river = River::from_spec(r);
                if river.is_none() {
                    tracing::warn!(
                        index = i,
                        points = r.points.len(),
                        width = r.width,
                        "skipping degenerate river"
                    );
                }
                river
            })
            .collect();

        Self {
            width: spec.width,
            height: spec.height,
            seed: spec.seed,
            shore,
            grass,
            rivers,
        }
    }

    pub fn is_in_ocean(&self, p: Vec2) -> bool {
        !point_in_polygon(p, &self.shore)
    }

    pub fn distance_to_shore(&self, p: Vec2) -> f32 {
        dist_to_polygon(p, &self.shore)
    }

    pub fn vertex_count(&self) -> usize {
        self.shore.len()
            + self.grass.len()
            + self
                .rivers
                .iter()
                .map(|r| r.shore_poly.len() + r.water_poly.len())
                .sum::<usize>()
    }

    /// Content hash of every vertex bit pattern. Equal fingerprints mean
    /// both sides generated identical geometry.
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = Sha256::new();
        hasher.update(self.seed.to_le_bytes());
        hasher.update(self.width.to_bits().to_le_bytes());
        hasher.update(self.height.to_bits().to_le_bytes());
        let mut polys: Vec<&[Vec2]> = vec![self.shore.as_slice(), self.grass.as_slice()];
        for r in &self.rivers {
            polys.push(r.shore_poly.as_slice());
            polys.push(r.water_poly.as_slice());
        }
        for poly in polys {
            hasher.update((poly.len() as u64).to_le_bytes());
            for v in poly {
                hasher.update(v.x.to_bits().to_le_bytes());
                hasher.update(v.y.to_bits().to_le_bytes());
            }
        }
        let result = hasher.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&result[..8]);
        u64::from_le_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(seed: u32) -> TerrainSpec {
        TerrainSpec {
            width: 512.0,
            height: 512.0,
            seed,
            shore_inset: 48.0,
            grass_inset: 18.0,
            rivers: vec![RiverSpec {
                points: vec![
                    Vec2::new(256.0, 0.0),
                    Vec2::new(256.0, 256.0),
                    Vec2::new(300.0, 512.0),
                ],
                width: 12.0,
                looped: false,
            }],
        }
    }

    #[test]
    fn generation_is_bit_identical() {
        let a = TerrainModel::generate(&spec(1337));
        let b = TerrainModel::generate(&spec(1337));
        assert_eq!(a, b);
        let bits = |m: &TerrainModel| -> Vec<u32> {
            m.shore.iter().chain(&m.grass).flat_map(|v| [v.x.to_bits(), v.y.to_bits()]).collect()
        };
        assert_eq!(bits(&a), bits(&b));
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn different_seeds_differ() {
        let a = TerrainModel::generate(&spec(1));
        let b = TerrainModel::generate(&spec(2));
        assert_ne!(a.shore, b.shore);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn grass_lies_inside_shore() {
        let m = TerrainModel::generate(&spec(42));
        assert_eq!(m.grass.len(), m.shore.len());
        for g in &m.grass {
            assert!(point_in_polygon(*g, &m.shore), "grass vertex {g} escaped the shore");
        }
    }

    #[test]
    fn small_grass_inset_stays_inside_shore() {
        for grass_inset in [0.0, 0.5, 1.0, 2.0, 18.0] {
            for seed in 0..50 {
                let m = TerrainModel::generate(&TerrainSpec {
                    width: 512.0,
                    height: 300.0,
                    seed,
                    shore_inset: 48.0,
                    grass_inset,
                    rivers: Vec::new(),
                });
                let outside = m
                    .grass
                    .iter()
                    .filter(|g| !point_in_polygon(**g, &m.shore))
                    .count();
                assert_eq!(outside, 0, "inset {grass_inset}, seed {seed}");
            }
        }
    }

    #[test]
    fn min_grass_inset_covers_both_jitters() {
        let params = TerrainParams::default();
        assert_eq!(params.min_grass_inset(), 8.0);
    }

    #[test]
    fn ocean_and_shore_distance() {
        let m = TerrainModel::generate(&spec(42));
        assert!(m.is_in_ocean(Vec2::new(5.0, 5.0)));
        assert!(!m.is_in_ocean(Vec2::new(256.0, 256.0)));
        let d = m.distance_to_shore(Vec2::new(5.0, 256.0));
        assert!(d > 30.0 && d < 50.0, "distance {d}");
    }

    #[test]
    fn river_water_inside_shore() {
        let m = TerrainModel::generate(&spec(42));
        let river = &m.rivers[0];
        let on_line = Vec2::new(256.0, 128.0);
        assert!(river.in_water(on_line));
        assert!(river.on_shore(on_line));
        // Half width 6, shore strip clamp(9, 4, 8) = 8.
        let bank = Vec2::new(256.0 + 10.0, 128.0);
        assert!(river.on_shore(bank));
        assert!(!river.in_water(bank));
        assert!(!river.on_shore(Vec2::new(256.0 + 20.0, 128.0)));
    }

    #[test]
    fn looped_river_is_a_band() {
        let ring = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(100.0, 0.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(0.0, 100.0),
        ];
        let river = River::from_spec(&RiverSpec {
            points: ring,
            width: 10.0,
            looped: true,
        })
        .unwrap();
        assert!(river.in_water(Vec2::new(50.0, 0.0)));
        assert!(river.in_water(Vec2::new(50.0, 3.0)));
        assert!(!river.in_water(Vec2::new(50.0, 50.0)));
        assert!(!river.on_shore(Vec2::new(50.0, 50.0)));
        assert!(river.on_shore(Vec2::new(50.0, -7.0)));
        assert!(!river.in_water(Vec2::new(50.0, -7.0)));
    }

    #[test]
    fn degenerate_rivers_are_skipped() {
        let mut s = spec(3);
        s.rivers.push(RiverSpec {
            points: vec![Vec2::ONE],
            width: 10.0,
            looped: false,
        });
        s.rivers.push(RiverSpec {
            points: vec![Vec2::ONE, Vec2::splat(50.0)],
            width: 0.0,
            looped: false,
        });
        let m = TerrainModel::generate(&s);
        assert_eq!(m.rivers.len(), 1);
    }

    #[test]
    fn spec_deserializes_from_camel_case() {
        let json = r#"{"width":100,"height":100,"seed":9,"shoreInset":10,"grassInset":5}"#;
        let s: TerrainSpec = serde_json::from_str(json).unwrap();
        assert_eq!(s.shore_inset, 10.0);
        assert!(s.rivers.is_empty());
    }
}
