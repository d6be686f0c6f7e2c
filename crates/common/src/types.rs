use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable identifier for a pooled entity. Unique within its pool and never
/// reused after the entity is despawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u32);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Layer bitmask.
///
/// Bit 0 selects the underground stratum, bit 1 marks "on stairs" (visible
/// from both strata). [`Layer::ANY`] matches every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Layer(pub u8);

impl Layer {
    pub const GROUND: Layer = Layer(0);
    pub const UNDERGROUND: Layer = Layer(1);
    pub const STAIRS_BIT: u8 = 0x2;
    pub const ANY: Layer = Layer(0xff);

    pub fn on_stairs(self) -> bool {
        self != Self::ANY && self.0 & Self::STAIRS_BIT != 0
    }

    /// Whether two layers can see each other: same stratum, both on stairs,
    /// or either side is [`Layer::ANY`].
    pub fn compatible(self, other: Layer) -> bool {
        if self == Self::ANY || other == Self::ANY {
            return true;
        }
        (self.0 & 0x1) == (other.0 & 0x1) || (self.on_stairs() && other.on_stairs())
    }
}

/// 0xRRGGBB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(pub u32);

impl Color {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{:06x}", self.0)
    }
}

/// Ground material reported by surface queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SurfaceKind {
    Grass,
    Sand,
    Water,
    Stone,
    StoneStep,
    Snow,
    Tile,
    Wood,
    Metal,
    Carpet,
    Asphalt,
    Container,
    Shack,
    Bunker,
}

impl SurfaceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Grass => "grass",
            Self::Sand => "sand",
            Self::Water => "water",
            Self::Stone => "stone",
            Self::StoneStep => "stone-step",
            Self::Snow => "snow",
            Self::Tile => "tile",
            Self::Wood => "wood",
            Self::Metal => "metal",
            Self::Carpet => "carpet",
            Self::Asphalt => "asphalt",
            Self::Container => "container",
            Self::Shack => "shack",
            Self::Bunker => "bunker",
        }
    }
}

impl std::fmt::Display for SurfaceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extra data carried by a surface. Water surfaces get their colours
/// filled from the biome palette when left unset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceData {
    #[serde(default)]
    pub water_color: Option<Color>,
    #[serde(default)]
    pub ripple_color: Option<Color>,
    /// Index of the river the point lies in.
    #[serde(default)]
    pub river: Option<usize>,
}

/// Placement of a map object: position, quarter-turn orientation, uniform scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub pos: Vec2,
    /// Quarter turns counter-clockwise, 0..=3.
    #[serde(default)]
    pub ori: u8,
    #[serde(default = "unit_scale")]
    pub scale: f32,
}

fn unit_scale() -> f32 {
    1.0
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            pos: Vec2::ZERO,
            ori: 0,
            scale: 1.0,
        }
    }
}

impl Transform {
    pub fn at(pos: Vec2) -> Self {
        Self {
            pos,
            ..Self::default()
        }
    }

    /// Orientation in radians.
    pub fn rotation(&self) -> f32 {
        (self.ori % 4) as f32 * std::f32::consts::FRAC_PI_2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layer_compatibility() {
        assert!(Layer::GROUND.compatible(Layer::GROUND));
        assert!(!Layer::GROUND.compatible(Layer::UNDERGROUND));
        assert!(Layer(2).compatible(Layer(3)));
        assert!(Layer(2).compatible(Layer::GROUND));
        assert!(!Layer(3).compatible(Layer::GROUND));
        assert!(Layer::ANY.compatible(Layer::UNDERGROUND));
        assert!(Layer::UNDERGROUND.compatible(Layer::ANY));
    }

    #[test]
    fn any_layer_is_not_on_stairs() {
        assert!(!Layer::ANY.on_stairs());
        assert!(Layer(2).on_stairs());
        assert!(!Layer::UNDERGROUND.on_stairs());
    }

    #[test]
    fn color_formats_as_hex() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56), Color(0x123456));
        assert_eq!(Color(0x80af49).to_string(), "#80af49");
    }

    #[test]
    fn surface_kind_names_match_serde() {
        let json = serde_json::to_string(&SurfaceKind::StoneStep).unwrap();
        assert_eq!(json, "\"stone-step\"");
        assert_eq!(SurfaceKind::StoneStep.to_string(), "stone-step");
    }

    #[test]
    fn surface_data_fields_are_optional() {
        let d: SurfaceData = serde_json::from_str(r#"{"water_color":255}"#).unwrap();
        assert_eq!(d.water_color, Some(Color(0xff)));
        assert_eq!(d.ripple_color, None);
        assert_eq!(d.river, None);
    }

    #[test]
    fn transform_default_is_identity() {
        let t = Transform::default();
        assert_eq!(t.pos, Vec2::ZERO);
        assert_eq!(t.ori, 0);
        assert_eq!(t.scale, 1.0);
        assert_eq!(t.rotation(), 0.0);
    }

    #[test]
    fn transform_deserializes_with_defaults() {
        let t: Transform = serde_json::from_str(r#"{"pos":[3.0,4.0]}"#).unwrap();
        assert_eq!(t.pos, Vec2::new(3.0, 4.0));
        assert_eq!(t.scale, 1.0);
    }
}
