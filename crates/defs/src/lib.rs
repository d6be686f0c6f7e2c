//! Static definitions: maps (biome palette, sounds, game mode) and map
//! objects (collision footprint, paint order, minimap shapes).
//!
//! Definitions are read-only configuration looked up by string key. They
//! ship builtin and can be replaced from JSON files.

mod map;
mod object;

pub use map::{Biome, BiomeParticles, BiomeSound, GameMode, MapDef, MapDefs, Palette};
pub use object::{FloorDef, MapShape, MinimapDef, ObjectDef, ObjectDefs, ObjectKind, ZoomRegion};

/// Errors from definition lookup and loading.
#[derive(Debug, thiserror::Error)]
pub enum DefsError {
    #[error("unknown map definition: {0}")]
    UnknownMap(String),
    #[error("unknown map object type: {0}")]
    UnknownObject(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn crate_info() -> &'static str {
    "isleworld-defs v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("defs"));
    }

    #[test]
    fn error_messages_name_the_key() {
        let err = DefsError::UnknownMap("atlantis".into());
        assert_eq!(err.to_string(), "unknown map definition: atlantis");
    }
}
