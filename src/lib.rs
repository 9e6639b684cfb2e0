#![warn(missing_docs)]

//! Tiled JSON arenas for Macroquad: collision extraction, a walkability
//! cache, spawn point resolution and a generated fallback map.

pub mod collision;
pub mod config;
mod error;
mod fallback;
mod ir_map;
mod loader {
    pub mod context;
    pub mod json_loader;
}
mod map;
pub mod render;
pub mod resource;
pub mod spatial;
pub mod spawn;

pub use collision::CollisionSet;
pub use config::{EngineConfig, FallbackConfig};
pub use error::LoadError;
pub use fallback::{generate as generate_fallback, FallbackMap};
pub use ir_map::{
    IrLayer, IrLayerKind, IrMap, IrObject, IrObjectShape, IrTileMetadata, IrTileset, Properties,
    PropertyValue,
};
pub use loader::context::MapLoadContext;
pub use loader::json_loader::{decode_map_file_to_ir, decode_map_str_to_ir};
pub use map::{MapSource, MapState, TileMap};
pub use render::{Composite, DrawTarget, ScreenTarget};
pub use resource::{placeholder_image, FileResolver, PlaceholderResolver, ResourceResolver};
pub use spatial::{CacheMode, MapBounds, TileCoord, WalkabilityCache};
pub use spawn::{SpawnCatalog, SpawnTier, CUSTOMER_SPAWN};
