//! Tile ids, map geometry and the walkability cache.

mod index;
mod walkability;

pub use index::*;
pub use walkability::{CacheMode, WalkabilityCache};
