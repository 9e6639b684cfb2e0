//! Collision extraction.
//!
//! Turns authored map data into the static geometry the walkability cache
//! consults: rectangles from collision objects and a set of blocked tiles from
//! tile metadata or legacy layer naming.

use std::collections::HashSet;

use macroquad::prelude::*;

use crate::ir_map::{IrLayerKind, IrMap};
use crate::spatial::{TileCoord, TileId};

/// Layer names that block every non-empty cell they contain.
pub const LEGACY_UNWALKABLE_LAYERS: [&str; 3] = ["collision", "unwalkable", "ocean"];

/// Object class marking a collision rectangle.
pub const COLLISION_CLASS: &str = "collision";

/// Boolean tile property marking a blocking tile.
pub const COLLIDES_PROPERTY: &str = "collides";

/// Static collision geometry of one map instance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CollisionSet {
    /// World-space rectangles from collision objects.
    pub rects: Vec<Rect>,
    /// Tiles that block movement.
    pub blocked_tiles: HashSet<TileCoord>,
}

impl CollisionSet {
    /// `true` when nothing blocks movement.
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty() && self.blocked_tiles.is_empty()
    }
}

/// Whether a tile layer blocks movement by name alone.
pub fn is_legacy_unwalkable(layer_name: &str) -> bool {
    LEGACY_UNWALKABLE_LAYERS
        .iter()
        .any(|n| layer_name.eq_ignore_ascii_case(n))
}

/// Whether objects of this group are collision zones by group name.
pub fn is_collision_group(group_name: &str) -> bool {
    group_name.to_ascii_lowercase().contains(COLLISION_CLASS)
}

/// Scans the map once and collects its collision geometry.
///
/// Tiles whose gid has no tileset or no metadata are walkable; a damaged
/// tileset never aborts extraction.
pub fn extract(map: &IrMap) -> CollisionSet {
    let mut set = CollisionSet::default();

    for (group, objects) in map.object_groups() {
        let whole_group = is_collision_group(&group.name);
        set.rects.extend(
            objects
                .iter()
                .filter(|o| whole_group || o.class_name == COLLISION_CLASS)
                .map(|o| o.rect()),
        );
    }

    let mut unknown_gids = 0usize;
    for layer in map.layers.iter().filter(|l| l.visible) {
        let IrLayerKind::Tiles { width, data, .. } = &layer.kind else {
            continue;
        };
        if *width == 0 {
            continue;
        }
        let legacy = is_legacy_unwalkable(&layer.name);

        for (idx, raw) in data.iter().enumerate() {
            let id = TileId(*raw);
            if id.is_empty() {
                continue;
            }

            let blocks = legacy
                || match map.tileset_for_gid(id.clean()) {
                    Some(_) => map
                        .tile_properties(id.clean())
                        .and_then(|p| p.get_bool(COLLIDES_PROPERTY))
                        .unwrap_or(false),
                    None => {
                        unknown_gids += 1;
                        false
                    }
                };

            if blocks {
                set.blocked_tiles
                    .insert(TileCoord::new((idx % width) as i32, (idx / width) as i32));
            }
        }
    }

    if unknown_gids > 0 {
        tracing::warn!(unknown_gids, "tiles without tileset metadata treated as walkable");
    }
    tracing::info!(
        rects = set.rects.len(),
        blocked_tiles = set.blocked_tiles.len(),
        "extracted collision geometry"
    );
    set
}
