//! Procedural arena used when the authored map cannot be loaded.

use macroquad::prelude::*;

use crate::collision::CollisionSet;
use crate::config::{FallbackConfig, MAX_ARENA_SIDE};
use crate::ir_map::{IrMap, Properties};
use crate::render::{blank_image, fill_rect, stroke_rect, Rgba};
use crate::spatial::TileCoord;
use crate::spawn::{SpawnCatalog, CUSTOMER_SPAWN};

const WALL: Rgba = [100, 100, 100, 255];
const FLOOR_LIGHT: Rgba = [200, 230, 200, 255];
const FLOOR_DARK: Rgba = [180, 210, 180, 255];
const GRID_LINE: Rgba = [150, 150, 150, 255];

const SPAWN_OFFSET: f32 = 100.0;

/// Everything a [`crate::TileMap`] needs, generated without I/O.
pub struct FallbackMap {
    /// Grid description of the arena.
    pub ir: IrMap,
    /// Border wall tiles.
    pub collisions: CollisionSet,
    /// Customer spawn points around the center.
    pub catalog: SpawnCatalog,
    /// Pre-rendered arena pixels.
    pub image: Image,
}

/// Builds a walled arena with a checkerboard floor and four customer spawn
/// points placed symmetrically around the center.
pub fn generate(config: &FallbackConfig) -> FallbackMap {
    let ts = config.tile_size.clamp(1, MAX_ARENA_SIDE / 3);
    // Three tiles minimum so the interior is never empty.
    let cols = (config.width.min(MAX_ARENA_SIDE) / ts).max(3);
    let rows = (config.height.min(MAX_ARENA_SIDE) / ts).max(3);
    let px_w = cols * ts;
    let px_h = rows * ts;

    let mut image = blank_image(px_w, px_h);
    let mut collisions = CollisionSet::default();

    for y in 0..rows {
        for x in 0..cols {
            let cell = Rect::new((x * ts) as f32, (y * ts) as f32, ts as f32, ts as f32);
            let border = x == 0 || y == 0 || x == cols - 1 || y == rows - 1;
            let color = if border {
                collisions
                    .blocked_tiles
                    .insert(TileCoord::new(x as i32, y as i32));
                WALL
            } else if (x + y) % 2 == 0 {
                FLOOR_LIGHT
            } else {
                FLOOR_DARK
            };
            fill_rect(&mut image, cell, color);
            stroke_rect(&mut image, cell, GRID_LINE);
        }
    }

    let cx = (px_w / 2) as f32;
    let cy = (px_h / 2) as f32;
    // Keep the points off the walls on small arenas.
    let dx = SPAWN_OFFSET.min((cx - 1.5 * ts as f32).max(0.0));
    let dy = SPAWN_OFFSET.min((cy - 1.5 * ts as f32).max(0.0));
    let mut catalog = SpawnCatalog::new();
    for p in [
        vec2(cx - dx, cy - dy),
        vec2(cx + dx, cy - dy),
        vec2(cx - dx, cy + dy),
        vec2(cx + dx, cy + dy),
    ] {
        catalog.insert(CUSTOMER_SPAWN, p);
    }

    tracing::info!(cols, rows, tile = ts, "generated fallback arena");

    FallbackMap {
        ir: IrMap {
            width: cols,
            height: rows,
            tile_w: ts,
            tile_h: ts,
            properties: Properties::new(),
            tilesets: Vec::new(),
            layers: Vec::new(),
        },
        collisions,
        catalog,
        image,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::pixel;

    #[test]
    fn default_arena_has_walls_and_spawns() {
        let map = generate(&FallbackConfig::default());

        assert_eq!((map.ir.width, map.ir.height), (20, 15));
        assert_eq!((map.image.width, map.image.height), (640, 480));
        // 2 * 20 + 2 * 13 perimeter cells
        assert_eq!(map.collisions.blocked_tiles.len(), 66);
        assert!(map.collisions.rects.is_empty());
        assert_eq!(
            map.catalog.get(CUSTOMER_SPAWN),
            Some(
                &[
                    vec2(220.0, 140.0),
                    vec2(420.0, 140.0),
                    vec2(220.0, 340.0),
                    vec2(420.0, 340.0)
                ][..]
            )
        );
    }

    #[test]
    fn floor_is_a_checkerboard_inside_grey_walls() {
        let map = generate(&FallbackConfig::default());

        assert_eq!(pixel(&map.image, 16, 16), WALL);
        assert_eq!(pixel(&map.image, 48, 48), FLOOR_LIGHT);
        assert_eq!(pixel(&map.image, 80, 48), FLOOR_DARK);
        assert_eq!(pixel(&map.image, 32, 40), GRID_LINE);
    }

    #[test]
    fn small_arena_keeps_spawns_inside() {
        let map = generate(&FallbackConfig {
            width: 96,
            height: 96,
            tile_size: 32,
        });
        let spawns = map.catalog.get(CUSTOMER_SPAWN).expect("spawns");
        assert!(spawns.iter().all(|p| *p == vec2(48.0, 48.0)));
    }

    #[test]
    fn unvalidated_wide_config_keeps_image_and_grid_in_sync() {
        let map = generate(&FallbackConfig {
            width: 100_000,
            height: 96,
            tile_size: 32,
        });
        assert_eq!(map.ir.pixel_width(), 65_504);
        assert_eq!(map.image.width as u32, map.ir.pixel_width());
        assert_eq!(map.image.height as u32, map.ir.pixel_height());
    }
}
