//! Debug overlays for authoring: walkability grid and spawn markers.

use macroquad::prelude::*;

use crate::spatial::{MapBounds, WalkabilityCache};
use crate::spawn::SpawnCatalog;

const MARKER_HALF: f32 = 2.5;

/// Samples walkability on a regular grid starting at the origin.
pub fn walkability_samples(
    cache: &WalkabilityCache,
    bounds: MapBounds,
    grid: u32,
) -> Vec<(Vec2, bool)> {
    let grid = grid.max(1) as usize;
    let (w, h) = (bounds.width as u32, bounds.height as u32);
    let mut out = Vec::new();
    for x in (0..w).step_by(grid) {
        for y in (0..h).step_by(grid) {
            let p = vec2(x as f32, y as f32);
            out.push((p, cache.is_walkable(p.x, p.y)));
        }
    }
    out
}

/// Marker color by category name.
pub fn spawn_marker_color(category: &str) -> Color {
    let lower = category.to_lowercase();
    if lower.contains("customer") {
        GREEN
    } else if lower.contains("player") {
        BLUE
    } else {
        YELLOW
    }
}

/// Green squares on walkable samples, red crosses on blocked ones.
pub fn draw_walkability(samples: &[(Vec2, bool)]) {
    let ok = Color::new(0.0, 1.0, 0.0, 0.5);
    let blocked = Color::new(1.0, 0.0, 0.0, 0.75);
    for (p, walkable) in samples {
        if *walkable {
            draw_rectangle(
                p.x - MARKER_HALF,
                p.y - MARKER_HALF,
                MARKER_HALF * 2.0,
                MARKER_HALF * 2.0,
                ok,
            );
        } else {
            let (a, b) = (*p - Vec2::splat(MARKER_HALF), *p + Vec2::splat(MARKER_HALF));
            draw_line(a.x, a.y, b.x, b.y, 2.0, blocked);
            draw_line(b.x, a.y, a.x, b.y, 2.0, blocked);
        }
    }
}

/// Ring plus dot on every cataloged spawn point.
pub fn draw_spawn_points(catalog: &SpawnCatalog) {
    for (category, points) in catalog.categories() {
        let color = spawn_marker_color(category);
        for p in points {
            draw_circle_lines(p.x, p.y, 10.0, 2.0, color);
            draw_circle(p.x, p.y, 2.0, color);
        }
    }
}
