use macroquad::prelude::*;

/// Raw Tiled gid, flip flags included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileId(pub u32);

/// Horizontal flip flag.
pub const FLIP_H: u32 = 0x8000_0000; // bit 31
/// Vertical flip flag.
pub const FLIP_V: u32 = 0x4000_0000; // bit 30
/// Diagonal (anti-transpose) flip flag.
pub const FLIP_D: u32 = 0x2000_0000; // bit 29
/// Bits holding the gid itself.
pub const GID_MASK: u32 = 0x1FFF_FFFF; // keep lower 29 bits (bit 28 is free)

impl TileId {
    /// Gid with flags.
    #[inline] pub fn raw(self) -> u32 { self.0 }
    /// Gid without flip flags.
    #[inline] pub fn clean(self) -> u32 { self.0 & GID_MASK }
    /// Gid 0 marks an empty cell.
    #[inline] pub fn is_empty(self) -> bool { self.clean() == 0 }
    /// Mirrored left to right.
    #[inline] pub fn flip_h(self) -> bool { (self.0 & FLIP_H) != 0 }
    /// Mirrored top to bottom.
    #[inline] pub fn flip_v(self) -> bool { (self.0 & FLIP_V) != 0 }
    /// Swapped along the top-left to bottom-right diagonal.
    #[inline] pub fn flip_d(self) -> bool { (self.0 & FLIP_D) != 0 }
}

/// Grid cell position, in tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    /// Column.
    pub x: i32,
    /// Row.
    pub y: i32,
}

impl TileCoord {
    /// Tile at column `x`, row `y`.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Pixel extent of a map and its tile size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapBounds {
    /// Width in pixels.
    pub width: f32,
    /// Height in pixels.
    pub height: f32,
    /// Tile width in pixels.
    pub tile_w: f32,
    /// Tile height in pixels.
    pub tile_h: f32,
}

impl MapBounds {
    /// Bounds of a `width x height` pixel map.
    pub fn new(width: u32, height: u32, tile_w: u32, tile_h: u32) -> Self {
        Self {
            width: width as f32,
            height: height as f32,
            tile_w: tile_w as f32,
            tile_h: tile_h as f32,
        }
    }

    /// `true` for finite points inside `[0, width) x [0, height)`.
    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.is_finite() && p.x >= 0.0 && p.y >= 0.0 && p.x < self.width && p.y < self.height
    }

    /// Map center, floored to whole pixels.
    #[inline]
    pub fn center(&self) -> Vec2 {
        vec2((self.width / 2.0).floor(), (self.height / 2.0).floor())
    }

    /// Tile containing `p`.
    #[inline]
    pub fn world_to_tile(&self, p: Vec2) -> TileCoord {
        TileCoord {
            x: (p.x / self.tile_w).floor() as i32,
            y: (p.y / self.tile_h).floor() as i32,
        }
    }

    /// Top-left pixel of a tile.
    #[inline]
    pub fn tile_origin(&self, t: TileCoord) -> Vec2 {
        vec2(t.x as f32 * self.tile_w, t.y as f32 * self.tile_h)
    }
}

/// Square of half size `half` centred on `p`.
#[inline]
pub fn probe_rect(p: Vec2, half: f32) -> Rect {
    Rect::new(p.x - half, p.y - half, half * 2.0, half * 2.0)
}

/// Interior overlap; rectangles that only share an edge do not overlap.
/// A zero-sized probe degenerates to a half-open point-in-rect test.
#[inline]
pub fn rects_overlap(a: &Rect, b: &Rect) -> bool {
    if a.w == 0.0 && a.h == 0.0 {
        return a.x >= b.x && a.x < b.x + b.w && a.y >= b.y && a.y < b.y + b.h;
    }
    a.x < b.x + b.w && b.x < a.x + a.w && a.y < b.y + b.h && b.y < a.y + a.h
}

/// Snaps a coordinate to the nearest multiple of `step`.
#[inline]
pub fn quantize(v: f32, step: u32) -> i32 {
    let step = step.max(1) as f32;
    ((v / step).round() * step) as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tile_id_strips_flip_flags() {
        let id = TileId(7 | FLIP_H | FLIP_D);
        assert_eq!(id.clean(), 7);
        assert!(id.flip_h() && id.flip_d() && !id.flip_v());
        assert!(TileId(FLIP_V).is_empty());
    }

    #[test]
    fn bounds_are_half_open_and_reject_non_finite() {
        let b = MapBounds::new(640, 480, 32, 32);
        assert!(b.contains(vec2(0.0, 0.0)));
        assert!(b.contains(vec2(639.9, 479.9)));
        assert!(!b.contains(vec2(640.0, 10.0)));
        assert!(!b.contains(vec2(10.0, 480.0)));
        assert!(!b.contains(vec2(-0.1, 10.0)));
        assert!(!b.contains(vec2(f32::NAN, 10.0)));
        assert!(!b.contains(vec2(10.0, f32::INFINITY)));
    }

    #[test]
    fn world_to_tile_floors() {
        let b = MapBounds::new(640, 480, 32, 32);
        assert_eq!(b.world_to_tile(vec2(31.9, 32.0)), TileCoord::new(0, 1));
        assert_eq!(b.tile_origin(TileCoord::new(2, 3)), vec2(64.0, 96.0));
    }

    #[test]
    fn touching_edges_do_not_overlap() {
        let wall = Rect::new(100.0, 100.0, 64.0, 64.0);
        assert!(rects_overlap(&probe_rect(vec2(132.0, 132.0), 8.0), &wall));
        assert!(!rects_overlap(&probe_rect(vec2(92.0, 132.0), 8.0), &wall));
        assert!(rects_overlap(&probe_rect(vec2(93.0, 132.0), 8.0), &wall));
        assert!(rects_overlap(&probe_rect(vec2(100.0, 100.0), 0.0), &wall));
        assert!(!rects_overlap(&probe_rect(vec2(164.0, 100.0), 0.0), &wall));
    }

    #[test]
    fn quantize_rounds_to_nearest_step() {
        assert_eq!(quantize(50.0, 8), 48);
        assert_eq!(quantize(52.0, 8), 56);
        assert_eq!(quantize(3.9, 8), 0);
        assert_eq!(quantize(12.0, 1), 12);
    }
}
