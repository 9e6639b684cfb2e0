//! Offscreen compositing of tile layers into one image.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::path::Path;

use macroquad::prelude::*;

use crate::ir_map::{IrLayerKind, IrMap, IrTileset};
use crate::resource::{placeholder_image, ResourceResolver};
use crate::spatial::TileId;

/// Straight-alpha RGBA pixel.
pub type Rgba = [u8; 4];

/// Transparent image of the given size, clamped to what `Image` can hold.
pub fn blank_image(width: u32, height: u32) -> Image {
    let w = width.min(u16::MAX as u32) as u16;
    let h = height.min(u16::MAX as u32) as u16;
    Image::gen_image_color(w, h, BLANK)
}

#[inline]
fn index(image: &Image, x: i64, y: i64) -> Option<usize> {
    let (w, h) = (image.width as i64, image.height as i64);
    (x >= 0 && y >= 0 && x < w && y < h).then(|| (y * w + x) as usize)
}

/// Pixel at `(x, y)`, transparent when out of range.
pub fn pixel(image: &Image, x: u32, y: u32) -> Rgba {
    index(image, x as i64, y as i64)
        .map(|i| image.get_image_data()[i])
        .unwrap_or([0; 4])
}

fn put(image: &mut Image, x: i64, y: i64, rgba: Rgba) {
    if let Some(i) = index(image, x, y) {
        image.get_image_data_mut()[i] = rgba;
    }
}

/// Source-over blend of `src` (scaled by `opacity`) onto the pixel.
fn blend(image: &mut Image, x: i64, y: i64, src: Rgba, opacity: f32) {
    let Some(i) = index(image, x, y) else {
        return;
    };
    let sa = src[3] as f32 / 255.0 * opacity;
    if sa <= 0.0 {
        return;
    }
    let dst = &mut image.get_image_data_mut()[i];
    if sa >= 1.0 {
        *dst = src;
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = sa + da * (1.0 - sa);
    for c in 0..3 {
        let (s, d) = (src[c] as f32, dst[c] as f32);
        dst[c] = ((s * sa + d * da * (1.0 - sa)) / out_a).round() as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

/// Fills `rect` (pixel units, clipped to the image).
pub fn fill_rect(image: &mut Image, rect: Rect, rgba: Rgba) {
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    for y in y0..y0 + rect.h as i64 {
        for x in x0..x0 + rect.w as i64 {
            put(image, x, y, rgba);
        }
    }
}

/// One pixel wide outline along the inside of `rect`.
pub fn stroke_rect(image: &mut Image, rect: Rect, rgba: Rgba) {
    let (x0, y0) = (rect.x as i64, rect.y as i64);
    let (x1, y1) = (x0 + rect.w as i64 - 1, y0 + rect.h as i64 - 1);
    for x in x0..=x1 {
        put(image, x, y0, rgba);
        put(image, x, y1, rgba);
    }
    for y in y0..=y1 {
        put(image, x0, y, rgba);
        put(image, x1, y, rgba);
    }
}

/// Copies `src` onto `dst` at `at`, applying Tiled flip flags and opacity.
///
/// Flips follow Tiled's order: diagonal first, then horizontal, then vertical.
pub fn blit_tile(dst: &mut Image, src: &Image, at: Vec2, id: TileId, opacity: f32) {
    let (sw, sh) = (src.width as u32, src.height as u32);
    let (ow, oh) = if id.flip_d() { (sh, sw) } else { (sw, sh) };
    let (ax, ay) = (at.x.round() as i64, at.y.round() as i64);

    for oy in 0..oh {
        for ox in 0..ow {
            let x = if id.flip_h() { ow - 1 - ox } else { ox };
            let y = if id.flip_v() { oh - 1 - oy } else { oy };
            let (sx, sy) = if id.flip_d() { (y, x) } else { (x, y) };
            blend(dst, ax + ox as i64, ay + oy as i64, pixel(src, sx, sy), opacity);
        }
    }
}

/// Alpha-blends the `source` region of `src` onto `dst` at `dest`.
pub fn blit_region(dst: &mut Image, src: &Image, source: Rect, dest: Vec2) {
    let (sx0, sy0) = (source.x.max(0.0) as u32, source.y.max(0.0) as u32);
    let (dx0, dy0) = (dest.x.round() as i64, dest.y.round() as i64);
    for y in 0..source.h as u32 {
        for x in 0..source.w as u32 {
            let p = pixel(src, sx0 + x, sy0 + y);
            blend(dst, dx0 + x as i64, dy0 + y as i64, p, 1.0);
        }
    }
}

/// Sub-image, or `None` if the rectangle does not fit inside `image`.
fn crop(image: &Image, x: u32, y: u32, w: u32, h: u32) -> Option<Image> {
    let right = x.checked_add(w)?;
    let bottom = y.checked_add(h)?;
    if w == 0 || h == 0 || right > image.width as u32 || bottom > image.height as u32 {
        return None;
    }
    Some(image.sub_image(Rect::new(x as f32, y as f32, w as f32, h as f32)))
}

/// Top-left corner of a tile drawn in grid cell `(col, row)`. Tiled anchors
/// tiles at the bottom-left of their cell, so tall tiles grow upwards.
fn tile_anchor(col: usize, row: usize, map: &IrMap, tile: &Image, id: TileId) -> Vec2 {
    let drawn_h = if id.flip_d() { tile.width } else { tile.height } as f32;
    vec2(
        col as f32 * map.tile_w as f32,
        (row + 1) as f32 * map.tile_h as f32 - drawn_h,
    )
}

/// Lazily decoded tile images of one map, keyed by clean gid.
struct TileImages<'a> {
    map: &'a IrMap,
    base: &'a Path,
    resolver: &'a dyn ResourceResolver,
    placeholder_cell: u16,
    atlases: HashMap<usize, Image>,
    tiles: HashMap<u32, Option<Image>>,
}

impl<'a> TileImages<'a> {
    fn get(&mut self, gid: u32) -> Option<&Image> {
        if !self.tiles.contains_key(&gid) {
            let img = self.load(gid);
            self.tiles.insert(gid, img);
        }
        self.tiles.get(&gid).and_then(Option::as_ref)
    }

    fn load(&mut self, gid: u32) -> Option<Image> {
        let map = self.map;
        let (ts, local) = map.tileset_for_gid(gid)?;
        match ts {
            IrTileset::Atlas {
                image,
                tile_w,
                tile_h,
                columns,
                spacing,
                margin,
                first_gid,
                ..
            } => {
                let key = *first_gid as usize;
                let (base, resolver) = (self.base, self.resolver);
                let atlas = self
                    .atlases
                    .entry(key)
                    .or_insert_with(|| resolver.resolve(image, base));
                let col = local % columns;
                let row = local / columns;
                let sx = tile_w
                    .checked_add(*spacing)
                    .and_then(|stride| stride.checked_mul(col))
                    .and_then(|v| v.checked_add(*margin));
                let sy = tile_h
                    .checked_add(*spacing)
                    .and_then(|stride| stride.checked_mul(row))
                    .and_then(|v| v.checked_add(*margin));
                sx.zip(sy)
                    .and_then(|(sx, sy)| crop(atlas, sx, sy, *tile_w, *tile_h))
                    .or_else(|| {
                        // Placeholder atlases are smaller than the real sheet.
                        Some(placeholder_image(
                            (*tile_w).min(u16::MAX as u32) as u16,
                            self.placeholder_cell,
                        ))
                    })
            }
            IrTileset::Collection { .. } => {
                let reference = ts.tile(local)?.image.as_deref()?;
                Some(self.resolver.resolve(reference, self.base))
            }
        }
    }
}

/// Renders every visible tile layer of `map`, in order, into one image.
pub fn compose(
    map: &IrMap,
    base: &Path,
    resolver: &dyn ResourceResolver,
    placeholder_cell: u16,
) -> Image {
    let mut out = blank_image(map.pixel_width(), map.pixel_height());
    let mut images = TileImages {
        map,
        base,
        resolver,
        placeholder_cell,
        atlases: HashMap::new(),
        tiles: HashMap::new(),
    };

    for layer in map.layers.iter().filter(|l| l.visible && l.opacity > 0.0) {
        let IrLayerKind::Tiles { width, data, .. } = &layer.kind else {
            continue;
        };
        for (idx, raw) in data.iter().enumerate() {
            let id = TileId(*raw);
            if id.is_empty() {
                continue;
            }
            let Some(tile) = images.get(id.clean()) else {
                continue;
            };
            let at = tile_anchor(idx % *width, idx / *width, map, tile, id) + layer.offset;
            blit_tile(&mut out, tile, at, id, layer.opacity.min(1.0));
        }
    }

    tracing::debug!(
        width = out.width,
        height = out.height,
        tiles = images.tiles.len(),
        "composited tile layers"
    );
    out
}

/// A map's pre-rendered image. The GPU texture is created on first use.
pub struct Composite {
    image: Image,
    texture: OnceCell<Texture2D>,
}

impl Composite {
    /// Wraps a composited image; no GPU work happens here.
    pub fn new(image: Image) -> Self {
        Self {
            image,
            texture: OnceCell::new(),
        }
    }

    /// CPU-side pixels.
    pub fn image(&self) -> &Image {
        &self.image
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.image.width as u32
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.image.height as u32
    }

    /// Uploads the image on first call. Needs a macroquad window.
    pub fn texture(&self) -> &Texture2D {
        self.texture.get_or_init(|| {
            let tex = Texture2D::from_image(&self.image);
            tex.set_filter(FilterMode::Nearest);
            tex
        })
    }
}
