use macroquad::prelude::*;

use super::compose::{blit_region, Composite};

/// Something a map composite can be drawn onto.
pub trait DrawTarget {
    /// Draws the `source` region of the composite with its top-left at `dest`.
    fn blit(&mut self, composite: &Composite, source: Rect, dest: Vec2);
}

/// The current macroquad render target (screen or active camera).
#[derive(Debug, Clone, Copy, Default)]
pub struct ScreenTarget;

impl DrawTarget for ScreenTarget {
    fn blit(&mut self, composite: &Composite, source: Rect, dest: Vec2) {
        draw_texture_ex(
            composite.texture(),
            dest.x,
            dest.y,
            WHITE,
            DrawTextureParams {
                source: Some(source),
                ..Default::default()
            },
        );
    }
}

/// Headless drawing into a CPU image.
impl DrawTarget for Image {
    fn blit(&mut self, composite: &Composite, source: Rect, dest: Vec2) {
        blit_region(self, composite.image(), source, dest);
    }
}
