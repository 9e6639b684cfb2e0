//! Map compositing and drawing.

mod compose;
mod cull;
pub mod debug;
mod target;

pub use compose::{
    blank_image, blit_region, blit_tile, compose, fill_rect, pixel, stroke_rect, Composite, Rgba,
};
pub use cull::visible_region;
pub use target::{DrawTarget, ScreenTarget};
