use macroquad::prelude::*;

/// Extra pixels kept around the view so sub-pixel camera moves never show a seam.
const CULL_MARGIN_PX: f32 = 1.0;

/// The part of a `width x height` composite covered by the view rectangle,
/// or `None` if they do not intersect. Corners may be given in any order.
pub fn visible_region(view_min: Vec2, view_max: Vec2, width: u32, height: u32) -> Option<Rect> {
    if !view_min.is_finite() || !view_max.is_finite() {
        return None;
    }
    let mut x0 = view_min.x.min(view_max.x);
    let mut y0 = view_min.y.min(view_max.y);
    let mut x1 = view_min.x.max(view_max.x);
    let mut y1 = view_min.y.max(view_max.y);

    x0 = (x0 - CULL_MARGIN_PX).floor().max(0.0);
    y0 = (y0 - CULL_MARGIN_PX).floor().max(0.0);
    x1 = (x1 + CULL_MARGIN_PX).ceil().min(width as f32);
    y1 = (y1 + CULL_MARGIN_PX).ceil().min(height as f32);

    if x0 >= x1 || y0 >= y1 {
        return None;
    }
    Some(Rect::new(x0, y0, x1 - x0, y1 - y0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_to_composite() {
        let r = visible_region(vec2(-50.0, -50.0), vec2(2000.0, 100.0), 640, 480);
        assert_eq!(r, Some(Rect::new(0.0, 0.0, 640.0, 101.0)));
    }

    #[test]
    fn swapped_corners_are_normalized() {
        let a = visible_region(vec2(300.0, 200.0), vec2(100.0, 50.0), 640, 480);
        let b = visible_region(vec2(100.0, 50.0), vec2(300.0, 200.0), 640, 480);
        assert_eq!(a, b);
        assert_eq!(a, Some(Rect::new(99.0, 49.0, 202.0, 152.0)));
    }

    #[test]
    fn disjoint_or_bad_views_cull_everything() {
        assert_eq!(visible_region(vec2(700.0, 0.0), vec2(900.0, 100.0), 640, 480), None);
        assert_eq!(visible_region(vec2(f32::NAN, 0.0), vec2(10.0, 10.0), 640, 480), None);
    }
}
