use crate::brush_engine::symmetry::Mirror;
use crate::canvas::blend::Ink;
use crate::canvas::surface::DocumentSurface;
use crate::utils::vector::Vec2;
use tiny_skia::{LineCap, LineJoin, Path, PathBuilder, Stroke};

const MAX_CORNER_RADIUS: f32 = 20.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShapeKind {
    Rect,
    Circle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeStyle {
    pub size: f32,
    pub filled: bool,
    pub rounded: bool,
}

impl ShapeStyle {
    /// Padding kept around the drag box when growing the document.
    pub fn bounds_padding(&self) -> f32 {
        (self.size / 2.0).max(1.0)
    }
}

/// Axis-aligned box spanned by a drag, as `(min, max)`.
pub fn drag_box(anchor: Vec2, end: Vec2) -> (Vec2, Vec2) {
    (anchor.min(end), anchor.max(end))
}

/// Extent actually covered by the shape's outline, as `(min, max)`.
///
/// A circle is drawn around the drag box, not inside it, so its extent is
/// the center plus or minus the radius.
pub fn bounds(kind: ShapeKind, anchor: Vec2, end: Vec2) -> (Vec2, Vec2) {
    let (min, max) = drag_box(anchor, end);
    match kind {
        ShapeKind::Rect => (min, max),
        ShapeKind::Circle => {
            let (center, radius) = circle(min, max);
            let r = Vec2::new(radius, radius);
            (center - r, center + r)
        }
    }
}

fn circle(min: Vec2, max: Vec2) -> (Vec2, f32) {
    let (w, h) = (max.x - min.x, max.y - min.y);
    (Vec2::new(min.x + w / 2.0, min.y + h / 2.0), w.hypot(h) / 2.0)
}

/// Draw the shape spanned by `anchor` and `end`. A zero-size drag draws nothing.
pub fn render(
    surface: &mut DocumentSurface,
    kind: ShapeKind,
    anchor: Vec2,
    end: Vec2,
    style: &ShapeStyle,
    ink: Ink,
    mirror: Option<Mirror>,
) {
    let (min, max) = drag_box(anchor, end);
    let (w, h) = (max.x - min.x, max.y - min.y);
    if w == 0.0 && h == 0.0 {
        return;
    }

    let mut outlines = vec![outline(kind, min.x, min.y, w, h, style)];
    if let Some(mirror) = mirror {
        outlines.push(outline(kind, mirror.box_x(min.x, w), min.y, w, h, style));
    }

    let stroke = outline_stroke(kind, style);
    for path in outlines.into_iter().flatten() {
        if style.filled {
            surface.fill_path(&path, ink);
        } else {
            surface.stroke_path(&path, &stroke, ink);
        }
    }
}

fn outline(kind: ShapeKind, x: f32, y: f32, w: f32, h: f32, style: &ShapeStyle) -> Option<Path> {
    match kind {
        ShapeKind::Rect if style.rounded => rounded_rect(x, y, w, h),
        ShapeKind::Rect => sharp_rect(x, y, w, h),
        ShapeKind::Circle => {
            let (center, radius) = circle(Vec2::new(x, y), Vec2::new(x + w, y + h));
            PathBuilder::from_circle(center.x, center.y, radius)
        }
    }
}

fn outline_stroke(kind: ShapeKind, style: &ShapeStyle) -> Stroke {
    let sharp = kind == ShapeKind::Rect && !style.rounded;
    Stroke {
        width: style.size,
        miter_limit: 10.0,
        line_cap: if sharp { LineCap::Butt } else { LineCap::Round },
        line_join: if sharp { LineJoin::Miter } else { LineJoin::Round },
        ..Stroke::default()
    }
}

fn sharp_rect(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    let mut pb = PathBuilder::new();
    pb.move_to(x, y);
    pb.line_to(x + w, y);
    pb.line_to(x + w, y + h);
    pb.line_to(x, y + h);
    pb.close();
    pb.finish()
}

fn rounded_rect(x: f32, y: f32, w: f32, h: f32) -> Option<Path> {
    let short = w.min(h);
    let r = MAX_CORNER_RADIUS.min(short * 0.2).min(short / 2.0);
    if r <= 0.0 {
        return sharp_rect(x, y, w, h);
    }
    let (right, bottom) = (x + w, y + h);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(right - r, y);
    pb.quad_to(right, y, right, y + r);
    pb.line_to(right, bottom - r);
    pb.quad_to(right, bottom, right - r, bottom);
    pb.line_to(x + r, bottom);
    pb.quad_to(x, bottom, x, bottom - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::blend::BlendMode;
    use crate::utils::color::Color;

    fn ink() -> Ink {
        Ink::new(Color::BLACK, 1.0, BlendMode::Paint)
    }

    fn style(filled: bool, rounded: bool) -> ShapeStyle {
        ShapeStyle {
            size: 4.0,
            filled,
            rounded,
        }
    }

    #[test]
    fn drag_box_normalizes_direction() {
        let (min, max) = drag_box(Vec2::new(10.0, 2.0), Vec2::new(3.0, 8.0));
        assert_eq!(min, Vec2::new(3.0, 2.0));
        assert_eq!(max, Vec2::new(10.0, 8.0));
        assert_eq!(style(false, false).bounds_padding(), 2.0);
        assert_eq!(ShapeStyle { size: 1.0, ..style(false, false) }.bounds_padding(), 1.0);
    }

    #[test]
    fn circle_bounds_reach_past_the_drag_box() {
        let anchor = Vec2::new(5.0, 50.0);
        let end = Vec2::new(45.0, 90.0);
        assert_eq!(bounds(ShapeKind::Rect, anchor, end), drag_box(anchor, end));

        let (min, max) = bounds(ShapeKind::Circle, anchor, end);
        let radius = 40.0f32.hypot(40.0) / 2.0;
        assert!((min.x - (25.0 - radius)).abs() < 1e-4);
        assert!((min.y - (70.0 - radius)).abs() < 1e-4);
        assert!((max.x - (25.0 + radius)).abs() < 1e-4);
        assert!(min.x < 0.0);
    }

    #[test]
    fn filled_rect_with_mirror() {
        let mut surface = DocumentSurface::new(500, 200, 1.0).unwrap();
        let mirror = Mirror::new(500.0);
        render(
            &mut surface,
            ShapeKind::Rect,
            Vec2::new(100.0, 100.0),
            Vec2::new(50.0, 50.0),
            &style(true, false),
            ink(),
            Some(mirror),
        );
        assert_eq!(surface.pixel(75.0, 75.0).unwrap().a, 255);
        assert_eq!(surface.pixel(425.0, 75.0).unwrap().a, 255);
        assert_eq!(surface.pixel(250.0, 75.0).unwrap().a, 0);
    }

    #[test]
    fn outlined_rect_is_hollow() {
        let mut surface = DocumentSurface::new(200, 200, 1.0).unwrap();
        render(
            &mut surface,
            ShapeKind::Rect,
            Vec2::new(50.0, 50.0),
            Vec2::new(150.0, 150.0),
            &style(false, false),
            ink(),
            None,
        );
        assert_eq!(surface.pixel(100.0, 100.0).unwrap().a, 0);
        assert_eq!(surface.pixel(50.0, 100.0).unwrap().a, 255);
        // sharp corners are filled by the miter join
        assert_eq!(surface.pixel(48.5, 48.5).unwrap().a, 255);
    }

    #[test]
    fn rounded_rect_cuts_corners() {
        let mut surface = DocumentSurface::new(200, 200, 1.0).unwrap();
        render(
            &mut surface,
            ShapeKind::Rect,
            Vec2::new(50.0, 50.0),
            Vec2::new(150.0, 150.0),
            &style(true, true),
            ink(),
            None,
        );
        assert_eq!(surface.pixel(100.0, 100.0).unwrap().a, 255);
        assert_eq!(surface.pixel(50.5, 50.5).unwrap().a, 0);
        assert_eq!(surface.pixel(50.5, 100.0).unwrap().a, 255);
    }

    #[test]
    fn circle_circumscribes_the_drag_box() {
        let mut surface = DocumentSurface::new(200, 200, 1.0).unwrap();
        render(
            &mut surface,
            ShapeKind::Circle,
            Vec2::new(60.0, 80.0),
            Vec2::new(120.0, 160.0),
            &style(true, true),
            ink(),
            None,
        );
        // center (90, 120), radius 50
        assert_eq!(surface.pixel(90.0, 120.0).unwrap().a, 255);
        assert_eq!(surface.pixel(136.0, 120.0).unwrap().a, 255);
        assert_eq!(surface.pixel(145.0, 120.0).unwrap().a, 0);
    }

    #[test]
    fn zero_size_drag_draws_nothing() {
        let mut surface = DocumentSurface::new(50, 50, 1.0).unwrap();
        let p = Vec2::new(20.0, 20.0);
        render(&mut surface, ShapeKind::Circle, p, p, &style(true, true), ink(), None);
        render(&mut surface, ShapeKind::Rect, p, p, &style(false, false), ink(), None);
        assert!(surface.pixmap().pixels().iter().all(|px| px.alpha() == 0));
    }
}
