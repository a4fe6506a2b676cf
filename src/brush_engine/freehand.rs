use crate::brush_engine::symmetry::Mirror;
use crate::canvas::blend::Ink;
use crate::canvas::surface::DocumentSurface;
use crate::utils::vector::Vec2;
use tiny_skia::{LineCap, LineJoin, PathBuilder, Stroke};

/// Draw a round-capped polyline through `points`, plus its mirror image.
///
/// A stroke whose points all coincide becomes a round dot of diameter `size`.
pub fn render(
    surface: &mut DocumentSurface,
    points: &[Vec2],
    size: f32,
    ink: Ink,
    mirror: Option<Mirror>,
) {
    draw_polyline(surface, points.iter().copied(), size, ink);
    if let Some(mirror) = mirror {
        draw_polyline(surface, points.iter().map(|p| mirror.point(*p)), size, ink);
    }
}

fn draw_polyline(
    surface: &mut DocumentSurface,
    mut points: impl Iterator<Item = Vec2>,
    size: f32,
    ink: Ink,
) {
    let Some(first) = points.next() else {
        return;
    };

    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    let mut moved = false;
    for p in points {
        moved |= p != first;
        pb.line_to(p.x, p.y);
    }

    if !moved {
        if let Some(dot) = PathBuilder::from_circle(first.x, first.y, size / 2.0) {
            surface.fill_path(&dot, ink);
        }
        return;
    }

    let Some(path) = pb.finish() else {
        return;
    };
    let stroke = Stroke {
        width: size,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    surface.stroke_path(&path, &stroke, ink);
}
