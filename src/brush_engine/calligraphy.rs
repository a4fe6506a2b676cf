use crate::brush_engine::settings::ToolSettings;
use crate::brush_engine::symmetry::Mirror;
use crate::canvas::surface::{self, DocumentSurface, Expansion};
use crate::error::SurfaceError;
use crate::utils::color::Color;
use crate::utils::vector::Vec2;
use tiny_skia::{FillRule, Paint, PathBuilder, Pixmap, Rect, Transform};

/// Elliptical pen tip.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Nib {
    pub size: f32,
    pub aspect: f32,
    pub angle_deg: f32,
}

impl Nib {
    pub fn from_settings(settings: &ToolSettings) -> Self {
        Self {
            size: settings.brush_size,
            aspect: settings.nib_aspect,
            angle_deg: settings.nib_angle_deg,
        }
    }

    /// Distance between stamps along a segment.
    pub fn spacing(&self) -> f32 {
        (self.size * 0.3).max(1.0)
    }

    fn radii(&self) -> (f32, f32) {
        let rx = (self.size / 2.0).max(0.5);
        // a zero aspect still leaves a hairline
        let ry = (self.size * self.aspect / 2.0).max(0.5);
        (rx, ry)
    }
}

/// Accumulation buffer for one calligraphy stroke.
///
/// Stamps land here at full opacity so overlaps do not darken; the whole
/// layer is composited onto the document once per frame at the stroke opacity.
pub struct NibLayer {
    pixmap: Pixmap,
    scale: f32,
    color: Color,
}

impl NibLayer {
    /// Transparent layer matching the surface's physical size.
    pub fn for_surface(surface: &DocumentSurface, color: Color) -> Result<Self, SurfaceError> {
        let (w, h) = (surface.pixmap().width(), surface.pixmap().height());
        let pixmap = Pixmap::new(w, h).ok_or(SurfaceError::Allocation {
            width: w,
            height: h,
        })?;
        Ok(Self {
            pixmap,
            scale: surface.scale(),
            color: color.with_alpha(255),
        })
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// One nib impression at `at`, plus its mirror image.
    pub fn stamp(&mut self, at: Vec2, nib: &Nib, mirror: Option<Mirror>) {
        self.stamp_one(at, nib.angle_deg, nib);
        if let Some(mirror) = mirror {
            self.stamp_one(mirror.point(at), mirror.angle(nib.angle_deg), nib);
        }
    }

    /// Evenly spaced stamps from `from` (exclusive) to `to` (inclusive).
    pub fn segment(&mut self, from: Vec2, to: Vec2, nib: &Nib, mirror: Option<Mirror>) {
        let dist = from.distance(to);
        if dist == 0.0 {
            self.stamp(to, nib, mirror);
            return;
        }
        let steps = (dist / nib.spacing()).ceil().max(1.0) as u32;
        for i in 1..=steps {
            let t = i as f32 / steps as f32;
            self.stamp(from.lerp(to, t), nib, mirror);
        }
    }

    /// Follow a document expansion, keeping stamps aligned with the shifted content.
    pub fn grow(&mut self, expansion: Expansion, surface: &DocumentSurface) {
        if expansion.is_empty() {
            return;
        }
        let (w, h) = (surface.pixmap().width(), surface.pixmap().height());
        let Some(mut grown) = Pixmap::new(w, h) else {
            log::error!("calligraphy layer could not follow expansion to {w}x{h}");
            return;
        };
        surface::copy_pixels(
            &self.pixmap,
            &mut grown,
            surface::physical(expansion.left, self.scale),
            surface::physical(expansion.top, self.scale),
        );
        self.pixmap = grown;
    }

    fn stamp_one(&mut self, at: Vec2, angle_deg: f32, nib: &Nib) {
        let (rx, ry) = nib.radii();
        let Some(oval) = Rect::from_xywh(-rx, -ry, rx * 2.0, ry * 2.0)
            .and_then(PathBuilder::from_oval)
        else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(self.color.to_skia(1.0));
        paint.anti_alias = true;
        let transform = Transform::from_scale(self.scale, self.scale)
            .pre_translate(at.x, at.y)
            .pre_rotate(angle_deg);
        self.pixmap
            .fill_path(&oval, &paint, FillRule::Winding, transform, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::viewport::ViewState;

    fn nib() -> Nib {
        Nib {
            size: 20.0,
            aspect: 0.35,
            angle_deg: 0.0,
        }
    }

    fn alpha(layer: &NibLayer, x: u32, y: u32) -> u8 {
        layer.pixmap().pixel(x, y).unwrap().alpha()
    }

    #[test]
    fn spacing_has_a_floor() {
        assert_eq!(nib().spacing(), 6.0);
        let tiny = Nib { size: 1.0, ..nib() };
        assert_eq!(tiny.spacing(), 1.0);
    }

    #[test]
    fn stamp_is_an_ellipse_along_the_angle() {
        let surface = DocumentSurface::new(60, 60, 1.0).unwrap();
        let mut layer = NibLayer::for_surface(&surface, Color::BLACK).unwrap();
        layer.stamp(Vec2::new(30.0, 30.0), &nib(), None);
        // rx = 10 horizontally, ry = 3.5 vertically
        assert_eq!(alpha(&layer, 37, 30), 255);
        assert_eq!(alpha(&layer, 30, 35), 0);

        let mut rotated = NibLayer::for_surface(&surface, Color::BLACK).unwrap();
        rotated.stamp(Vec2::new(30.0, 30.0), &Nib { angle_deg: 90.0, ..nib() }, None);
        assert_eq!(alpha(&rotated, 29, 37), 255);
        assert_eq!(alpha(&rotated, 35, 29), 0);
    }

    #[test]
    fn segment_leaves_no_gaps() {
        let surface = DocumentSurface::new(200, 40, 1.0).unwrap();
        let mut layer = NibLayer::for_surface(&surface, Color::BLACK).unwrap();
        let from = Vec2::new(20.0, 20.0);
        layer.stamp(from, &nib(), None);
        layer.segment(from, Vec2::new(180.0, 20.0), &nib(), None);
        for x in 20..180 {
            assert_eq!(alpha(&layer, x, 20), 255, "gap at x={x}");
        }
    }

    #[test]
    fn mirrored_stamp_lands_on_the_other_side() {
        let surface = DocumentSurface::new(100, 40, 1.0).unwrap();
        let mut layer = NibLayer::for_surface(&surface, Color::BLACK).unwrap();
        layer.stamp(Vec2::new(20.0, 20.0), &nib(), Some(Mirror::new(100.0)));
        assert_eq!(alpha(&layer, 20, 20), 255);
        assert_eq!(alpha(&layer, 80, 20), 255);
        assert_eq!(alpha(&layer, 50, 20), 0);
    }

    #[test]
    fn grow_shifts_existing_stamps() {
        let mut surface = DocumentSurface::new(60, 60, 1.0).unwrap();
        let mut layer = NibLayer::for_surface(&surface, Color::BLACK).unwrap();
        layer.stamp(Vec2::new(30.0, 30.0), &nib(), None);

        let mut view = ViewState::default();
        let applied = surface.expand(15.0, 5.0, 0.0, 0.0, &mut view);
        layer.grow(applied, &surface);
        assert_eq!(layer.pixmap().width(), 75);
        assert_eq!(layer.pixmap().height(), 65);
        assert_eq!(alpha(&layer, 45, 35), 255);
        assert_eq!(alpha(&layer, 30, 30), 0);
    }
}
