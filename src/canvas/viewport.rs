use crate::canvas::surface::DocumentSurface;
use crate::utils::vector::Vec2;
use serde::{Deserialize, Serialize};
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

/// Pan/zoom state mapping content units to screen units.
///
/// `screen = content * scale + offset`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

/// Allowed zoom range.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self { min: 0.1, max: 8.0 }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max.max(self.min))
    }
}

/// A wheel/trackpad event already converted to screen units.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WheelInput {
    pub position: Vec2,
    /// Positive `delta_y` scrolls the content up, as with a mouse wheel turned towards the user.
    pub delta_x: f32,
    pub delta_y: f32,
    /// Ctrl/Cmd held, or a pinch gesture.
    pub zoom: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

impl ViewState {
    pub fn offset(&self) -> Vec2 {
        Vec2::new(self.offset_x, self.offset_y)
    }

    pub fn screen_to_content(&self, screen: Vec2) -> Vec2 {
        (screen - self.offset()) / self.scale
    }

    pub fn content_to_screen(&self, content: Vec2) -> Vec2 {
        content * self.scale + self.offset()
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.offset_x += dx;
        self.offset_y += dy;
    }

    /// Zoom by `factor` while keeping the content under `anchor` (screen) fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32, limits: ZoomLimits) {
        if !factor.is_finite() || factor <= 0.0 {
            return;
        }
        let pinned = self.screen_to_content(anchor);
        self.scale = limits.clamp(self.scale * factor);
        self.offset_x = anchor.x - pinned.x * self.scale;
        self.offset_y = anchor.y - pinned.y * self.scale;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Plain wheel pans; the zoom modifier zooms around the cursor.
    pub fn apply_wheel(&mut self, wheel: WheelInput, limits: ZoomLimits) {
        if wheel.zoom {
            let factor = 1.1f32.powf(-wheel.delta_y / 100.0);
            self.zoom_at(wheel.position, factor, limits);
        } else {
            self.pan(-wheel.delta_x, -wheel.delta_y);
        }
    }

    /// Keep content anchored after `dx, dy` content units were prepended to the document.
    pub fn compensate_prepend(&mut self, dx: f32, dy: f32) {
        self.offset_x -= dx * self.scale;
        self.offset_y -= dy * self.scale;
    }

    /// Content units to viewport device pixels.
    pub fn transform(&self, viewport_dpr: f32) -> Transform {
        Transform::from_scale(viewport_dpr, viewport_dpr)
            .pre_translate(self.offset_x, self.offset_y)
            .pre_scale(self.scale, self.scale)
    }
}

/// Draw the document into a viewport-sized pixmap (device pixels).
pub fn render(surface: &DocumentSurface, view: &ViewState, target: &mut Pixmap, viewport_dpr: f32) {
    target.fill(tiny_skia::Color::TRANSPARENT);
    let quality = if view.scale * viewport_dpr >= surface.scale() {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    let paint = PixmapPaint {
        quality,
        ..PixmapPaint::default()
    };
    // the surface stores physical pixels, undo its scale before applying the view
    let transform = view
        .transform(viewport_dpr)
        .pre_scale(1.0 / surface.scale(), 1.0 / surface.scale());
    target.draw_pixmap(0, 0, surface.pixmap().as_ref(), &paint, transform, None);
}
