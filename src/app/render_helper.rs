use super::painter::PainterApp;
use crate::utils::profiler::ScopeTimer;
use crate::utils::vector::Vec2;
use eframe::egui;
use eframe::egui::{Color32, TextureOptions};
use tiny_skia::Pixmap;

/// Re-render the viewport texture when the session changed, then paint it
/// over a white document backdrop.
pub fn draw_viewport(app: &mut PainterApp, ctx: &egui::Context, ui: &mut egui::Ui, rect: egui::Rect) {
    let ppp = ctx.pixels_per_point();
    let width = (rect.width() * ppp).round().max(1.0) as u32;
    let height = (rect.height() * ppp).round().max(1.0) as u32;

    let resized = app
        .viewport_pixmap
        .as_ref()
        .is_none_or(|p| p.width() != width || p.height() != height);
    if resized {
        app.viewport_pixmap = Pixmap::new(width, height);
    }

    let dirty = app.session.take_dirty() || resized || app.viewport_texture.is_none();
    if dirty {
        if let Some(pixmap) = &mut app.viewport_pixmap {
            let _timer = ScopeTimer::new("viewport_upload");
            app.session.render_viewport(pixmap, ppp);
            let image = egui::ColorImage::from_rgba_premultiplied(
                [width as usize, height as usize],
                pixmap.data(),
            );
            match &mut app.viewport_texture {
                Some(texture) => texture.set(image, TextureOptions::NEAREST),
                None => {
                    app.viewport_texture =
                        Some(ctx.load_texture("viewport", image, TextureOptions::NEAREST));
                }
            }
        }
    }

    let painter = ui.painter_at(rect);
    let view = app.session.view();
    let surface = app.session.surface();
    let to_screen = |content: Vec2| {
        let s = view.content_to_screen(content);
        rect.min + egui::vec2(s.x, s.y)
    };
    let doc_rect = egui::Rect::from_min_max(
        to_screen(Vec2::ZERO),
        to_screen(Vec2::new(surface.width() as f32, surface.height() as f32)),
    );
    painter.rect_filled(doc_rect, 0.0, Color32::WHITE);

    if let Some(texture) = &app.viewport_texture {
        painter.image(
            texture.id(),
            rect,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    if app.session.settings().symmetry {
        let x = doc_rect.center().x;
        painter.line_segment(
            [egui::pos2(x, doc_rect.top()), egui::pos2(x, doc_rect.bottom())],
            egui::Stroke::new(1.0, Color32::from_rgba_unmultiplied(0, 120, 255, 120)),
        );
    }
}
