use crate::PainterApp;
use crate::brush_engine::settings::Tool;
use crate::utils::color::{Color, Harmony};
use eframe::egui;

const SWATCH: f32 = 22.0;

/// Side panel with the active tool's parameters and the color controls.
pub fn tool_panel(app: &mut PainterApp, ctx: &egui::Context) {
    egui::SidePanel::left("tool_panel")
        .default_width(200.0)
        .show(ctx, |ui| {
            tool_settings(app, ui);
            ui.separator();
            color_settings(app, ui);
        });
}

fn tool_settings(app: &mut PainterApp, ui: &mut egui::Ui) {
    let settings = app.session.settings_mut();
    ui.heading(settings.active_tool.label());

    ui.label("Size:");
    ui.add(egui::Slider::new(&mut settings.brush_size, 1.0..=200.0).logarithmic(true));

    match settings.active_tool {
        Tool::Spray => {
            ui.label("Strength:");
            ui.add(egui::Slider::new(&mut settings.spray_strength, 1..=200));
            ui.label("Opacity:");
            ui.add(egui::Slider::new(&mut settings.spray_opacity, 0.0..=1.0));
        }
        Tool::Calligraphy => {
            ui.label("Opacity:");
            ui.add(egui::Slider::new(&mut settings.opacity, 0.0..=1.0));
            ui.label("Nib angle:");
            ui.add(egui::Slider::new(&mut settings.nib_angle_deg, -90.0..=90.0).suffix("°"));
            ui.label("Nib aspect:");
            ui.add(egui::Slider::new(&mut settings.nib_aspect, 0.05..=1.0));
        }
        Tool::Rect | Tool::Circle => {
            ui.label("Opacity:");
            ui.add(egui::Slider::new(&mut settings.opacity, 0.0..=1.0));
            ui.checkbox(&mut settings.shape_filled, "Filled");
            if settings.active_tool == Tool::Rect {
                ui.checkbox(&mut settings.rounded_corners, "Rounded corners");
            }
        }
        Tool::Brush | Tool::Eraser => {
            ui.label("Opacity:");
            ui.add(egui::Slider::new(&mut settings.opacity, 0.0..=1.0));
        }
    }

    ui.add_space(5.0);
    ui.checkbox(&mut settings.symmetry, "Mirror (M)");
}

fn color_settings(app: &mut PainterApp, ui: &mut egui::Ui) {
    ui.heading("Color");

    let current = app.session.settings().color;
    let mut rgb = [current.r, current.g, current.b];
    if ui.color_edit_button_srgb(&mut rgb).changed() {
        let picked = Color::rgb(rgb[0], rgb[1], rgb[2]);
        set_color(app, picked);
    }

    let response = ui.add(egui::TextEdit::singleline(&mut app.hex_input).desired_width(90.0));
    if response.lost_focus() {
        let hex = app.hex_input.clone();
        if !app.session.set_color_hex(&hex) {
            app.hex_input = app.session.settings().color.to_hex();
        }
    }

    ui.add_space(5.0);
    egui::ComboBox::from_id_salt("harmony")
        .selected_text(app.harmony.label())
        .show_ui(ui, |ui| {
            for harmony in Harmony::ALL {
                ui.selectable_value(&mut app.harmony, harmony, harmony.label());
            }
        });

    let palette = app.session.settings().color.harmony(app.harmony);
    ui.horizontal(|ui| {
        for swatch in palette {
            let button = egui::Button::new("")
                .fill(swatch.to_color32())
                .min_size(egui::vec2(SWATCH, SWATCH));
            if ui.add(button).on_hover_text(swatch.to_hex()).clicked() {
                set_color(app, swatch);
            }
        }
    });
}

fn set_color(app: &mut PainterApp, color: Color) {
    app.session.settings_mut().color = color;
    app.hex_input = color.to_hex();
}
