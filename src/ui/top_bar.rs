use crate::PainterApp;
use crate::brush_engine::settings::Tool;
use eframe::egui;

pub fn top_bar(app: &mut PainterApp, ctx: &egui::Context) {
    egui::TopBottomPanel::top("quick_settings").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let mut tool = app.session.settings().active_tool;
            for candidate in Tool::ALL {
                ui.selectable_value(&mut tool, candidate, candidate.label());
            }
            if tool != app.session.settings().active_tool {
                app.session.set_tool(tool);
            }

            ui.separator();

            let history = app.session.history();
            let (can_undo, can_redo) = (history.can_undo(), history.can_redo());
            if ui.add_enabled(can_undo, egui::Button::new("Undo")).clicked() {
                app.session.undo();
            }
            if ui.add_enabled(can_redo, egui::Button::new("Redo")).clicked() {
                app.session.redo();
            }
            if ui.button("Clear").clicked() {
                match app.session.clear() {
                    Ok(()) => app.persist(),
                    Err(err) => log::error!("could not clear document: {err}"),
                }
            }

            ui.separator();

            if ui.button("Reset view").clicked() {
                app.session.reset_view();
            }
            ui.label(format!("{:.0}%", app.session.view().scale * 100.0));

            ui.separator();

            if ui.button("Export").clicked() {
                app.open_export_modal();
            }
        });
    });
}
