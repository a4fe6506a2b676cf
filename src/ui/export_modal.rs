use crate::PainterApp;
use crate::error::ExportError;
use crate::utils::exporter::{self, ExportBackground, ExportFormat, ExportRequest};
use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;

/// Modal dialog to export the current document to disk with a native file picker.
pub fn export_modal(app: &mut PainterApp, ctx: &egui::Context) {
    if !app.show_export_modal {
        return;
    }

    let mut open = app.show_export_modal;
    egui::Window::new("Export Drawing")
        .open(&mut open)
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            let settings = &mut app.export_settings;
            let request = &mut settings.request;

            ui.horizontal(|ui| {
                ui.label("Name");
                ui.text_edit_singleline(&mut request.filename_stem);
            });

            ui.horizontal(|ui| {
                ui.label("Format");
                egui::ComboBox::from_id_salt("export_format")
                    .selected_text(request.format.label())
                    .show_ui(ui, |ui| {
                        for format in ExportFormat::ALL {
                            ui.selectable_value(&mut request.format, format, format.label());
                        }
                    });
            });

            ui.horizontal(|ui| {
                ui.label("Background");
                egui::ComboBox::from_id_salt("export_background")
                    .selected_text(request.effective_background().label())
                    .show_ui(ui, |ui| {
                        for background in [
                            ExportBackground::Transparent,
                            ExportBackground::White,
                            ExportBackground::CurrentColor,
                        ] {
                            ui.selectable_value(
                                &mut request.background,
                                background,
                                background.label(),
                            );
                        }
                    });
            });

            ui.label("Scale:");
            ui.add(egui::Slider::new(&mut request.scale_factor, 0.1..=4.0).suffix("x"));

            if request.format == ExportFormat::Jpeg {
                ui.label("Quality:");
                ui.add(egui::Slider::new(&mut request.quality, 0.5..=1.0));
            }

            ui.separator();
            ui.heading("Destination");
            ui.horizontal(|ui| {
                ui.label("File");
                let display = settings
                    .chosen_path
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| settings.request.filename());
                ui.monospace(display);
                if ui.button("Choose...").clicked() {
                    if let Some(path) = pick_file(&settings.request) {
                        settings.chosen_path = Some(path);
                    }
                }
            });

            if let Some(msg) = &app.export_message {
                ui.label(msg);
            }

            if app.export_in_progress {
                ui.add(
                    egui::ProgressBar::new(app.export_progress)
                        .desired_width(200.0)
                        .text("Exporting..."),
                );
            }

            ui.separator();
            ui.horizontal(|ui| {
                let disabled = app.export_in_progress;
                if ui
                    .add_enabled(!disabled, egui::Button::new("Export"))
                    .clicked()
                {
                    let target = app.export_settings.output_path();
                    start_export(app, target);
                }
                if ui
                    .add_enabled(!disabled, egui::Button::new("Cancel"))
                    .clicked()
                {
                    app.show_export_modal = false;
                }
            });
        });

    app.show_export_modal &= open;
}

/// Ask for a destination right away and export with the current settings.
pub fn save_dialog(app: &mut PainterApp) {
    if app.export_in_progress {
        return;
    }
    if let Some(path) = pick_file(&app.export_settings.request) {
        app.export_settings.chosen_path = Some(path);
        let target = app.export_settings.output_path();
        start_export(app, target);
    }
}

/// Snapshot on the UI thread, then encode and save on a worker thread.
fn start_export(app: &mut PainterApp, target: PathBuf) {
    let snapshot = app.session.surface().to_exportable_image();
    let request = app.export_settings.request.clone();
    let current_color = app.session.settings().color;

    app.export_in_progress = true;
    app.export_progress = 0.05;
    app.export_message = Some("Exporting...".to_string());
    let (tx, rx) = mpsc::channel();
    app.export_progress_rx = Some(rx);
    app.export_task = Some(thread::spawn(move || -> Result<PathBuf, ExportError> {
        let _ = tx.send(ExportProgress {
            progress: 0.2,
            message: Some("Encoding...".to_string()),
        });
        let image = exporter::export(&snapshot, &request, current_color)?;
        let _ = tx.send(ExportProgress {
            progress: 0.8,
            message: Some("Saving file...".to_string()),
        });
        image.save_as(&target)?;
        log::debug!("exported {}x{} to {:?}", image.width, image.height, target);
        Ok(target)
    }));
}

fn pick_file(request: &ExportRequest) -> Option<PathBuf> {
    rfd::FileDialog::new()
        .set_file_name(request.filename())
        .add_filter(request.format.label(), &[request.format.extension()])
        .save_file()
}

/// Export settings tracked by the app.
#[derive(Clone, Debug, Default)]
pub struct ExportSettings {
    pub request: ExportRequest,
    pub chosen_path: Option<PathBuf>,
}

impl ExportSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_path(&self) -> PathBuf {
        if let Some(path) = &self.chosen_path {
            ensure_extension(path.clone(), self.request.format.extension())
        } else {
            Path::new(&self.request.filename()).to_path_buf()
        }
    }
}

fn ensure_extension(mut path: PathBuf, ext: &str) -> PathBuf {
    match path.extension().and_then(|e| e.to_str()) {
        Some(current) if current.eq_ignore_ascii_case(ext) => path,
        // "jpeg" is as good as "jpg"
        Some(current) if ext == "jpg" && current.eq_ignore_ascii_case("jpeg") => path,
        _ => {
            path.set_extension(ext);
            path
        }
    }
}

pub struct ExportProgress {
    pub progress: f32,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_follows_the_format() {
        let mut settings = ExportSettings::new();
        assert_eq!(settings.output_path(), PathBuf::from("drawing.png"));

        settings.request.format = ExportFormat::Jpeg;
        settings.chosen_path = Some(PathBuf::from("/tmp/sketch.png"));
        assert_eq!(settings.output_path(), PathBuf::from("/tmp/sketch.jpg"));

        settings.chosen_path = Some(PathBuf::from("/tmp/sketch.JPEG"));
        assert_eq!(settings.output_path(), PathBuf::from("/tmp/sketch.JPEG"));
    }
}
