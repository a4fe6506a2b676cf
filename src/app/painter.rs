use super::input_handler::handle_input;
use super::render_helper::draw_viewport;
use super::storage::Storage;
use crate::error::{ExportError, SurfaceError};
use crate::session::{Session, SessionConfig};
use crate::ui;
use crate::ui::export_modal::{ExportProgress, ExportSettings};
use crate::utils::color::Harmony;
use eframe::egui;
use eframe::egui::TextureHandle;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread::JoinHandle;
use tiny_skia::Pixmap;

/// Desktop shell around a [`Session`]: owns the egui texture, panels and
/// local storage.
pub struct PainterApp {
    pub(crate) session: Session,
    pub(crate) storage: Option<Storage>,

    pub(crate) viewport_texture: Option<TextureHandle>,
    pub(crate) viewport_pixmap: Option<Pixmap>,
    pub(crate) is_panning: bool,
    pub(crate) last_pointer: Option<egui::Pos2>,

    pub(crate) hex_input: String,
    pub(crate) harmony: Harmony,
    pub(crate) show_export_modal: bool,
    pub(crate) export_settings: ExportSettings,
    pub(crate) export_message: Option<String>,
    pub(crate) export_in_progress: bool,
    pub(crate) export_task: Option<JoinHandle<Result<PathBuf, ExportError>>>,
    pub(crate) export_progress: f32,
    pub(crate) export_progress_rx: Option<mpsc::Receiver<ExportProgress>>,
}

impl PainterApp {
    /// Build the session and reload the last drawing from local storage.
    pub fn new(cc: &eframe::CreationContext<'_>) -> Result<Self, SurfaceError> {
        let config = SessionConfig {
            device_pixel_ratio: cc.egui_ctx.pixels_per_point(),
            ..SessionConfig::default()
        };
        Self::with_storage(config, Some(Storage::new(Storage::default_dir())))
    }

    pub fn with_storage(
        config: SessionConfig,
        storage: Option<Storage>,
    ) -> Result<Self, SurfaceError> {
        let mut session = Session::new(config)?;
        if let Some(storage) = &storage {
            match storage.load() {
                Ok(stored) if !stored.is_empty() => {
                    let restored = session.restore(
                        stored.settings_json.as_deref(),
                        stored.canvas_png.as_deref(),
                    );
                    if let Err(err) = restored {
                        log::error!("could not restore drawing: {err}");
                    }
                }
                Ok(_) => {}
                Err(err) => log::warn!("ignoring stored drawing in {:?}: {err}", storage.dir()),
            }
        }
        let hex_input = session.settings().color.to_hex();
        Ok(Self {
            session,
            storage,
            viewport_texture: None,
            viewport_pixmap: None,
            is_panning: false,
            last_pointer: None,
            hex_input,
            harmony: Harmony::default(),
            show_export_modal: false,
            export_settings: ExportSettings::new(),
            export_message: None,
            export_in_progress: false,
            export_task: None,
            export_progress: 0.0,
            export_progress_rx: None,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Write the settings and the document to local storage.
    pub(crate) fn persist(&self) {
        let Some(storage) = &self.storage else {
            return;
        };
        let settings = match self.session.persisted_settings().to_json() {
            Ok(json) => json,
            Err(err) => {
                log::error!("could not serialize settings: {err}");
                return;
            }
        };
        let png = match self.session.encode_document() {
            Ok(png) => png,
            Err(err) => {
                log::error!("could not encode document: {err}");
                return;
            }
        };
        if let Err(err) = storage.save(&settings, &png) {
            log::error!("could not save drawing to {:?}: {err}", storage.dir());
        }
    }

    pub(crate) fn open_export_modal(&mut self) {
        self.export_settings.chosen_path = None;
        self.export_message = None;
        self.show_export_modal = true;
    }

    /// Pick up progress and the result of a running export.
    fn poll_export(&mut self) {
        if let Some(rx) = &self.export_progress_rx {
            for update in rx.try_iter() {
                self.export_progress = update.progress;
                if let Some(msg) = update.message {
                    self.export_message = Some(msg);
                }
            }
        }

        let finished = self
            .export_task
            .as_ref()
            .is_some_and(|task| task.is_finished());
        if !finished {
            return;
        }
        if let Some(task) = self.export_task.take() {
            self.export_message = Some(match task.join() {
                Ok(Ok(path)) => format!("Saved to {}", path.display()),
                Ok(Err(err)) => {
                    log::error!("export failed: {err}");
                    format!("Export failed: {err}")
                }
                Err(_) => "Export failed: worker panicked".to_string(),
            });
        }
        self.export_in_progress = false;
        self.export_progress_rx = None;
    }
}

impl eframe::App for PainterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.poll_export();

        ui::top_bar::top_bar(self, ctx);
        ui::tool_panel::tool_panel(self, ctx);
        ui::export_modal::export_modal(self, ctx);

        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(egui::Color32::from_gray(60)))
            .show(ctx, |ui| {
                let (rect, response) =
                    ui.allocate_at_least(ui.available_size(), egui::Sense::click_and_drag());
                self.session.resize_viewport(rect.width(), rect.height());

                handle_input(self, ctx, rect, &response);
                self.session.frame();
                draw_viewport(self, ctx, ui, rect);
            });

        if self.session.is_drawing() || self.export_in_progress {
            ctx.request_repaint();
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.persist();
    }
}
