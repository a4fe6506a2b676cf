pub mod persist;

use crate::brush_engine::settings::{Tool, ToolSettings};
use crate::brush_engine::stroke::StrokeEngine;
use crate::canvas::history::History;
use crate::canvas::surface::{DEFAULT_EXPANSION_MARGIN, DocumentSurface, Snapshot};
use crate::canvas::viewport::{self, ViewState, WheelInput, ZoomLimits};
use crate::error::{ExportError, SurfaceError};
use crate::utils::exporter::{self, ExportRequest, ExportedImage};
use crate::utils::vector::Vec2;
use serde::{Deserialize, Serialize};
use tiny_skia::Pixmap;

pub use persist::PersistedSettings;

/// Startup configuration for a [`Session`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Viewport size in screen units; also the initial document size.
    pub viewport_width: f32,
    pub viewport_height: f32,
    /// Backing resolution of the document, clamped to 1..=3.
    pub device_pixel_ratio: f32,
    pub expansion_margin: f32,
    pub history_limit: Option<usize>,
    pub zoom: ZoomLimits,
    /// Fixed spray seed for reproducible sessions.
    pub spray_seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            viewport_width: 800.0,
            viewport_height: 600.0,
            device_pixel_ratio: 1.0,
            expansion_margin: DEFAULT_EXPANSION_MARGIN,
            history_limit: None,
            zoom: ZoomLimits::default(),
            spray_seed: None,
        }
    }
}

/// Everything one open drawing needs: the document, view, tools, history
/// and the stroke in progress. Input adapters talk to this in screen units.
pub struct Session {
    config: SessionConfig,
    surface: DocumentSurface,
    view: ViewState,
    settings: ToolSettings,
    history: History<Snapshot>,
    engine: StrokeEngine,
    viewport: Vec2,
    dirty: bool,
}

impl Session {
    /// A blank document the size of the viewport, with one history entry.
    pub fn new(config: SessionConfig) -> Result<Self, SurfaceError> {
        let viewport = Vec2::new(config.viewport_width, config.viewport_height);
        let surface = DocumentSurface::new(
            dimension(viewport.x),
            dimension(viewport.y),
            config.device_pixel_ratio,
        )?;
        let engine = match config.spray_seed {
            Some(seed) => StrokeEngine::with_seed(config.expansion_margin, seed),
            None => StrokeEngine::new(config.expansion_margin),
        };
        let mut history = History::with_limit(config.history_limit);
        history.push(surface.snapshot());
        Ok(Self {
            config,
            surface,
            view: ViewState::default(),
            settings: ToolSettings::default(),
            history,
            engine,
            viewport,
            dirty: true,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn surface(&self) -> &DocumentSurface {
        &self.surface
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn settings(&self) -> &ToolSettings {
        &self.settings
    }

    /// Edits apply to the next stroke, never the running one.
    pub fn settings_mut(&mut self) -> &mut ToolSettings {
        &mut self.settings
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn engine(&self) -> &StrokeEngine {
        &self.engine
    }

    pub fn viewport_size(&self) -> Vec2 {
        self.viewport
    }

    pub fn is_drawing(&self) -> bool {
        self.engine.is_active()
    }

    /// Whether the viewport needs re-rendering; clears the flag.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn pointer_down(&mut self, screen: Vec2) {
        if self.engine.is_active() {
            self.pointer_up(None);
        }
        let point = self.view.screen_to_content(screen);
        match self
            .engine
            .begin(&mut self.surface, &mut self.view, &self.settings, point)
        {
            Ok(()) => self.dirty = true,
            Err(err) => log::error!("could not start stroke: {err}"),
        }
    }

    pub fn pointer_move(&mut self, screen: Vec2) {
        if !self.engine.is_active() {
            return;
        }
        let point = self.view.screen_to_content(screen);
        self.engine.update(&mut self.surface, &mut self.view, point);
        self.dirty = true;
    }

    /// Finish the stroke. Shapes use `screen` as their final corner when given.
    pub fn pointer_up(&mut self, screen: Option<Vec2>) -> bool {
        let end = screen.map(|s| self.view.screen_to_content(s));
        let committed =
            self.engine
                .commit(&mut self.surface, &mut self.view, &mut self.history, end);
        self.dirty |= committed;
        committed
    }

    /// The pointer left the drawing area: commit at the last known point.
    pub fn pointer_leave(&mut self) -> bool {
        self.pointer_up(None)
    }

    /// Once per display frame.
    pub fn frame(&mut self) -> bool {
        let painted = self.engine.frame(&mut self.surface);
        self.dirty |= painted;
        painted
    }

    pub fn undo(&mut self) -> bool {
        self.engine.cancel(&mut self.surface);
        match self.history.undo().cloned() {
            Some(snapshot) => {
                self.restore_snapshot(&snapshot);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        self.engine.cancel(&mut self.surface);
        match self.history.redo().cloned() {
            Some(snapshot) => {
                self.restore_snapshot(&snapshot);
                true
            }
            None => false,
        }
    }

    /// Blank document the size of the viewport, view reset, recorded in history.
    pub fn clear(&mut self) -> Result<(), SurfaceError> {
        self.engine.cancel(&mut self.surface);
        self.surface.resize_to_fit(self.viewport.x, self.viewport.y)?;
        self.view.reset();
        self.history.push(self.surface.snapshot());
        self.dirty = true;
        log::debug!("cleared document to {}x{}", self.surface.width(), self.surface.height());
        Ok(())
    }

    /// Track the host viewport size. The document keeps its size.
    pub fn resize_viewport(&mut self, width: f32, height: f32) {
        let size = Vec2::new(width.max(1.0), height.max(1.0));
        if size != self.viewport {
            self.viewport = size;
            self.dirty = true;
        }
    }

    pub fn reset_view(&mut self) {
        self.view.reset();
        self.dirty = true;
    }

    pub fn pan(&mut self, dx: f32, dy: f32) {
        self.view.pan(dx, dy);
        self.dirty = true;
    }

    pub fn wheel(&mut self, wheel: WheelInput) {
        self.view.apply_wheel(wheel, self.config.zoom);
        self.dirty = true;
    }

    /// Pinch zoom keeping the content under `anchor` fixed.
    pub fn zoom_at(&mut self, anchor: Vec2, factor: f32) {
        if factor.is_finite() && factor > 0.0 {
            self.view.zoom_at(anchor, factor, self.config.zoom);
            self.dirty = true;
        }
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.settings.active_tool = tool;
    }

    pub fn toggle_symmetry(&mut self) -> bool {
        self.settings.symmetry = !self.settings.symmetry;
        self.settings.symmetry
    }

    pub fn toggle_fill(&mut self) -> bool {
        self.settings.shape_filled = !self.settings.shape_filled;
        self.settings.shape_filled
    }

    /// Apply a hex color; malformed input is logged and ignored.
    pub fn set_color_hex(&mut self, hex: &str) -> bool {
        match self.settings.set_color_hex(hex) {
            Ok(()) => true,
            Err(err) => {
                log::warn!("keeping {}: {err}", self.settings.color);
                false
            }
        }
    }

    pub fn export(&self, request: &ExportRequest) -> Result<ExportedImage, ExportError> {
        let result = exporter::export(
            &self.surface.to_exportable_image(),
            request,
            self.settings.color,
        );
        if let Err(err) = &result {
            log::error!("export of {} failed: {err}", request.filename());
        }
        result
    }

    /// Draw the document into a viewport buffer of device pixels.
    pub fn render_viewport(&self, target: &mut Pixmap, viewport_dpr: f32) {
        viewport::render(&self.surface, &self.view, target, viewport_dpr);
    }

    /// Reinstate a history entry, keeping on-screen content where it was even
    /// if the entry was taken before or after an expansion.
    fn restore_snapshot(&mut self, snapshot: &Snapshot) {
        let (old_x, old_y) = self.surface.origin();
        let (new_x, new_y) = snapshot.origin();
        self.surface.restore(snapshot);
        self.view
            .compensate_prepend(new_x as f32 - old_x as f32, new_y as f32 - old_y as f32);
        self.dirty = true;
    }
}

fn dimension(v: f32) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v.floor() as u32
    } else {
        1
    }
}
