use super::Session;
use crate::brush_engine::settings::{Tool, ToolSettings};
use crate::canvas::surface::pixmap_from_rgba;
use crate::canvas::viewport::ViewState;
use crate::error::PersistError;
use crate::utils::color::Color;
use crate::utils::exporter::{self, ExportFormat};
use image::ImageFormat;
use serde::{Deserialize, Serialize};

/// Settings record saved between runs. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedSettings {
    pub color: Color,
    pub brush_size: f32,
    pub opacity: f32,
    pub spray_strength: u32,
    pub spray_opacity: f32,
    pub active_tool: Tool,
    pub symmetry_enabled: bool,
    pub shape_filled: bool,
    pub rounded_corners: bool,
    pub nib_angle: f32,
    pub nib_aspect: f32,
    pub doc_width: Option<u32>,
    pub doc_height: Option<u32>,
    pub view_scale: f32,
    pub view_offset_x: f32,
    pub view_offset_y: f32,
}

impl Default for PersistedSettings {
    fn default() -> Self {
        let tools = ToolSettings::default();
        let view = ViewState::default();
        Self {
            color: tools.color,
            brush_size: tools.brush_size,
            opacity: tools.opacity,
            spray_strength: tools.spray_strength,
            spray_opacity: tools.spray_opacity,
            active_tool: tools.active_tool,
            symmetry_enabled: tools.symmetry,
            shape_filled: tools.shape_filled,
            rounded_corners: tools.rounded_corners,
            nib_angle: tools.nib_angle_deg,
            nib_aspect: tools.nib_aspect,
            doc_width: None,
            doc_height: None,
            view_scale: view.scale,
            view_offset_x: view.offset_x,
            view_offset_y: view.offset_y,
        }
    }
}

impl PersistedSettings {
    pub fn from_json(json: &str) -> Result<Self, PersistError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, PersistError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn tool_settings(&self) -> ToolSettings {
        let mut tools = ToolSettings {
            color: self.color,
            active_tool: self.active_tool,
            symmetry: self.symmetry_enabled,
            shape_filled: self.shape_filled,
            rounded_corners: self.rounded_corners,
            nib_angle_deg: self.nib_angle,
            nib_aspect: self.nib_aspect,
            ..ToolSettings::default()
        };
        tools.set_brush_size(self.brush_size);
        tools.set_opacity(self.opacity);
        tools.set_spray_strength(self.spray_strength);
        tools.set_spray_opacity(self.spray_opacity);
        tools
    }
}

impl Session {
    /// Snapshot of the settings record for saving.
    pub fn persisted_settings(&self) -> PersistedSettings {
        let tools = &self.settings;
        PersistedSettings {
            color: tools.color,
            brush_size: tools.brush_size,
            opacity: tools.opacity,
            spray_strength: tools.spray_strength,
            spray_opacity: tools.spray_opacity,
            active_tool: tools.active_tool,
            symmetry_enabled: tools.symmetry,
            shape_filled: tools.shape_filled,
            rounded_corners: tools.rounded_corners,
            nib_angle: tools.nib_angle_deg,
            nib_aspect: tools.nib_aspect,
            doc_width: Some(self.surface.width()),
            doc_height: Some(self.surface.height()),
            view_scale: self.view.scale,
            view_offset_x: self.view.offset_x,
            view_offset_y: self.view.offset_y,
        }
    }

    /// The committed document as PNG bytes.
    pub fn encode_document(&self) -> Result<Vec<u8>, PersistError> {
        let snapshot = self.surface.to_exportable_image();
        Ok(exporter::encode(snapshot.pixmap(), ExportFormat::Png, 100)?)
    }

    /// Rebuild the session from a saved settings record and document image.
    ///
    /// The document is reallocated at the saved logical size and the image is
    /// stretched over it. On any failure the session falls back to an empty
    /// viewport-sized document with fresh history and the error is returned.
    pub fn restore(
        &mut self,
        settings_json: Option<&str>,
        image_png: Option<&[u8]>,
    ) -> Result<(), PersistError> {
        self.engine.cancel(&mut self.surface);
        let result = self.try_restore(settings_json, image_png);
        if let Err(err) = &result {
            log::warn!("restore failed, starting with an empty document: {err}");
            self.fall_back_to_empty()?;
        }
        self.history.clear();
        self.history.push(self.surface.snapshot());
        self.dirty = true;
        result
    }

    fn try_restore(
        &mut self,
        settings_json: Option<&str>,
        image_png: Option<&[u8]>,
    ) -> Result<(), PersistError> {
        if let Some(json) = settings_json {
            let saved = PersistedSettings::from_json(json)?;
            self.settings = saved.tool_settings();
            if let (Some(w), Some(h)) = (saved.doc_width, saved.doc_height) {
                self.surface.resize_to_fit(w as f32, h as f32)?;
            }
            self.view = ViewState {
                scale: self.config.zoom.clamp(saved.view_scale),
                offset_x: finite_or_zero(saved.view_offset_x),
                offset_y: finite_or_zero(saved.view_offset_y),
            };
        }
        if let Some(bytes) = image_png {
            let decoded = image::load_from_memory_with_format(bytes, ImageFormat::Png)?.to_rgba8();
            let (w, h) = decoded.dimensions();
            let pixmap = pixmap_from_rgba(w, h, decoded.as_raw())?;
            self.surface.blit_image_stretched(&pixmap);
        }
        Ok(())
    }

    fn fall_back_to_empty(&mut self) -> Result<(), PersistError> {
        self.surface.resize_to_fit(self.viewport.x, self.viewport.y)?;
        self.view.reset();
        Ok(())
    }
}

fn finite_or_zero(v: f32) -> f32 {
    if v.is_finite() { v } else { 0.0 }
}
