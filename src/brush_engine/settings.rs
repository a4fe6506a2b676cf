use crate::canvas::blend::BlendMode;
use crate::error::ColorError;
use crate::utils::color::Color;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    #[default]
    Brush,
    Eraser,
    Spray,
    Calligraphy,
    Rect,
    Circle,
}

impl Tool {
    pub const ALL: [Tool; 6] = [
        Tool::Brush,
        Tool::Calligraphy,
        Tool::Spray,
        Tool::Eraser,
        Tool::Rect,
        Tool::Circle,
    ];

    /// Single-key shortcut used by the desktop shell.
    pub fn from_shortcut(key: char) -> Option<Tool> {
        match key.to_ascii_lowercase() {
            'b' => Some(Tool::Brush),
            'n' => Some(Tool::Calligraphy),
            'v' => Some(Tool::Spray),
            'e' => Some(Tool::Eraser),
            'r' => Some(Tool::Rect),
            'o' => Some(Tool::Circle),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tool::Brush => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Spray => "Spray",
            Tool::Calligraphy => "Calligraphy",
            Tool::Rect => "Rectangle",
            Tool::Circle => "Circle",
        }
    }

    pub fn blend_mode(&self) -> BlendMode {
        match self {
            Tool::Eraser => BlendMode::Erase,
            _ => BlendMode::Paint,
        }
    }

    /// Spray paints straight onto the document; every other tool previews on a held base.
    pub fn uses_preview_base(&self) -> bool {
        !matches!(self, Tool::Spray)
    }
}

/// Tool configuration. Copied into a stroke when it begins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolSettings {
    pub color: Color,
    pub brush_size: f32,
    pub opacity: f32,
    pub spray_strength: u32,
    pub spray_opacity: f32,
    pub active_tool: Tool,
    pub symmetry: bool,
    pub shape_filled: bool,
    pub rounded_corners: bool,
    pub nib_angle_deg: f32,
    pub nib_aspect: f32,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            color: Color::default(),
            brush_size: 10.0,
            opacity: 1.0,
            spray_strength: 20,
            spray_opacity: 1.0,
            active_tool: Tool::Brush,
            symmetry: false,
            shape_filled: false,
            rounded_corners: true,
            nib_angle_deg: -35.0,
            nib_aspect: 0.35,
        }
    }
}

impl ToolSettings {
    /// Apply a hex color. On error the previous color is kept.
    pub fn set_color_hex(&mut self, hex: &str) -> Result<(), ColorError> {
        self.color = Color::from_hex(hex)?;
        Ok(())
    }

    pub fn set_brush_size(&mut self, size: f32) {
        if size.is_finite() {
            self.brush_size = size.max(1.0);
        }
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        if opacity.is_finite() {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }

    pub fn set_spray_strength(&mut self, strength: u32) {
        self.spray_strength = strength.max(1);
    }

    pub fn set_spray_opacity(&mut self, opacity: f32) {
        if opacity.is_finite() {
            self.spray_opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortcuts_cover_every_tool() {
        for (key, tool) in [
            ('b', Tool::Brush),
            ('N', Tool::Calligraphy),
            ('v', Tool::Spray),
            ('e', Tool::Eraser),
            ('r', Tool::Rect),
            ('o', Tool::Circle),
        ] {
            assert_eq!(Tool::from_shortcut(key), Some(tool));
        }
        assert_eq!(Tool::from_shortcut('x'), None);
    }

    #[test]
    fn bad_hex_keeps_previous_color() {
        let mut settings = ToolSettings::default();
        assert!(settings.set_color_hex("#12zz56").is_err());
        assert_eq!(settings.color, Color::rgb(0xff, 0x95, 0x00));
        settings.set_color_hex("#00ff00").unwrap();
        assert_eq!(settings.color, Color::rgb(0, 255, 0));
    }

    #[test]
    fn setters_clamp() {
        let mut settings = ToolSettings::default();
        settings.set_brush_size(0.2);
        settings.set_opacity(3.0);
        settings.set_spray_strength(0);
        settings.set_spray_opacity(f32::NAN);
        assert_eq!(settings.brush_size, 1.0);
        assert_eq!(settings.opacity, 1.0);
        assert_eq!(settings.spray_strength, 1);
        assert_eq!(settings.spray_opacity, 1.0);
    }

    #[test]
    fn eraser_erases() {
        assert_eq!(Tool::Eraser.blend_mode(), BlendMode::Erase);
        assert_eq!(Tool::Rect.blend_mode(), BlendMode::Paint);
        assert!(!Tool::Spray.uses_preview_base());
    }
}
