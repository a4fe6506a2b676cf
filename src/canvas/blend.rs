use crate::utils::color::Color;
use serde::{Deserialize, Serialize};
use tiny_skia::Paint;

/// How new marks combine with the pixels already on the document.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlendMode {
    /// Source-over compositing.
    #[default]
    Paint,
    /// Destination-out: removes coverage proportional to the mark's alpha.
    Erase,
}

impl From<BlendMode> for tiny_skia::BlendMode {
    fn from(mode: BlendMode) -> Self {
        match mode {
            BlendMode::Paint => tiny_skia::BlendMode::SourceOver,
            BlendMode::Erase => tiny_skia::BlendMode::DestinationOut,
        }
    }
}

/// Color, opacity and blend mode for one raster operation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ink {
    pub color: Color,
    pub opacity: f32,
    pub blend: BlendMode,
}

impl Ink {
    pub fn new(color: Color, opacity: f32, blend: BlendMode) -> Self {
        Self {
            color,
            opacity,
            blend,
        }
    }

    /// Anti-aliased tiny-skia paint for this ink.
    pub fn paint(&self) -> Paint<'static> {
        let mut paint = Paint::default();
        paint.set_color(self.color.to_skia(self.opacity));
        paint.anti_alias = true;
        paint.blend_mode = self.blend.into();
        paint
    }
}
