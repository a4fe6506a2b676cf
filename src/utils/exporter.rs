use crate::canvas::surface::Snapshot;
use crate::error::{ExportError, SurfaceError};
use crate::utils::{color::Color, profiler::ScopeTimer};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::{ExtendedColorType, ImageEncoder};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tiny_skia::{FilterQuality, Pixmap, PixmapPaint, Transform};

pub const DEFAULT_QUALITY: f32 = 0.92;
const MIN_SCALE_FACTOR: f32 = 0.1;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Png,
    Jpeg,
    Webp,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Png, ExportFormat::Jpeg, ExportFormat::Webp];

    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Png => "PNG",
            ExportFormat::Jpeg => "JPEG",
            ExportFormat::Webp => "WebP",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
            ExportFormat::Webp => "webp",
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
            ExportFormat::Webp => "image/webp",
        }
    }

    /// Formats that cannot keep transparency are flattened onto white.
    pub fn is_lossy(&self) -> bool {
        matches!(self, ExportFormat::Jpeg | ExportFormat::Webp)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportBackground {
    #[default]
    Transparent,
    White,
    CurrentColor,
}

impl ExportBackground {
    pub fn label(&self) -> &'static str {
        match self {
            ExportBackground::Transparent => "Transparent",
            ExportBackground::White => "White",
            ExportBackground::CurrentColor => "Current color",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportRequest {
    pub format: ExportFormat,
    pub filename_stem: String,
    pub scale_factor: f32,
    pub background: ExportBackground,
    /// 0.5..=1, used by JPEG only.
    pub quality: f32,
}

impl Default for ExportRequest {
    fn default() -> Self {
        Self {
            format: ExportFormat::Png,
            filename_stem: "drawing".to_string(),
            scale_factor: 1.0,
            background: ExportBackground::Transparent,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl ExportRequest {
    /// `stem.ext`, with an empty stem replaced by `drawing`.
    pub fn filename(&self) -> String {
        let stem = self.filename_stem.trim();
        let stem = if stem.is_empty() { "drawing" } else { stem };
        format!("{}.{}", stem, self.format.extension())
    }

    pub fn effective_background(&self) -> ExportBackground {
        if self.format.is_lossy() && self.background == ExportBackground::Transparent {
            ExportBackground::White
        } else {
            self.background
        }
    }

    fn scale_factor(&self) -> f32 {
        if self.scale_factor.is_finite() {
            self.scale_factor.max(MIN_SCALE_FACTOR)
        } else {
            1.0
        }
    }

    fn quality(&self) -> u8 {
        let q = if self.quality.is_finite() {
            self.quality.clamp(0.5, 1.0)
        } else {
            DEFAULT_QUALITY
        };
        (q * 100.0).round() as u8
    }
}

/// Encoded export ready to be written or downloaded.
#[derive(Clone, Debug)]
pub struct ExportedImage {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub mime: &'static str,
    pub width: u32,
    pub height: u32,
}

impl ExportedImage {
    pub fn save_as(&self, path: &Path) -> Result<(), ExportError> {
        std::fs::write(path, &self.bytes)?;
        Ok(())
    }
}

/// Flatten the snapshot onto its background at the requested scale.
pub fn render_export(
    snapshot: &Snapshot,
    request: &ExportRequest,
    current_color: Color,
) -> Result<Pixmap, ExportError> {
    let source = snapshot.pixmap();
    let factor = request.scale_factor();
    let width = ((source.width() as f32 * factor).round() as u32).max(1);
    let height = ((source.height() as f32 * factor).round() as u32).max(1);
    let mut out = Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;

    match request.effective_background() {
        ExportBackground::Transparent => {}
        ExportBackground::White => out.fill(tiny_skia::Color::WHITE),
        ExportBackground::CurrentColor => out.fill(current_color.with_alpha(255).to_skia(1.0)),
    }

    let sx = width as f32 / source.width() as f32;
    let sy = height as f32 / source.height() as f32;
    let quality = if sx == 1.0 && sy == 1.0 {
        FilterQuality::Nearest
    } else {
        FilterQuality::Bilinear
    };
    let paint = PixmapPaint {
        quality,
        ..PixmapPaint::default()
    };
    out.draw_pixmap(
        0,
        0,
        source.as_ref(),
        &paint,
        Transform::from_scale(sx, sy),
        None,
    );
    Ok(out)
}

/// Render and encode the snapshot. The document itself is never touched.
pub fn export(
    snapshot: &Snapshot,
    request: &ExportRequest,
    current_color: Color,
) -> Result<ExportedImage, ExportError> {
    let _timer = ScopeTimer::new("export");
    let flattened = render_export(snapshot, request, current_color)?;
    let bytes = encode(&flattened, request.format, request.quality())?;
    Ok(ExportedImage {
        bytes,
        filename: request.filename(),
        mime: request.format.mime(),
        width: flattened.width(),
        height: flattened.height(),
    })
}

/// Encode a premultiplied pixmap. `quality` is 1..=100 and only affects JPEG.
pub fn encode(pixmap: &Pixmap, format: ExportFormat, quality: u8) -> Result<Vec<u8>, ExportError> {
    let (w, h) = (pixmap.width(), pixmap.height());
    let mut bytes = Vec::new();
    match format {
        ExportFormat::Png => {
            PngEncoder::new(&mut bytes).write_image(
                &straight_rgba(pixmap),
                w,
                h,
                ExtendedColorType::Rgba8,
            )?;
        }
        ExportFormat::Jpeg => {
            JpegEncoder::new_with_quality(&mut bytes, quality).write_image(
                &straight_rgb(pixmap),
                w,
                h,
                ExtendedColorType::Rgb8,
            )?;
        }
        ExportFormat::Webp => {
            // the bundled WebP encoder is lossless only
            WebPEncoder::new_lossless(&mut bytes).write_image(
                &straight_rgba(pixmap),
                w,
                h,
                ExtendedColorType::Rgba8,
            )?;
        }
    }
    Ok(bytes)
}

/// Demultiplied RGBA8 bytes, row-major.
pub fn straight_rgba(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = vec![0u8; pixmap.pixels().len() * 4];
    out.par_chunks_exact_mut(4)
        .zip(pixmap.pixels().par_iter())
        .for_each(|(dst, px)| {
            let c = px.demultiply();
            dst.copy_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        });
    out
}

fn straight_rgb(pixmap: &Pixmap) -> Vec<u8> {
    let mut out = vec![0u8; pixmap.pixels().len() * 3];
    out.par_chunks_exact_mut(3)
        .zip(pixmap.pixels().par_iter())
        .for_each(|(dst, px)| {
            let c = px.demultiply();
            dst.copy_from_slice(&[c.red(), c.green(), c.blue()]);
        });
    out
}
