use crate::canvas::blend::Ink;
use crate::canvas::viewport::ViewState;
use crate::error::SurfaceError;
use crate::utils::color::Color;
use std::sync::Arc;
use tiny_skia::{
    ColorU8, FillRule, FilterQuality, IntSize, Path, Pixmap, PixmapPaint, Stroke, Transform,
};

/// Breathing room added past the edge a stroke crossed.
pub const DEFAULT_EXPANSION_MARGIN: f32 = 64.0;

const ALIGNMENT_SEARCH: u32 = 100;

/// Content units added on each side by one expansion.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Expansion {
    pub left: u32,
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
}

impl Expansion {
    pub fn is_empty(&self) -> bool {
        self.left == 0 && self.top == 0 && self.right == 0 && self.bottom == 0
    }

    /// Shift applied to every existing content coordinate.
    pub fn shift(&self) -> (f32, f32) {
        (self.left as f32, self.top as f32)
    }
}

/// Immutable copy of the whole document, cheap to clone.
#[derive(Clone, Debug)]
pub struct Snapshot {
    pixels: Arc<Pixmap>,
    width: u32,
    height: u32,
    scale: f32,
    origin: (u32, u32),
}

impl Snapshot {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    /// Physical (premultiplied) pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixels
    }
}

/// The document raster: logical size in content units backed by a
/// premultiplied pixmap of at least `ceil(size * scale)` device pixels.
pub struct DocumentSurface {
    width: u32,
    height: u32,
    scale: f32,
    pixmap: Pixmap,
    origin: (u32, u32),
    preview_base: Option<Snapshot>,
}

impl DocumentSurface {
    /// Allocate a fully transparent document. Sizes floor to at least 1.
    pub fn new(width: u32, height: u32, scale: f32) -> Result<Self, SurfaceError> {
        let width = width.max(1);
        let height = height.max(1);
        let scale = clamp_scale(scale);
        Ok(Self {
            width,
            height,
            scale,
            pixmap: allocate(width, height, scale)?,
            origin: (0, 0),
            preview_base: None,
        })
    }

    /// Reallocate to the given content size, discarding all pixels.
    pub fn resize_to_fit(&mut self, content_w: f32, content_h: f32) -> Result<(), SurfaceError> {
        let width = floor_dimension(content_w);
        let height = floor_dimension(content_h);
        self.pixmap = allocate(width, height, self.scale)?;
        self.width = width;
        self.height = height;
        self.origin = (0, 0);
        self.preview_base = None;
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Content units prepended on the left/top since the document was created.
    pub fn origin(&self) -> (u32, u32) {
        self.origin
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Content units to physical pixels.
    pub fn transform(&self) -> Transform {
        Transform::from_scale(self.scale, self.scale)
    }

    /// Grow the document. Paddings are floored and negative ones ignored;
    /// left and top round up until they span whole device pixels.
    ///
    /// Old pixels land at `(left, top)`. While a preview base is held the
    /// base is copied instead of the live pixels, and the base is replaced by
    /// the expanded copy. The view offset compensates so content stays put
    /// on screen.
    pub fn expand(
        &mut self,
        left: f32,
        top: f32,
        right: f32,
        bottom: f32,
        view: &mut ViewState,
    ) -> Expansion {
        let requested = Expansion {
            left: aligned(padding(left), self.scale),
            top: aligned(padding(top), self.scale),
            right: padding(right),
            bottom: padding(bottom),
        };
        if requested.is_empty() {
            return Expansion::default();
        }

        let width = self
            .width
            .saturating_add(requested.left)
            .saturating_add(requested.right);
        let height = self
            .height
            .saturating_add(requested.top)
            .saturating_add(requested.bottom);
        // grow the physical buffer by whole device pixels so old pixels never resample
        let (pad_left, pad_top) = (
            physical(requested.left, self.scale),
            physical(requested.top, self.scale),
        );
        let pw = self
            .pixmap
            .width()
            .saturating_add(pad_left)
            .saturating_add(physical_ceil(requested.right, self.scale));
        let ph = self
            .pixmap
            .height()
            .saturating_add(pad_top)
            .saturating_add(physical_ceil(requested.bottom, self.scale));
        let Some(mut grown) = Pixmap::new(pw, ph) else {
            log::error!(
                "document expansion skipped: {}",
                SurfaceError::Allocation {
                    width: pw,
                    height: ph
                }
            );
            return Expansion::default();
        };

        let source = match &self.preview_base {
            Some(base) => base.pixmap(),
            None => &self.pixmap,
        };
        copy_pixels(source, &mut grown, pad_left, pad_top);

        self.pixmap = grown;
        self.width = width;
        self.height = height;
        self.origin.0 = self.origin.0.saturating_add(requested.left);
        self.origin.1 = self.origin.1.saturating_add(requested.top);
        if self.preview_base.is_some() {
            self.preview_base = Some(self.snapshot());
        }
        let (dx, dy) = requested.shift();
        view.compensate_prepend(dx, dy);

        log::debug!(
            "expanded document by l{} t{} r{} b{} to {}x{}",
            requested.left,
            requested.top,
            requested.right,
            requested.bottom,
            width,
            height
        );
        requested
    }

    /// Grow any side that the disc of `radius` around `(x, y)` crosses.
    ///
    /// A crossed side is padded by the overshoot plus `margin`, so a second
    /// call with the same (shifted) point finds it well inside.
    pub fn ensure_bounds(
        &mut self,
        x: f32,
        y: f32,
        radius: f32,
        margin: f32,
        view: &mut ViewState,
    ) -> Expansion {
        if !x.is_finite() || !y.is_finite() {
            return Expansion::default();
        }
        let reach = radius.max(0.0);
        let margin = margin.max(0.0);
        let (w, h) = (self.width as f32, self.height as f32);
        let grow = |overshoot: f32| {
            if overshoot > 0.0 {
                overshoot.ceil() + margin
            } else {
                0.0
            }
        };
        self.expand(
            grow(reach - x),
            grow(reach - y),
            grow(x + reach - w),
            grow(y + reach - h),
            view,
        )
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            pixels: Arc::new(self.pixmap.clone()),
            width: self.width,
            height: self.height,
            scale: self.scale,
            origin: self.origin,
        }
    }

    /// Reinstate size and pixels from a snapshot. Drops any preview base.
    pub fn restore(&mut self, snapshot: &Snapshot) {
        self.pixmap = snapshot.pixmap().clone();
        self.width = snapshot.width;
        self.height = snapshot.height;
        self.scale = snapshot.scale;
        self.origin = snapshot.origin;
        self.preview_base = None;
    }

    /// Remember the current pixels as the base that previews draw on top of.
    pub fn hold_preview_base(&mut self) {
        self.preview_base = Some(self.snapshot());
    }

    /// Put the held base back, erasing the previous preview frame.
    pub fn rollback_preview(&mut self) {
        if let Some(base) = &self.preview_base {
            self.pixmap = base.pixmap().clone();
        }
    }

    pub fn release_preview_base(&mut self) {
        self.preview_base = None;
    }

    pub fn has_preview_base(&self) -> bool {
        self.preview_base.is_some()
    }

    pub fn stroke_path(&mut self, path: &Path, stroke: &Stroke, ink: Ink) {
        let transform = self.transform();
        self.pixmap
            .stroke_path(path, &ink.paint(), stroke, transform, None);
    }

    pub fn fill_path(&mut self, path: &Path, ink: Ink) {
        let transform = self.transform();
        self.pixmap
            .fill_path(path, &ink.paint(), FillRule::Winding, transform, None);
    }

    /// Composite a pixmap of the same physical size over the document.
    pub fn draw_layer(&mut self, layer: &Pixmap, ink: Ink) {
        let paint = PixmapPaint {
            opacity: ink.opacity.clamp(0.0, 1.0),
            blend_mode: ink.blend.into(),
            quality: FilterQuality::Nearest,
        };
        self.pixmap
            .draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
    }

    /// Replace the document with `image` stretched over its whole area.
    pub fn blit_image_stretched(&mut self, image: &Pixmap) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
        let sx = self.pixmap.width() as f32 / image.width() as f32;
        let sy = self.pixmap.height() as f32 / image.height() as f32;
        let quality = if sx == 1.0 && sy == 1.0 {
            FilterQuality::Nearest
        } else {
            FilterQuality::Bilinear
        };
        let paint = PixmapPaint {
            quality,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );
    }

    pub fn clear_pixels(&mut self) {
        self.pixmap.fill(tiny_skia::Color::TRANSPARENT);
    }

    /// Straight-alpha color at a content coordinate, `None` outside the document.
    pub fn pixel(&self, x: f32, y: f32) -> Option<Color> {
        if x < 0.0 || y < 0.0 || x >= self.width as f32 || y >= self.height as f32 {
            return None;
        }
        let px = (x * self.scale).floor() as u32;
        let py = (y * self.scale).floor() as u32;
        let c = self.pixmap.pixel(px, py)?.demultiply();
        Some(Color::rgba(c.red(), c.green(), c.blue(), c.alpha()))
    }

    /// Immutable copy for export.
    pub fn to_exportable_image(&self) -> Snapshot {
        self.snapshot()
    }
}

/// Build a premultiplied pixmap from straight RGBA bytes.
pub fn pixmap_from_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Pixmap, SurfaceError> {
    let size =
        IntSize::from_wh(width, height).ok_or(SurfaceError::Allocation { width, height })?;
    if rgba.len() != width as usize * height as usize * 4 {
        return Err(SurfaceError::PixelData { width, height });
    }
    let mut data = Vec::with_capacity(rgba.len());
    for px in rgba.chunks_exact(4) {
        let c = ColorU8::from_rgba(px[0], px[1], px[2], px[3]).premultiply();
        data.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
    }
    Pixmap::from_vec(data, size).ok_or(SurfaceError::PixelData { width, height })
}

/// Copy `src` into `dst` at a pixel offset, clipping to `dst`.
pub(crate) fn copy_pixels(src: &Pixmap, dst: &mut Pixmap, dx: u32, dy: u32) {
    let (src_w, src_h) = (src.width() as usize, src.height() as usize);
    let (dst_w, dst_h) = (dst.width() as usize, dst.height() as usize);
    let (dx, dy) = (dx as usize, dy as usize);
    if dx >= dst_w || dy >= dst_h {
        return;
    }
    let cols = src_w.min(dst_w - dx);
    let rows = src_h.min(dst_h - dy);
    let src_data = src.data();
    let dst_data = dst.data_mut();
    for row in 0..rows {
        let src_start = row * src_w * 4;
        let dst_start = ((dy + row) * dst_w + dx) * 4;
        dst_data[dst_start..dst_start + cols * 4]
            .copy_from_slice(&src_data[src_start..src_start + cols * 4]);
    }
}

/// Content units to physical pixels, for offsets.
pub(crate) fn physical(units: u32, scale: f32) -> u32 {
    (units as f32 * scale).round() as u32
}

fn physical_ceil(units: u32, scale: f32) -> u32 {
    (units as f32 * scale).ceil() as u32
}

/// Smallest padding of at least `units` that spans whole device pixels.
///
/// Scales are kept to hundredths, so a match exists within `ALIGNMENT_SEARCH`.
fn aligned(units: u32, scale: f32) -> u32 {
    if units == 0 {
        return 0;
    }
    (units..units.saturating_add(ALIGNMENT_SEARCH))
        .find(|&n| {
            let px = n as f32 * scale;
            (px - px.round()).abs() < 1e-3
        })
        .unwrap_or(units)
}

pub(crate) fn allocate(width: u32, height: u32, scale: f32) -> Result<Pixmap, SurfaceError> {
    let pw = (width as f32 * scale).ceil().max(1.0) as u32;
    let ph = (height as f32 * scale).ceil().max(1.0) as u32;
    Pixmap::new(pw, ph).ok_or(SurfaceError::Allocation {
        width: pw,
        height: ph,
    })
}

fn clamp_scale(scale: f32) -> f32 {
    if scale.is_finite() {
        (scale.clamp(1.0, 3.0) * 100.0).round() / 100.0
    } else {
        1.0
    }
}

fn floor_dimension(v: f32) -> u32 {
    if v.is_finite() && v >= 1.0 {
        v.floor() as u32
    } else {
        1
    }
}

fn padding(v: f32) -> u32 {
    if v.is_finite() && v > 0.0 {
        v.floor() as u32
    } else {
        0
    }
}
