use crate::brush_engine::calligraphy::{Nib, NibLayer};
use crate::brush_engine::freehand;
use crate::brush_engine::settings::{Tool, ToolSettings};
use crate::brush_engine::shape::{self, ShapeKind, ShapeStyle};
use crate::brush_engine::spray::SprayQueue;
use crate::brush_engine::symmetry::Mirror;
use crate::canvas::blend::{BlendMode, Ink};
use crate::canvas::history::History;
use crate::canvas::surface::{DocumentSurface, Expansion, Snapshot};
use crate::canvas::viewport::ViewState;
use crate::error::SurfaceError;
use crate::utils::{profiler::ScopeTimer, vector::Vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Per-tool working state of the stroke in progress.
enum StrokeKind {
    Freehand { points: Vec<Vec2> },
    Calligraphy { layer: NibLayer, nib: Nib },
    Spray { queue: SprayQueue },
    Shape { kind: ShapeKind, anchor: Vec2, end: Vec2 },
}

/// A stroke between pointer-down and commit. Settings are frozen at begin.
struct ActiveStroke {
    tool: Tool,
    settings: ToolSettings,
    last: Vec2,
    kind: StrokeKind,
    _timer: ScopeTimer,
}

impl ActiveStroke {
    fn mirror(&self, surface: &DocumentSurface) -> Option<Mirror> {
        self.settings
            .symmetry
            .then(|| Mirror::new(surface.width() as f32))
    }

    fn ink(&self) -> Ink {
        Ink::new(
            self.settings.color,
            self.settings.opacity,
            self.tool.blend_mode(),
        )
    }

    fn shape_style(&self) -> ShapeStyle {
        ShapeStyle {
            size: self.settings.brush_size,
            filled: self.settings.shape_filled,
            rounded: self.settings.rounded_corners,
        }
    }

    /// Grow the document around `point` and return it in post-expansion coordinates.
    fn track(
        &mut self,
        surface: &mut DocumentSurface,
        view: &mut ViewState,
        point: Vec2,
        margin: f32,
    ) -> Vec2 {
        let reach = reach(self.tool, self.settings.brush_size);
        let expansion = surface.ensure_bounds(point.x, point.y, reach, margin, view);
        self.follow(expansion, surface);
        let (dx, dy) = expansion.shift();
        Vec2::new(point.x + dx, point.y + dy)
    }

    /// Keep the padded outline extent of a shape inside the document.
    fn track_shape_box(&mut self, surface: &mut DocumentSurface, view: &mut ViewState, margin: f32) {
        let pad = self.shape_style().bounds_padding();
        for corner in [Corner::Min, Corner::Max] {
            let StrokeKind::Shape { kind, anchor, end } = &self.kind else {
                return;
            };
            let (min, max) = shape::bounds(*kind, *anchor, *end);
            let p = match corner {
                Corner::Min => min,
                Corner::Max => max,
            };
            let expansion = surface.ensure_bounds(p.x, p.y, pad, margin, view);
            self.follow(expansion, surface);
        }
    }

    /// Shift every stored content coordinate after an expansion.
    fn follow(&mut self, expansion: Expansion, surface: &DocumentSurface) {
        if expansion.is_empty() {
            return;
        }
        let (dx, dy) = expansion.shift();
        let delta = Vec2::new(dx, dy);
        self.last = self.last + delta;
        match &mut self.kind {
            StrokeKind::Freehand { points } => {
                for p in points.iter_mut() {
                    *p = *p + delta;
                }
            }
            StrokeKind::Calligraphy { layer, .. } => layer.grow(expansion, surface),
            StrokeKind::Spray { queue } => queue.shift(dx, dy),
            StrokeKind::Shape { anchor, end, .. } => {
                *anchor = *anchor + delta;
                *end = *end + delta;
            }
        }
    }

    /// Draw the stroke on top of whatever the surface currently holds.
    fn render(&self, surface: &mut DocumentSurface) {
        let mirror = self.mirror(surface);
        match &self.kind {
            StrokeKind::Freehand { points } => {
                freehand::render(surface, points, self.settings.brush_size, self.ink(), mirror)
            }
            StrokeKind::Calligraphy { layer, .. } => surface.draw_layer(layer.pixmap(), self.ink()),
            StrokeKind::Shape { kind, anchor, end } => shape::render(
                surface,
                *kind,
                *anchor,
                *end,
                &self.shape_style(),
                self.ink(),
                mirror,
            ),
            // spray paints straight onto the document in `flush`
            StrokeKind::Spray { .. } => {}
        }
    }

    /// Replace the previous preview frame with the current one.
    fn redraw_preview(&self, surface: &mut DocumentSurface) {
        if self.tool.uses_preview_base() {
            surface.rollback_preview();
            self.render(surface);
        }
    }

    fn flush_spray(&mut self, surface: &mut DocumentSurface) -> usize {
        let ink = Ink::new(
            self.settings.color,
            self.settings.spray_opacity,
            BlendMode::Paint,
        );
        match &mut self.kind {
            StrokeKind::Spray { queue } => queue.flush(surface, ink),
            _ => 0,
        }
    }
}

#[derive(Clone, Copy)]
enum Corner {
    Min,
    Max,
}

/// How far a tool's marks reach from the pointer.
fn reach(tool: Tool, size: f32) -> f32 {
    match tool {
        Tool::Spray => size,
        _ => size / 2.0,
    }
}

/// Per-tool live preview and commit state machine (`Idle` ⇄ `Active`).
pub struct StrokeEngine {
    active: Option<ActiveStroke>,
    rng: StdRng,
    margin: f32,
}

impl StrokeEngine {
    /// Engine with an entropy-seeded spray generator.
    pub fn new(margin: f32) -> Self {
        Self::with_rng(margin, StdRng::from_rng(&mut rand::rng()))
    }

    /// Engine with a deterministic spray generator.
    pub fn with_seed(margin: f32, seed: u64) -> Self {
        Self::with_rng(margin, StdRng::seed_from_u64(seed))
    }

    fn with_rng(margin: f32, rng: StdRng) -> Self {
        Self {
            active: None,
            rng,
            margin,
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    pub fn active_tool(&self) -> Option<Tool> {
        self.active.as_ref().map(|a| a.tool)
    }

    /// Last pointer position of the running stroke, in content units.
    pub fn last_point(&self) -> Option<Vec2> {
        self.active.as_ref().map(|a| a.last)
    }

    /// Recorded freehand points of the running stroke.
    pub fn points(&self) -> Option<&[Vec2]> {
        match &self.active.as_ref()?.kind {
            StrokeKind::Freehand { points } => Some(points),
            _ => None,
        }
    }

    /// Spray particles not yet flushed.
    pub fn pending_particles(&self) -> usize {
        match self.active.as_ref().map(|a| &a.kind) {
            Some(StrokeKind::Spray { queue }) => queue.particles().len(),
            _ => 0,
        }
    }

    /// Start a stroke at a content-space point with a copy of `settings`.
    ///
    /// A stroke that is still running is cancelled first.
    pub fn begin(
        &mut self,
        surface: &mut DocumentSurface,
        view: &mut ViewState,
        settings: &ToolSettings,
        point: Vec2,
    ) -> Result<(), SurfaceError> {
        self.cancel(surface);

        let tool = settings.active_tool;
        let reach = reach(tool, settings.brush_size);
        let expansion = surface.ensure_bounds(point.x, point.y, reach, self.margin, view);
        let (dx, dy) = expansion.shift();
        let point = Vec2::new(point.x + dx, point.y + dy);

        let mirror = settings
            .symmetry
            .then(|| Mirror::new(surface.width() as f32));
        let kind = match tool {
            Tool::Brush | Tool::Eraser => StrokeKind::Freehand {
                points: vec![point],
            },
            Tool::Calligraphy => {
                let nib = Nib::from_settings(settings);
                let mut layer = NibLayer::for_surface(surface, settings.color)?;
                layer.stamp(point, &nib, mirror);
                StrokeKind::Calligraphy { layer, nib }
            }
            Tool::Spray => {
                let mut queue = SprayQueue::new();
                queue.scatter(
                    &mut self.rng,
                    point,
                    settings.brush_size,
                    settings.spray_strength,
                    mirror,
                );
                StrokeKind::Spray { queue }
            }
            Tool::Rect | Tool::Circle => StrokeKind::Shape {
                kind: if tool == Tool::Rect {
                    ShapeKind::Rect
                } else {
                    ShapeKind::Circle
                },
                anchor: point,
                end: point,
            },
        };

        if tool.uses_preview_base() {
            surface.hold_preview_base();
        }
        let active = ActiveStroke {
            tool,
            settings: settings.clone(),
            last: point,
            kind,
            _timer: ScopeTimer::new("stroke"),
        };
        active.redraw_preview(surface);
        self.active = Some(active);
        Ok(())
    }

    /// Feed a pointer move (content space) into the running stroke.
    pub fn update(&mut self, surface: &mut DocumentSurface, view: &mut ViewState, point: Vec2) {
        let margin = self.margin;
        let Some(active) = self.active.as_mut() else {
            return;
        };
        let _timer = ScopeTimer::new("stroke_update");

        let point = active.track(surface, view, point, margin);
        let mirror = active.mirror(surface);
        let last = active.last;
        match &mut active.kind {
            StrokeKind::Freehand { points } => points.push(point),
            StrokeKind::Calligraphy { layer, nib } => layer.segment(last, point, nib, mirror),
            StrokeKind::Spray { queue } => queue.scatter(
                &mut self.rng,
                point,
                active.settings.brush_size,
                active.settings.spray_strength,
                mirror,
            ),
            StrokeKind::Shape { end, .. } => *end = point,
        }
        active.last = point;
        if matches!(active.kind, StrokeKind::Shape { .. }) {
            active.track_shape_box(surface, view, margin);
        }
        active.redraw_preview(surface);
    }

    /// Per-display-frame work: flush queued spray particles in one batch.
    ///
    /// Returns whether anything was painted.
    pub fn frame(&mut self, surface: &mut DocumentSurface) -> bool {
        match self.active.as_mut() {
            Some(active) => active.flush_spray(surface) > 0,
            None => false,
        }
    }

    /// Finish the stroke, draw it for real and record a history entry.
    ///
    /// Shapes take `end` (content space) as their final corner when given.
    /// Returns `false` when no stroke was running.
    pub fn commit(
        &mut self,
        surface: &mut DocumentSurface,
        view: &mut ViewState,
        history: &mut History<Snapshot>,
        end: Option<Vec2>,
    ) -> bool {
        let Some(mut active) = self.active.take() else {
            return false;
        };

        if let (Some(end), StrokeKind::Shape { .. }) = (end, &active.kind) {
            let point = active.track(surface, view, end, self.margin);
            if let StrokeKind::Shape { end, .. } = &mut active.kind {
                *end = point;
            }
            active.last = point;
            active.track_shape_box(surface, view, self.margin);
        }

        if active.tool.uses_preview_base() {
            active.redraw_preview(surface);
        } else {
            active.flush_spray(surface);
        }
        surface.release_preview_base();
        history.push(surface.snapshot());
        log::debug!(
            "committed {} stroke on {}x{} document",
            active.tool.label(),
            surface.width(),
            surface.height()
        );
        true
    }

    /// Drop the running stroke without recording it.
    pub fn cancel(&mut self, surface: &mut DocumentSurface) {
        if let Some(active) = self.active.take() {
            if active.tool.uses_preview_base() {
                surface.rollback_preview();
            }
            surface.release_preview_base();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::surface::DEFAULT_EXPANSION_MARGIN;

    struct Rig {
        surface: DocumentSurface,
        view: ViewState,
        history: History<Snapshot>,
        engine: StrokeEngine,
        settings: ToolSettings,
    }

    impl Rig {
        fn new(w: u32, h: u32, tool: Tool) -> Self {
            let surface = DocumentSurface::new(w, h, 1.0).unwrap();
            let mut history = History::new();
            history.push(surface.snapshot());
            Self {
                surface,
                view: ViewState::default(),
                history,
                engine: StrokeEngine::with_seed(DEFAULT_EXPANSION_MARGIN, 42),
                settings: ToolSettings {
                    active_tool: tool,
                    ..ToolSettings::default()
                },
            }
        }

        fn begin(&mut self, x: f32, y: f32) {
            self.engine
                .begin(&mut self.surface, &mut self.view, &self.settings, Vec2::new(x, y))
                .unwrap();
        }

        fn drag(&mut self, x: f32, y: f32) {
            self.engine
                .update(&mut self.surface, &mut self.view, Vec2::new(x, y));
        }

        fn commit(&mut self) -> bool {
            self.engine
                .commit(&mut self.surface, &mut self.view, &mut self.history, None)
        }
    }

    #[test]
    fn final_preview_equals_committed_raster() {
        for tool in [Tool::Brush, Tool::Eraser, Tool::Calligraphy, Tool::Rect, Tool::Circle] {
            let mut rig = Rig::new(200, 200, tool);
            rig.settings.symmetry = true;
            rig.settings.opacity = 0.6;
            rig.begin(40.0, 40.0);
            rig.drag(60.0, 80.0);
            rig.drag(90.0, 70.0);
            let preview = rig.surface.pixmap().clone();
            assert!(rig.commit());
            assert_eq!(
                preview.data(),
                rig.surface.pixmap().data(),
                "{tool:?} commit differs from its last preview"
            );
        }
    }

    #[test]
    fn preview_frames_do_not_accumulate() {
        let mut rig = Rig::new(200, 200, Tool::Rect);
        rig.settings.shape_filled = true;
        rig.begin(10.0, 10.0);
        rig.drag(150.0, 150.0);
        rig.drag(30.0, 30.0);
        assert_eq!(rig.surface.pixel(100.0, 100.0).unwrap().a, 0);
        assert_eq!(rig.surface.pixel(20.0, 20.0).unwrap().a, 255);
    }

    #[test]
    fn commit_records_one_history_entry() {
        let mut rig = Rig::new(100, 100, Tool::Brush);
        rig.begin(10.0, 10.0);
        rig.drag(20.0, 20.0);
        assert!(rig.engine.is_active());
        assert!(rig.commit());
        assert!(!rig.engine.is_active());
        assert!(!rig.surface.has_preview_base());
        assert_eq!(rig.history.len(), 2);
        assert!(!rig.commit());
        assert_eq!(rig.history.len(), 2);
    }

    #[test]
    fn settings_are_frozen_at_begin() {
        let mut rig = Rig::new(100, 100, Tool::Brush);
        rig.begin(50.0, 20.0);
        rig.settings.brush_size = 60.0;
        rig.settings.active_tool = Tool::Eraser;
        rig.drag(50.0, 80.0);
        rig.commit();
        assert_eq!(rig.surface.pixel(50.0, 50.0).unwrap().a, 255);
        assert_eq!(rig.surface.pixel(70.0, 50.0).unwrap().a, 0);
    }

    #[test]
    fn single_click_calligraphy_leaves_a_nib_mark() {
        let mut rig = Rig::new(100, 100, Tool::Calligraphy);
        rig.settings.brush_size = 20.0;
        rig.begin(50.0, 50.0);
        rig.commit();
        assert_eq!(rig.surface.pixel(50.0, 50.0).unwrap().a, 255);
    }

    #[test]
    fn calligraphy_overlaps_do_not_darken() {
        let mut rig = Rig::new(100, 100, Tool::Calligraphy);
        rig.settings.opacity = 0.5;
        rig.settings.brush_size = 20.0;
        rig.begin(40.0, 50.0);
        rig.drag(60.0, 50.0);
        rig.drag(40.0, 50.0);
        rig.commit();
        let a = rig.surface.pixel(50.0, 50.0).unwrap().a;
        assert!((126..=129).contains(&a), "alpha {a}");
    }

    #[test]
    fn spray_flushes_once_per_frame_and_on_commit() {
        let mut rig = Rig::new(200, 200, Tool::Spray);
        rig.settings.spray_strength = 40;
        rig.begin(100.0, 100.0);
        rig.drag(101.0, 100.0);
        rig.drag(102.0, 100.0);
        let pending = rig.engine.pending_particles();
        assert!(pending > 0);
        assert!(rig.engine.frame(&mut rig.surface));
        assert_eq!(rig.engine.pending_particles(), 0);
        assert!(!rig.engine.frame(&mut rig.surface));

        rig.drag(103.0, 100.0);
        assert!(rig.engine.pending_particles() > 0);
        rig.commit();
        let painted = rig
            .surface
            .pixmap()
            .pixels()
            .iter()
            .filter(|p| p.alpha() > 0)
            .count();
        assert!(painted > 0);
        assert_eq!(rig.history.len(), 2);
    }

    #[test]
    fn spray_particles_follow_expansion() {
        let mut rig = Rig::new(100, 100, Tool::Spray);
        rig.settings.brush_size = 4.0;
        rig.begin(50.0, 50.0);
        rig.drag(-10.0, 50.0);
        assert_eq!(rig.surface.width(), 100 + 14 + 64);
        rig.commit();
        // nothing may land in the freshly prepended strip far from the stroke
        for x in 0..60 {
            for y in 0..100 {
                assert_eq!(rig.surface.pixmap().pixel(x, y).unwrap().alpha(), 0);
            }
        }
    }

    #[test]
    fn shape_growth_shifts_anchor() {
        let mut rig = Rig::new(100, 100, Tool::Rect);
        rig.settings.shape_filled = true;
        rig.settings.brush_size = 2.0;
        rig.begin(20.0, 20.0);
        rig.drag(-30.0, 50.0);
        rig.commit();
        // left grew by ceil(30 + 1) + 64 = 95
        assert_eq!(rig.surface.width(), 195);
        assert_eq!(rig.surface.pixel(114.0, 30.0).unwrap().a, 255);
        assert_eq!(rig.surface.pixel(66.0, 30.0).unwrap().a, 255);
        assert_eq!(rig.surface.pixel(116.0, 30.0).unwrap().a, 0);
    }

    #[test]
    fn circle_near_left_edge_grows_document() {
        let mut rig = Rig::new(100, 100, Tool::Circle);
        rig.settings.shape_filled = true;
        rig.begin(5.0, 50.0);
        rig.drag(45.0, 90.0);
        assert!(rig.commit());

        // leftmost point sits at 25 - hypot(40, 40) / 2, about 3.3 past the edge
        assert!(rig.surface.width() > 100);
        let shift = rig.surface.origin().0 as f32;
        assert!(shift > 0.0);
        assert_eq!(rig.surface.pixel(shift - 3.0, 70.0).unwrap().a, 255);
        assert_eq!(rig.surface.pixel(shift + 25.0, 70.0).unwrap().a, 255);
    }

    #[test]
    fn shape_commit_uses_release_point() {
        let mut rig = Rig::new(100, 100, Tool::Rect);
        rig.settings.shape_filled = true;
        rig.begin(10.0, 10.0);
        rig.drag(20.0, 20.0);
        rig.engine.commit(
            &mut rig.surface,
            &mut rig.view,
            &mut rig.history,
            Some(Vec2::new(60.0, 60.0)),
        );
        assert_eq!(rig.surface.pixel(50.0, 50.0).unwrap().a, 255);
    }

    #[test]
    fn cancel_restores_pre_stroke_pixels() {
        let mut rig = Rig::new(100, 100, Tool::Brush);
        rig.begin(10.0, 10.0);
        rig.drag(90.0, 90.0);
        rig.engine.cancel(&mut rig.surface);
        assert!(rig.surface.pixmap().pixels().iter().all(|p| p.alpha() == 0));
        assert_eq!(rig.history.len(), 1);
        assert!(!rig.engine.is_active());
    }
}
