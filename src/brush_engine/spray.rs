use crate::brush_engine::symmetry::Mirror;
use crate::canvas::blend::Ink;
use crate::canvas::surface::DocumentSurface;
use crate::utils::vector::Vec2;
use rand::Rng;
use std::mem;
use tiny_skia::{PathBuilder, Rect};

/// Particles generated by pointer moves, waiting for the next frame flush.
#[derive(Debug, Default)]
pub struct SprayQueue {
    particles: Vec<Vec2>,
}

impl SprayQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn particles(&self) -> &[Vec2] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Scatter `strength` samples uniformly inside the disc of `radius` around `center`.
    ///
    /// Samples are drawn from the enclosing square and those outside the disc
    /// are discarded, so fewer than `strength` particles may be queued.
    pub fn scatter<R: Rng>(
        &mut self,
        rng: &mut R,
        center: Vec2,
        radius: f32,
        strength: u32,
        mirror: Option<Mirror>,
    ) {
        let radius = radius.max(0.0);
        for _ in 0..strength {
            let dx = (rng.random::<f32>() - 0.5) * 2.0 * radius;
            let dy = (rng.random::<f32>() - 0.5) * 2.0 * radius;
            if dx.hypot(dy) > radius {
                continue;
            }
            let p = Vec2::new(center.x + dx, center.y + dy);
            self.particles.push(p);
            if let Some(mirror) = mirror {
                self.particles.push(mirror.point(p));
            }
        }
    }

    /// Move queued particles along with a document expansion.
    pub fn shift(&mut self, dx: f32, dy: f32) {
        for p in &mut self.particles {
            p.x += dx;
            p.y += dy;
        }
    }

    /// Paint every queued particle as a 1×1 cell in one batched fill.
    ///
    /// Returns the number of particles drawn.
    pub fn flush(&mut self, surface: &mut DocumentSurface, ink: Ink) -> usize {
        let particles = mem::take(&mut self.particles);
        if particles.is_empty() {
            return 0;
        }
        let mut pb = PathBuilder::new();
        for p in &particles {
            if let Some(cell) = Rect::from_xywh(p.x, p.y, 1.0, 1.0) {
                pb.push_rect(cell);
            }
        }
        if let Some(path) = pb.finish() {
            surface.fill_path(&path, ink);
        }
        particles.len()
    }
}
