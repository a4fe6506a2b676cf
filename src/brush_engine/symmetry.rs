use crate::utils::vector::Vec2;

/// Horizontal mirror about the vertical center line of the document.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Mirror {
    doc_width: f32,
}

impl Mirror {
    pub fn new(doc_width: f32) -> Self {
        Self { doc_width }
    }

    pub fn x(&self, x: f32) -> f32 {
        self.doc_width - x
    }

    pub fn point(&self, p: Vec2) -> Vec2 {
        Vec2::new(self.x(p.x), p.y)
    }

    /// Left edge of the mirror image of a box starting at `x` with width `w`.
    pub fn box_x(&self, x: f32, w: f32) -> f32 {
        self.doc_width - x - w
    }

    /// Rotations flip direction in the mirror. Works in any angular unit.
    pub fn angle(&self, angle: f32) -> f32 {
        -angle
    }
}
