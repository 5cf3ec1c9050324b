//! Axis-aligned rectangle used for bounding boxes and the viewport

use macroquad::math::Vec2;

/// A rectangle defined by its top-left corner and size
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const ZERO: Rect = Rect::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    /// Create from screen dimensions
    pub fn screen(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    /// A `w` x `h` rectangle centered on the local origin
    pub fn centered(w: f32, h: f32) -> Self {
        Self::new(-w * 0.5, -h * 0.5, w, h)
    }

    /// Right edge
    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    /// Bottom edge
    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    /// Check if point is inside
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Grow by `margin` on all sides
    pub fn expand(&self, margin: f32) -> Self {
        Self::new(
            self.x - margin,
            self.y - margin,
            self.w + margin * 2.0,
            self.h + margin * 2.0,
        )
    }

    /// Move by an offset, keeping the size
    pub fn translate(&self, offset: Vec2) -> Self {
        Self::new(self.x + offset.x, self.y + offset.y, self.w, self.h)
    }

    /// Overlap test. A zero-sized rectangle behaves as a point and
    /// intersects when it lies inside `other`.
    pub fn intersects(&self, other: &Rect) -> bool {
        if self.w == 0.0 && self.h == 0.0 {
            return other.contains(self.x, self.y);
        }
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// All components finite and the size non-negative
    pub fn is_well_formed(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.w.is_finite()
            && self.h.is_finite()
            && self.w >= 0.0
            && self.h >= 0.0
    }
}
