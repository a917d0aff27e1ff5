//! Axis-aligned bounding box collision
//!
//! Every entity is a rectangle anchored at its top-left corner with y growing
//! downward, so a single overlap predicate covers all gameplay collisions.

use glam::Vec2;

/// An axis-aligned rectangle (top-left corner + size)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Aabb {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self { pos, size }
    }

    #[inline]
    pub fn left(&self) -> f32 {
        self.pos.x
    }

    #[inline]
    pub fn right(&self) -> f32 {
        self.pos.x + self.size.x
    }

    #[inline]
    pub fn top(&self) -> f32 {
        self.pos.y
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.pos.y + self.size.y
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.pos + self.size * 0.5
    }
}

/// Anything with a collision box
pub trait Bounds {
    fn aabb(&self) -> Aabb;
}

impl Bounds for Aabb {
    fn aabb(&self) -> Aabb {
        *self
    }
}

/// Strict overlap test; boxes that only touch along an edge do not collide
#[inline]
pub fn overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.left() < b.right() && a.right() > b.left() && a.top() < b.bottom() && a.bottom() > b.top()
}

/// Overlap test between two entities
#[inline]
pub fn collides(a: &impl Bounds, b: &impl Bounds) -> bool {
    overlaps(&a.aabb(), &b.aabb())
}
