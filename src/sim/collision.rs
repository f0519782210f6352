//! Collision detection for the flat playfield
//!
//! Everything is axis-aligned: obstacles, power-ups and most hazards are
//! rectangles, giant obstacles are circles tested against the player's
//! center, and wall/safe-zone hazards are horizontal spans.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub pos: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            pos: Vec2::new(x, y),
            size: Vec2::new(width, height),
        }
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

    /// Strict overlap: rectangles that only share an edge do not collide
    #[inline]
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.left() < other.right()
            && self.right() > other.left()
            && self.top() < other.bottom()
            && self.bottom() > other.top()
    }

    /// True if `inner` lies entirely inside this rectangle (edges inclusive)
    #[inline]
    pub fn contains(&self, inner: &Rect) -> bool {
        inner.left() >= self.left()
            && inner.right() <= self.right()
            && inner.top() >= self.top()
            && inner.bottom() <= self.bottom()
    }

    /// True if every coordinate is finite
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.size.is_finite()
    }
}

/// Circle hit test used for giant obstacles: the point must be strictly
/// inside the radius
#[inline]
pub fn circle_contains_point(center: Vec2, radius: f32, point: Vec2) -> bool {
    center.distance_squared(point) < radius * radius
}

/// True if the rectangle's horizontal extent is inside `[left, right]`
#[inline]
pub fn within_span(rect: &Rect, left: f32, right: f32) -> bool {
    rect.left() >= left && rect.right() <= right
}
