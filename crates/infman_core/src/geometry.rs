//! Axis-aligned rectangles and the single-axis collision resolver.
//!
//! World space is y-down: `(x, y)` is the top-left corner. Every body-vs-tile
//! and body-vs-body check in the game goes through `Rect::overlaps` and
//! `Rect::resolve_overlap`.
//!
//! Overlap is strict on both axes: rectangles that share an edge do not
//! collide. This is what lets a resolved body rest flush against a block
//! without re-triggering the block next frame.
//!
//! The resolver pushes the mover out along the axis of *least* penetration
//! only. It is not a full separating-vector solver: a corner hit at high speed
//! can be resolved along the wrong axis, and a body moving more than its own
//! size in one step can tunnel through thin geometry.

use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Displacement that separates a mover from an obstacle along one axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    pub axis: Axis,
    pub delta: f32,
}

impl Correction {
    pub fn as_vec2(self) -> Vec2 {
        match self.axis {
            Axis::Horizontal => Vec2::new(self.delta, 0.0),
            Axis::Vertical => Vec2::new(0.0, self.delta),
        }
    }
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn from_pos_size(pos: Vec2, size: Vec2) -> Self {
        Self::new(pos.x, pos.y, size.x, size.y)
    }

    pub fn pos(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn translated(&self, by: Vec2) -> Self {
        Self::new(self.x + by.x, self.y + by.y, self.w, self.h)
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Half-open: the left and top edges are inside, the right and bottom
    /// edges are not.
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.x && point.x < self.right() && point.y >= self.y && point.y < self.bottom()
    }

    /// Minimum single-axis push that moves `self` out of `obstacle`.
    ///
    /// Horizontal wins only when its penetration is strictly smaller; equal
    /// penetration resolves vertically. The push points away from the
    /// obstacle: negative when `self` starts further left (or higher).
    pub fn resolve_overlap(&self, obstacle: &Rect) -> Option<Correction> {
        if !self.overlaps(obstacle) {
            return None;
        }

        let overlap_w = self.right().min(obstacle.right()) - self.x.max(obstacle.x);
        let overlap_h = self.bottom().min(obstacle.bottom()) - self.y.max(obstacle.y);

        let correction = if overlap_w < overlap_h {
            Correction {
                axis: Axis::Horizontal,
                delta: if self.x < obstacle.x { -overlap_w } else { overlap_w },
            }
        } else {
            Correction {
                axis: Axis::Vertical,
                delta: if self.y < obstacle.y { -overlap_h } else { overlap_h },
            }
        };
        Some(correction)
    }
}
