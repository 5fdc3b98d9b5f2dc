// src/geometry.rs
//
// Axis-aligned rectangle math for ROI overlap checks.

use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in left/top/width/height form, matching the
/// bounding boxes reported by the upstream tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// Area of the overlap with `other`, 0.0 for disjoint rectangles.
    /// A shared edge counts as no overlap (strict inequality on both axes).
    pub fn intersection_area(&self, other: &Rect) -> f32 {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right <= left || bottom <= top {
            return 0.0;
        }

        (right - left) * (bottom - top)
    }
}
