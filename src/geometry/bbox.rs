//! Axis-aligned bounding box with order-independent corners.
//!
//! A [`BoundingBox`] stores the two corners exactly as given. Minimum and
//! maximum coordinates are derived on access, so a box built from
//! `(500, 800, 100, 200)` describes the same rectangle as one built from
//! `(100, 200, 500, 800)`.
//!
//! Boxes are coordinate-system agnostic: the same type carries overview
//! pixels, main-image pixels and stage micrometers depending on the caller.

use serde::{Deserialize, Serialize};

use super::Point;

/// Immutable rectangle defined by two opposite corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    x1: f64,
    y1: f64,
    x2: f64,
    y2: f64,
}

impl BoundingBox {
    /// Create a box from two corners in any order.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from its top-left corner and size.
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// First corner X, as supplied.
    pub fn x1(&self) -> f64 {
        self.x1
    }

    /// First corner Y, as supplied.
    pub fn y1(&self) -> f64 {
        self.y1
    }

    /// Second corner X, as supplied.
    pub fn x2(&self) -> f64 {
        self.x2
    }

    /// Second corner Y, as supplied.
    pub fn y2(&self) -> f64 {
        self.y2
    }

    #[inline]
    pub fn min_x(&self) -> f64 {
        self.x1.min(self.x2)
    }

    #[inline]
    pub fn max_x(&self) -> f64 {
        self.x1.max(self.x2)
    }

    #[inline]
    pub fn min_y(&self) -> f64 {
        self.y1.min(self.y2)
    }

    #[inline]
    pub fn max_y(&self) -> f64 {
        self.y1.max(self.y2)
    }

    /// Absolute width.
    #[inline]
    pub fn width(&self) -> f64 {
        (self.x2 - self.x1).abs()
    }

    /// Absolute height.
    #[inline]
    pub fn height(&self) -> f64 {
        (self.y2 - self.y1).abs()
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x() + self.max_x()) / 2.0,
            (self.min_y() + self.max_y()) / 2.0,
        )
    }

    /// Whether the point lies inside or on the boundary.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.min_x() && p.x <= self.max_x() && p.y >= self.min_y() && p.y <= self.max_y()
    }

    /// The four corners, clockwise from the minimum corner.
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x(), self.min_y()),
            Point::new(self.max_x(), self.min_y()),
            Point::new(self.max_x(), self.max_y()),
            Point::new(self.min_x(), self.max_y()),
        ]
    }

    /// Scale origin and size independently per axis.
    ///
    /// Used to move a box between overview and main-image pixel space where
    /// the two images need not share an aspect ratio.
    pub fn scaled(&self, scale_x: f64, scale_y: f64) -> Self {
        Self::from_origin_size(
            self.min_x() * scale_x,
            self.min_y() * scale_y,
            self.width() * scale_x,
            self.height() * scale_y,
        )
    }

    /// Grow the box by `dx` on the left and right and `dy` on top and bottom.
    pub fn padded(&self, dx: f64, dy: f64) -> Self {
        Self::new(
            self.min_x() - dx,
            self.min_y() - dy,
            self.max_x() + dx,
            self.max_y() + dy,
        )
    }

    /// Smallest box covering both.
    pub fn union(&self, other: &BoundingBox) -> Self {
        Self::new(
            self.min_x().min(other.min_x()),
            self.min_y().min(other.min_y()),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }
}

// =============================================================================
// Tests
// =============================================================================
