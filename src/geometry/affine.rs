//! 2×3 affine transforms between image and stage coordinates.
//!
//! Coefficients follow the usual row-major convention:
//!
//! ```text
//! x' = m00 * x + m01 * y + m02
//! y' = m10 * x + m11 * y + m12
//! ```
//!
//! The flat six-scalar order used by the persisted formats is
//! `[m00, m10, m01, m11, m02, m12]` (column by column).

use serde::{Deserialize, Serialize};

use super::Point;

/// Determinants smaller than this are treated as singular.
const SINGULAR_EPSILON: f64 = 1e-12;

/// Affine mapping of the plane.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AffineTransform {
    pub m00: f64,
    pub m10: f64,
    pub m01: f64,
    pub m11: f64,
    pub m02: f64,
    pub m12: f64,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    /// Create a transform from coefficients in flat order.
    pub fn new(m00: f64, m10: f64, m01: f64, m11: f64, m02: f64, m12: f64) -> Self {
        Self {
            m00,
            m10,
            m01,
            m11,
            m02,
            m12,
        }
    }

    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    pub fn scale(sx: f64, sy: f64) -> Self {
        Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0)
    }

    pub fn translation(tx: f64, ty: f64) -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, tx, ty)
    }

    /// Build from `[m00, m10, m01, m11, m02, m12]`.
    pub fn from_array(m: [f64; 6]) -> Self {
        Self::new(m[0], m[1], m[2], m[3], m[4], m[5])
    }

    /// Flatten to `[m00, m10, m01, m11, m02, m12]`.
    pub fn to_array(&self) -> [f64; 6] {
        [self.m00, self.m10, self.m01, self.m11, self.m02, self.m12]
    }

    /// Map a single point.
    #[inline]
    pub fn apply(&self, p: Point) -> Point {
        Point::new(
            self.m00 * p.x + self.m01 * p.y + self.m02,
            self.m10 * p.x + self.m11 * p.y + self.m12,
        )
    }

    pub fn determinant(&self) -> f64 {
        self.m00 * self.m11 - self.m01 * self.m10
    }

    pub fn is_invertible(&self) -> bool {
        let det = self.determinant();
        det.is_finite() && det.abs() > SINGULAR_EPSILON
    }

    /// Inverse mapping, or `None` for a singular transform.
    pub fn inverse(&self) -> Option<Self> {
        if !self.is_invertible() {
            return None;
        }
        let det = self.determinant();
        let i00 = self.m11 / det;
        let i01 = -self.m01 / det;
        let i10 = -self.m10 / det;
        let i11 = self.m00 / det;
        Some(Self::new(
            i00,
            i10,
            i01,
            i11,
            -(i00 * self.m02 + i01 * self.m12),
            -(i10 * self.m02 + i11 * self.m12),
        ))
    }

    /// Composition that applies `self` first and then `next`.
    pub fn then(&self, next: &AffineTransform) -> Self {
        Self::new(
            next.m00 * self.m00 + next.m01 * self.m10,
            next.m10 * self.m00 + next.m11 * self.m10,
            next.m00 * self.m01 + next.m01 * self.m11,
            next.m10 * self.m01 + next.m11 * self.m11,
            next.m00 * self.m02 + next.m01 * self.m12 + next.m02,
            next.m10 * self.m02 + next.m11 * self.m12 + next.m12,
        )
    }
}

/// Apply `affine` to a single point.
pub fn transform(point: Point, affine: &AffineTransform) -> Point {
    affine.apply(point)
}

/// Pure scaling from image pixels to stage units, flipping inverted axes.
pub fn pixel_to_stage_scaling(pixel_size: f64, invert_x: bool, invert_y: bool) -> AffineTransform {
    let sx = if invert_x { -pixel_size } else { pixel_size };
    let sy = if invert_y { -pixel_size } else { pixel_size };
    AffineTransform::scale(sx, sy)
}

/// Keep the scale terms of `scaling`, drop any shear, and pick the translation
/// that sends `image_point` exactly onto `stage_point`.
///
/// This anchors a pixel-size-only transform to one manually aligned landmark.
pub fn add_translation_to_scaled_affine(
    scaling: &AffineTransform,
    image_point: Point,
    stage_point: Point,
) -> AffineTransform {
    let sx = scaling.m00;
    let sy = scaling.m11;
    AffineTransform::new(
        sx,
        0.0,
        0.0,
        sy,
        stage_point.x - sx * image_point.x,
        stage_point.y - sy * image_point.y,
    )
}

// =============================================================================
// Tests
// =============================================================================
