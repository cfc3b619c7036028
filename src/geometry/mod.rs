//! Plane geometry shared by detection, tiling and coordinate transforms.
//!
//! - [`BoundingBox`]: rectangle with order-independent corners
//! - [`Polygon`]: region outline for filtered tiling
//! - [`AffineTransform`]: 2×3 image-to-stage mapping

mod affine;
mod bbox;
mod polygon;

use serde::{Deserialize, Serialize};

pub use affine::{add_translation_to_scaled_affine, pixel_to_stage_scaling, transform, AffineTransform};
pub use bbox::BoundingBox;
pub use polygon::Polygon;

/// A point in some 2D coordinate space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

}
