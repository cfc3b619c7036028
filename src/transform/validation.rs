//! Plausibility check for image-to-stage transforms.
//!
//! A transform is accepted when the four image corners and the image center
//! all land inside the stage travel limits. Failure is reported, not raised:
//! callers decide whether an out-of-range transform is fatal.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::geometry::{AffineTransform, Point};

/// Stage travel limits in stage units, inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl StageBounds {
    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x_min && p.x <= self.x_max && p.y >= self.y_min && p.y <= self.y_max
    }
}

// =============================================================================
// Validation Report
// =============================================================================

/// One test point that mapped outside the stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfBounds {
    /// Test point in image pixels
    pub image: Point,
    /// Where the transform sent it
    pub stage: Point,
}

/// Result of validating a transform against stage limits.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationReport {
    /// Number of test points checked
    pub checked: usize,
    /// Test points that landed outside the stage (empty if valid)
    pub violations: Vec<OutOfBounds>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Map the image corners and center through `transform` and check each
/// against `bounds`.
pub fn validate(
    transform: &AffineTransform,
    image_width: f64,
    image_height: f64,
    bounds: &StageBounds,
) -> ValidationReport {
    let test_points = [
        Point::new(0.0, 0.0),
        Point::new(image_width, 0.0),
        Point::new(0.0, image_height),
        Point::new(image_width, image_height),
        Point::new(image_width / 2.0, image_height / 2.0),
    ];

    let mut violations = Vec::new();
    for image in test_points {
        let stage = transform.apply(image);
        if !bounds.contains(stage) {
            warn!(
                "Transform validation failed: point ({}, {}) -> ({}, {}) is outside stage bounds",
                image.x, image.y, stage.x, stage.y
            );
            violations.push(OutOfBounds { image, stage });
        }
    }

    if violations.is_empty() {
        info!("Transform validation passed for all test points");
    }

    ValidationReport {
        checked: test_points.len(),
        violations,
    }
}
