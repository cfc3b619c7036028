//! Focus plane prediction.
//!
//! Stage tilt makes the best focus position drift roughly linearly across a
//! slide. [`FocusPlaneModel`] fits `z = a·x + b·y + c` to the focus values of
//! already acquired positions and predicts `z` for the next one.
//!
//! The fit works on coordinates relative to the sample mean, which reduces
//! the least-squares normal equations to
//!
//! ```text
//! | Σx'²   Σx'y' |   | a |   | Σx'z' |
//! | Σx'y'  Σy'²  | · | b | = | Σy'z' |
//! ```
//!
//! solved with Cramer's rule, and `c = z̄ - a·x̄ - b·ȳ`. Collinear or
//! coincident samples make the system singular, judged relative to
//! `Σx'² · Σy'²`; the model then keeps its previous coefficients and reports
//! itself as unfitted.

use tracing::{debug, info, warn};

/// Samples needed before predictions are always allowed.
pub const MIN_POINTS_STANDARD: usize = 4;

/// Samples needed for a fit, and for predictions far from the last sample.
pub const MIN_POINTS_EARLY: usize = 3;

/// Distance (µm) past which three samples are enough to predict.
pub const EARLY_PREDICTION_DISTANCE: f64 = 1000.0;

/// Smallest accepted `det / (Σx'² · Σy'²)`, i.e. `1 - r²` of x and y.
const SINGULAR_EPSILON: f64 = 1e-10;

/// One measured focus position in stage coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FocusSample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Incrementally fitted focus plane.
#[derive(Debug, Clone, Default)]
pub struct FocusPlaneModel {
    samples: Vec<FocusSample>,
    coefficients: [f64; 3],
    fitted: bool,
}

impl FocusPlaneModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a measured focus position and refit once enough samples exist.
    pub fn add_sample(&mut self, x: f64, y: f64, z: f64) {
        self.samples.push(FocusSample { x, y, z });
        info!(
            "Added focus point #{}: ({:.1}, {:.1}) -> z={:.2}",
            self.samples.len(),
            x,
            y,
            z
        );
        if self.samples.len() >= MIN_POINTS_EARLY {
            self.fit();
        }
    }

    /// Whether a prediction may be used for a position `distance` away from
    /// the last sample.
    pub fn can_predict(&self, distance: f64) -> bool {
        let n = self.samples.len();
        if n >= MIN_POINTS_STANDARD {
            return self.fitted;
        }
        if n >= MIN_POINTS_EARLY && distance > EARLY_PREDICTION_DISTANCE {
            debug!(
                "Early prediction enabled: {} points, distance {:.1} > {:.1}",
                n, distance, EARLY_PREDICTION_DISTANCE
            );
            return self.fitted;
        }
        false
    }

    /// Predicted focus at `(x, y)`, `None` until the plane is fitted.
    pub fn predict(&self, x: f64, y: f64) -> Option<f64> {
        if !self.fitted {
            return None;
        }
        let [a, b, c] = self.coefficients;
        let z = a * x + b * y + c;
        debug!("Predicted z for ({:.1}, {:.1}): {:.2}", x, y, z);
        Some(z)
    }

    /// Root mean square of the vertical residuals, `None` when unfitted.
    pub fn residual_error(&self) -> Option<f64> {
        if !self.fitted || self.samples.is_empty() {
            return None;
        }
        let [a, b, c] = self.coefficients;
        let sum_sq: f64 = self
            .samples
            .iter()
            .map(|s| {
                let err = s.z - (a * s.x + b * s.y + c);
                err * err
            })
            .sum();
        Some((sum_sq / self.samples.len() as f64).sqrt())
    }

    /// Euclidean distance from the most recent sample, 0 before any sample.
    pub fn distance_from_last_point(&self, x: f64, y: f64) -> f64 {
        match self.samples.last() {
            Some(last) => (x - last.x).hypot(y - last.y),
            None => 0.0,
        }
    }

    pub fn reset(&mut self) {
        self.samples.clear();
        self.coefficients = [0.0; 3];
        self.fitted = false;
        info!("Focus plane model reset");
    }

    pub fn samples(&self) -> &[FocusSample] {
        &self.samples
    }

    /// Plane coefficients `[a, b, c]`.
    ///
    /// After a singular refit these are the last successful ones.
    pub fn coefficients(&self) -> [f64; 3] {
        self.coefficients
    }

    pub fn point_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted
    }

    fn fit(&mut self) {
        let n = self.samples.len() as f64;
        let mean_x = self.samples.iter().map(|s| s.x).sum::<f64>() / n;
        let mean_y = self.samples.iter().map(|s| s.y).sum::<f64>() / n;
        let mean_z = self.samples.iter().map(|s| s.z).sum::<f64>() / n;

        let (mut sxx, mut syy, mut sxy, mut sxz, mut syz) = (0.0, 0.0, 0.0, 0.0, 0.0);
        for s in &self.samples {
            let (dx, dy, dz) = (s.x - mean_x, s.y - mean_y, s.z - mean_z);
            sxx += dx * dx;
            syy += dy * dy;
            sxy += dx * dy;
            sxz += dx * dz;
            syz += dy * dz;
        }

        let det = sxx * syy - sxy * sxy;
        if det <= SINGULAR_EPSILON * sxx * syy {
            warn!("Plane fitting failed: singular matrix (collinear or coincident points)");
            self.fitted = false;
            return;
        }

        let a = (sxz * syy - sxy * syz) / det;
        let b = (sxx * syz - sxy * sxz) / det;
        self.coefficients = [a, b, mean_z - a * mean_x - b * mean_y];
        self.fitted = true;

        let [a, b, c] = self.coefficients;
        info!(
            "Plane fitted with {} points: z = {:.6}x + {:.6}y + {:.2}, residual error {:.2}",
            self.samples.len(),
            a,
            b,
            c,
            self.residual_error().unwrap_or(f64::NAN)
        );
    }
}

// =============================================================================
// Tests
// =============================================================================
