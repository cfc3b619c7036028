//! Thresholding strategies for separating tissue from slide background.
//!
//! Two families are supported:
//!
//! - **Global luminance thresholds** (Otsu, mean, percentile, fixed): a single
//!   cut-off is derived from the luminance histogram and every pixel darker
//!   than it is tissue.
//! - **Stain classifiers** (eosin, dual H&E, color deconvolution): each pixel
//!   is classified from its own color using hue windows, channel dominance
//!   and saturation/brightness gates. No global cut-off is computed.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Default percentile for [`ThresholdMethod::Percentile`].
pub const DEFAULT_PERCENTILE: f64 = 0.5;

/// Default cut-off for [`ThresholdMethod::Fixed`].
pub const DEFAULT_FIXED_THRESHOLD: u8 = 128;

/// Returned by the percentile search when no bin reaches the target.
const PERCENTILE_FALLBACK: u8 = 128;

// =============================================================================
// Threshold Method
// =============================================================================

/// How the tissue mask is derived from an overview raster.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdMethod {
    /// Otsu's method on the luminance histogram.
    #[default]
    Otsu,
    /// Mean luminance.
    Mean,
    /// Luminance at the given cumulative fraction (0.0 - 1.0).
    Percentile(f64),
    /// Caller-supplied cut-off.
    Fixed(u8),
    /// Pink/red eosin classifier.
    Eosin(StainParams),
    /// Eosin OR hematoxylin classifier.
    Dual(StainParams),
    /// Brightness bounds plus channel spread.
    ColorDeconvolution(StainParams),
}

impl ThresholdMethod {
    /// Parse a method name, falling back to Otsu for anything unrecognized.
    ///
    /// Parameterized methods get their default parameters.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "otsu" => ThresholdMethod::Otsu,
            "mean" => ThresholdMethod::Mean,
            "percentile" => ThresholdMethod::Percentile(DEFAULT_PERCENTILE),
            "fixed" => ThresholdMethod::Fixed(DEFAULT_FIXED_THRESHOLD),
            "eosin" | "he_eosin" => ThresholdMethod::Eosin(StainParams::default()),
            "dual" | "he_dual" => ThresholdMethod::Dual(StainParams::default()),
            "deconvolution" | "color_deconvolution" => {
                ThresholdMethod::ColorDeconvolution(StainParams::default())
            }
            other => {
                warn!("Unsupported threshold method '{}', using Otsu", other);
                ThresholdMethod::Otsu
            }
        }
    }

    /// Short lowercase name, as accepted by [`ThresholdMethod::from_name`].
    pub fn name(&self) -> &'static str {
        match self {
            ThresholdMethod::Otsu => "otsu",
            ThresholdMethod::Mean => "mean",
            ThresholdMethod::Percentile(_) => "percentile",
            ThresholdMethod::Fixed(_) => "fixed",
            ThresholdMethod::Eosin(_) => "eosin",
            ThresholdMethod::Dual(_) => "dual",
            ThresholdMethod::ColorDeconvolution(_) => "deconvolution",
        }
    }

    /// Stain parameters for per-pixel classifiers, `None` for global methods.
    pub fn stain_params(&self) -> Option<&StainParams> {
        match self {
            ThresholdMethod::Eosin(p)
            | ThresholdMethod::Dual(p)
            | ThresholdMethod::ColorDeconvolution(p) => Some(p),
            _ => None,
        }
    }

    /// Global luminance cut-off for this method, `None` for stain classifiers.
    pub fn global_threshold(&self, histogram: &[u64; 256]) -> Option<u8> {
        let threshold = match *self {
            ThresholdMethod::Otsu => otsu_threshold(histogram),
            ThresholdMethod::Mean => mean_threshold(histogram),
            ThresholdMethod::Percentile(p) => percentile_threshold(histogram, p),
            ThresholdMethod::Fixed(t) => t,
            _ => return None,
        };
        info!("{} threshold calculated: {}", self.name(), threshold);
        Some(threshold)
    }

    /// Per-pixel classification for stain methods.
    ///
    /// Returns `None` for global methods, which classify by luminance instead.
    pub fn classify_color(&self, rgb: [u8; 3]) -> Option<bool> {
        match self {
            ThresholdMethod::Eosin(p) => Some(p.is_eosin(rgb)),
            ThresholdMethod::Dual(p) => Some(p.is_eosin(rgb) || p.is_hematoxylin(rgb)),
            ThresholdMethod::ColorDeconvolution(p) => Some(p.is_stained(rgb)),
            _ => None,
        }
    }
}

// =============================================================================
// Global Thresholds
// =============================================================================

/// Otsu's method.
///
/// Returns one past the last bin of the dark class, so tissue is
/// `luminance < t`. When several splits reach the same between-class
/// variance the lowest one wins. A single-valued histogram gives 0.
pub fn otsu_threshold(histogram: &[u64; 256]) -> u8 {
    let total: u64 = histogram.iter().sum();
    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &n)| i as f64 * n as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut w_b: u64 = 0;
    let mut var_max = 0.0;
    let mut threshold = 0u8;

    for (i, &n) in histogram.iter().enumerate() {
        w_b += n;
        if w_b == 0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f == 0 {
            break;
        }

        sum_b += i as f64 * n as f64;
        let m_b = sum_b / w_b as f64;
        let m_f = (sum - sum_b) / w_f as f64;
        let var_between = w_b as f64 * w_f as f64 * (m_b - m_f) * (m_b - m_f);

        if var_between > var_max {
            var_max = var_between;
            // i < 255 here since the foreground class is non-empty
            threshold = (i + 1) as u8;
        }
    }

    threshold
}

/// Integer mean of the histogram.
pub fn mean_threshold(histogram: &[u64; 256]) -> u8 {
    let (sum, count) = histogram
        .iter()
        .enumerate()
        .fold((0u64, 0u64), |(s, c), (i, &n)| (s + i as u64 * n, c + n));
    if count == 0 {
        return 0;
    }
    (sum / count) as u8
}

/// First bin at which the cumulative count reaches `percentile` of the total.
pub fn percentile_threshold(histogram: &[u64; 256], percentile: f64) -> u8 {
    let total: u64 = histogram.iter().sum();
    let target = (total as f64 * percentile) as u64;
    let mut cumulative = 0u64;
    for (i, &n) in histogram.iter().enumerate() {
        cumulative += n;
        if cumulative >= target {
            return i as u8;
        }
    }
    PERCENTILE_FALLBACK
}

// =============================================================================
// Stain Classifiers
// =============================================================================

/// Tunable windows for the H&E stain classifiers.
///
/// Hues are fractions of a full turn (0.0 - 1.0). Thresholds and gates are
/// on normalized 0.0 - 1.0 channel values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StainParams {
    /// Red must exceed green and blue by this fraction to count as dominant.
    pub eosin_threshold: f64,
    /// Minimum normalized blue for blue dominance.
    pub hematoxylin_threshold: f64,
    /// Minimum HSB saturation (exclusive).
    pub saturation_min: f64,
    /// Brightness window (exclusive for HSB, inclusive for deconvolution).
    pub brightness_min: f64,
    pub brightness_max: f64,
    /// Eosin hue window wraps around red: `hue < low || hue > high`.
    pub eosin_hue_low: f64,
    pub eosin_hue_high: f64,
    /// Hematoxylin hue window: `min < hue < max`.
    pub hematoxylin_hue_min: f64,
    pub hematoxylin_hue_max: f64,
    /// Minimum channel spread for the deconvolution classifier (exclusive).
    pub colorfulness_min: f64,
}

impl Default for StainParams {
    fn default() -> Self {
        Self {
            eosin_threshold: 0.15,
            hematoxylin_threshold: 0.15,
            saturation_min: 0.1,
            brightness_min: 0.2,
            brightness_max: 0.95,
            eosin_hue_low: 0.055,
            eosin_hue_high: 0.944,
            hematoxylin_hue_min: 0.667,
            hematoxylin_hue_max: 0.778,
            colorfulness_min: 0.1,
        }
    }
}

impl StainParams {
    fn passes_gates(&self, hsb: Hsb) -> bool {
        let s = hsb.saturation as f64;
        let v = hsb.brightness as f64;
        s > self.saturation_min && v > self.brightness_min && v < self.brightness_max
    }

    /// Pink/red eosin: hue near red or red-dominant, within the gates.
    pub fn is_eosin(&self, rgb: [u8; 3]) -> bool {
        let hsb = Hsb::from_rgb(rgb);
        let [r, g, b] = normalized(rgb);
        let hue = hsb.hue as f64;

        let eosin_hue = hue < self.eosin_hue_low || hue > self.eosin_hue_high;
        let factor = 1.0 + self.eosin_threshold;
        let red_dominant = r > g * factor && r > b * factor;

        (eosin_hue || red_dominant) && self.passes_gates(hsb)
    }

    /// Purple/blue hematoxylin: hue in the blue-violet window or strong blue.
    pub fn is_hematoxylin(&self, rgb: [u8; 3]) -> bool {
        let hsb = Hsb::from_rgb(rgb);
        let [r, _, b] = normalized(rgb);
        let hue = hsb.hue as f64;

        let hema_hue = hue > self.hematoxylin_hue_min && hue < self.hematoxylin_hue_max;
        let blue_dominant = b > self.hematoxylin_threshold && b >= r * 0.8;

        (hema_hue || blue_dominant) && self.passes_gates(hsb)
    }

    /// Simplified deconvolution: mid-range brightness with visible color.
    pub fn is_stained(&self, rgb: [u8; 3]) -> bool {
        let [r, g, b] = normalized(rgb);
        let brightness = (r + g + b) / 3.0;
        if brightness < self.brightness_min || brightness > self.brightness_max {
            return false;
        }
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        max - min > self.colorfulness_min
    }
}

fn normalized([r, g, b]: [u8; 3]) -> [f64; 3] {
    [r as f64 / 255.0, g as f64 / 255.0, b as f64 / 255.0]
}

/// Hue/saturation/brightness, each in 0.0 - 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hsb {
    pub hue: f32,
    pub saturation: f32,
    pub brightness: f32,
}

impl Hsb {
    /// Convert 8-bit RGB. Greys have hue 0.
    pub fn from_rgb([r, g, b]: [u8; 3]) -> Self {
        let cmax = r.max(g).max(b) as f32;
        let cmin = r.min(g).min(b) as f32;
        let (r, g, b) = (r as f32, g as f32, b as f32);

        let brightness = cmax / 255.0;
        let saturation = if cmax != 0.0 { (cmax - cmin) / cmax } else { 0.0 };

        let hue = if saturation == 0.0 {
            0.0
        } else {
            let span = cmax - cmin;
            let redc = (cmax - r) / span;
            let greenc = (cmax - g) / span;
            let bluec = (cmax - b) / span;
            let mut h = if r == cmax {
                bluec - greenc
            } else if g == cmax {
                2.0 + redc - bluec
            } else {
                4.0 + greenc - redc
            };
            h /= 6.0;
            if h < 0.0 {
                h += 1.0;
            }
            h
        };

        Self {
            hue,
            saturation,
            brightness,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
