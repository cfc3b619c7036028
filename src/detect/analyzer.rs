use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::raster::{histogram, luminance_plane, Raster};
use super::regions::{find_regions, union_bounds, BinaryMask, RegionFilter};
use super::threshold::ThresholdMethod;
use crate::geometry::BoundingBox;

/// Default minimum bounding-box area for a tissue region, in overview pixels.
pub const DEFAULT_MIN_REGION_SIZE: u64 = 1000;

/// Detection settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TissueDetectionConfig {
    pub method: ThresholdMethod,
    /// Regions with a bounding-box area at or below this are dropped.
    pub min_region_size: u64,
    /// Regions narrower or shorter than this are dropped.
    pub min_region_dimension: Option<u32>,
}

impl Default for TissueDetectionConfig {
    fn default() -> Self {
        Self {
            method: ThresholdMethod::default(),
            min_region_size: DEFAULT_MIN_REGION_SIZE,
            min_region_dimension: None,
        }
    }
}

/// Result of one detection pass over an overview image.
#[derive(Debug, Clone)]
pub struct TissueAnalysis {
    pub overview_width: u32,
    pub overview_height: u32,
    pub mask: BinaryMask,
    /// Surviving regions in overview pixels.
    pub regions: Vec<BoundingBox>,
    /// Union of `regions`, or the 1×1 box at the origin when empty.
    pub bounds: BoundingBox,
    /// Main-image pixels per overview pixel.
    pub scale_x: f64,
    pub scale_y: f64,
    /// Global cut-off, `None` for stain classifiers.
    pub threshold: Option<u8>,
    pub method: ThresholdMethod,
}

impl TissueAnalysis {
    /// Whether any region survived filtering.
    pub fn has_tissue(&self) -> bool {
        !self.regions.is_empty()
    }

    /// Convert a box from overview pixels to main-image pixels.
    pub fn scale_to_main_image(&self, bbox: &BoundingBox) -> BoundingBox {
        bbox.scaled(self.scale_x, self.scale_y)
    }

    /// Tissue bounds in main-image pixels, `None` when no tissue was found.
    pub fn main_image_bounds(&self) -> Option<BoundingBox> {
        self.has_tissue()
            .then(|| self.scale_to_main_image(&self.bounds))
    }
}

/// Tissue detector for slide overview images.
///
/// ```text
/// raster ──► luminance ──► histogram ──► threshold ──► mask
///                                                       │
///            union bounds ◄── size filter ◄── flood fill ┘
/// ```
#[derive(Debug, Clone, Default)]
pub struct TissueDetector {
    config: TissueDetectionConfig,
}

impl TissueDetector {
    pub fn new(config: TissueDetectionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TissueDetectionConfig {
        &self.config
    }

    /// Analyze an overview whose main image is `main_width` × `main_height`.
    ///
    /// Returns `None` when no overview is available, or when either image has
    /// zero size. A result with no regions means no tissue was found.
    pub fn analyze<R: Raster + ?Sized>(
        &self,
        overview: Option<&R>,
        main_width: u32,
        main_height: u32,
    ) -> Option<TissueAnalysis> {
        let Some(overview) = overview else {
            warn!("No overview image available for tissue detection");
            return None;
        };
        if overview.is_empty() {
            warn!("Overview image is empty");
            return None;
        }
        if main_width == 0 || main_height == 0 {
            warn!(
                "Main image has zero size ({}x{}), cannot compute scale",
                main_width, main_height
            );
            return None;
        }

        let method = self.config.method;
        let (w, h) = (overview.width(), overview.height());
        info!(
            "Starting tissue detection with method {} on {}x{} overview",
            method.name(),
            w,
            h
        );

        let (mask, threshold) = match method.stain_params() {
            Some(_) => {
                let mask = BinaryMask::from_fn(w, h, |x, y| {
                    method.classify_color(overview.rgb(x, y)).unwrap_or(false)
                });
                (mask, None)
            }
            None => {
                let luma = luminance_plane(overview);
                let hist = histogram(&luma);
                let t = method.global_threshold(&hist).unwrap_or(0);
                let mask = BinaryMask::from_fn(w, h, |x, y| {
                    luma[y as usize * w as usize + x as usize] < t
                });
                (mask, Some(t))
            }
        };
        debug!("Tissue mask has {} pixels", mask.count());

        let filter = RegionFilter {
            min_area: self.config.min_region_size,
            min_dimension: self.config.min_region_dimension,
        };
        let regions = find_regions(&mask, &filter);
        let bounds = union_bounds(&regions);

        info!(
            "Found {} tissue regions with overall bounds: ({}, {}, {}, {})",
            regions.len(),
            bounds.min_x(),
            bounds.min_y(),
            bounds.width(),
            bounds.height()
        );

        Some(TissueAnalysis {
            overview_width: w,
            overview_height: h,
            mask,
            regions,
            bounds,
            scale_x: main_width as f64 / w as f64,
            scale_y: main_height as f64 / h as f64,
            threshold,
            method,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
