//! Tissue detection on slide overview images.
//!
//! An overview (macro) image is a low-resolution photograph of the whole
//! slide. Detection thresholds it into a tissue mask, extracts connected
//! regions and reports their union as the area worth scanning, together
//! with the scale factors that relate overview pixels to main-image pixels.
//!
//! # Pipeline
//!
//! 1. Luminance `0.299 R + 0.587 G + 0.114 B` per pixel
//! 2. 256-bin histogram
//! 3. Threshold via [`ThresholdMethod`] (global cut-off or stain classifier)
//! 4. 4-connected flood fill with an explicit worklist
//! 5. Size filtering and union of the surviving bounding boxes
//!
//! Pixel access goes through the [`Raster`] trait, so any image source can
//! be analyzed.

mod analyzer;
mod overview;
mod raster;
mod regions;
mod threshold;

pub use analyzer::{
    TissueAnalysis, TissueDetectionConfig, TissueDetector, DEFAULT_MIN_REGION_SIZE,
};
pub use overview::{
    crop_to_slide_area, flip_overview, save_analysis_images, CropBounds, CroppedOverview,
    BOUNDS_FILE_NAME, ORIGINAL_FILE_NAME, THRESHOLDED_FILE_NAME,
};
pub use raster::{histogram, luminance, luminance_plane, Raster};
pub use regions::{find_regions, union_bounds, BinaryMask, RegionFilter};
pub use threshold::{
    mean_threshold, otsu_threshold, percentile_threshold, Hsb, StainParams, ThresholdMethod,
    DEFAULT_FIXED_THRESHOLD, DEFAULT_PERCENTILE,
};
