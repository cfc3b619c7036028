//! Overview image preparation and analysis export.
//!
//! Scanner overview images often include the slide holder around the glass.
//! [`crop_to_slide_area`] trims them to the slide itself and returns the
//! offset needed to map results back; [`flip_overview`] corrects scanners
//! whose overview is mirrored relative to the main image.

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use image::{DynamicImage, Rgb, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::analyzer::TissueAnalysis;
use super::raster::Raster;
use crate::error::DetectionError;
use crate::geometry::{BoundingBox, Point};

/// Default slide area for overviews that include the holder.
pub const DEFAULT_SLIDE_X_MIN: u32 = 0;
pub const DEFAULT_SLIDE_X_MAX: u32 = 985;
pub const DEFAULT_SLIDE_Y_MIN: u32 = 19;
pub const DEFAULT_SLIDE_Y_MAX: u32 = 331;

/// Debug export file names.
pub const ORIGINAL_FILE_NAME: &str = "macro_original.png";
pub const THRESHOLDED_FILE_NAME: &str = "macro_thresholded.png";
pub const BOUNDS_FILE_NAME: &str = "macro_bounds.png";

// =============================================================================
// Cropping
// =============================================================================

/// Slide area within an overview image, max edges exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropBounds {
    pub x_min: u32,
    pub x_max: u32,
    pub y_min: u32,
    pub y_max: u32,
}

impl Default for CropBounds {
    fn default() -> Self {
        Self {
            x_min: DEFAULT_SLIDE_X_MIN,
            x_max: DEFAULT_SLIDE_X_MAX,
            y_min: DEFAULT_SLIDE_Y_MIN,
            y_max: DEFAULT_SLIDE_Y_MAX,
        }
    }
}

impl fmt::Display for CropBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.x_min, self.x_max, self.y_min, self.y_max)
    }
}

/// Parses `x_min,x_max,y_min,y_max`.
impl FromStr for CropBounds {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(format!("expected x_min,x_max,y_min,y_max, got '{}'", s));
        }
        let mut values = [0u32; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| format!("invalid crop coordinate '{}'", part))?;
        }
        Ok(Self {
            x_min: values[0],
            x_max: values[1],
            y_min: values[2],
            y_max: values[3],
        })
    }
}

/// Cropped overview plus the offset back to the uncropped image.
#[derive(Debug, Clone)]
pub struct CroppedOverview {
    pub image: DynamicImage,
    pub original_width: u32,
    pub original_height: u32,
    pub offset_x: u32,
    pub offset_y: u32,
}

impl CroppedOverview {
    /// Map a point in cropped pixels to the original overview.
    pub fn to_original(&self, p: Point) -> Point {
        Point::new(p.x + self.offset_x as f64, p.y + self.offset_y as f64)
    }

    /// Map a box in original overview pixels into cropped pixels.
    ///
    /// The box is shifted, not clipped. A warning is logged when it falls
    /// partly outside the cropped image.
    pub fn adjust_box(&self, bbox: &BoundingBox) -> BoundingBox {
        let x = bbox.min_x() - self.offset_x as f64;
        let y = bbox.min_y() - self.offset_y as f64;
        if x < 0.0
            || y < 0.0
            || x + bbox.width() > self.image.width() as f64
            || y + bbox.height() > self.image.height() as f64
        {
            warn!("Adjusted box extends beyond cropped image bounds");
        }
        BoundingBox::from_origin_size(x, y, bbox.width(), bbox.height())
    }
}

/// Crop an overview to the slide area.
///
/// Bounds are first clamped to the image. If nothing remains the crop is
/// rejected.
pub fn crop_to_slide_area(
    image: &DynamicImage,
    bounds: CropBounds,
) -> Result<CroppedOverview, DetectionError> {
    let (width, height) = (image.width(), image.height());
    let x_min = bounds.x_min;
    let x_max = bounds.x_max.min(width);
    let y_min = bounds.y_min;
    let y_max = bounds.y_max.min(height);

    if x_min >= x_max || y_min >= y_max {
        return Err(DetectionError::InvalidCropBounds {
            x_min,
            x_max,
            y_min,
            y_max,
        });
    }

    let crop_w = x_max - x_min;
    let crop_h = y_max - y_min;
    info!(
        "Cropping overview from {}x{} to {}x{} (offset: {}, {})",
        width, height, crop_w, crop_h, x_min, y_min
    );

    Ok(CroppedOverview {
        image: image.crop_imm(x_min, y_min, crop_w, crop_h),
        original_width: width,
        original_height: height,
        offset_x: x_min,
        offset_y: y_min,
    })
}

/// Mirror an overview horizontally and/or vertically.
pub fn flip_overview(image: DynamicImage, flip_x: bool, flip_y: bool) -> DynamicImage {
    if !flip_x && !flip_y {
        return image;
    }
    let mut out = image;
    if flip_x {
        out = out.fliph();
    }
    if flip_y {
        out = out.flipv();
    }
    info!("Applied flips to overview: flip_x={}, flip_y={}", flip_x, flip_y);
    out
}

// =============================================================================
// Debug Export
// =============================================================================

fn to_rgb_image<R: Raster + ?Sized>(raster: &R) -> RgbImage {
    RgbImage::from_fn(raster.width(), raster.height(), |x, y| Rgb(raster.rgb(x, y)))
}

/// Blend a 2 pixel red outline of `bbox` over `img`.
fn draw_outline(img: &mut RgbImage, bbox: &BoundingBox) {
    let x0 = bbox.min_x().floor() as i64;
    let y0 = bbox.min_y().floor() as i64;
    let x1 = bbox.max_x().floor() as i64;
    let y1 = bbox.max_y().floor() as i64;
    let (w, h) = (img.width() as i64, img.height() as i64);

    for y in (y0 - 1).max(0)..=(y1 + 1).min(h - 1) {
        for x in (x0 - 1).max(0)..=(x1 + 1).min(w - 1) {
            let near_vertical = (x - x0).abs() <= 1 || (x - x1).abs() <= 1;
            let near_horizontal = (y - y0).abs() <= 1 || (y - y1).abs() <= 1;
            if near_vertical || near_horizontal {
                let p = img.get_pixel_mut(x as u32, y as u32);
                let [r, g, b] = p.0;
                *p = Rgb([
                    ((r as u16 + 255) / 2) as u8,
                    (g as u16 / 2) as u8,
                    (b as u16 / 2) as u8,
                ]);
            }
        }
    }
}

/// Write the overview, the tissue mask and the overview with the tissue
/// bounds outlined as PNG files into `dir`, creating it if needed.
pub fn save_analysis_images<R: Raster + ?Sized>(
    analysis: &TissueAnalysis,
    overview: &R,
    dir: &Path,
) -> Result<(), DetectionError> {
    fs::create_dir_all(dir).map_err(|source| DetectionError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let original = to_rgb_image(overview);
    original.save(dir.join(ORIGINAL_FILE_NAME))?;

    analysis.mask.to_image().save(dir.join(THRESHOLDED_FILE_NAME))?;

    let mut outlined = original;
    draw_outline(&mut outlined, &analysis.bounds);
    outlined.save(dir.join(BOUNDS_FILE_NAME))?;

    info!("Saved analysis images to {}", dir.display());
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
