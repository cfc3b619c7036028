//! Command-line configuration for the `wsi-planner` binary.
//!
//! Each subcommand has its own argument struct with a `validate()` method
//! that reports problems as plain messages before any work starts.
//!
//! # Environment Variables
//!
//! Options shared between invocations can be set with the `WSI_PLANNER_`
//! prefix:
//!
//! - `WSI_PLANNER_CONFIG_DIR` - Directory holding `saved_transforms.json`
//! - `WSI_PLANNER_METHOD` - Threshold method for `detect` (default: otsu)
//! - `WSI_PLANNER_MIN_REGION_SIZE` - Minimum region area (default: 1000)
//! - `WSI_PLANNER_OVERLAP` - Frame overlap in percent (default: 10)

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::detect::{
    CropBounds, ThresholdMethod, TissueDetectionConfig, DEFAULT_MIN_REGION_SIZE,
};
use crate::error::ConfigError;
use crate::geometry::{
    add_translation_to_scaled_affine, pixel_to_stage_scaling, AffineTransform, BoundingBox, Point,
};
use crate::tiling::{TilingRequest, DEFAULT_OVERLAP_PERCENT};
use crate::transform::StageBounds;

// =============================================================================
// Default Values
// =============================================================================

/// Default threshold method name.
pub const DEFAULT_METHOD: &str = "otsu";

// =============================================================================
// CLI Arguments
// =============================================================================

/// WSI Planner - Acquisition geometry for slide scanning.
///
/// Finds tissue on overview images, manages image-to-stage transforms and
/// plans overlapping tile grids.
#[derive(Parser, Debug, Clone)]
#[command(name = "wsi-planner")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Detect tissue on an overview image and print the bounds as JSON.
    Detect(DetectConfig),

    /// Plan a tile grid over a bounding box and write its coordinate file.
    Plan(PlanConfig),

    /// Manage saved image-to-stage transforms.
    Presets(PresetsConfig),

    /// Convert written coordinate files from pixel to stage space.
    TransformTiles(TransformTilesConfig),
}

// =============================================================================
// Detect Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct DetectConfig {
    /// Overview image (PNG or JPEG).
    #[arg(long)]
    pub overview: PathBuf,

    /// Width of the main image in pixels.
    #[arg(long)]
    pub main_width: u32,

    /// Height of the main image in pixels.
    #[arg(long)]
    pub main_height: u32,

    /// Threshold method: otsu, mean, percentile, fixed, eosin, dual or
    /// deconvolution.
    #[arg(long, default_value = DEFAULT_METHOD, env = "WSI_PLANNER_METHOD")]
    pub method: String,

    /// Cut-off for the fixed method (0-255).
    #[arg(long)]
    pub threshold: Option<u8>,

    /// Cumulative fraction for the percentile method (0.0-1.0).
    #[arg(long)]
    pub percentile: Option<f64>,

    /// Regions with a bounding-box area at or below this are dropped.
    #[arg(long, default_value_t = DEFAULT_MIN_REGION_SIZE, env = "WSI_PLANNER_MIN_REGION_SIZE")]
    pub min_region_size: u64,

    /// Crop the overview to the slide area first (x_min,x_max,y_min,y_max).
    #[arg(long)]
    pub crop: Option<CropBounds>,

    /// Mirror the overview horizontally before analysis.
    #[arg(long, default_value_t = false)]
    pub flip_x: bool,

    /// Mirror the overview vertically before analysis.
    #[arg(long, default_value_t = false)]
    pub flip_y: bool,

    /// Write the overview, mask and outlined bounds as PNGs here.
    #[arg(long)]
    pub debug_dir: Option<PathBuf>,
}

impl DetectConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.main_width == 0 || self.main_height == 0 {
            return Err("main image dimensions must be greater than 0".to_string());
        }
        if let Some(p) = self.percentile {
            if !(0.0..=1.0).contains(&p) {
                return Err(format!("percentile must be between 0.0 and 1.0, got {}", p));
            }
        }
        Ok(())
    }

    /// Threshold method with any explicit parameters applied.
    pub fn threshold_method(&self) -> ThresholdMethod {
        match ThresholdMethod::from_name(&self.method) {
            ThresholdMethod::Fixed(default) => ThresholdMethod::Fixed(self.threshold.unwrap_or(default)),
            ThresholdMethod::Percentile(default) => {
                ThresholdMethod::Percentile(self.percentile.unwrap_or(default))
            }
            other => other,
        }
    }

    pub fn detection_config(&self) -> TissueDetectionConfig {
        TissueDetectionConfig {
            method: self.threshold_method(),
            min_region_size: self.min_region_size,
            ..TissueDetectionConfig::default()
        }
    }
}

// =============================================================================
// Plan Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PlanConfig {
    /// Output folder; the grid is written to `<output>/bounds/`.
    #[arg(long)]
    pub output: PathBuf,

    /// Frame width, in the units of the bounding box.
    #[arg(long)]
    pub frame_width: f64,

    /// Frame height, in the units of the bounding box.
    #[arg(long)]
    pub frame_height: f64,

    /// Overlap between neighboring frames in percent.
    #[arg(long, default_value_t = DEFAULT_OVERLAP_PERCENT, env = "WSI_PLANNER_OVERLAP")]
    pub overlap: f64,

    /// Area to cover (x1,y1,x2,y2).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, required = true)]
    pub bbox: Vec<f64>,

    /// Walk columns from the far side.
    #[arg(long, default_value_t = false)]
    pub invert_x: bool,

    /// Walk rows from the far side.
    #[arg(long, default_value_t = false)]
    pub invert_y: bool,
}

impl PlanConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.bbox.len() != 4 {
            return Err(format!(
                "bbox needs 4 comma-separated values (x1,y1,x2,y2), got {}",
                self.bbox.len()
            ));
        }
        Ok(())
    }

    /// Build the tiling request. Call [`PlanConfig::validate`] first.
    pub fn to_request(&self) -> Result<TilingRequest, ConfigError> {
        let mut builder = TilingRequest::builder()
            .output_folder(&self.output)
            .frame_size(self.frame_width, self.frame_height)
            .overlap_percent(self.overlap)
            .invert_axes(self.invert_x, self.invert_y);
        if let [x1, y1, x2, y2] = self.bbox[..] {
            builder = builder.bounding_box(BoundingBox::new(x1, y1, x2, y2));
        }
        builder.build()
    }
}

// =============================================================================
// Presets Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct PresetsConfig {
    /// Directory holding the transform store.
    #[arg(long, env = "WSI_PLANNER_CONFIG_DIR")]
    pub config_dir: PathBuf,

    #[command(subcommand)]
    pub action: PresetAction,
}

#[derive(Subcommand, Debug, Clone)]
pub enum PresetAction {
    /// List presets as JSON.
    List {
        /// Only presets for this microscope.
        #[arg(long)]
        microscope: Option<String>,
    },

    /// Print one preset as JSON.
    Show { name: String },

    /// Delete a preset.
    Delete { name: String },

    /// Save a preset, replacing any preset with the same name.
    Add(AddPresetConfig),
}

/// Arguments for `presets add`.
///
/// The transform is either given directly as six coefficients, or derived
/// from a pixel size and one image point with its known stage position.
#[derive(Args, Debug, Clone)]
pub struct AddPresetConfig {
    pub name: String,

    #[arg(long)]
    pub microscope: String,

    #[arg(long, default_value = "")]
    pub mounting_method: String,

    /// Coefficients m00,m10,m01,m11,m02,m12.
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub transform: Option<Vec<f64>>,

    /// Stage units per image pixel.
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Reference point in image pixels (x,y).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub image_point: Option<Vec<f64>>,

    /// Stage position of the reference point (x,y).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub stage_point: Option<Vec<f64>>,

    /// Stage X axis runs opposite to image X.
    #[arg(long, default_value_t = false)]
    pub invert_x: bool,

    /// Stage Y axis runs opposite to image Y.
    #[arg(long, default_value_t = false)]
    pub invert_y: bool,

    #[arg(long, default_value = "")]
    pub notes: String,

    /// Stage travel limits to check the transform against
    /// (x_min,x_max,y_min,y_max).
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
    pub stage_limits: Option<Vec<f64>>,

    /// Image size used for the stage limit check (width,height).
    #[arg(long, value_delimiter = ',')]
    pub image_size: Option<Vec<u32>>,
}

fn point_arg(values: &Option<Vec<f64>>, name: &str) -> Result<Point, String> {
    match values.as_deref() {
        Some([x, y]) => Ok(Point::new(*x, *y)),
        Some(other) => Err(format!("{} needs 2 values (x,y), got {}", name, other.len())),
        None => Err(format!("{} is required with --pixel-size", name)),
    }
}

impl AddPresetConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("preset name must not be empty".to_string());
        }
        match (&self.transform, self.pixel_size) {
            (Some(_), Some(_)) => {
                return Err("use either --transform or --pixel-size, not both".to_string())
            }
            (None, None) => return Err("one of --transform or --pixel-size is required".to_string()),
            (Some(t), None) if t.len() != 6 => {
                return Err(format!("transform needs 6 coefficients, got {}", t.len()))
            }
            (None, Some(ps)) if !(ps.is_finite() && ps > 0.0) => {
                return Err(format!("pixel size must be positive, got {}", ps))
            }
            _ => {}
        }
        if self.pixel_size.is_some() {
            point_arg(&self.image_point, "--image-point")?;
            point_arg(&self.stage_point, "--stage-point")?;
        }
        match (&self.stage_limits, &self.image_size) {
            (Some(l), Some(s)) if l.len() == 4 && s.len() == 2 => Ok(()),
            (None, None) => Ok(()),
            _ => Err("--stage-limits (4 values) and --image-size (2 values) go together".to_string()),
        }
    }

    /// Transform described by the arguments. Call
    /// [`AddPresetConfig::validate`] first.
    pub fn build_transform(&self) -> Result<AffineTransform, String> {
        if let Some(values) = &self.transform {
            let coefficients: [f64; 6] = values
                .as_slice()
                .try_into()
                .map_err(|_| format!("transform needs 6 coefficients, got {}", values.len()))?;
            return Ok(AffineTransform::from_array(coefficients));
        }
        let pixel_size = self
            .pixel_size
            .ok_or_else(|| "one of --transform or --pixel-size is required".to_string())?;
        let scaling = pixel_to_stage_scaling(pixel_size, self.invert_x, self.invert_y);
        let image = point_arg(&self.image_point, "--image-point")?;
        let stage = point_arg(&self.stage_point, "--stage-point")?;
        Ok(add_translation_to_scaled_affine(&scaling, image, stage))
    }

    /// Stage limit check parameters, if requested.
    pub fn stage_check(&self) -> Option<(StageBounds, u32, u32)> {
        match (self.stage_limits.as_deref(), self.image_size.as_deref()) {
            (Some(&[x_min, x_max, y_min, y_max]), Some(&[w, h])) => {
                Some((StageBounds::new(x_min, x_max, y_min, y_max), w, h))
            }
            _ => None,
        }
    }
}

// =============================================================================
// Transform Tiles Command
// =============================================================================

#[derive(Args, Debug, Clone)]
pub struct TransformTilesConfig {
    /// Directory holding the transform store.
    #[arg(long, env = "WSI_PLANNER_CONFIG_DIR")]
    pub config_dir: PathBuf,

    /// Name of the saved transform to apply.
    #[arg(long)]
    pub preset: String,

    /// Directory whose subdirectories hold coordinate files.
    #[arg(long)]
    pub tiles_dir: PathBuf,
}

impl TransformTilesConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.preset.trim().is_empty() {
            return Err("preset name must not be empty".to_string());
        }
        if !self.tiles_dir.is_dir() {
            return Err(format!(
                "tiles directory does not exist: {}",
                self.tiles_dir.display()
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
