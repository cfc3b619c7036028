//! # WSI Planner
//!
//! Acquisition geometry for whole-slide scanning: decides where tissue is on
//! a slide overview, maps it into stage coordinates and plans the camera
//! frames that cover it.
//!
//! ## Features
//!
//! - **Tissue detection**: global thresholds (Otsu, mean, percentile, fixed)
//!   and stain classifiers on overview images, with connected-region
//!   extraction
//! - **Transform presets**: named image-to-stage affine transforms persisted
//!   as JSON, plus per-slide alignments
//! - **Tile planning**: overlapping serpentine grids over a bounding box or
//!   polygon regions, written as `TileConfiguration.txt`
//! - **Focus prediction**: a least-squares focus plane fitted from acquired
//!   positions
//!
//! ## Architecture
//!
//! ```text
//!  overview image
//!       │
//!       ▼
//!  [`detect`] ── tissue bounds (overview px) × scale ──► main-image px
//!                                                          │
//!                              [`transform`] preset affine │
//!                                                          ▼
//!                                                    stage coordinates
//!                                                          │
//!                                                          ▼
//!  [`focus`] ◄── acquired (x, y, z) ◄── acquisition ◄── [`tiling`] plan
//! ```
//!
//! - [`geometry`] - Points, boxes, polygons and affine transforms
//! - [`detect`] - Tissue detection on overview images
//! - [`transform`] - Transform preset store and validation
//! - [`tiling`] - Tile grid planning and coordinate files
//! - [`focus`] - Focus plane prediction
//! - [`config`] - CLI configuration types
//!
//! ## Example
//!
//! ```rust,no_run
//! use wsi_planner::{BoundingBox, TilingRequest, plan};
//!
//! let request = TilingRequest::builder()
//!     .output_folder("/data/acquisition")
//!     .frame_size(1200.0, 900.0)
//!     .overlap_percent(10.0)
//!     .bounding_box(BoundingBox::new(0.0, 0.0, 20_000.0, 15_000.0))
//!     .build()
//!     .unwrap();
//!
//! let plan = plan(&request).unwrap();
//! println!("{} tiles", plan.tile_count());
//! ```

pub mod config;
pub mod detect;
pub mod error;
pub mod focus;
pub mod geometry;
mod persist;
pub mod tiling;
pub mod transform;

// Re-export commonly used types
pub use config::{Cli, Command};
pub use detect::{
    BinaryMask, CropBounds, Raster, StainParams, ThresholdMethod, TissueAnalysis,
    TissueDetectionConfig, TissueDetector,
};
pub use error::{ConfigError, DetectionError, StoreError, TilingError};
pub use focus::{FocusPlaneModel, FocusSample};
pub use geometry::{AffineTransform, BoundingBox, Point, Polygon};
pub use tiling::{
    plan, plan_with_cancel, transform_tile_configurations, GridLayout, Tile, TilingPlan,
    TilingRequest, TilingRequestBuilder,
};
pub use transform::{
    validate, SlideAlignment, SlideAlignmentStore, StageBounds, TransformPreset, TransformStore,
    ValidationReport,
};
