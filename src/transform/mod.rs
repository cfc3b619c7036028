//! Image-to-stage coordinate transforms and their persistence.
//!
//! - [`TransformStore`]: named presets in `saved_transforms.json`
//! - [`SlideAlignmentStore`]: per-slide overrides under `alignmentFiles/`
//! - [`validate`]: check a transform against stage travel limits

mod alignment;
mod preset;
mod store;
mod validation;

pub use alignment::{SlideAlignment, SlideAlignmentStore, ALIGNMENT_DIR};
pub use preset::{DetectionParams, TransformPreset};
pub use store::{TransformStore, TRANSFORMS_FILE};
pub use validation::{validate, OutOfBounds, StageBounds, ValidationReport};
