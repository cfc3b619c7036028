use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::AffineTransform;

/// Named image-to-stage transform with provenance.
///
/// Field names are camelCase on disk so stores written by earlier tooling
/// load unchanged. Presets without marker-detection parameters get the
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformPreset {
    pub name: String,
    pub microscope: String,
    pub mounting_method: String,
    pub transform: AffineTransform,
    #[serde(default = "Utc::now")]
    pub created_date: DateTime<Utc>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, rename = "greenBoxParams")]
    pub detection_params: DetectionParams,
}

impl TransformPreset {
    /// Create a preset stamped with the current time and default detection
    /// parameters.
    pub fn new(
        name: impl Into<String>,
        microscope: impl Into<String>,
        mounting_method: impl Into<String>,
        transform: AffineTransform,
    ) -> Self {
        Self {
            name: name.into(),
            microscope: microscope.into(),
            mounting_method: mounting_method.into(),
            transform,
            created_date: Utc::now(),
            notes: String::new(),
            detection_params: DetectionParams::default(),
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    pub fn with_detection_params(mut self, params: DetectionParams) -> Self {
        self.detection_params = params;
        self
    }
}

impl std::fmt::Display for TransformPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} - {})", self.name, self.microscope, self.mounting_method)
    }
}

/// Parameters for locating the green slide-holder marker on an overview.
///
/// Stored with each preset so that alignment can be repeated with the
/// settings it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DetectionParams {
    /// How strongly green must exceed the other channels.
    pub green_threshold: f64,
    pub saturation_min: f64,
    pub brightness_min: f64,
    pub brightness_max: f64,
    /// Minimum marker size in overview pixels.
    pub min_box_width: u32,
    pub min_box_height: u32,
    /// Expected thickness of the marker outline.
    pub edge_thickness: u32,
    pub require_rectangle: bool,
}

impl Default for DetectionParams {
    fn default() -> Self {
        Self {
            green_threshold: 0.4,
            saturation_min: 0.3,
            brightness_min: 0.3,
            brightness_max: 0.9,
            min_box_width: 100,
            min_box_height: 100,
            edge_thickness: 3,
            require_rectangle: true,
        }
    }
}
