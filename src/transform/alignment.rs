use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::geometry::AffineTransform;
use crate::persist::write_atomically;

/// Directory under the project folder holding per-slide alignments.
pub const ALIGNMENT_DIR: &str = "alignmentFiles";

/// Transform refined for one specific slide.
///
/// The affine is stored as the flat array `[m00, m10, m01, m11, m02, m12]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideAlignment {
    pub sample_name: String,
    pub modality: String,
    pub timestamp: DateTime<Utc>,
    #[serde(with = "flat_affine")]
    pub transform: AffineTransform,
}

mod flat_affine {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::geometry::AffineTransform;

    pub fn serialize<S: Serializer>(t: &AffineTransform, s: S) -> Result<S::Ok, S::Error> {
        t.to_array().serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<AffineTransform, D::Error> {
        <[f64; 6]>::deserialize(d).map(AffineTransform::from_array)
    }
}

/// Per-slide alignment files under `<project>/alignmentFiles/`.
#[derive(Debug, Clone)]
pub struct SlideAlignmentStore {
    dir: PathBuf,
}

impl SlideAlignmentStore {
    pub fn new(project_dir: impl AsRef<Path>) -> Self {
        Self {
            dir: project_dir.as_ref().join(ALIGNMENT_DIR),
        }
    }

    /// Path of the alignment file for `sample_name`.
    pub fn path_for(&self, sample_name: &str) -> Result<PathBuf, StoreError> {
        validate_sample_name(sample_name)?;
        Ok(self.dir.join(format!("{}_alignment.json", sample_name)))
    }

    /// Write (or overwrite) the alignment for a slide.
    pub fn save(
        &self,
        sample_name: &str,
        modality: &str,
        transform: &AffineTransform,
    ) -> Result<PathBuf, StoreError> {
        let path = self.path_for(sample_name)?;
        let alignment = SlideAlignment {
            sample_name: sample_name.to_string(),
            modality: modality.to_string(),
            timestamp: Utc::now(),
            transform: *transform,
        };
        let json =
            serde_json::to_string_pretty(&alignment).map_err(|e| StoreError::json(&path, e))?;
        write_atomically(&path, json.as_bytes()).map_err(|e| StoreError::io(&path, e))?;
        info!("Saved slide-specific alignment to: {}", path.display());
        Ok(path)
    }

    /// Load the alignment for a slide, `None` if there is none.
    pub fn load(&self, sample_name: &str) -> Result<Option<SlideAlignment>, StoreError> {
        let path = self.path_for(sample_name)?;
        if !path.exists() {
            debug!("No slide-specific alignment found at: {}", path.display());
            return Ok(None);
        }
        let text = fs::read_to_string(&path).map_err(|e| StoreError::io(&path, e))?;
        let alignment: SlideAlignment =
            serde_json::from_str(&text).map_err(|e| StoreError::json(&path, e))?;
        info!(
            "Loaded slide-specific alignment from: {} (created {})",
            path.display(),
            alignment.timestamp
        );
        Ok(Some(alignment))
    }

    pub fn exists(&self, sample_name: &str) -> bool {
        self.path_for(sample_name)
            .map(|p| p.exists())
            .unwrap_or(false)
    }
}

fn validate_sample_name(name: &str) -> Result<(), StoreError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\']);
    if invalid {
        return Err(StoreError::InvalidSampleName(name.to_string()));
    }
    Ok(())
}
