//! Durable store of named transform presets.
//!
//! The store is a single pretty-printed JSON object mapping preset name to
//! preset, kept in `saved_transforms.json` inside a configuration directory.
//!
//! # Consistency
//!
//! - The file is loaded once when the store is opened. A missing, unreadable
//!   or corrupt file yields an empty store and a logged warning, never an
//!   error.
//! - Every mutation rewrites the whole file: the JSON is written to a
//!   temporary sibling and renamed over the original, so readers never see a
//!   half-written store.
//! - There is no locking. One writer per directory is assumed.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persist::write_atomically;

use super::preset::TransformPreset;

/// File name of the preset store inside the configuration directory.
pub const TRANSFORMS_FILE: &str = "saved_transforms.json";

/// Handle to a preset store in one configuration directory.
#[derive(Debug)]
pub struct TransformStore {
    path: PathBuf,
    presets: BTreeMap<String, TransformPreset>,
}

impl TransformStore {
    /// Open the store in `config_dir`, loading any existing presets.
    pub fn open(config_dir: impl AsRef<Path>) -> Self {
        let path = config_dir.as_ref().join(TRANSFORMS_FILE);
        let presets = load_presets(&path);
        info!("Loaded {} transform presets from {}", presets.len(), path.display());
        Self { path, presets }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    /// Insert or replace a preset by name and persist.
    ///
    /// On error the store is left as it was before the call.
    pub fn save(&mut self, preset: TransformPreset) -> Result<(), StoreError> {
        let name = preset.name.clone();
        let mut presets = self.presets.clone();
        presets.insert(name.clone(), preset);
        self.persist(&presets)?;
        self.presets = presets;
        info!("Saved transform preset: {}", name);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&TransformPreset> {
        self.presets.get(name)
    }

    /// Remove a preset. Returns `false` if it did not exist, in which case
    /// nothing is written.
    pub fn delete(&mut self, name: &str) -> Result<bool, StoreError> {
        if !self.presets.contains_key(name) {
            return Ok(false);
        }
        let mut presets = self.presets.clone();
        presets.remove(name);
        self.persist(&presets)?;
        self.presets = presets;
        info!("Deleted transform preset: {}", name);
        Ok(true)
    }

    /// All presets, ordered by name.
    pub fn all_presets(&self) -> Vec<&TransformPreset> {
        self.presets.values().collect()
    }

    /// Presets for one microscope, ordered by name.
    pub fn presets_for_microscope(&self, microscope: &str) -> Vec<&TransformPreset> {
        self.presets
            .values()
            .filter(|p| p.microscope == microscope)
            .collect()
    }

    fn persist(&self, presets: &BTreeMap<String, TransformPreset>) -> Result<(), StoreError> {
        let json =
            serde_json::to_string_pretty(presets).map_err(|e| StoreError::json(&self.path, e))?;
        write_atomically(&self.path, json.as_bytes())
            .map_err(|e| StoreError::io(&self.path, e))?;
        debug!("Persisted {} transforms to {}", presets.len(), self.path.display());
        Ok(())
    }
}

fn load_presets(path: &Path) -> BTreeMap<String, TransformPreset> {
    if !path.exists() {
        info!("No saved transforms file found at {}", path.display());
        return BTreeMap::new();
    }

    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) => {
            warn!("Failed to read transforms from {}: {}", path.display(), e);
            return BTreeMap::new();
        }
    };

    match serde_json::from_str(&text) {
        Ok(presets) => presets,
        Err(e) => {
            warn!(
                "Ignoring corrupt transform store {}: {}",
                path.display(),
                e
            );
            BTreeMap::new()
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
