//! Test utilities for integration tests.
//!
//! Helpers for building synthetic overview images and reading planner output.

use image::{Rgb, RgbImage};
use std::fs;
use std::path::{Path, PathBuf};

use wsi_planner::tiling::{parse_tile_configuration, TileEntry};
use wsi_planner::{AffineTransform, TransformPreset};

/// Light grey slide background.
pub const BACKGROUND: Rgb<u8> = Rgb([235, 235, 235]);

/// Dark tissue, luminance 50.
pub const TISSUE: Rgb<u8> = Rgb([60, 40, 80]);

/// Rectangle `(x, y, width, height)` in overview pixels.
pub type Blob = (u32, u32, u32, u32);

// =============================================================================
// Overview Images
// =============================================================================

/// Light overview with dark rectangular blobs.
pub fn overview_with_blobs(width: u32, height: u32, blobs: &[Blob]) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        let inside = blobs
            .iter()
            .any(|&(bx, by, bw, bh)| x >= bx && x < bx + bw && y >= by && y < by + bh);
        if inside {
            TISSUE
        } else {
            BACKGROUND
        }
    })
}

/// Save an overview as PNG and return its path.
pub fn write_png(dir: &Path, name: &str, image: &RgbImage) -> PathBuf {
    let path = dir.join(name);
    image.save(&path).unwrap();
    path
}

// =============================================================================
// Planner Output
// =============================================================================

/// Parse a written coordinate file.
pub fn read_entries(path: &Path) -> Vec<TileEntry> {
    let text = fs::read_to_string(path).unwrap();
    parse_tile_configuration(&text).unwrap()
}

/// Names of the subdirectories of `dir`, sorted.
pub fn subdirectories(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_dir())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// Presets
// =============================================================================

/// Preset with a 0.5 µm pixel size anchored at stage (10000, 20000).
pub fn sample_preset(name: &str, microscope: &str) -> TransformPreset {
    TransformPreset::new(
        name,
        microscope,
        "slide",
        AffineTransform::new(0.5, 0.0, 0.0, 0.5, 10_000.0, 20_000.0),
    )
}

pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-6
}
