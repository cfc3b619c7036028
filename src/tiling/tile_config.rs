//! Tile coordinate files (`TileConfiguration.txt`).
//!
//! The format is line oriented:
//!
//! ```text
//! dim = 2
//! 0.tif; ; (123.456, 789.012)
//! 1.tif; ; (213.456, 789.012)
//! ```
//!
//! Each entry names the frame file by tile index and gives the frame center
//! with three decimals. The planner writes pixel-space coordinates to both
//! `TileConfiguration.txt` and `TileConfiguration_QP.txt`; converting a
//! directory to stage space rewrites `TileConfiguration.txt` through an
//! affine transform and leaves the `_QP` copy untouched.

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::TilingError;
use crate::geometry::{AffineTransform, BoundingBox, Point};
use crate::persist::write_atomically;

/// Coordinate file consumed by the acquisition and stitching steps.
pub const TILE_CONFIG_FILE: &str = "TileConfiguration.txt";

/// Pixel-space copy kept next to [`TILE_CONFIG_FILE`].
pub const QP_TILE_CONFIG_FILE: &str = "TileConfiguration_QP.txt";

const HEADER: &str = "dim = 2";

/// One parsed coordinate line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileEntry {
    pub index: usize,
    pub position: Point,
}

impl TileEntry {
    pub fn file_name(&self) -> String {
        format!("{}.tif", self.index)
    }
}

/// Format a single coordinate line.
pub fn format_entry(index: usize, position: Point) -> String {
    format!("{}.tif; ; ({:.3}, {:.3})", index, position.x, position.y)
}

/// Render a complete coordinate file, header included.
pub fn render_tile_configuration<I>(entries: I) -> String
where
    I: IntoIterator<Item = TileEntry>,
{
    let mut out = String::from(HEADER);
    out.push('\n');
    for entry in entries {
        out.push_str(&format_entry(entry.index, entry.position));
        out.push('\n');
    }
    out
}

/// Try to read `"{n}.tif; ; (x, y)"`. Returns `None` for anything else.
fn parse_entry(line: &str) -> Option<TileEntry> {
    let (name, rest) = line.trim().split_once("; ; ")?;
    let index = name.strip_suffix(".tif")?.parse().ok()?;
    let coords = rest.trim().strip_prefix('(')?.strip_suffix(')')?;
    let (x, y) = coords.split_once(',')?;
    Some(TileEntry {
        index,
        position: Point::new(x.trim().parse().ok()?, y.trim().parse().ok()?),
    })
}

fn is_passthrough(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("dim")
}

/// Parse all entries of a coordinate file.
///
/// The `dim` header and blank lines are skipped; any other line that is not
/// a valid entry is an error.
pub fn parse_tile_configuration(text: &str) -> Result<Vec<TileEntry>, TilingError> {
    let mut entries = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if is_passthrough(line) {
            continue;
        }
        let entry = parse_entry(line).ok_or_else(|| TilingError::MalformedLine {
            line: i + 1,
            content: line.to_string(),
        })?;
        entries.push(entry);
    }
    Ok(entries)
}

fn read_entries(path: &Path) -> Result<Vec<TileEntry>, TilingError> {
    let text = fs::read_to_string(path).map_err(|e| TilingError::io(path, e))?;
    parse_tile_configuration(&text)
}

/// Minimum and maximum frame centers in a coordinate file, `None` if the
/// file has no entries.
pub fn find_image_boundaries(path: &Path) -> Result<Option<BoundingBox>, TilingError> {
    let entries = read_entries(path)?;
    let bounds = entries
        .iter()
        .map(|e| BoundingBox::new(e.position.x, e.position.y, e.position.x, e.position.y))
        .reduce(|acc, b| acc.union(&b));
    Ok(bounds)
}

/// Convert every tile directory under `parent_dir` to stage coordinates.
///
/// For each subdirectory holding a [`TILE_CONFIG_FILE`], the pixel-space
/// entries are read from [`QP_TILE_CONFIG_FILE`] when present (creating it
/// from the main file otherwise), mapped through `transform`, and written
/// back to [`TILE_CONFIG_FILE`]. Reading from the pixel-space copy makes
/// repeated conversions give the same result.
///
/// Returns the names of the modified subdirectories, sorted.
pub fn transform_tile_configurations(
    parent_dir: &Path,
    transform: &AffineTransform,
) -> Result<Vec<String>, TilingError> {
    info!("Looking for tile configuration files in: {}", parent_dir.display());

    let mut subdirs = Vec::new();
    for entry in fs::read_dir(parent_dir).map_err(|e| TilingError::io(parent_dir, e))? {
        let entry = entry.map_err(|e| TilingError::io(parent_dir, e))?;
        let path = entry.path();
        if path.is_dir() && path.join(TILE_CONFIG_FILE).is_file() {
            subdirs.push(path);
        }
    }
    subdirs.sort();

    let mut modified = Vec::with_capacity(subdirs.len());
    for dir in subdirs {
        let count = transform_directory(&dir, transform)?;
        info!("Transformed {} tile coordinates in: {}", count, dir.display());
        if let Some(name) = dir.file_name() {
            modified.push(name.to_string_lossy().into_owned());
        }
    }

    info!("Modified directories: {:?}", modified);
    Ok(modified)
}

fn transform_directory(dir: &Path, transform: &AffineTransform) -> Result<usize, TilingError> {
    let main = dir.join(TILE_CONFIG_FILE);
    let pixel_copy = dir.join(QP_TILE_CONFIG_FILE);

    if !pixel_copy.is_file() {
        fs::copy(&main, &pixel_copy).map_err(|e| TilingError::io(&pixel_copy, e))?;
        debug!("Backed up pixel coordinates to: {}", pixel_copy.display());
    }

    let entries = read_entries(&pixel_copy)?;
    let transformed = entries.iter().map(|e| TileEntry {
        index: e.index,
        position: transform.apply(e.position),
    });
    let text = render_tile_configuration(transformed);
    write_atomically(&main, text.as_bytes()).map_err(|e| TilingError::io(&main, e))?;
    Ok(entries.len())
}

// =============================================================================
// Tests
// =============================================================================
