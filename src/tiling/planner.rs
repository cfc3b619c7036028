//! Tile grid planning and coordinate file output.
//!
//! # Modes
//!
//! - **Bounding box**: the box is padded by half a frame on every side so
//!   frames centered on the box edges are included. All tiles go to
//!   `<output>/bounds/`.
//! - **Regions**: each polygon is tiled over its own bounds (optionally
//!   padded by half a frame) and tiles are kept only when their center lies
//!   in the polygon or their rectangle touches it. Each region gets its own
//!   numbering and its own `<output>/<region name>/` directory.
//!
//! # Cancellation
//!
//! [`plan_with_cancel`] checks a flag between grid rows. All grids are
//! generated before anything is written, and each file is written to a
//! temporary path and renamed, so a cancelled plan leaves no coordinate
//! files behind.

use std::fs;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use tracing::{debug, info};

use crate::error::TilingError;
use crate::geometry::{BoundingBox, Point, Polygon};
use crate::persist::write_atomically;

use super::grid::GridLayout;
use super::request::{Region, TilingRequest, TilingTarget};
use super::tile_config::{
    render_tile_configuration, TileEntry, QP_TILE_CONFIG_FILE, TILE_CONFIG_FILE,
};

/// Upper bound on tiles for a single region.
///
/// Hitting it almost always means the frame size was given in the wrong
/// units.
pub const MAX_TILES_PER_REGION: u64 = 10_000;

/// Output subdirectory for bounding-box plans.
pub const BOUNDS_DIR: &str = "bounds";

// =============================================================================
// Tile
// =============================================================================

/// One planned acquisition frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    /// Position in acquisition order, starting at 0 for each grid
    pub index: usize,
    /// Grid row
    pub row: usize,
    /// Grid column
    pub column: usize,
    /// Top-left corner of the frame
    pub origin: Point,
    pub width: f64,
    pub height: f64,
    /// Frame center, as written to the coordinate file
    pub centroid: Point,
    /// Owning region name in region mode
    pub region: Option<String>,
}

impl Tile {
    /// Frame image file name.
    pub fn file_name(&self) -> String {
        format!("{}.tif", self.index)
    }

    /// Display label: `"{index}_{region}"` for region tiles, else the index.
    pub fn label(&self) -> String {
        match &self.region {
            Some(region) => format!("{}_{}", self.index, region),
            None => self.index.to_string(),
        }
    }

    pub fn rect(&self) -> BoundingBox {
        BoundingBox::from_origin_size(self.origin.x, self.origin.y, self.width, self.height)
    }
}

/// Tiles generated for one grid (the bounding box or one region).
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedGrid {
    /// Region name, `None` in bounding-box mode
    pub region: Option<String>,
    pub layout: GridLayout,
    pub tiles: Vec<Tile>,
    /// Grid cells discarded by the region filter
    pub skipped: usize,
    /// Written `TileConfiguration.txt`
    pub config_path: PathBuf,
}

/// Result of a planning call.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingPlan {
    pub grids: Vec<PlannedGrid>,
}

impl TilingPlan {
    /// All tiles, grid by grid.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.grids.iter().flat_map(|g| g.tiles.iter())
    }

    pub fn tile_count(&self) -> usize {
        self.grids.iter().map(|g| g.tiles.len()).sum()
    }

    /// Written coordinate files, one per grid.
    pub fn config_paths(&self) -> Vec<&PathBuf> {
        self.grids.iter().map(|g| &g.config_path).collect()
    }
}

// =============================================================================
// Planning
// =============================================================================

/// Plan tiles for `request` and write their coordinate files.
pub fn plan(request: &TilingRequest) -> Result<TilingPlan, TilingError> {
    plan_with_cancel(request, &AtomicBool::new(false))
}

/// Like [`plan`], but abort with [`TilingError::Cancelled`] once `cancel` is
/// set.
pub fn plan_with_cancel(
    request: &TilingRequest,
    cancel: &AtomicBool,
) -> Result<TilingPlan, TilingError> {
    let grids = match request.target() {
        TilingTarget::BoundingBox(bbox) => {
            info!("Creating tiles for bounding box");
            let layout = GridLayout::for_bounding_box(
                bbox,
                request.frame_width(),
                request.frame_height(),
                request.overlap_percent(),
            );
            let dir = request.output_folder().join(BOUNDS_DIR);
            vec![generate(request, layout, None, dir, cancel)?]
        }
        TilingTarget::Regions(regions) => {
            info!("Creating tiles for {} regions", regions.len());
            check_region_tile_counts(request, regions)?;
            let mut grids = Vec::with_capacity(regions.len());
            for region in regions {
                let layout = region_layout(request, region);
                let dir = request.output_folder().join(&region.name);
                grids.push(generate(request, layout, Some(region), dir, cancel)?);
            }
            grids
        }
    };

    for grid in &grids {
        write_grid(grid)?;
    }

    let plan = TilingPlan { grids };
    info!("Tile creation completed: {} tiles", plan.tile_count());
    Ok(plan)
}

fn region_layout(request: &TilingRequest, region: &Region) -> GridLayout {
    let mut bounds = region.polygon.bounds();
    if request.add_buffer() {
        bounds = bounds.padded(request.frame_width() / 2.0, request.frame_height() / 2.0);
    }
    info!(
        "Processing region {} at bounds ({}, {}, {}, {})",
        region.name,
        bounds.min_x(),
        bounds.min_y(),
        bounds.width(),
        bounds.height()
    );
    GridLayout::new(
        Point::new(bounds.min_x(), bounds.min_y()),
        bounds.width(),
        bounds.height(),
        request.frame_width(),
        request.frame_height(),
        request.overlap_percent(),
    )
}

/// Reject regions that would need more than [`MAX_TILES_PER_REGION`] frames.
fn check_region_tile_counts(request: &TilingRequest, regions: &[Region]) -> Result<(), TilingError> {
    let (step_x, step_y) = request.step();
    for region in regions {
        let bounds = region.polygon.bounds();
        let cols = (bounds.width() / step_x).ceil() as u64;
        let rows = (bounds.height() / step_y).ceil() as u64;
        let tiles = cols.saturating_mul(rows);
        if tiles > MAX_TILES_PER_REGION {
            return Err(TilingError::TooManyTiles {
                region: region.name.clone(),
                tiles,
                cols,
                rows,
                max: MAX_TILES_PER_REGION,
            });
        }
        debug!("Region '{}' will create up to {} tiles ({}x{})", region.name, tiles, cols, rows);
    }
    Ok(())
}

fn keep_tile(filter: &Polygon, rect: &BoundingBox) -> bool {
    filter.contains(rect.center()) || filter.intersects_box(rect)
}

fn generate(
    request: &TilingRequest,
    layout: GridLayout,
    region: Option<&Region>,
    dir: PathBuf,
    cancel: &AtomicBool,
) -> Result<PlannedGrid, TilingError> {
    info!(
        "Tile grid: area ({}, {}) step {} x {} ({}% overlap), {} columns x {} rows, inverted x={} y={}",
        layout.start.x,
        layout.start.y,
        layout.step_x,
        layout.step_y,
        request.overlap_percent(),
        layout.columns,
        layout.rows,
        request.invert_x(),
        request.invert_y()
    );

    let mut tiles = Vec::new();
    let mut skipped = 0;

    for pass in 0..layout.rows {
        if cancel.load(Ordering::Relaxed) {
            info!("Tile generation cancelled after {} of {} rows", pass, layout.rows);
            return Err(TilingError::Cancelled {
                rows_done: pass,
                rows_total: layout.rows,
            });
        }

        for cell in layout.pass(pass, request.invert_x(), request.invert_y()) {
            let rect = BoundingBox::from_origin_size(
                cell.origin.x,
                cell.origin.y,
                layout.frame_width,
                layout.frame_height,
            );

            if let Some(region) = region {
                if !keep_tile(&region.polygon, &rect) {
                    skipped += 1;
                    continue;
                }
            }

            tiles.push(Tile {
                index: tiles.len(),
                row: cell.row,
                column: cell.column,
                origin: cell.origin,
                width: layout.frame_width,
                height: layout.frame_height,
                centroid: rect.center(),
                region: region.map(|r| r.name.clone()),
            });
        }
    }

    info!("Generated {} tiles, skipped {} tiles outside region", tiles.len(), skipped);

    Ok(PlannedGrid {
        region: region.map(|r| r.name.clone()),
        layout,
        tiles,
        skipped,
        config_path: dir.join(TILE_CONFIG_FILE),
    })
}

fn write_grid(grid: &PlannedGrid) -> Result<(), TilingError> {
    let text = render_tile_configuration(grid.tiles.iter().map(|t| TileEntry {
        index: t.index,
        position: t.centroid,
    }));

    if let Some(dir) = grid.config_path.parent() {
        fs::create_dir_all(dir).map_err(|e| TilingError::io(dir, e))?;
        write_atomically(&grid.config_path, text.as_bytes())
            .map_err(|e| TilingError::io(&grid.config_path, e))?;
        let qp_path = dir.join(QP_TILE_CONFIG_FILE);
        write_atomically(&qp_path, text.as_bytes()).map_err(|e| TilingError::io(&qp_path, e))?;
        info!("Wrote tile configuration to: {}", grid.config_path.display());
    }
    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
