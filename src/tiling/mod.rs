//! Tile grid planning.
//!
//! ```text
//! TilingRequest ──► GridLayout ──► serpentine cells ──► region filter ──► TileConfiguration.txt
//!  (validated)      (steps, counts)                     (regions only)    + TileConfiguration_QP.txt
//! ```
//!
//! Requests are validated once by [`TilingRequestBuilder::build`]. The
//! planner then lays out an overlapping grid, walks it row by row in
//! alternating direction, and writes one coordinate file per grid.
//! [`transform_tile_configurations`] later maps written files from pixel to
//! stage coordinates.

mod grid;
mod planner;
mod request;
mod tile_config;

pub use grid::{GridCell, GridLayout};
pub use planner::{
    plan, plan_with_cancel, PlannedGrid, Tile, TilingPlan, BOUNDS_DIR, MAX_TILES_PER_REGION,
};
pub use request::{Region, TilingRequest, TilingRequestBuilder, TilingTarget, DEFAULT_OVERLAP_PERCENT};
pub use tile_config::{
    find_image_boundaries, format_entry, parse_tile_configuration, render_tile_configuration,
    transform_tile_configurations, TileEntry, QP_TILE_CONFIG_FILE, TILE_CONFIG_FILE,
};
