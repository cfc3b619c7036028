//! Tile planning integration tests.
//!
//! Tests verify:
//! - Coordinate files written for bounding-box and region plans
//! - Axis inversion changes the order but not the set of positions
//! - Converting written files to stage space, repeatedly
//! - Cancellation and request errors leave the output folder untouched

use std::fs;
use std::sync::atomic::AtomicBool;

use tempfile::TempDir;

use wsi_planner::tiling::{
    find_image_boundaries, QP_TILE_CONFIG_FILE, TILE_CONFIG_FILE,
};
use wsi_planner::{
    plan, plan_with_cancel, transform_tile_configurations, AffineTransform, BoundingBox,
    ConfigError, Point, Polygon, TilingError, TilingRequest, TilingRequestBuilder,
};

use super::test_utils::{approx_eq, read_entries, subdirectories};

fn bbox_builder(dir: &std::path::Path) -> TilingRequestBuilder {
    TilingRequest::builder()
        .output_folder(dir)
        .frame_size(100.0, 100.0)
        .bounding_box(BoundingBox::new(0.0, 0.0, 1000.0, 1000.0))
}

// =============================================================================
// Bounding Box Plans
// =============================================================================

#[test]
fn test_bounding_box_plan_on_disk() {
    let dir = TempDir::new().unwrap();
    let plan = plan(&bbox_builder(dir.path()).build().unwrap()).unwrap();

    assert_eq!(subdirectories(dir.path()), vec!["bounds"]);
    let path = dir.path().join("bounds").join(TILE_CONFIG_FILE);
    let entries = read_entries(&path);

    assert_eq!(entries.len(), 169);
    assert_eq!(entries.len(), plan.tile_count());
    for (i, entry) in entries.iter().enumerate() {
        assert_eq!(entry.index, i);
    }
    assert_eq!(entries[0].position, Point::new(0.0, 0.0));
    // Row 12 runs left to right and ends in the far corner
    assert_eq!(entries[168].position, Point::new(1080.0, 1080.0));

    let qp = dir.path().join("bounds").join(QP_TILE_CONFIG_FILE);
    assert_eq!(fs::read(&path).unwrap(), fs::read(&qp).unwrap());
}

#[test]
fn test_inverted_axes_start_at_far_corner() {
    let dir = TempDir::new().unwrap();
    let normal = plan(&bbox_builder(dir.path()).build().unwrap()).unwrap();

    let inverted_dir = TempDir::new().unwrap();
    let inverted = plan(
        &bbox_builder(inverted_dir.path())
            .invert_axes(true, true)
            .build()
            .unwrap(),
    )
    .unwrap();

    let first = inverted.tiles().next().unwrap();
    assert_eq!(first.centroid, Point::new(1080.0, 1080.0));

    let key = |p: Point| ((p.x * 1000.0) as i64, (p.y * 1000.0) as i64);
    let mut a: Vec<_> = normal.tiles().map(|t| key(t.centroid)).collect();
    let mut b: Vec<_> = inverted.tiles().map(|t| key(t.centroid)).collect();
    a.sort();
    b.sort();
    assert_eq!(a, b);
}

#[test]
fn test_image_boundaries_of_plan() {
    let dir = TempDir::new().unwrap();
    plan(&bbox_builder(dir.path()).build().unwrap()).unwrap();

    let bounds = find_image_boundaries(&dir.path().join("bounds").join(TILE_CONFIG_FILE))
        .unwrap()
        .unwrap();
    assert_eq!(bounds, BoundingBox::new(0.0, 0.0, 1080.0, 1080.0));
}

// =============================================================================
// Region Plans
// =============================================================================

#[test]
fn test_region_plan_directories() {
    let dir = TempDir::new().unwrap();
    let left = Polygon::rectangle(&BoundingBox::new(0.0, 0.0, 400.0, 300.0));
    let right = Polygon::new(vec![
        Point::new(2000.0, 0.0),
        Point::new(2600.0, 0.0),
        Point::new(2000.0, 600.0),
    ]);
    let request = TilingRequest::builder()
        .output_folder(dir.path())
        .frame_size(100.0, 100.0)
        .add_buffer(true)
        .regions([left, right])
        .build()
        .unwrap();
    let plan = plan(&request).unwrap();

    assert_eq!(subdirectories(dir.path()), vec!["200_150", "2200_200"]);
    for grid in &plan.grids {
        let name = grid.region.as_deref().unwrap();
        let entries = read_entries(&dir.path().join(name).join(TILE_CONFIG_FILE));
        assert_eq!(entries.len(), grid.tiles.len());
        assert_eq!(entries[0].index, 0);
        for tile in &grid.tiles {
            assert_eq!(tile.region.as_deref(), Some(name));
        }
    }

    // The triangle drops the cells beyond its hypotenuse
    let triangle = &plan.grids[1];
    assert!(triangle.skipped > 0);
    assert_eq!(
        triangle.tiles.len() + triangle.skipped,
        triangle.layout.cell_count()
    );
}

// =============================================================================
// Stage Conversion
// =============================================================================

#[test]
fn test_transform_written_plan_to_stage() {
    let dir = TempDir::new().unwrap();
    plan(&bbox_builder(dir.path()).build().unwrap()).unwrap();

    let affine = AffineTransform::new(0.5, 0.0, 0.0, -0.5, 10_000.0, 20_000.0);
    let modified = transform_tile_configurations(dir.path(), &affine).unwrap();
    assert_eq!(modified, vec!["bounds"]);

    let sub = dir.path().join("bounds");
    let stage = read_entries(&sub.join(TILE_CONFIG_FILE));
    let pixels = read_entries(&sub.join(QP_TILE_CONFIG_FILE));
    assert_eq!(stage.len(), pixels.len());
    for (s, p) in stage.iter().zip(&pixels) {
        let expected = affine.apply(p.position);
        assert!(approx_eq(s.position.x, expected.x));
        assert!(approx_eq(s.position.y, expected.y));
    }
    assert_eq!(stage[0].position, Point::new(10_000.0, 20_000.0));

    // A second conversion starts again from the pixel copy
    let before = fs::read(sub.join(TILE_CONFIG_FILE)).unwrap();
    transform_tile_configurations(dir.path(), &affine).unwrap();
    assert_eq!(fs::read(sub.join(TILE_CONFIG_FILE)).unwrap(), before);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_cancelled_plan_leaves_no_output() {
    let dir = TempDir::new().unwrap();
    let request = bbox_builder(dir.path()).build().unwrap();
    let cancel = AtomicBool::new(true);

    let err = plan_with_cancel(&request, &cancel).unwrap_err();
    assert!(matches!(err, TilingError::Cancelled { rows_done: 0, .. }));
    assert!(subdirectories(dir.path()).is_empty());
}

#[test]
fn test_invalid_requests() {
    let dir = TempDir::new().unwrap();

    let err = bbox_builder(dir.path())
        .overlap_percent(100.0)
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::InvalidOverlap(100.0));

    let err = bbox_builder(dir.path())
        .region(Polygon::rectangle(&BoundingBox::new(0.0, 0.0, 10.0, 10.0)))
        .build()
        .unwrap_err();
    assert_eq!(err, ConfigError::BothTargets);

    // Request errors convert into planning errors
    let planning: TilingError = err.into();
    assert!(planning.to_string().contains("both"));
}
