//! End-to-end acquisition planning.
//!
//! Overview detection, scaling to the main image, tile planning in pixel
//! space, conversion to stage space with a stored transform, and focus
//! prediction over the resulting positions.

use tempfile::TempDir;

use wsi_planner::tiling::{QP_TILE_CONFIG_FILE, TILE_CONFIG_FILE};
use wsi_planner::{
    plan, transform_tile_configurations, BoundingBox, FocusPlaneModel, Point,
    SlideAlignmentStore, ThresholdMethod, TilingRequest, TissueDetectionConfig, TissueDetector,
    TransformStore,
};

use super::test_utils::{approx_eq, overview_with_blobs, read_entries, sample_preset};

fn true_focus(p: Point) -> f64 {
    0.001 * p.x - 0.002 * p.y + 100.0
}

#[test]
fn test_overview_to_focus_pipeline() {
    let project = TempDir::new().unwrap();
    let config_dir = project.path().join("config");
    let tiles_dir = project.path().join("tiles");

    // Detect tissue and scale it to main-image pixels
    let overview = overview_with_blobs(200, 150, &[(20, 30, 40, 50)]);
    let detector = TissueDetector::new(TissueDetectionConfig {
        method: ThresholdMethod::Mean,
        ..Default::default()
    });
    let analysis = detector.analyze(Some(&overview), 4000, 3000).unwrap();
    let main_bounds = analysis.main_image_bounds().unwrap();
    assert_eq!(main_bounds, BoundingBox::new(400.0, 600.0, 1200.0, 1600.0));

    // Store a transform and pick it up again as a later session would
    let mut store = TransformStore::open(&config_dir);
    store.save(sample_preset("ppm-slide", "PPM")).unwrap();
    let store = TransformStore::open(&config_dir);
    let transform = store.get("ppm-slide").unwrap().transform;

    // Plan 100 µm frames (200 px at 0.5 µm/px) over the tissue
    let request = TilingRequest::builder()
        .output_folder(&tiles_dir)
        .frame_size(200.0, 200.0)
        .overlap_percent(10.0)
        .bounding_box(main_bounds)
        .build()
        .unwrap();
    let tiling = plan(&request).unwrap();
    let grid = &tiling.grids[0];
    assert_eq!((grid.layout.columns, grid.layout.rows), (6, 7));
    assert_eq!(tiling.tile_count(), 42);

    // Convert the coordinate file to stage space
    let modified = transform_tile_configurations(&tiles_dir, &transform).unwrap();
    assert_eq!(modified, vec!["bounds"]);
    let stage = read_entries(&tiles_dir.join("bounds").join(TILE_CONFIG_FILE));
    let pixels = read_entries(&tiles_dir.join("bounds").join(QP_TILE_CONFIG_FILE));
    assert_eq!(pixels[0].position, Point::new(400.0, 600.0));
    assert_eq!(stage[0].position, Point::new(10_200.0, 20_300.0));

    // Acquire a few tiles, then predict focus for the rest
    let mut focus = FocusPlaneModel::new();
    for index in [0, 5, 6, 41] {
        let p = stage[index].position;
        focus.add_sample(p.x, p.y, true_focus(p));
    }
    assert!(focus.is_fitted());

    for entry in &stage {
        let p = entry.position;
        let distance = focus.distance_from_last_point(p.x, p.y);
        assert!(focus.can_predict(distance));
        let z = focus.predict(p.x, p.y).unwrap();
        assert!((z - true_focus(p)).abs() < 1e-3, "tile {}", entry.index);
    }
    assert!(focus.residual_error().unwrap() < 1e-3);
}

#[test]
fn test_slide_alignment_overrides_preset() {
    let project = TempDir::new().unwrap();
    let preset = sample_preset("ppm-slide", "PPM");

    let alignments = SlideAlignmentStore::new(project.path());
    let mut refined = preset.transform;
    refined.m02 += 12.5;
    refined.m12 -= 7.25;
    alignments.save("slide_42", "ppm", &refined).unwrap();

    let chosen = alignments
        .load("slide_42")
        .unwrap()
        .map(|a| a.transform)
        .unwrap_or(preset.transform);
    let p = chosen.apply(Point::new(100.0, 100.0));
    assert!(approx_eq(p.x, 10_062.5));
    assert!(approx_eq(p.y, 20_042.75));

    let fallback = alignments
        .load("other_slide")
        .unwrap()
        .map(|a| a.transform)
        .unwrap_or(preset.transform);
    assert_eq!(fallback, preset.transform);
}
