//! Tissue detection integration tests.
//!
//! Tests verify:
//! - Detection on PNG files decoded through the `image` crate
//! - Global threshold methods agree on clearly separated images
//! - Region size filtering
//! - Overview cropping and flipping keep coordinates consistent
//! - Analysis images are exported

use image::GenericImageView;
use tempfile::TempDir;

use wsi_planner::detect::{
    crop_to_slide_area, flip_overview, luminance, save_analysis_images, CropBounds,
    BOUNDS_FILE_NAME, ORIGINAL_FILE_NAME, THRESHOLDED_FILE_NAME,
};
use wsi_planner::{
    BoundingBox, Point, ThresholdMethod, TissueDetectionConfig, TissueDetector,
};

use super::test_utils::{overview_with_blobs, write_png, Blob, BACKGROUND, TISSUE};

const BLOBS: [Blob; 2] = [(20, 30, 40, 50), (100, 60, 30, 40)];

fn detector(method: ThresholdMethod) -> TissueDetector {
    TissueDetector::new(TissueDetectionConfig {
        method,
        ..Default::default()
    })
}

// =============================================================================
// Threshold Methods
// =============================================================================

#[test]
fn test_detect_from_png_file() {
    let dir = TempDir::new().unwrap();
    let path = write_png(dir.path(), "macro.png", &overview_with_blobs(200, 150, &BLOBS));

    let overview = image::open(&path).unwrap();
    let analysis = detector(ThresholdMethod::Fixed(128))
        .analyze(Some(&overview), 2000, 1500)
        .unwrap();

    assert_eq!(analysis.regions.len(), 2);
    assert_eq!(analysis.bounds, BoundingBox::new(20.0, 30.0, 130.0, 100.0));
    assert_eq!(
        analysis.main_image_bounds(),
        Some(BoundingBox::new(200.0, 300.0, 1300.0, 1000.0))
    );
}

#[test]
fn test_global_methods_agree_on_separated_image() {
    let overview = overview_with_blobs(200, 150, &BLOBS);
    let expected = BoundingBox::new(20.0, 30.0, 130.0, 100.0);

    for method in [
        ThresholdMethod::Fixed(128),
        ThresholdMethod::Mean,
        ThresholdMethod::Percentile(0.5),
    ] {
        let analysis = detector(method).analyze(Some(&overview), 200, 150).unwrap();
        assert_eq!(analysis.bounds, expected, "method {}", method.name());
        assert_eq!(analysis.method, method);
    }
}

#[test]
fn test_mean_threshold_value() {
    let overview = overview_with_blobs(200, 150, &BLOBS);
    let analysis = detector(ThresholdMethod::Mean)
        .analyze(Some(&overview), 200, 150)
        .unwrap();
    let dark = luminance(TISSUE.0) as u64;
    let light = luminance(BACKGROUND.0) as u64;
    let expected = (3200 * dark + 26800 * light) / 30000;
    assert_eq!(analysis.threshold, Some(expected as u8));
}

#[test]
fn test_min_region_size_filters_smaller_blob() {
    let overview = overview_with_blobs(200, 150, &BLOBS);
    let detector = TissueDetector::new(TissueDetectionConfig {
        method: ThresholdMethod::Fixed(128),
        min_region_size: 1500,
        ..Default::default()
    });
    let analysis = detector.analyze(Some(&overview), 200, 150).unwrap();

    assert_eq!(analysis.regions, vec![BoundingBox::new(20.0, 30.0, 60.0, 80.0)]);
    assert_eq!(analysis.bounds, BoundingBox::new(20.0, 30.0, 60.0, 80.0));
    // The mask still holds the dropped blob
    assert_eq!(analysis.mask.count(), 3200);
}

#[test]
fn test_method_from_name_round_trip() {
    for name in ["otsu", "mean", "percentile", "fixed", "eosin", "dual", "deconvolution"] {
        assert_eq!(ThresholdMethod::from_name(name).name(), name);
    }
    assert_eq!(ThresholdMethod::from_name("ij_auto"), ThresholdMethod::Otsu);
}

// =============================================================================
// Overview Preparation
// =============================================================================

#[test]
fn test_crop_then_detect_maps_back_to_original() {
    let overview = image::DynamicImage::ImageRgb8(overview_with_blobs(
        1000,
        400,
        &[(300, 100, 100, 80)],
    ));
    let cropped = crop_to_slide_area(&overview, CropBounds::default()).unwrap();
    assert_eq!(cropped.image.dimensions(), (985, 312));

    let analysis = detector(ThresholdMethod::Fixed(128))
        .analyze(Some(&cropped.image), 985, 312)
        .unwrap();
    assert_eq!(analysis.bounds, BoundingBox::new(300.0, 81.0, 400.0, 161.0));

    let origin = cropped.to_original(Point::new(analysis.bounds.min_x(), analysis.bounds.min_y()));
    assert_eq!(origin, Point::new(300.0, 100.0));

    let original_box = BoundingBox::new(300.0, 100.0, 400.0, 180.0);
    assert_eq!(cropped.adjust_box(&original_box), analysis.bounds);
}

#[test]
fn test_crop_outside_image_is_rejected() {
    let overview = image::DynamicImage::ImageRgb8(overview_with_blobs(100, 10, &[]));
    let bounds = CropBounds {
        x_min: 0,
        x_max: 100,
        y_min: 19,
        y_max: 331,
    };
    assert!(crop_to_slide_area(&overview, bounds).is_err());
}

#[test]
fn test_flip_mirrors_detected_bounds() {
    let overview = image::DynamicImage::ImageRgb8(overview_with_blobs(200, 150, &[(20, 30, 40, 50)]));
    let flipped = flip_overview(overview, true, false);
    let analysis = detector(ThresholdMethod::Fixed(128))
        .analyze(Some(&flipped), 200, 150)
        .unwrap();
    assert_eq!(analysis.bounds, BoundingBox::new(140.0, 30.0, 180.0, 80.0));
}

// =============================================================================
// Analysis Export
// =============================================================================

#[test]
fn test_save_analysis_images() {
    let dir = TempDir::new().unwrap();
    let overview = overview_with_blobs(200, 150, &BLOBS);
    let analysis = detector(ThresholdMethod::Fixed(128))
        .analyze(Some(&overview), 200, 150)
        .unwrap();

    let out = dir.path().join("debug");
    save_analysis_images(&analysis, &overview, &out).unwrap();

    for name in [ORIGINAL_FILE_NAME, THRESHOLDED_FILE_NAME, BOUNDS_FILE_NAME] {
        let saved = image::open(out.join(name)).unwrap();
        assert_eq!(saved.dimensions(), (200, 150), "{}", name);
    }

    // Tissue is black in the mask image
    let mask = image::open(out.join(THRESHOLDED_FILE_NAME)).unwrap().to_luma8();
    assert_eq!(mask.get_pixel(25, 35).0, [0]);
    assert_eq!(mask.get_pixel(5, 5).0, [255]);
}
