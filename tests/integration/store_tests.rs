//! Transform persistence integration tests.
//!
//! Tests verify:
//! - Presets survive reopening the store bit for bit
//! - Corrupt store files are treated as empty and can be overwritten
//! - Per-slide alignments are saved, loaded and reported missing

use std::fs;

use tempfile::TempDir;

use wsi_planner::transform::{DetectionParams, TRANSFORMS_FILE};
use wsi_planner::{
    AffineTransform, Point, SlideAlignmentStore, StageBounds, StoreError, TransformStore,
};

use super::test_utils::sample_preset;

// =============================================================================
// Transform Store
// =============================================================================

#[test]
fn test_presets_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let awkward = AffineTransform::new(0.1 + 0.2, 1e-17, -3.3333333333333335, 0.7, 12_345.678_9, -0.0);
    let mut first = sample_preset("scope1-slide", "PPM");
    first.transform = awkward;
    let second = sample_preset("scope2-slide", "CAMM").with_notes("manual alignment");

    {
        let mut store = TransformStore::open(dir.path());
        assert!(store.is_empty());
        store.save(first.clone()).unwrap();
        store.save(second.clone()).unwrap();
    }

    let store = TransformStore::open(dir.path());
    assert_eq!(store.len(), 2);
    assert_eq!(store.get("scope1-slide"), Some(&first));
    assert_eq!(store.get("scope2-slide"), Some(&second));

    let loaded = store.get("scope1-slide").unwrap().transform;
    assert_eq!(loaded.to_array().map(f64::to_bits), awkward.to_array().map(f64::to_bits));
}

#[test]
fn test_presets_by_microscope() {
    let dir = TempDir::new().unwrap();
    let mut store = TransformStore::open(dir.path());
    for (name, scope) in [("b", "PPM"), ("a", "PPM"), ("c", "CAMM")] {
        store.save(sample_preset(name, scope)).unwrap();
    }

    let names: Vec<&str> = store
        .presets_for_microscope("PPM")
        .iter()
        .map(|p| p.name.as_str())
        .collect();
    assert_eq!(names, vec!["a", "b"]);
    assert!(store.presets_for_microscope("unknown").is_empty());
}

#[test]
fn test_delete_persists() {
    let dir = TempDir::new().unwrap();
    let mut store = TransformStore::open(dir.path());
    store.save(sample_preset("keep", "PPM")).unwrap();
    store.save(sample_preset("drop", "PPM")).unwrap();

    assert!(store.delete("drop").unwrap());
    assert!(!store.delete("drop").unwrap());

    let reopened = TransformStore::open(dir.path());
    assert_eq!(reopened.len(), 1);
    assert!(reopened.get("drop").is_none());
}

#[test]
fn test_corrupt_store_starts_empty() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join(TRANSFORMS_FILE), "{ not json").unwrap();

    let mut store = TransformStore::open(dir.path());
    assert!(store.is_empty());

    store.save(sample_preset("fresh", "PPM")).unwrap();
    let reopened = TransformStore::open(dir.path());
    assert_eq!(reopened.len(), 1);
}

#[test]
fn test_missing_detection_params_get_defaults() {
    let dir = TempDir::new().unwrap();
    let json = r#"{
        "legacy": {
            "name": "legacy",
            "microscope": "PPM",
            "mountingMethod": "slide",
            "transform": {"m00": 1.0, "m10": 0.0, "m01": 0.0, "m11": 1.0, "m02": 5.0, "m12": 6.0}
        }
    }"#;
    fs::write(dir.path().join(TRANSFORMS_FILE), json).unwrap();

    let store = TransformStore::open(dir.path());
    let preset = store.get("legacy").unwrap();
    assert_eq!(preset.detection_params, DetectionParams::default());
    assert_eq!(preset.transform.apply(Point::new(1.0, 1.0)), Point::new(6.0, 7.0));
}

#[test]
fn test_preset_validation_against_stage() {
    let preset = sample_preset("scope", "PPM");
    let stage = StageBounds::new(0.0, 40_000.0, 0.0, 30_000.0);

    // 0.5 µm pixels from (10000, 20000): a 20000 px wide image reaches x = 20000
    let report = wsi_planner::validate(&preset.transform, 20_000.0, 10_000.0, &stage);
    assert!(report.is_valid());

    // A 30000 px tall image runs past y = 30000
    let report = wsi_planner::validate(&preset.transform, 20_000.0, 30_000.0, &stage);
    assert!(!report.is_valid());
    assert_eq!(report.checked, 5);
    assert_eq!(report.violations.len(), 2);
}

// =============================================================================
// Slide Alignments
// =============================================================================

#[test]
fn test_slide_alignment_round_trip() {
    let dir = TempDir::new().unwrap();
    let store = SlideAlignmentStore::new(dir.path());
    let affine = AffineTransform::new(0.25, 0.001, -0.001, 0.25, 1500.5, -200.25);

    assert!(!store.exists("sample_01"));
    assert!(store.load("sample_01").unwrap().is_none());

    let path = store.save("sample_01", "ppm_20x", &affine).unwrap();
    assert!(path.ends_with("alignmentFiles/sample_01_alignment.json"));
    assert!(store.exists("sample_01"));

    let loaded = store.load("sample_01").unwrap().unwrap();
    assert_eq!(loaded.sample_name, "sample_01");
    assert_eq!(loaded.modality, "ppm_20x");
    assert_eq!(loaded.transform, affine);
}

#[test]
fn test_slide_alignment_errors() {
    let dir = TempDir::new().unwrap();
    let store = SlideAlignmentStore::new(dir.path());

    let err = store
        .save("../escape", "ppm", &AffineTransform::identity())
        .unwrap_err();
    assert!(matches!(err, StoreError::InvalidSampleName(_)));

    let path = store.path_for("broken").unwrap();
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, "[]").unwrap();
    assert!(matches!(store.load("broken"), Err(StoreError::Json { .. })));
}
