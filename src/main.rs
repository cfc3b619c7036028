//! WSI Planner - acquisition geometry for slide scanning.
//!
//! This binary wires the library operations to the command line. Results are
//! printed to stdout as JSON; logs go to stderr.

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use wsi_planner::{
    config::{
        AddPresetConfig, Cli, Command, DetectConfig, PlanConfig, PresetAction, PresetsConfig,
        TransformTilesConfig,
    },
    detect::{crop_to_slide_area, flip_overview, save_analysis_images, TissueDetector},
    tiling::{plan, transform_tile_configurations},
    transform::{validate, TransformPreset, TransformStore},
};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.into_command() {
        Command::Detect(config) => run_detect(config),
        Command::Plan(config) => run_plan(config),
        Command::Presets(config) => run_presets(config),
        Command::TransformTiles(config) => run_transform_tiles(config),
    }
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose {
        "wsi_planner=debug"
    } else {
        "wsi_planner=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Print a value as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to encode output: {}", e);
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// Detect Command
// =============================================================================

fn run_detect(config: DetectConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let image = match image::open(&config.overview) {
        Ok(image) => image,
        Err(e) => {
            error!("Failed to open {}: {}", config.overview.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let image = flip_overview(image, config.flip_x, config.flip_y);

    let (overview, offset) = match config.crop {
        Some(bounds) => match crop_to_slide_area(&image, bounds) {
            Ok(cropped) => {
                let offset = (cropped.offset_x, cropped.offset_y);
                (cropped.image, offset)
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        },
        None => (image, (0, 0)),
    };

    let detector = TissueDetector::new(config.detection_config());
    let Some(analysis) = detector.analyze(Some(&overview), config.main_width, config.main_height)
    else {
        error!("Tissue detection could not run on {}", config.overview.display());
        return ExitCode::FAILURE;
    };

    if !analysis.has_tissue() {
        warn!("No tissue regions found");
    }

    if let Some(dir) = &config.debug_dir {
        match save_analysis_images(&analysis, &overview, dir) {
            Ok(()) => info!("Saved analysis images to {}", dir.display()),
            Err(e) => warn!("Failed to save analysis images: {}", e),
        }
    }

    let summary = serde_json::json!({
        "method": analysis.method.name(),
        "threshold": analysis.threshold,
        "overview": {
            "width": analysis.overview_width,
            "height": analysis.overview_height,
            "offset": [offset.0, offset.1],
        },
        "regions": analysis.regions,
        "bounds": analysis.has_tissue().then_some(analysis.bounds),
        "scale": [analysis.scale_x, analysis.scale_y],
        "main_image_bounds": analysis.main_image_bounds(),
    });
    print_json(&summary)
}

// =============================================================================
// Plan Command
// =============================================================================

fn run_plan(config: PlanConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let request = match config.to_request() {
        Ok(request) => request,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let plan = match plan(&request) {
        Ok(plan) => plan,
        Err(e) => {
            error!("Tile planning failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let grids: Vec<_> = plan
        .grids
        .iter()
        .map(|grid| {
            serde_json::json!({
                "region": grid.region,
                "columns": grid.layout.columns,
                "rows": grid.layout.rows,
                "tiles": grid.tiles.len(),
                "skipped": grid.skipped,
                "path": grid.config_path,
            })
        })
        .collect();
    print_json(&serde_json::json!({
        "tiles": plan.tile_count(),
        "grids": grids,
    }))
}

// =============================================================================
// Presets Command
// =============================================================================

fn run_presets(config: PresetsConfig) -> ExitCode {
    let mut store = TransformStore::open(&config.config_dir);

    match config.action {
        PresetAction::List { microscope } => {
            let presets = match microscope {
                Some(ref m) => store.presets_for_microscope(m),
                None => store.all_presets(),
            };
            print_json(&presets)
        }
        PresetAction::Show { name } => match store.get(&name) {
            Some(preset) => print_json(preset),
            None => {
                error!("No preset named '{}'", name);
                ExitCode::FAILURE
            }
        },
        PresetAction::Delete { name } => match store.delete(&name) {
            Ok(true) => {
                info!("Deleted preset '{}'", name);
                ExitCode::SUCCESS
            }
            Ok(false) => {
                error!("No preset named '{}'", name);
                ExitCode::FAILURE
            }
            Err(e) => {
                error!("Failed to delete preset: {}", e);
                ExitCode::FAILURE
            }
        },
        PresetAction::Add(add) => run_add_preset(&mut store, add),
    }
}

fn run_add_preset(store: &mut TransformStore, config: AddPresetConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }
    let transform = match config.build_transform() {
        Ok(t) => t,
        Err(e) => {
            error!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some((limits, width, height)) = config.stage_check() {
        let report = validate(&transform, width as f64, height as f64, &limits);
        if !report.is_valid() {
            warn!(
                "{} of {} test points fall outside the stage limits",
                report.violations.len(),
                report.checked
            );
        }
    }

    let preset = TransformPreset::new(
        config.name,
        config.microscope,
        config.mounting_method,
        transform,
    )
    .with_notes(config.notes);

    if let Err(e) = store.save(preset.clone()) {
        error!("Failed to save preset: {}", e);
        return ExitCode::FAILURE;
    }
    print_json(&preset)
}

// =============================================================================
// Transform Tiles Command
// =============================================================================

fn run_transform_tiles(config: TransformTilesConfig) -> ExitCode {
    if let Err(e) = config.validate() {
        error!("Configuration error: {}", e);
        return ExitCode::FAILURE;
    }

    let store = TransformStore::open(&config.config_dir);
    let Some(preset) = store.get(&config.preset) else {
        error!("No preset named '{}'", config.preset);
        return ExitCode::FAILURE;
    };
    info!("Using transform {}", preset);

    match transform_tile_configurations(&config.tiles_dir, &preset.transform) {
        Ok(modified) => print_json(&modified),
        Err(e) => {
            error!("Failed to transform tile configurations: {}", e);
            ExitCode::FAILURE
        }
    }
}
