use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::geometry::{BoundingBox, Polygon};

/// Default overlap between neighboring frames, in percent.
pub const DEFAULT_OVERLAP_PERCENT: f64 = 10.0;

/// Polygon region with its centroid-derived name.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub polygon: Polygon,
}

impl Region {
    /// Name a polygon `"{x}_{y}"` from its centroid, truncated toward zero.
    pub fn from_polygon(polygon: Polygon) -> Self {
        let c = polygon.centroid();
        Self {
            name: format!("{}_{}", c.x as i64, c.y as i64),
            polygon,
        }
    }
}

/// What a tiling request covers.
#[derive(Debug, Clone, PartialEq)]
pub enum TilingTarget {
    /// Rectangle, padded by half a frame on every side.
    BoundingBox(BoundingBox),
    /// Polygons, each tiled into its own grid and file.
    Regions(Vec<Region>),
}

/// Validated parameters for one grid-generation call.
///
/// Construct with [`TilingRequest::builder`]; every field is checked at
/// build time so planning never sees an inconsistent request.
#[derive(Debug, Clone, PartialEq)]
pub struct TilingRequest {
    output_folder: PathBuf,
    frame_width: f64,
    frame_height: f64,
    overlap_percent: f64,
    invert_x: bool,
    invert_y: bool,
    add_buffer: bool,
    target: TilingTarget,
}

impl TilingRequest {
    pub fn builder() -> TilingRequestBuilder {
        TilingRequestBuilder::default()
    }

    pub fn output_folder(&self) -> &Path {
        &self.output_folder
    }

    pub fn frame_width(&self) -> f64 {
        self.frame_width
    }

    pub fn frame_height(&self) -> f64 {
        self.frame_height
    }

    pub fn overlap_percent(&self) -> f64 {
        self.overlap_percent
    }

    pub fn invert_x(&self) -> bool {
        self.invert_x
    }

    pub fn invert_y(&self) -> bool {
        self.invert_y
    }

    /// Whether region bounds are padded by half a frame.
    pub fn add_buffer(&self) -> bool {
        self.add_buffer
    }

    pub fn target(&self) -> &TilingTarget {
        &self.target
    }

    /// Step between neighboring frame origins along each axis.
    pub fn step(&self) -> (f64, f64) {
        let keep = 1.0 - self.overlap_percent / 100.0;
        (self.frame_width * keep, self.frame_height * keep)
    }
}

/// Builder for [`TilingRequest`].
#[derive(Debug, Clone)]
pub struct TilingRequestBuilder {
    output_folder: Option<PathBuf>,
    frame_width: f64,
    frame_height: f64,
    overlap_percent: f64,
    invert_x: bool,
    invert_y: bool,
    add_buffer: bool,
    bounding_box: Option<BoundingBox>,
    regions: Vec<Polygon>,
}

impl Default for TilingRequestBuilder {
    fn default() -> Self {
        Self {
            output_folder: None,
            frame_width: 0.0,
            frame_height: 0.0,
            overlap_percent: DEFAULT_OVERLAP_PERCENT,
            invert_x: false,
            invert_y: false,
            add_buffer: false,
            bounding_box: None,
            regions: Vec::new(),
        }
    }
}

impl TilingRequestBuilder {
    pub fn output_folder(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_folder = Some(dir.into());
        self
    }

    /// Frame size, in the same units as the target geometry.
    pub fn frame_size(mut self, width: f64, height: f64) -> Self {
        self.frame_width = width;
        self.frame_height = height;
        self
    }

    pub fn overlap_percent(mut self, percent: f64) -> Self {
        self.overlap_percent = percent;
        self
    }

    pub fn invert_axes(mut self, invert_x: bool, invert_y: bool) -> Self {
        self.invert_x = invert_x;
        self.invert_y = invert_y;
        self
    }

    pub fn add_buffer(mut self, add_buffer: bool) -> Self {
        self.add_buffer = add_buffer;
        self
    }

    pub fn bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    pub fn region(mut self, polygon: Polygon) -> Self {
        self.regions.push(polygon);
        self
    }

    pub fn regions(mut self, polygons: impl IntoIterator<Item = Polygon>) -> Self {
        self.regions.extend(polygons);
        self
    }

    /// Validate and build the request.
    pub fn build(self) -> Result<TilingRequest, ConfigError> {
        let output_folder = self
            .output_folder
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or(ConfigError::MissingOutputFolder)?;

        let valid_frame = |v: f64| v.is_finite() && v > 0.0;
        if !valid_frame(self.frame_width) || !valid_frame(self.frame_height) {
            return Err(ConfigError::InvalidFrameSize {
                width: self.frame_width,
                height: self.frame_height,
            });
        }

        if !(self.overlap_percent >= 0.0 && self.overlap_percent < 100.0) {
            return Err(ConfigError::InvalidOverlap(self.overlap_percent));
        }

        let target = match (self.bounding_box, self.regions.is_empty()) {
            (Some(_), false) => return Err(ConfigError::BothTargets),
            (None, true) => return Err(ConfigError::NoTarget),
            (Some(bbox), true) => {
                let coords = [bbox.x1(), bbox.y1(), bbox.x2(), bbox.y2()];
                if !coords.iter().all(|c| c.is_finite()) {
                    return Err(ConfigError::NonFiniteBoundingBox);
                }
                TilingTarget::BoundingBox(bbox)
            }
            (None, false) => TilingTarget::Regions(name_regions(self.regions)?),
        };

        Ok(TilingRequest {
            output_folder,
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            overlap_percent: self.overlap_percent,
            invert_x: self.invert_x,
            invert_y: self.invert_y,
            add_buffer: self.add_buffer,
            target,
        })
    }
}

fn name_regions(polygons: Vec<Polygon>) -> Result<Vec<Region>, ConfigError> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut regions = Vec::with_capacity(polygons.len());

    for (index, polygon) in polygons.into_iter().enumerate() {
        if polygon.vertices().len() < 3 {
            return Err(ConfigError::DegenerateRegion {
                index,
                vertices: polygon.vertices().len(),
            });
        }
        let region = Region::from_polygon(polygon);
        if let Some(&first) = seen.get(&region.name) {
            return Err(ConfigError::DuplicateRegionName {
                name: region.name,
                first,
                second: index,
            });
        }
        seen.insert(region.name.clone(), index);
        regions.push(region);
    }

    Ok(regions)
}

// =============================================================================
// Tests
// =============================================================================
