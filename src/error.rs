use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating a tiling request or command configuration.
///
/// These are structural problems with the caller's parameters. They are
/// reported at construction time so that a bad request never reaches the
/// grid generator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// No output folder was given
    #[error("Output folder is required")]
    MissingOutputFolder,

    /// Frame width or height is zero, negative or not finite
    #[error("Frame dimensions must be positive: got {width} x {height}")]
    InvalidFrameSize { width: f64, height: f64 },

    /// Overlap outside the supported range
    #[error("Overlap percent must be in [0, 100): got {0}")]
    InvalidOverlap(f64),

    /// Both a bounding box and regions were supplied
    #[error("Cannot specify both bounding box and regions")]
    BothTargets,

    /// Bounding box has NaN or infinite coordinates
    #[error("Bounding box coordinates must be finite")]
    NonFiniteBoundingBox,

    /// Neither a bounding box nor any region was supplied
    #[error("Must specify either bounding box or regions")]
    NoTarget,

    /// A region polygon has fewer than three vertices
    #[error("Region {index} has {vertices} vertices, at least 3 are required")]
    DegenerateRegion { index: usize, vertices: usize },

    /// Two regions resolve to the same centroid-derived name
    #[error("Regions {first} and {second} share the name '{name}'")]
    DuplicateRegionName {
        name: String,
        first: usize,
        second: usize,
    },
}

/// Errors that can occur while planning tile grids or handling tile
/// coordinate files.
#[derive(Debug, Error)]
pub enum TilingError {
    /// The request was malformed
    #[error("Invalid tiling request: {0}")]
    Config(#[from] ConfigError),

    /// Reading or writing a coordinate file failed
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A region would need more tiles than allowed
    #[error(
        "Region '{region}' would require {tiles} tiles ({cols}x{rows}), maximum allowed is {max}"
    )]
    TooManyTiles {
        region: String,
        tiles: u64,
        cols: u64,
        rows: u64,
        max: u64,
    },

    /// Generation was aborted through the cancellation flag
    #[error("Tile generation cancelled after {rows_done} of {rows_total} rows")]
    Cancelled { rows_done: usize, rows_total: usize },

    /// A coordinate line could not be parsed
    #[error("Malformed tile coordinate on line {line}: {content}")]
    MalformedLine { line: usize, content: String },
}

impl TilingError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        TilingError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors from the transform preset store and per-slide alignment files.
///
/// Note that loading a corrupt store is not an error: the store logs the
/// problem and starts empty. These variants cover writes and explicit reads.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON encoding or decoding error
    #[error("JSON error in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Sample names are used as file names and must be non-empty path segments
    #[error("Invalid sample name: '{0}'")]
    InvalidSampleName(String),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn json(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        StoreError::Json {
            path: path.into(),
            source,
        }
    }
}

/// Errors from overview image preparation and analysis export.
#[derive(Debug, Error)]
pub enum DetectionError {
    /// Crop bounds do not describe a non-empty area inside the image
    #[error("Invalid slide boundaries: X[{x_min}-{x_max}], Y[{y_min}-{y_max}]")]
    InvalidCropBounds {
        x_min: u32,
        x_max: u32,
        y_min: u32,
        y_max: u32,
    },

    /// Image encoding or decoding error
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Filesystem error
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
