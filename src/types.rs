use chrono::{DateTime, Utc};
use geo_types::{MultiPolygon, Polygon};
use ndarray::{s, Array2, Array3, Array4, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

/// Real-valued raster sample
pub type BandValue = f32;

/// 2D raster plane (y, x)
pub type BandPlane = Array2<BandValue>;

/// 2D boolean mask plane (y, x)
pub type MaskPlane = Array2<bool>;

/// Single-band stack across time (t, y, x)
pub type BandStack = Array3<BandValue>;

/// Ground resolution of one raster pixel, in meters
///
/// The hosting pipeline knows the true resolution of the product it hands
/// us; area figures are `count * pixel_area()`, never a hard-coded
/// constant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelResolution {
    pub x_size: f64,
    pub y_size: f64,
}

impl PixelResolution {
    /// Create a resolution, rejecting non-positive pixel sizes
    pub fn new(x_size: f64, y_size: f64) -> WaterResult<Self> {
        if !(x_size > 0.0) || !(y_size > 0.0) {
            return Err(WaterError::InvalidParameter(format!(
                "pixel sizes must be positive, got {} x {}",
                x_size, y_size
            )));
        }
        Ok(Self { x_size, y_size })
    }

    /// Ground area covered by one pixel, in square meters
    pub fn pixel_area(&self) -> f64 {
        self.x_size * self.y_size
    }
}

/// Labeled multi-band, multi-temporal raster cube
///
/// Data is laid out `(band, t, y, x)`. Band names and time labels are
/// carried alongside the array and validated against its shape. Invalid
/// pixels use NaN as the missing-data marker, matching the convention of
/// the hosting pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct DataCube {
    data: Array4<BandValue>,
    bands: Vec<String>,
    times: Vec<DateTime<Utc>>,
    resolution: PixelResolution,
}

impl DataCube {
    /// Create a cube, validating labels against the array shape
    pub fn new(
        data: Array4<BandValue>,
        bands: Vec<String>,
        times: Vec<DateTime<Utc>>,
        resolution: PixelResolution,
    ) -> WaterResult<Self> {
        let shape = data.shape();
        if bands.len() != shape[0] {
            return Err(WaterError::ShapeMismatch(format!(
                "{} band names for {} bands",
                bands.len(),
                shape[0]
            )));
        }
        if times.len() != shape[1] {
            return Err(WaterError::ShapeMismatch(format!(
                "{} time labels for {} time steps",
                times.len(),
                shape[1]
            )));
        }
        Ok(Self {
            data,
            bands,
            times,
            resolution,
        })
    }

    /// Number of bands
    pub fn n_bands(&self) -> usize {
        self.data.shape()[0]
    }

    /// Number of time steps
    pub fn n_times(&self) -> usize {
        self.data.shape()[1]
    }

    /// Spatial dimensions (height, width)
    pub fn spatial_dim(&self) -> (usize, usize) {
        (self.data.shape()[2], self.data.shape()[3])
    }

    /// Band names, in band-axis order
    pub fn band_names(&self) -> &[String] {
        &self.bands
    }

    /// Time labels, in time-axis order
    pub fn times(&self) -> &[DateTime<Utc>] {
        &self.times
    }

    /// Pixel ground resolution
    pub fn resolution(&self) -> PixelResolution {
        self.resolution
    }

    /// Raw data view
    pub fn data(&self) -> &Array4<BandValue> {
        &self.data
    }

    /// Resolve a band name to its index along the band axis
    pub fn band_index(&self, name: &str) -> WaterResult<usize> {
        self.bands
            .iter()
            .position(|b| b == name)
            .ok_or_else(|| WaterError::BandNotFound(name.to_string()))
    }

    /// Spatial plane of one band at one time step
    pub fn plane(&self, band: usize, t: usize) -> ArrayView2<'_, BandValue> {
        self.data.slice(s![band, t, .., ..])
    }

    /// Append a band broadcast across all time steps
    ///
    /// The stack must be shaped `(t, y, x)` matching this cube.
    pub fn append_band(&mut self, name: impl Into<String>, stack: BandStack) -> WaterResult<()> {
        let (nt, ny, nx) = stack.dim();
        let shape = self.data.shape();
        if nt != shape[1] || ny != shape[2] || nx != shape[3] {
            return Err(WaterError::ShapeMismatch(format!(
                "band stack {}x{}x{} does not match cube {}x{}x{}",
                nt, ny, nx, shape[1], shape[2], shape[3]
            )));
        }
        let appended = ndarray::concatenate(
            Axis(0),
            &[self.data.view(), stack.insert_axis(Axis(0)).view()],
        )
        .map_err(|e| WaterError::ShapeMismatch(e.to_string()))?;
        self.data = appended;
        self.bands.push(name.into());
        Ok(())
    }

    /// Subset the cube along the time axis, preserving order
    pub fn select_times(&self, indices: &[usize]) -> WaterResult<DataCube> {
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.n_times()) {
            return Err(WaterError::ShapeMismatch(format!(
                "time index {} out of range ({} time steps)",
                bad,
                self.n_times()
            )));
        }
        let data = self.data.select(Axis(1), indices);
        let times = indices.iter().map(|&i| self.times[i]).collect();
        Ok(DataCube {
            data,
            bands: self.bands.clone(),
            times,
            resolution: self.resolution,
        })
    }
}

/// One spatial plane at a fixed time, with explicit validity
///
/// The validity mask is derived from the missing-data positions of the
/// source plane, making "missing" a first-class state instead of an
/// implicit NaN convention.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSlice {
    pub values: BandPlane,
    pub valid: MaskPlane,
}

impl TimeSlice {
    /// Build a slice from a raw plane; NaN marks invalid pixels
    pub fn from_plane(plane: ArrayView2<'_, BandValue>) -> Self {
        let valid = plane.map(|v| !v.is_nan());
        Self {
            values: plane.to_owned(),
            valid,
        }
    }

    /// Spatial dimensions (height, width)
    pub fn dim(&self) -> (usize, usize) {
        self.values.dim()
    }

    /// Number of valid pixels
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }
}

/// Reservoir geometry, closed over the two shapes the source data carries
#[derive(Debug, Clone, PartialEq)]
pub enum ReservoirGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
}

/// One reservoir record, immutable after construction
#[derive(Debug, Clone, PartialEq)]
pub struct Reservoir {
    pub fid: i64,
    pub source_name: String,
    pub source_id: Option<String>,
    pub name: Option<String>,
    pub name_en: Option<String>,
    pub grand_id: Option<i64>,
    pub geometry: ReservoirGeometry,
}

/// Error types for water detection and ingestion
#[derive(Debug, thiserror::Error)]
pub enum WaterError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("band not found: {0}")]
    BandNotFound(String),

    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("degenerate sample: {0}")]
    DegenerateSample(String),

    #[error("water and fill masks overlap: {water} water + {fill} fill != {total} total")]
    MaskOverlap {
        water: usize,
        fill: usize,
        total: usize,
    },

    #[error("processing error: {0}")]
    Processing(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("geometry error: {0}")]
    Geometry(String),
}

/// Result type for water detection operations
pub type WaterResult<T> = Result<T, WaterError>;
