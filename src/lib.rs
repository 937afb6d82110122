//! Waterwatch: reservoir surface-water detection from satellite imagery
//!
//! This library extracts water-surface masks and areas from labeled
//! multi-temporal raster cubes. The classifier combines Canny edge
//! detection with Otsu thresholding of a spectral water index, then
//! recovers water hidden by the index threshold from a historical
//! occurrence band. Time filters for cloudy and sparsely-observed scenes
//! and reservoir geometry ingestion round out the pipeline surface.

pub mod core;
pub mod io;
pub mod types;

// Re-export main types and functions for easier access
pub use types::{
    BandPlane, BandStack, BandValue, DataCube, MaskPlane, PixelResolution, Reservoir,
    ReservoirGeometry, TimeSlice, WaterError, WaterResult,
};

pub use crate::core::{
    CannyParams, CoverageFilter, CoverageFilterParams, QualityFilter, QualityFilterParams,
    SliceClassification, WaterDetectParams, WaterDetector,
};

pub use io::{reservoir_from_feature, reservoirs_from_features, GeometryApi};
