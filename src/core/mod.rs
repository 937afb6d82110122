//! Core raster processing modules

pub mod coverage_filter;
pub mod edge;
pub mod quality_filter;
pub mod threshold;
pub mod water_detect;

// Re-export main types
pub use coverage_filter::{CoverageFilter, CoverageFilterParams};
pub use edge::{canny, dilate, CannyParams};
pub use quality_filter::{QualityFilter, QualityFilterParams};
pub use threshold::{median, otsu_threshold, quantile};
pub use water_detect::{
    SliceClassification, WaterDetectParams, WaterDetector, TOTAL_WATER_BAND, WATER_BAND,
    WATER_FILL_BAND,
};
