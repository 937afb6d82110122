//! Polygon fill-fraction time filtering
//!
//! Reservoir polygons are burned into the raster with a sentinel outside
//! the polygon; within it, observations can still be missing. This filter
//! keeps the time steps where enough of the polygon interior actually
//! carries observations, judged by the scarcest of the check bands.

use crate::types::{DataCube, WaterError, WaterResult};
use serde::{Deserialize, Serialize};

/// Fill-fraction filter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoverageFilterParams {
    /// Minimum fraction of the unmasked area that must carry observations
    pub minimum_filled_fraction: f64,
    /// Bands whose coverage is checked; the scarcest one decides
    pub quality_check_bands: Vec<String>,
    /// Sentinel marking pixels outside the polygon
    pub masked_value: f32,
    /// Sentinel marking missing observations inside the polygon
    pub missing_value: f32,
}

impl Default for CoverageFilterParams {
    fn default() -> Self {
        Self {
            minimum_filled_fraction: 0.35,
            quality_check_bands: vec![
                "green".to_string(),
                "nir".to_string(),
                "swir".to_string(),
            ],
            masked_value: -999_999.0,
            missing_value: -888_888.0,
        }
    }
}

impl CoverageFilterParams {
    /// Validate parameter ranges
    pub fn validate(&self) -> WaterResult<()> {
        if !(0.0..=1.0).contains(&self.minimum_filled_fraction) {
            return Err(WaterError::InvalidParameter(format!(
                "minimum_filled_fraction must lie in [0, 1], got {}",
                self.minimum_filled_fraction
            )));
        }
        if self.quality_check_bands.is_empty() {
            return Err(WaterError::InvalidParameter(
                "quality_check_bands must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Fill-fraction time filter
pub struct CoverageFilter {
    params: CoverageFilterParams,
}

impl CoverageFilter {
    /// Create a filter with default parameters
    pub fn new() -> Self {
        Self {
            params: CoverageFilterParams::default(),
        }
    }

    /// Create a filter with custom, validated parameters
    pub fn with_params(params: CoverageFilterParams) -> WaterResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Keep time steps with sufficient observation coverage
    pub fn apply(&self, cube: &DataCube) -> WaterResult<DataCube> {
        let band_indices: Vec<usize> = self
            .params
            .quality_check_bands
            .iter()
            .map(|name| cube.band_index(name))
            .collect::<WaterResult<_>>()?;
        let (height, width) = cube.spatial_dim();
        let n_pixels = (height * width) as f64;

        let mut keep = Vec::new();
        for t in 0..cube.n_times() {
            // Polygon-exterior fraction comes from the first check band
            let masked_fraction = cube
                .plane(band_indices[0], t)
                .iter()
                .filter(|&&v| v == self.params.masked_value)
                .count() as f64
                / n_pixels;

            // The band with the fewest observations decides
            let min_valid_fraction = band_indices
                .iter()
                .map(|&band| {
                    cube.plane(band, t)
                        .iter()
                        .filter(|&&v| !v.is_nan() && v != self.params.missing_value)
                        .count() as f64
                        / n_pixels
                })
                .fold(f64::INFINITY, f64::min);

            let unmasked_fraction = 1.0 - masked_fraction;
            if unmasked_fraction <= 0.0 {
                log::debug!("t={}: polygon fully masked, dropping", t);
                continue;
            }
            let filled = min_valid_fraction / unmasked_fraction;
            if filled > self.params.minimum_filled_fraction {
                keep.push(t);
            } else {
                log::debug!("t={}: filled fraction {:.3} too low, dropping", t, filled);
            }
        }

        log::info!(
            "Coverage filter kept {}/{} time steps",
            keep.len(),
            cube.n_times()
        );
        cube.select_times(&keep)
    }
}

impl Default for CoverageFilter {
    fn default() -> Self {
        Self::new()
    }
}
