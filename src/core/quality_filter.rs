//! Cloud/quality time filtering
//!
//! Keeps the time steps whose quality-band score stays below a fraction
//! of the series maximum. The score of a time step is a high quantile of
//! its quality band, so a few clean pixels cannot hide a cloudy scene.

use crate::core::threshold::quantile;
use crate::types::{DataCube, WaterError, WaterResult};
use serde::{Deserialize, Serialize};

/// Quality filter parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityFilterParams {
    /// Keep time steps scoring below this percentage of the series maximum
    pub cutoff_percentile: f64,
    /// Quantile of the quality band used as the per-step score
    pub score_percentile: f64,
    /// Name of the quality band
    pub quality_band: String,
}

impl Default for QualityFilterParams {
    fn default() -> Self {
        Self {
            cutoff_percentile: 35.0,
            score_percentile: 75.0,
            quality_band: "cloudp".to_string(),
        }
    }
}

impl QualityFilterParams {
    /// Validate parameter ranges
    pub fn validate(&self) -> WaterResult<()> {
        for (name, value) in [
            ("cutoff_percentile", self.cutoff_percentile),
            ("score_percentile", self.score_percentile),
        ] {
            if !(value > 0.0 && value <= 100.0) {
                return Err(WaterError::InvalidParameter(format!(
                    "{} must lie in (0, 100], got {}",
                    name, value
                )));
            }
        }
        if self.quality_band.is_empty() {
            return Err(WaterError::InvalidParameter(
                "quality_band must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Quality-based time filter
pub struct QualityFilter {
    params: QualityFilterParams,
}

impl QualityFilter {
    /// Create a filter with default parameters
    pub fn new() -> Self {
        Self {
            params: QualityFilterParams::default(),
        }
    }

    /// Create a filter with custom, validated parameters
    pub fn with_params(params: QualityFilterParams) -> WaterResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Drop time steps whose quality score is too close to the maximum
    ///
    /// A time step with no valid quality pixels cannot score and is
    /// dropped.
    pub fn apply(&self, cube: &DataCube) -> WaterResult<DataCube> {
        let band = cube.band_index(&self.params.quality_band)?;
        let q = self.params.score_percentile / 100.0;
        let cutoff = self.params.cutoff_percentile / 100.0;

        let mut scores: Vec<Option<f32>> = Vec::with_capacity(cube.n_times());
        for t in 0..cube.n_times() {
            let sample: Vec<f32> = cube
                .plane(band, t)
                .iter()
                .copied()
                .filter(|v| !v.is_nan())
                .collect();
            if sample.is_empty() {
                scores.push(None);
                continue;
            }
            scores.push(Some(quantile(&sample, q)?));
        }

        let max_score = scores
            .iter()
            .flatten()
            .fold(f32::NEG_INFINITY, |acc, &s| acc.max(s));

        let keep: Vec<usize> = scores
            .iter()
            .enumerate()
            .filter(|(_, score)| matches!(score, Some(s) if s / max_score < cutoff as f32))
            .map(|(t, _)| t)
            .collect();

        log::info!(
            "Quality filter kept {}/{} time steps (max score {:.3})",
            keep.len(),
            cube.n_times(),
            max_score
        );
        cube.select_times(&keep)
    }
}

impl Default for QualityFilter {
    fn default() -> Self {
        Self::new()
    }
}
