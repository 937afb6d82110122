//! Water and flood-fill classification
//!
//! Per-time-slice classifier combining Canny edge detection, Otsu
//! thresholding of the water index at boundary-adjacent pixels, and a
//! historical-occurrence fill pass that recovers water the index
//! threshold misses. Each slice is independent; results are written into
//! pre-sized output buffers and appended to the cube as three new bands.

use crate::core::edge::{canny, dilate, CannyParams};
use crate::core::threshold::{median, otsu_threshold};
use crate::types::{DataCube, MaskPlane, TimeSlice, WaterError, WaterResult};
use ndarray::Array3;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Band name appended for the index-threshold water mask
pub const WATER_BAND: &str = "water";
/// Band name appended for the occurrence-fill mask
pub const WATER_FILL_BAND: &str = "water_fill";
/// Band name appended for the union of the two
pub const TOTAL_WATER_BAND: &str = "total_water";

/// Water classifier parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WaterDetectParams {
    /// Name of the spectral water-index band
    pub mndwi_band: String,
    /// Name of the historical water-occurrence band
    pub wo_band: String,
    /// Edge detector settings
    pub canny: CannyParams,
    /// Histogram bins for Otsu threshold selection
    pub histogram_bins: usize,
    /// Index value below which a pixel is definite non-water
    pub nonwater_threshold: f32,
    /// Edge mask dilation radius (1 = 3x3 footprint)
    pub dilation_radius: usize,
}

impl Default for WaterDetectParams {
    fn default() -> Self {
        Self {
            mndwi_band: "MNDWI".to_string(),
            wo_band: "wo".to_string(),
            canny: CannyParams::default(),
            histogram_bins: 100,
            nonwater_threshold: -0.15,
            dilation_radius: 1,
        }
    }
}

impl WaterDetectParams {
    /// Validate parameter ranges, failing fast on nonsense values
    pub fn validate(&self) -> WaterResult<()> {
        self.canny.validate()?;
        if self.histogram_bins < 2 {
            return Err(WaterError::InvalidParameter(format!(
                "histogram_bins must be at least 2, got {}",
                self.histogram_bins
            )));
        }
        if self.dilation_radius == 0 {
            return Err(WaterError::InvalidParameter(
                "dilation_radius must be at least 1".to_string(),
            ));
        }
        if self.mndwi_band.is_empty() || self.wo_band.is_empty() {
            return Err(WaterError::InvalidParameter(
                "band names must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Classification result for one time slice
#[derive(Debug, Clone)]
pub struct SliceClassification {
    /// Water by index threshold
    pub water: MaskPlane,
    /// Water recovered from historical occurrence
    pub water_fill: MaskPlane,
    /// Union of the two (disjoint by construction)
    pub total_water: MaskPlane,
    /// Validity of the index band at this slice
    pub valid: MaskPlane,
    /// Otsu threshold on the index band
    pub threshold: f32,
    /// Median occurrence at edge pixels
    pub occurrence_split: f32,
    /// Water area in square meters
    pub water_area: f64,
    /// Filled area in square meters
    pub filled_area: f64,
}

impl SliceClassification {
    /// Combined water area in square meters
    pub fn total_area(&self) -> f64 {
        self.water_area + self.filled_area
    }
}

/// Water/flood classifier
pub struct WaterDetector {
    params: WaterDetectParams,
}

impl WaterDetector {
    /// Create a classifier with default parameters
    pub fn new() -> Self {
        Self {
            params: WaterDetectParams::default(),
        }
    }

    /// Create a classifier with custom, validated parameters
    pub fn with_params(params: WaterDetectParams) -> WaterResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    /// Classifier parameters
    pub fn params(&self) -> &WaterDetectParams {
        &self.params
    }

    /// Classify every time slice and append the three mask bands
    ///
    /// Output bands are 1.0/0.0 planes with NaN wherever the index band
    /// was missing. Slices are independent; with the `parallel` feature
    /// they are classified concurrently and reassembled in time order.
    pub fn apply(&self, cube: &DataCube) -> WaterResult<DataCube> {
        let mndwi_idx = cube.band_index(&self.params.mndwi_band)?;
        let wo_idx = cube.band_index(&self.params.wo_band)?;
        let (height, width) = cube.spatial_dim();
        let n_times = cube.n_times();
        let pixel_area = cube.resolution().pixel_area();

        log::info!(
            "Classifying water for {} time steps of {}x{} pixels",
            n_times,
            height,
            width
        );

        let classify = |t: usize| -> WaterResult<SliceClassification> {
            let mndwi = TimeSlice::from_plane(cube.plane(mndwi_idx, t));
            let wo = TimeSlice::from_plane(cube.plane(wo_idx, t));
            let classified = self.classify_slice(&mndwi, &wo, pixel_area)?;
            log::debug!(
                "t={}: threshold {:.4}, water {:.0} m2, filled {:.0} m2",
                t,
                classified.threshold,
                classified.water_area,
                classified.filled_area
            );
            Ok(classified)
        };

        #[cfg(feature = "parallel")]
        let slices: Vec<SliceClassification> = (0..n_times)
            .into_par_iter()
            .map(classify)
            .collect::<WaterResult<_>>()?;

        #[cfg(not(feature = "parallel"))]
        let slices: Vec<SliceClassification> =
            (0..n_times).map(classify).collect::<WaterResult<_>>()?;

        // Pre-sized output buffers, written at each slice's time index
        let mut water = Array3::from_elem((n_times, height, width), f32::NAN);
        let mut water_fill = water.clone();
        let mut total_water = water.clone();

        for (t, classified) in slices.iter().enumerate() {
            for y in 0..height {
                for x in 0..width {
                    if !classified.valid[[y, x]] {
                        continue;
                    }
                    water[[t, y, x]] = mask_value(&classified.water, y, x);
                    water_fill[[t, y, x]] = mask_value(&classified.water_fill, y, x);
                    total_water[[t, y, x]] = mask_value(&classified.total_water, y, x);
                }
            }
        }

        let mut out = cube.clone();
        out.append_band(WATER_BAND, water)?;
        out.append_band(WATER_FILL_BAND, water_fill)?;
        out.append_band(TOTAL_WATER_BAND, total_water)?;

        log::info!("Water classification completed, appended 3 bands");
        Ok(out)
    }

    /// Classify one time slice
    ///
    /// `mndwi` supplies both values and the validity mask; `wo` is the
    /// historical occurrence plane of the same shape.
    pub fn classify_slice(
        &self,
        mndwi: &TimeSlice,
        wo: &TimeSlice,
        pixel_area: f64,
    ) -> WaterResult<SliceClassification> {
        if mndwi.dim() != wo.dim() {
            return Err(WaterError::ShapeMismatch(format!(
                "index slice {:?} vs occurrence slice {:?}",
                mndwi.dim(),
                wo.dim()
            )));
        }
        let dim = mndwi.dim();

        // Threshold only at boundary-adjacent pixels
        let edges = canny(mndwi, &self.params.canny)?;
        let edge_zone = dilate(&edges, self.params.dilation_radius);

        let index_sample: Vec<f32> = mndwi
            .values
            .indexed_iter()
            .filter(|(pos, _)| edge_zone[*pos] && mndwi.valid[*pos])
            .map(|(_, &v)| v)
            .collect();
        let threshold = otsu_threshold(&index_sample, self.params.histogram_bins)?;
        log::debug!("otsu threshold: {}", threshold);

        let water = MaskPlane::from_shape_fn(dim, |pos| {
            mndwi.valid[pos] && mndwi.values[pos] > threshold
        });
        let water_count = count(&water);
        let water_area = water_count as f64 * pixel_area;

        // Occurrence split at the same edge pixels
        let occurrence_sample: Vec<f32> = wo
            .values
            .indexed_iter()
            .filter(|(pos, &v)| edge_zone[*pos] && mndwi.valid[*pos] && !v.is_nan())
            .map(|(_, &v)| v)
            .collect();
        let occurrence_split = median(&occurrence_sample)?;

        let nonwater_threshold = self.params.nonwater_threshold;
        let water_fill = MaskPlane::from_shape_fn(dim, |pos| {
            mndwi.valid[pos]
                && mndwi.values[pos] < nonwater_threshold
                && wo.values[pos] > occurrence_split
        });
        let fill_count = count(&water_fill);
        let filled_area = fill_count as f64 * pixel_area;

        let total_water = MaskPlane::from_shape_fn(dim, |pos| water[pos] || water_fill[pos]);
        let total_count = count(&total_water);

        // Water and fill must stay disjoint; overlap is a hard fault
        if total_count != water_count + fill_count {
            return Err(WaterError::MaskOverlap {
                water: water_count,
                fill: fill_count,
                total: total_count,
            });
        }

        Ok(SliceClassification {
            water,
            water_fill,
            total_water,
            valid: mndwi.valid.clone(),
            threshold,
            occurrence_split,
            water_area,
            filled_area,
        })
    }
}

impl Default for WaterDetector {
    fn default() -> Self {
        Self::new()
    }
}

fn mask_value(mask: &MaskPlane, y: usize, x: usize) -> f32 {
    if mask[[y, x]] {
        1.0
    } else {
        0.0
    }
}

fn count(mask: &MaskPlane) -> usize {
    mask.iter().filter(|&&v| v).count()
}
