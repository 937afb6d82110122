//! Sample statistics for adaptive thresholding
//!
//! Histogram-based Otsu threshold selection over a filtered 1-D sample,
//! plus the median and linear-interpolation quantile used by the
//! occurrence split and the quality filter. All routines reject empty or
//! degenerate samples; callers propagate those faults.

use crate::types::{WaterError, WaterResult};

/// Select a threshold by maximizing between-class variance
///
/// Bins span the sample's value range. The returned threshold is the
/// center of the winning bin, so for a bimodal sample it lands strictly
/// between the two modes.
pub fn otsu_threshold(sample: &[f32], bins: usize) -> WaterResult<f32> {
    if bins < 2 {
        return Err(WaterError::InvalidParameter(format!(
            "otsu needs at least 2 histogram bins, got {}",
            bins
        )));
    }
    if sample.is_empty() {
        return Err(WaterError::DegenerateSample(
            "no valid pixels available for threshold selection".to_string(),
        ));
    }

    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &v in sample {
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    if !(max > min) {
        return Err(WaterError::DegenerateSample(format!(
            "all {} sample values equal {}",
            sample.len(),
            min
        )));
    }

    let bin_width = (max - min) / bins as f32;
    let mut histogram = vec![0usize; bins];
    for &v in sample {
        let bin = (((v - min) / bin_width) as usize).min(bins - 1);
        histogram[bin] += 1;
    }

    let center = |i: usize| min as f64 + (i as f64 + 0.5) * bin_width as f64;
    let total = sample.len() as f64;
    let sum: f64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &count)| center(i) * count as f64)
        .sum();

    let mut sum_b = 0.0;
    let mut weight_b = 0.0;
    let mut best_variance = 0.0;
    let mut best_bin = 0;

    for (i, &count) in histogram.iter().enumerate() {
        weight_b += count as f64;
        if weight_b == 0.0 {
            continue;
        }
        let weight_f = total - weight_b;
        if weight_f == 0.0 {
            break;
        }
        sum_b += center(i) * count as f64;

        let mean_b = sum_b / weight_b;
        let mean_f = (sum - sum_b) / weight_f;
        let variance = weight_b * weight_f * (mean_b - mean_f).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_bin = i;
        }
    }

    Ok(center(best_bin) as f32)
}

/// Median of a sample (mean of the two central values for even lengths)
pub fn median(sample: &[f32]) -> WaterResult<f32> {
    if sample.is_empty() {
        return Err(WaterError::DegenerateSample(
            "no valid pixels available for the median".to_string(),
        ));
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        Ok(sorted[mid])
    } else {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    }
}

/// Quantile with linear interpolation between order statistics
pub fn quantile(sample: &[f32], q: f64) -> WaterResult<f32> {
    if !(0.0..=1.0).contains(&q) {
        return Err(WaterError::InvalidParameter(format!(
            "quantile must lie in [0, 1], got {}",
            q
        )));
    }
    if sample.is_empty() {
        return Err(WaterError::DegenerateSample(
            "no valid pixels available for the quantile".to_string(),
        ));
    }
    let mut sorted = sample.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = (sorted.len() - 1) as f64 * q;
    let below = position.floor() as usize;
    let above = position.ceil() as usize;
    if below == above {
        return Ok(sorted[below]);
    }
    let fraction = (position - below as f64) as f32;
    Ok(sorted[below] + (sorted[above] - sorted[below]) * fraction)
}
