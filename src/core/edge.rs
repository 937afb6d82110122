//! Edge detection for threshold-sample selection
//!
//! Canny-style detector (Gaussian smoothing, Sobel gradients, non-maximum
//! suppression, double-threshold hysteresis) plus boolean morphological
//! dilation. Edges restrict the adaptive threshold to boundary-adjacent
//! pixels, where the two material classes are best separated.

use crate::types::{MaskPlane, TimeSlice, WaterError, WaterResult};
use ndarray::Array2;

/// Canny detector parameters
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CannyParams {
    /// Gaussian smoothing scale
    pub sigma: f32,
    /// Low hysteresis threshold on gradient magnitude
    pub low_threshold: f32,
    /// High hysteresis threshold on gradient magnitude
    pub high_threshold: f32,
}

impl Default for CannyParams {
    fn default() -> Self {
        Self {
            sigma: 0.7,
            low_threshold: 0.5,
            high_threshold: 1.0,
        }
    }
}

impl CannyParams {
    /// Validate parameter ranges
    pub fn validate(&self) -> WaterResult<()> {
        if !(self.sigma > 0.0) {
            return Err(WaterError::InvalidParameter(format!(
                "canny sigma must be positive, got {}",
                self.sigma
            )));
        }
        if !(self.low_threshold >= 0.0) || !(self.high_threshold > self.low_threshold) {
            return Err(WaterError::InvalidParameter(format!(
                "canny thresholds must satisfy 0 <= low < high, got {}/{}",
                self.low_threshold, self.high_threshold
            )));
        }
        Ok(())
    }
}

/// Detect edges in a partially-invalid slice
///
/// Invalid pixels are excluded from the smoothing kernel (weights are
/// renormalized over the valid neighborhood) and never become edges; a
/// pixel whose 3x3 gradient stencil touches an invalid or out-of-bounds
/// cell carries no gradient.
pub fn canny(slice: &TimeSlice, params: &CannyParams) -> WaterResult<MaskPlane> {
    params.validate()?;
    let (height, width) = slice.dim();
    if height < 3 || width < 3 {
        return Err(WaterError::Processing(format!(
            "edge detection requires at least a 3x3 slice, got {}x{}",
            height, width
        )));
    }

    let smoothed = smooth_valid(slice, params.sigma);
    let (magnitude, direction) = sobel_gradients(&smoothed, &slice.valid);
    let thinned = non_maximum_suppression(&magnitude, &direction);
    let edges = hysteresis(
        &thinned,
        &slice.valid,
        params.low_threshold,
        params.high_threshold,
    );
    Ok(edges)
}

/// Dilate a boolean mask with a full square neighborhood
///
/// `radius` 1 gives the 3x3 footprint. Neighborhoods are clipped at the
/// raster border.
pub fn dilate(mask: &MaskPlane, radius: usize) -> MaskPlane {
    let (height, width) = mask.dim();
    let r = radius as isize;
    let mut out = Array2::from_elem((height, width), false);

    for y in 0..height {
        for x in 0..width {
            'search: for dy in -r..=r {
                for dx in -r..=r {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny >= 0
                        && ny < height as isize
                        && nx >= 0
                        && nx < width as isize
                        && mask[[ny as usize, nx as usize]]
                    {
                        out[[y, x]] = true;
                        break 'search;
                    }
                }
            }
        }
    }

    out
}

/// Gaussian smoothing over the valid neighborhood only
fn smooth_valid(slice: &TimeSlice, sigma: f32) -> Array2<f32> {
    let (height, width) = slice.dim();
    let radius = (3.0 * sigma).ceil() as isize;
    let two_sigma_sq = 2.0 * sigma * sigma;

    let mut smoothed = Array2::from_elem((height, width), f32::NAN);
    for y in 0..height {
        for x in 0..width {
            if !slice.valid[[y, x]] {
                continue;
            }
            let mut weighted = 0.0f32;
            let mut weight_sum = 0.0f32;
            for dy in -radius..=radius {
                for dx in -radius..=radius {
                    let ny = y as isize + dy;
                    let nx = x as isize + dx;
                    if ny < 0 || ny >= height as isize || nx < 0 || nx >= width as isize {
                        continue;
                    }
                    let (ny, nx) = (ny as usize, nx as usize);
                    if !slice.valid[[ny, nx]] {
                        continue;
                    }
                    let dist_sq = (dy * dy + dx * dx) as f32;
                    let w = (-dist_sq / two_sigma_sq).exp();
                    weighted += w * slice.values[[ny, nx]];
                    weight_sum += w;
                }
            }
            if weight_sum > 0.0 {
                smoothed[[y, x]] = weighted / weight_sum;
            }
        }
    }
    smoothed
}

/// Sobel gradient magnitude and direction
///
/// Cells whose 3x3 stencil leaves the raster or touches an invalid pixel
/// get zero magnitude.
fn sobel_gradients(smoothed: &Array2<f32>, valid: &MaskPlane) -> (Array2<f32>, Array2<f32>) {
    let (height, width) = smoothed.dim();
    let mut magnitude = Array2::zeros((height, width));
    let mut direction = Array2::zeros((height, width));

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mut stencil_ok = true;
            'check: for dy in 0..3usize {
                for dx in 0..3usize {
                    if !valid[[y + dy - 1, x + dx - 1]] {
                        stencil_ok = false;
                        break 'check;
                    }
                }
            }
            if !stencil_ok {
                continue;
            }

            let z = |dy: usize, dx: usize| smoothed[[y + dy - 1, x + dx - 1]];
            let gx = (z(0, 2) + 2.0 * z(1, 2) + z(2, 2)) - (z(0, 0) + 2.0 * z(1, 0) + z(2, 0));
            let gy = (z(2, 0) + 2.0 * z(2, 1) + z(2, 2)) - (z(0, 0) + 2.0 * z(0, 1) + z(0, 2));

            magnitude[[y, x]] = (gx * gx + gy * gy).sqrt();
            direction[[y, x]] = gy.atan2(gx);
        }
    }

    (magnitude, direction)
}

/// Suppress non-maximal gradient responses along the gradient direction
fn non_maximum_suppression(magnitude: &Array2<f32>, direction: &Array2<f32>) -> Array2<f32> {
    let (height, width) = magnitude.dim();
    let mut thinned = Array2::zeros((height, width));

    for y in 1..height.saturating_sub(1) {
        for x in 1..width.saturating_sub(1) {
            let mag = magnitude[[y, x]];
            if mag <= 0.0 {
                continue;
            }

            // Quantize the gradient direction into one of four sectors
            let mut angle = direction[[y, x]].to_degrees();
            if angle < 0.0 {
                angle += 180.0;
            }
            let ((dy1, dx1), (dy2, dx2)) = if !(22.5..157.5).contains(&angle) {
                ((0isize, 1isize), (0isize, -1isize))
            } else if angle < 67.5 {
                ((1, 1), (-1, -1))
            } else if angle < 112.5 {
                ((1, 0), (-1, 0))
            } else {
                ((1, -1), (-1, 1))
            };

            let n1 = magnitude[[(y as isize + dy1) as usize, (x as isize + dx1) as usize]];
            let n2 = magnitude[[(y as isize + dy2) as usize, (x as isize + dx2) as usize]];
            if mag >= n1 && mag >= n2 {
                thinned[[y, x]] = mag;
            }
        }
    }

    thinned
}

/// Double-threshold hysteresis: strong edges seed, weak edges join if
/// 8-connected to a strong one
fn hysteresis(thinned: &Array2<f32>, valid: &MaskPlane, low: f32, high: f32) -> MaskPlane {
    let (height, width) = thinned.dim();
    let mut edges = Array2::from_elem((height, width), false);
    let mut stack = Vec::new();

    for y in 0..height {
        for x in 0..width {
            if valid[[y, x]] && thinned[[y, x]] > high {
                edges[[y, x]] = true;
                stack.push((y, x));
            }
        }
    }

    while let Some((y, x)) = stack.pop() {
        for dy in -1isize..=1 {
            for dx in -1isize..=1 {
                let ny = y as isize + dy;
                let nx = x as isize + dx;
                if ny < 0 || ny >= height as isize || nx < 0 || nx >= width as isize {
                    continue;
                }
                let (ny, nx) = (ny as usize, nx as usize);
                if !edges[[ny, nx]] && valid[[ny, nx]] && thinned[[ny, nx]] > low {
                    edges[[ny, nx]] = true;
                    stack.push((ny, nx));
                }
            }
        }
    }

    edges
}
