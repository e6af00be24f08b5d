//! Subset-level quality statistics.
//!
//! All statistics run over the pixels that are active and not
//! deactivated under the current candidate deformation — the same set
//! the correlation residual is computed from, so the optimizer judges
//! exactly the data it is fitting.

use std::f32::consts::PI;

use super::Subset;
use crate::core::types::Deformation;
use crate::image::IntensityImage;

/// Which per-pixel intensity array a statistic reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntensityField {
    Reference,
    Deformed,
}

/// Discrete Laplacian used by the noise estimator.
const NOISE_MASK: [[f32; 3]; 3] = [[1.0, -2.0, 1.0], [-2.0, 4.0, -2.0], [1.0, -2.0, 1.0]];

impl Subset {
    /// Count of pixels that are active and not deactivated this step.
    pub fn num_active_pixels(&self) -> usize {
        (0..self.num_pixels())
            .filter(|&i| self.is_active(i) && !self.is_deactivated_this_step(i))
            .count()
    }

    /// Mean intensity over the active, non-deactivated pixels.
    ///
    /// Returns 0.0 when that set is empty.
    pub fn mean_intensity(&self, field: IntensityField) -> f32 {
        let values = match field {
            IntensityField::Reference => self.ref_intensities(),
            IntensityField::Deformed => self.def_intensities(),
        };
        let mut sum = 0.0f32;
        let mut count = 0usize;
        for i in 0..self.num_pixels() {
            if self.is_active(i) && !self.is_deactivated_this_step(i) {
                sum += values[i];
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        sum / count as f32
    }

    /// Population standard deviation of the deformed intensities over
    /// the active, non-deactivated pixels.
    ///
    /// An empty set yields 0.0: the subset has no usable contrast, and
    /// [`Subset::num_active_pixels`] is the signal for why.
    pub fn contrast_std_dev(&self) -> f32 {
        let mean = self.mean_intensity(IntensityField::Deformed);
        let mut sum_sq = 0.0f32;
        let mut count = 0usize;
        for i in 0..self.num_pixels() {
            if self.is_active(i) && !self.is_deactivated_this_step(i) {
                let d = self.def_intensities()[i] - mean;
                sum_sq += d * d;
                count += 1;
            }
        }
        if count == 0 {
            return 0.0;
        }
        (sum_sq / count as f32).sqrt()
    }

    /// Estimate the image-acquisition noise under the subset's deformed
    /// footprint.
    ///
    /// Convolves the discrete Laplacian over the subset's bounding box
    /// translated by the deformation's rigid translation, intersected
    /// with the image; pixels on the image border contribute their raw
    /// absolute intensity. The accumulated sum is scaled by
    /// `sqrt(π/2) / (6 (W−2) (H−2))` for the box width and height.
    ///
    /// Returns the sentinel `1.0` — "maximally noisy, treat as
    /// unreliable" — when the translated box leaves the image or is too
    /// small to convolve.
    pub fn noise_std_dev(&self, image: &IntensityImage, deformation: &Deformation) -> f32 {
        let region = match self.pixels().bounds() {
            Some(region) => region,
            None => return 1.0,
        };
        let (cx, cy) = self.centroid();
        let (u, v) = deformation.translation_components(cx, cy);

        let min_x = (region.min_x as f32 + u) as i32;
        let max_x = (region.max_x as f32 + u) as i32;
        let min_y = (region.min_y as f32 + v) as i32;
        let max_y = (region.max_y as f32 + v) as i32;
        log::debug!(
            "noise_std_dev: subset extents {} {} {} {}",
            min_x,
            max_x,
            min_y,
            max_y
        );

        let w = max_x - min_x + 1;
        let h = max_y - min_y + 1;
        let img_w = image.width() as i32;
        let img_h = image.height() as i32;
        let ox = image.offset_x();
        let oy = image.offset_y();

        // The scale below needs at least one interior pixel each way.
        if max_x >= img_w + ox || min_x < ox || max_y >= img_h + oy || min_y < oy || w < 3 || h < 3
        {
            return 1.0;
        }

        let mut variance = 0.0f32;
        for y in min_y..max_y {
            for x in min_x..max_x {
                let col = x - ox;
                let row = y - oy;
                if col < 1 || col >= img_w - 1 || row < 1 || row >= img_h - 1 {
                    // Image border: no full 3x3 neighborhood to convolve.
                    variance += image.at(col as usize, row as usize).abs();
                } else {
                    let mut conv = 0.0f32;
                    for (j, mask_row) in NOISE_MASK.iter().enumerate() {
                        for (i, &m) in mask_row.iter().enumerate() {
                            conv += image.at(
                                (col + i as i32 - 1) as usize,
                                (row + j as i32 - 1) as usize,
                            ) * m;
                        }
                    }
                    variance += conv.abs();
                }
            }
        }
        variance *= (0.5 * PI).sqrt() / (6.0 * (w - 2) as f32 * (h - 2) as f32);
        log::debug!("noise_std_dev: estimate {}", variance);
        variance
    }
}
