//! Debug rendering of subset state.
//!
//! Visualizations the optimizer's operators look at when a subset
//! misbehaves: where the membership sits in the frame, which pixels are
//! inactive or deactivated, and how large the local intensity residual
//! is. Buffers are `f32` intensities; files go through
//! [`crate::image::encode`] as 8-bit grayscale.

use std::path::Path;

use super::Subset;
use crate::core::math::round_half_up_pair;
use crate::core::types::Deformation;
use crate::error::Result;
use crate::image::{encode, IntensityImage};

/// Marker intensity for pixels that have never been active.
const INACTIVE_MARKER: f32 = 255.0;
/// Gray level for inactive areas in subset-extent renders.
const INACTIVE_GRAY: f32 = 100.0;

impl Subset {
    /// Render the subset onto a frame-sized buffer.
    ///
    /// Without a deformation the buffer is zeroed and every membership
    /// pixel is painted with a bright marker. With a deformation the
    /// frame is copied as background and each mapped pixel is colored:
    /// 255 when the pixel is not active, 0 when it is deactivated this
    /// step, otherwise `2 |def − ref|` saturated to 255 — a
    /// visualization of the local intensity residual. Mapped locations
    /// falling outside the frame are skipped.
    pub fn render_on_image(
        &self,
        image: &IntensityImage,
        deformation: Option<&Deformation>,
    ) -> Vec<f32> {
        let w = image.width();
        let h = image.height();
        let ox = image.offset_x();
        let oy = image.offset_y();

        let def = match deformation {
            None => {
                let mut buffer = vec![0.0f32; w * h];
                for (x, y) in self.pixels().iter() {
                    let col = x - ox;
                    let row = y - oy;
                    if col >= 0 && (col as usize) < w && row >= 0 && (row as usize) < h {
                        buffer[row as usize * w + col as usize] = INACTIVE_MARKER;
                    }
                }
                return buffer;
            }
            Some(def) => def,
        };

        let mut buffer = image.intensities().to_vec();
        let (cx, cy) = self.centroid();
        for i in 0..self.num_pixels() {
            let (mx, my) = def.map(self.pixels().x(i) as f32, self.pixels().y(i) as f32, cx, cy);
            let (col, row) = round_half_up_pair(mx - ox as f32, my - oy as f32);
            if col < 0 || col as usize >= w || row < 0 || row as usize >= h {
                continue;
            }
            let value = if !self.is_active(i) {
                INACTIVE_MARKER
            } else if self.is_deactivated_this_step(i) {
                0.0
            } else {
                (2.0 * (self.def_intensities()[i] - self.ref_intensities()[i]).abs()).min(255.0)
            };
            buffer[row as usize * w + col as usize] = value;
        }
        buffer
    }

    /// Render and write as an 8-bit grayscale file.
    pub fn write_on_image(
        &self,
        path: impl AsRef<Path>,
        image: &IntensityImage,
        deformation: Option<&Deformation>,
    ) -> Result<()> {
        let buffer = self.render_on_image(image, deformation);
        encode::write_gray_image(path, image.width(), image.height(), &buffer)
    }

    /// Render the subset's own extent: a bounding-box-sized buffer with
    /// inactive pixels gray and the rest carrying the chosen intensity
    /// field.
    ///
    /// Returns `(width, height, buffer)`.
    pub fn render_region(&self, use_def_intensities: bool) -> (usize, usize, Vec<f32>) {
        let region = match self.pixels().bounds() {
            Some(region) => region,
            None => return (0, 0, Vec::new()),
        };
        let w = region.width() as usize;
        let h = region.height() as usize;
        let mut buffer = vec![0.0f32; w * h];
        for i in 0..self.num_pixels() {
            let col = (self.pixels().x(i) - region.min_x) as usize;
            let row = (self.pixels().y(i) - region.min_y) as usize;
            buffer[row * w + col] = if !self.is_active(i) {
                INACTIVE_GRAY
            } else if use_def_intensities {
                self.def_intensities()[i]
            } else {
                self.ref_intensities()[i]
            };
        }
        (w, h, buffer)
    }

    /// Render the subset extent and write as an 8-bit grayscale file.
    pub fn write_region(&self, path: impl AsRef<Path>, use_def_intensities: bool) -> Result<()> {
        let (w, h, buffer) = self.render_region(use_def_intensities);
        encode::write_gray_image(path, w, h, &buffer)
    }
}
