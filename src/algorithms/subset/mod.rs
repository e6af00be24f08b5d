//! Subset: a tracked region of pixels and its per-pixel state.
//!
//! A subset owns an ordered pixel membership ([`PixelSet`]) plus
//! parallel per-pixel arrays: reference and deformed intensities, the
//! persistent activity flag, and the per-step deactivation flag. The
//! correlation optimizer drives it per candidate deformation:
//!
//! 1. [`Subset::turn_off_obstructed_pixels`] maps every pixel through
//!    the candidate and recomputes the deactivation flags against the
//!    obstruction and cross-subset blocking snapshots.
//! 2. The optimizer reads [`Subset::num_active_pixels`],
//!    [`Subset::contrast_std_dev`] and [`Subset::noise_std_dev`] to
//!    judge subset health before accepting the solution.
//! 3. On acceptance, [`Subset::turn_on_previously_obstructed_pixels`]
//!    reseeds pixels that came back out from behind an obstruction.
//!
//! # Concurrency
//!
//! Subset operations are read-mostly computations over the subset's own
//! arrays with no internal synchronization; distinct subsets may be
//! processed on distinct worker threads. The only cross-subset data are
//! the obstruction and blocking sets, which are immutable [`Arc`]
//! snapshots installed before the workers start (see
//! [`run_blocking_phase`]).

mod blocking;
mod boundary;
mod render;
mod stats;

pub use blocking::{deformed_footprints, install_blocking_sets, run_blocking_phase, ObstructionConfig};
pub use boundary::{BoundaryShape, CircleBoundary, ConformalDef, PolygonBoundary};
pub use stats::IntensityField;

use std::collections::HashSet;
use std::sync::Arc;

use crate::core::types::{Deformation, PixelCoord, PixelSet};
use crate::error::{DicError, Result};
use crate::image::IntensityImage;

/// A tracked, possibly non-rectangular, set of reference-image pixels
/// whose motion between frames is solved for.
#[derive(Debug)]
pub struct Subset {
    pixels: PixelSet,
    ref_intensities: Vec<f32>,
    def_intensities: Vec<f32>,
    is_active: Vec<bool>,
    is_deactivated_this_step: Vec<bool>,
    /// Pixels covered by obstruction geometry in the deformed image.
    /// Immutable snapshot owned by the scene, rebuilt between frames.
    obstructed_coords: Arc<HashSet<PixelCoord>>,
    /// Pixels claimed by neighboring subsets for the current candidate
    /// step. Must be fully collected before any obstruction test runs.
    blocked_by_other_subsets: Arc<HashSet<PixelCoord>>,
    conformal: Option<ConformalDef>,
}

impl Subset {
    /// Rectangular subset centered on `(cx, cy)`.
    pub fn centered(cx: i32, cy: i32, width: usize, height: usize) -> Self {
        Self::build(PixelSet::centered(cx, cy, width, height), None)
    }

    /// Subset over an explicit pixel membership.
    pub fn from_pixel_set(pixels: PixelSet) -> Self {
        Self::build(pixels, None)
    }

    /// Conformal subset whose membership comes from boundary shapes.
    ///
    /// Fails with [`DicError::EmptySubset`] when the shapes cover no
    /// pixels.
    pub fn conformal(def: ConformalDef) -> Result<Self> {
        let footprint = def.reference_footprint();
        if footprint.is_empty() {
            return Err(DicError::EmptySubset);
        }
        Ok(Self::build(PixelSet::from_coord_set(&footprint), Some(def)))
    }

    fn build(pixels: PixelSet, conformal: Option<ConformalDef>) -> Self {
        let n = pixels.len();
        log::debug!("Subset created with {} pixels", n);
        Self {
            pixels,
            ref_intensities: vec![0.0; n],
            def_intensities: vec![0.0; n],
            is_active: vec![true; n],
            is_deactivated_this_step: vec![false; n],
            obstructed_coords: Arc::new(HashSet::new()),
            blocked_by_other_subsets: Arc::new(HashSet::new()),
            conformal,
        }
    }

    /// Number of pixels in the membership.
    #[inline]
    pub fn num_pixels(&self) -> usize {
        self.pixels.len()
    }

    /// The pixel membership.
    #[inline]
    pub fn pixels(&self) -> &PixelSet {
        &self.pixels
    }

    /// Centroid in the reference configuration.
    #[inline]
    pub fn centroid(&self) -> (f32, f32) {
        self.pixels.centroid()
    }

    /// Whether the footprint comes from explicit boundary shapes.
    #[inline]
    pub fn is_conformal(&self) -> bool {
        self.conformal.is_some()
    }

    /// Reference intensities in pixel order.
    pub fn ref_intensities(&self) -> &[f32] {
        &self.ref_intensities
    }

    /// Deformed intensities in pixel order.
    pub fn def_intensities(&self) -> &[f32] {
        &self.def_intensities
    }

    /// Mutable deformed intensities, for the optimizer's sampling loop.
    pub fn def_intensities_mut(&mut self) -> &mut [f32] {
        &mut self.def_intensities
    }

    /// Whether pixel `i` has ever held a valid reference intensity.
    #[inline]
    pub fn is_active(&self, i: usize) -> bool {
        self.is_active[i]
    }

    /// Whether pixel `i` is deactivated under the current candidate.
    #[inline]
    pub fn is_deactivated_this_step(&self, i: usize) -> bool {
        self.is_deactivated_this_step[i]
    }

    /// Install the scene's obstruction snapshot.
    pub fn set_obstructed_coords(&mut self, coords: Arc<HashSet<PixelCoord>>) {
        self.obstructed_coords = coords;
    }

    /// Install the cross-subset blocking snapshot for this step.
    pub fn set_blocked_pixels(&mut self, coords: Arc<HashSet<PixelCoord>>) {
        self.blocked_by_other_subsets = coords;
    }

    /// Seed reference intensities from the image at the membership
    /// coordinates.
    pub fn initialize_reference(&mut self, image: &IntensityImage) {
        for i in 0..self.num_pixels() {
            let col = self.pixels.x(i) - image.offset_x();
            let row = self.pixels.y(i) - image.offset_y();
            self.ref_intensities[i] = image.at(col as usize, row as usize);
        }
    }

    /// Sample deformed intensities from the image at the mapped
    /// location of each pixel, bilinearly interpolated.
    pub fn initialize_deformed(&mut self, image: &IntensityImage, deformation: &Deformation) {
        let (cx, cy) = self.pixels.centroid();
        for i in 0..self.num_pixels() {
            let (x, y) = deformation.map(self.pixels.x(i) as f32, self.pixels.y(i) as f32, cx, cy);
            self.def_intensities[i] = image
                .interpolate_bilinear(x - image.offset_x() as f32, y - image.offset_y() as f32);
        }
    }

    /// Whether a mapped location falls on an obstructed pixel.
    ///
    /// Each coordinate rounds half-up independently; membership is
    /// tested against the `(row, col)` obstruction set. Pure.
    #[inline]
    pub fn is_obstructed_pixel(&self, coord_x: f32, coord_y: f32) -> bool {
        self.obstructed_coords
            .contains(&PixelCoord::from_xy(coord_x, coord_y))
    }

    /// Pixels this subset covers in the deformed configuration.
    ///
    /// Empty for non-conformal subsets. For a conformal subset, the
    /// union of every boundary shape's coverage under `deformation`,
    /// grown by `skin_factor`. This is how a tracked subset becomes
    /// obstruction geometry for its neighbors.
    pub fn deformed_pixel_footprint(
        &self,
        deformation: &Deformation,
        skin_factor: f32,
    ) -> HashSet<PixelCoord> {
        let mut coords = HashSet::new();
        if let Some(conformal) = &self.conformal {
            let (cx, cy) = self.pixels.centroid();
            for shape in conformal.boundary() {
                coords.extend(shape.owned_pixels(Some(deformation), cx, cy, skin_factor));
            }
        }
        coords
    }

    /// Recompute the per-step deactivation flags for a candidate
    /// deformation.
    ///
    /// Every pixel is mapped through `deformation`; its flag becomes
    /// the logical OR of obstruction membership and (when a non-empty
    /// blocking snapshot is installed) blocked-set membership at the
    /// half-up-rounded location. All flags are recomputed from scratch;
    /// nothing carries over from the previous candidate. Idempotent for
    /// fixed inputs.
    pub fn turn_off_obstructed_pixels(&mut self, deformation: &Deformation) {
        let (cx, cy) = self.pixels.centroid();
        let has_blocks = !self.blocked_by_other_subsets.is_empty();

        for i in 0..self.num_pixels() {
            let (x, y) = deformation.map(self.pixels.x(i) as f32, self.pixels.y(i) as f32, cx, cy);
            let mut deactivated = self.is_obstructed_pixel(x, y);
            if has_blocks {
                deactivated |= self
                    .blocked_by_other_subsets
                    .contains(&PixelCoord::from_xy(x, y));
            }
            self.is_deactivated_this_step[i] = deactivated;
        }
    }

    /// Reseed pixels that re-emerged from behind an obstruction.
    ///
    /// Assumes the deactivation flags reflect the just-accepted
    /// deformation. Every pixel that is neither deactivated this step
    /// nor active gets its deformed intensity copied into the reference
    /// slot and its activity flag set: a pixel coming back into view
    /// has no valid history, so its newly observed value becomes its
    /// baseline. This is the only mutation of the reference intensities
    /// and activity flags after construction.
    pub fn turn_on_previously_obstructed_pixels(&mut self) {
        let mut reseeded = 0usize;
        for i in 0..self.num_pixels() {
            if !self.is_deactivated_this_step[i] && !self.is_active[i] {
                self.ref_intensities[i] = self.def_intensities[i];
                self.is_active[i] = true;
                reseeded += 1;
            }
        }
        if reseeded > 0 {
            log::debug!("Reseeded {} previously obstructed pixels", reseeded);
        }
    }

    /// Force a pixel inactive. Obstruction bookkeeping for regions that
    /// start the analysis covered (e.g. behind a known occluder).
    pub fn deactivate_pixel(&mut self, i: usize) {
        self.is_active[i] = false;
    }

    /// Overwrite the reference intensities. Length must match the
    /// membership.
    pub fn set_ref_intensities(&mut self, intensities: &[f32]) {
        assert_eq!(intensities.len(), self.num_pixels());
        self.ref_intensities.copy_from_slice(intensities);
    }

    /// Overwrite the deformed intensities. Length must match the
    /// membership.
    pub fn set_def_intensities(&mut self, intensities: &[f32]) {
        assert_eq!(intensities.len(), self.num_pixels());
        self.def_intensities.copy_from_slice(intensities);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstruction(coords: &[(i32, i32)]) -> Arc<HashSet<PixelCoord>> {
        Arc::new(coords.iter().map(|&(row, col)| PixelCoord::new(row, col)).collect())
    }

    #[test]
    fn test_is_obstructed_pixel_rounds_half_up() {
        let mut subset = Subset::centered(10, 10, 3, 3);
        subset.set_obstructed_coords(obstruction(&[(7, 4)]));
        // x = 3.5 rounds to column 4, y = 6.5 rounds to row 7.
        assert!(subset.is_obstructed_pixel(3.5, 6.5));
        assert!(!subset.is_obstructed_pixel(3.4, 6.5));
        assert!(!subset.is_obstructed_pixel(3.5, 6.4));
    }

    #[test]
    fn test_turn_off_is_full_recompute() {
        let mut subset = Subset::centered(10, 10, 3, 3);
        subset.set_obstructed_coords(obstruction(&[(10, 10)]));

        subset.turn_off_obstructed_pixels(&Deformation::identity());
        let first: Vec<bool> = (0..9).map(|i| subset.is_deactivated_this_step(i)).collect();
        assert_eq!(first.iter().filter(|&&b| b).count(), 1);

        // A translation that moves the subset off the obstruction must
        // clear the previously set flag.
        subset.turn_off_obstructed_pixels(&Deformation::translation(100.0, 0.0));
        assert!((0..9).all(|i| !subset.is_deactivated_this_step(i)));
    }

    #[test]
    fn test_turn_off_idempotent() {
        let mut subset = Subset::centered(5, 5, 5, 5);
        subset.set_obstructed_coords(obstruction(&[(5, 5), (5, 6)]));
        let def = Deformation::translation(0.3, -0.2);

        subset.turn_off_obstructed_pixels(&def);
        let first: Vec<bool> = (0..25).map(|i| subset.is_deactivated_this_step(i)).collect();
        subset.turn_off_obstructed_pixels(&def);
        let second: Vec<bool> = (0..25).map(|i| subset.is_deactivated_this_step(i)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_blocking_composes_with_obstruction_by_or() {
        let mut subset = Subset::centered(5, 5, 3, 3);
        subset.set_obstructed_coords(obstruction(&[(4, 4)]));
        subset.set_blocked_pixels(obstruction(&[(6, 6)]));

        subset.turn_off_obstructed_pixels(&Deformation::identity());
        for i in 0..subset.num_pixels() {
            let coord = (subset.pixels().y(i), subset.pixels().x(i));
            let expected = coord == (4, 4) || coord == (6, 6);
            assert_eq!(subset.is_deactivated_this_step(i), expected, "pixel {:?}", coord);
        }
    }

    #[test]
    fn test_reactivation_reseeds_reference() {
        let mut subset = Subset::centered(5, 5, 3, 3);
        let def_values: Vec<f32> = (0..9).map(|i| 10.0 + i as f32).collect();
        subset.set_def_intensities(&def_values);

        subset.deactivate_pixel(4);
        subset.deactivate_pixel(5);
        // Pixel 5 is still obstructed this step, pixel 4 is clear.
        subset.set_obstructed_coords(obstruction(&[(5, 6)]));
        subset.turn_off_obstructed_pixels(&Deformation::identity());

        subset.turn_on_previously_obstructed_pixels();
        assert!(subset.is_active(4));
        assert_eq!(subset.ref_intensities()[4], 14.0);
        assert!(!subset.is_active(5));
        // Already-active pixels keep their reference values.
        assert_eq!(subset.ref_intensities()[0], 0.0);
    }

    #[test]
    fn test_conformal_footprint_moves_with_deformation() {
        let subset = Subset::conformal(
            ConformalDef::new().with_boundary(Box::new(PolygonBoundary::new(vec![
                (0.0, 0.0),
                (4.0, 0.0),
                (4.0, 4.0),
                (0.0, 4.0),
            ]))),
        )
        .unwrap();
        assert!(subset.is_conformal());

        let still = subset.deformed_pixel_footprint(&Deformation::identity(), 1.0);
        assert!(still.contains(&PixelCoord::new(0, 0)));

        let moved = subset.deformed_pixel_footprint(&Deformation::translation(5.0, 5.0), 1.0);
        assert!(moved.contains(&PixelCoord::new(5, 5)));
        assert!(!moved.contains(&PixelCoord::new(0, 0)));
    }

    #[test]
    fn test_non_conformal_footprint_is_empty() {
        let subset = Subset::centered(5, 5, 3, 3);
        assert!(subset
            .deformed_pixel_footprint(&Deformation::identity(), 1.8)
            .is_empty());
    }

    #[test]
    fn test_empty_conformal_rejected() {
        let result = Subset::conformal(ConformalDef::new());
        assert!(matches!(result, Err(DicError::EmptySubset)));
    }
}
