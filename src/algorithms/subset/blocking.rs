//! Cross-subset blocking: the collection phase between candidate steps.
//!
//! When several subsets track neighboring regions, a pixel one subset
//! has moved onto must not be correlated by another. The blocked sets
//! cannot be built incrementally while subsets run — that would be
//! shared mutable state on the hot path — so each candidate step has an
//! explicit barrier phase: collect every subset's deformed footprint,
//! union them per subset, and install the results as immutable [`Arc`]
//! snapshots. Only after the phase completes may the per-subset
//! obstruction tests run, from as many worker threads as the caller
//! likes.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::Subset;
use crate::core::types::{Deformation, PixelCoord};

/// Settings for footprint collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObstructionConfig {
    /// Growth factor applied to boundary shapes when computing deformed
    /// footprints.
    ///
    /// Values above 1.0 make a subset claim a margin around itself so
    /// boundary aliasing does not leak pixels to a neighbor. Typical:
    /// 1.8
    pub skin_factor: f32,
}

impl Default for ObstructionConfig {
    fn default() -> Self {
        Self { skin_factor: 1.8 }
    }
}

/// Deformed footprint of every subset under its candidate deformation.
///
/// `deformations` pairs positionally with `subsets`. Non-conformal
/// subsets yield empty footprints (they claim nothing).
pub fn deformed_footprints(
    subsets: &[Subset],
    deformations: &[Deformation],
    skin_factor: f32,
) -> Vec<HashSet<PixelCoord>> {
    assert_eq!(
        subsets.len(),
        deformations.len(),
        "one candidate deformation per subset"
    );
    subsets
        .iter()
        .zip(deformations)
        .map(|(subset, def)| subset.deformed_pixel_footprint(def, skin_factor))
        .collect()
}

/// Install each subset's blocking snapshot: the union of every *other*
/// subset's footprint.
///
/// Single-writer phase; once it returns, the installed sets are shared
/// read-only and the subsets may be processed concurrently.
pub fn install_blocking_sets(subsets: &mut [Subset], footprints: &[HashSet<PixelCoord>]) {
    assert_eq!(
        subsets.len(),
        footprints.len(),
        "one footprint per subset"
    );
    for (i, subset) in subsets.iter_mut().enumerate() {
        let mut blocked = HashSet::new();
        for (j, footprint) in footprints.iter().enumerate() {
            if i != j {
                blocked.extend(footprint.iter().copied());
            }
        }
        log::debug!("Subset {} blocked by {} foreign pixels", i, blocked.len());
        subset.set_blocked_pixels(Arc::new(blocked));
    }
}

/// Run the full barrier phase for one candidate step: collect deformed
/// footprints and install the per-subset blocking snapshots.
pub fn run_blocking_phase(
    subsets: &mut [Subset],
    deformations: &[Deformation],
    config: &ObstructionConfig,
) {
    let footprints = deformed_footprints(subsets, deformations, config.skin_factor);
    install_blocking_sets(subsets, &footprints);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::subset::{ConformalDef, PolygonBoundary};

    fn square_subset(x0: f32, y0: f32, side: f32) -> Subset {
        Subset::conformal(
            ConformalDef::new().with_boundary(Box::new(PolygonBoundary::new(vec![
                (x0, y0),
                (x0 + side, y0),
                (x0 + side, y0 + side),
                (x0, y0 + side),
            ]))),
        )
        .unwrap()
    }

    #[test]
    fn test_blocking_excludes_own_footprint() {
        let mut subsets = vec![square_subset(0.0, 0.0, 4.0), square_subset(20.0, 0.0, 4.0)];
        let deformations = vec![Deformation::identity(), Deformation::identity()];
        run_blocking_phase(
            &mut subsets,
            &deformations,
            &ObstructionConfig { skin_factor: 1.0 },
        );

        // Each subset is blocked by the other's pixels, not its own.
        subsets[0].turn_off_obstructed_pixels(&Deformation::identity());
        assert_eq!(subsets[0].num_active_pixels(), subsets[0].num_pixels());

        // Move subset 0 onto subset 1's claimed region.
        subsets[0].turn_off_obstructed_pixels(&Deformation::translation(20.0, 0.0));
        assert_eq!(subsets[0].num_active_pixels(), 0);
    }

    #[test]
    fn test_non_conformal_subsets_claim_nothing() {
        let subsets = vec![
            Subset::centered(5, 5, 3, 3),
            Subset::centered(20, 5, 3, 3),
        ];
        let deformations = vec![Deformation::identity(), Deformation::identity()];
        let footprints = deformed_footprints(&subsets, &deformations, 1.8);
        assert!(footprints.iter().all(|f| f.is_empty()));
    }
}
