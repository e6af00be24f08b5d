//! Integration test: a full correlation step over several subsets with
//! an obstruction passing through the scene.

use std::collections::HashSet;
use std::sync::Arc;

use approx::assert_relative_eq;
use vikara_dic::{
    run_blocking_phase, ConformalDef, Deformation, IntensityImage, ObstructionConfig, PixelCoord,
    PolygonBoundary, Subset,
};

/// Synthetic speckle-ish pattern with deterministic values.
fn speckle_image(width: usize, height: usize) -> IntensityImage {
    IntensityImage::from_fn(width, height, |col, row| {
        let v = (col as f32 * 0.2).sin() * (row as f32 * 0.3).cos();
        120.0 + 60.0 * v
    })
}

fn square_conformal(x0: f32, y0: f32, side: f32) -> Subset {
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
fn obstruction_sweep_deactivates_then_reseeds() {
    let image = speckle_image(64, 64);

    let mut subset = Subset::centered(20, 20, 9, 9);
    subset.initialize_reference(&image);
    subset.initialize_deformed(&image, &Deformation::identity());

    // A vertical obstruction bar covers columns 24..=26 this frame.
    let bar: HashSet<PixelCoord> = (0..64)
        .flat_map(|row| (24..=26).map(move |col| PixelCoord::new(row, col)))
        .collect();
    subset.set_obstructed_coords(Arc::new(bar));

    // Candidate translation pushes the right edge of the subset into
    // the bar.
    let candidate = Deformation::translation(2.0, 0.0);
    subset.turn_off_obstructed_pixels(&candidate);

    // Columns 16..=24 map onto 18..=26; three columns land on the bar.
    assert_eq!(subset.num_active_pixels(), 9 * 6);
    let contrast = subset.contrast_std_dev();
    assert!(contrast > 0.0, "speckle pattern must have contrast");

    // The optimizer accepts; the bar moves away next frame and the
    // formerly hidden pixels reseed from their observed values.
    let mut hidden: Vec<usize> = Vec::new();
    for i in 0..subset.num_pixels() {
        if subset.is_deactivated_this_step(i) {
            subset.deactivate_pixel(i);
            hidden.push(i);
        }
    }
    subset.set_obstructed_coords(Arc::new(HashSet::new()));
    subset.initialize_deformed(&image, &candidate);
    subset.turn_off_obstructed_pixels(&candidate);
    subset.turn_on_previously_obstructed_pixels();

    for &i in &hidden {
        assert!(subset.is_active(i), "pixel {} must reactivate", i);
        assert_relative_eq!(
            subset.ref_intensities()[i],
            subset.def_intensities()[i],
            epsilon = 1e-6
        );
    }
    assert_eq!(subset.num_active_pixels(), 81);
}

#[test]
fn neighboring_subsets_block_each_other_after_barrier_phase() {
    let mut subsets = vec![
        square_conformal(10.0, 10.0, 6.0),
        square_conformal(30.0, 10.0, 6.0),
    ];
    // Subset 1 drifts left toward subset 0.
    let candidates = vec![Deformation::identity(), Deformation::translation(-4.0, 0.0)];

    run_blocking_phase(
        &mut subsets,
        &candidates,
        &ObstructionConfig { skin_factor: 1.0 },
    );

    // After the barrier phase the snapshots are immutable; obstruction
    // tests may run per subset in any order.
    for (subset, candidate) in subsets.iter_mut().zip(&candidates) {
        subset.turn_off_obstructed_pixels(candidate);
    }

    // Subset 0 keeps its footprint (subset 1 stopped short of it).
    assert_eq!(subsets[0].num_active_pixels(), subsets[0].num_pixels());

    // Push subset 0 into the region subset 1 claimed.
    let collision = Deformation::translation(16.0, 0.0);
    subsets[0].turn_off_obstructed_pixels(&collision);
    assert!(
        subsets[0].num_active_pixels() < subsets[0].num_pixels(),
        "pixels claimed by the neighbor must deactivate"
    );
}

#[test]
fn noise_estimate_flags_out_of_frame_subsets() {
    let image = speckle_image(48, 48);
    let subset = Subset::centered(24, 24, 11, 11);

    let inside = subset.noise_std_dev(&image, &Deformation::identity());
    assert!(inside < 1.0, "in-frame speckle noise is moderate");
    assert!(inside > 0.0);

    let outside = subset.noise_std_dev(&image, &Deformation::translation(40.0, 0.0));
    assert_eq!(outside, 1.0, "out-of-frame estimate is the sentinel");
}

#[test]
fn subsets_run_obstruction_tests_concurrently_after_barrier() {
    // Shared immutable snapshots + per-subset mutable state: one
    // worker thread per subset, no synchronization inside the loop.
    let obstruction: Arc<HashSet<PixelCoord>> = Arc::new(
        (10..=14)
            .flat_map(|row| (10..=14).map(move |col| PixelCoord::new(row, col)))
            .collect(),
    );

    let mut subsets: Vec<Subset> = (0..4)
        .map(|i| {
            let mut s = Subset::centered(12 + 20 * i, 12, 5, 5);
            s.set_obstructed_coords(Arc::clone(&obstruction));
            s
        })
        .collect();

    std::thread::scope(|scope| {
        for subset in subsets.iter_mut() {
            scope.spawn(move || {
                subset.turn_off_obstructed_pixels(&Deformation::identity());
            });
        }
    });

    // Only the first subset overlaps the obstruction block.
    assert_eq!(subsets[0].num_active_pixels(), 0);
    for subset in &subsets[1..] {
        assert_eq!(subset.num_active_pixels(), 25);
    }
}

#[test]
fn rotated_subset_maps_through_shape_function_consistently() {
    let image = speckle_image(64, 64);
    let mut subset = Subset::centered(32, 32, 7, 7);
    subset.initialize_reference(&image);

    // Rotating the sampling by 90 degrees about the centroid and
    // rotating the membership are the same operation on this pattern's
    // support, so every sample stays in frame.
    let quarter_turn = Deformation::RigidStrain {
        u: 0.0,
        v: 0.0,
        theta: std::f32::consts::FRAC_PI_2,
        e_xx: 0.0,
        e_yy: 0.0,
        g_xy: 0.0,
    };
    subset.initialize_deformed(&image, &quarter_turn);

    // The centroid pixel is fixed under the rotation.
    let center_index = subset.num_pixels() / 2;
    assert_relative_eq!(
        subset.def_intensities()[center_index],
        subset.ref_intensities()[center_index],
        epsilon = 1e-3
    );
}
