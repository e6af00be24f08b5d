//! Local shape functions: parametric motion models for a subset.
//!
//! A shape function converts a point in the reference configuration to
//! the deformed configuration. Two variants share one interface:
//!
//! - [`AffineShapeFunction`]: 6 parameters — rigid translation,
//!   rotation, normal strains and shear
//! - [`ProjectiveShapeFunction`]: 9 parameters — a general projective
//!   affine map
//!
//! The variant is selected once per analysis run by
//! [`shape_function_factory`] and never mixed within one subset's
//! lifetime.
//!
//! # Parameter lifecycle
//!
//! ```text
//! constructed → cleared (all defaults)
//!             → populated (initialize_from_fields, insert_motion)
//!             → mapped (map / rigid_body_motion point transforms)
//!             → saved (save_fields back to the persistence layer)
//! ```
//!
//! There is no path back to the constructed state; a new correlation
//! step either builds a fresh instance or calls `clear()` explicitly.
//!
//! Trigonometric terms are recomputed from the current rotation
//! parameter on every `map` call. Caching them across calls reads stale
//! values as soon as the optimizer perturbs the rotation.

mod affine;
mod projective;

pub use affine::{AffineDof, AffineShapeFunction};
pub use projective::{ProjectiveDof, ProjectiveShapeFunction};

use crate::core::types::Deformation;
use crate::fields::{FieldStore, ShapeFunctionConfig};

/// Common interface of the two motion-model variants.
pub trait LocalShapeFunction: std::fmt::Debug {
    /// Number of scalar parameters in this model.
    fn num_params(&self) -> usize;

    /// Current parameter values in wire-layout order.
    fn parameters(&self) -> &[f32];

    /// Reset every parameter to its default (the identity map).
    fn clear(&mut self);

    /// Map a reference-configuration point through the current
    /// parameters. Trig terms are computed from the current rotation on
    /// every call.
    fn map(&self, x: f32, y: f32, cx: f32, cy: f32) -> (f32, f32);

    /// Equivalent rigid-body motion `(u, v, theta)` of the current
    /// parameters. For the projective variant the rotation is an
    /// `atan2` approximation of the linear part — not exact under
    /// shear.
    fn rigid_body_motion(&self, cx: f32, cy: f32) -> (f32, f32, f32);

    /// Snapshot the current parameters as a [`Deformation`] consumable
    /// by subset operations.
    fn deformation(&self) -> Deformation;

    /// Overwrite the rigid-body components, leaving strain terms alone.
    fn insert_motion(&mut self, u: f32, v: f32, theta: f32);

    /// Add a translation increment to the current parameters.
    fn add_translation(&mut self, u: f32, v: f32);

    /// Seed the parameters from the persistence layer for one subset.
    ///
    /// Each enabled DOF family loads its prior solved value; with
    /// velocity-based projection configured and at least two solved
    /// steps behind us, translation and rotation instead get
    /// `prior + (prior - prior_prior)`. Disabled families stay at their
    /// defaults.
    fn initialize_from_fields(&mut self, store: &dyn FieldStore, subset_gid: u32);

    /// Persist the current parameters for one subset.
    fn save_fields(&self, store: &mut dyn FieldStore, subset_gid: u32);

    /// Zero the persisted values for one subset.
    fn reset_fields(&self, store: &mut dyn FieldStore, subset_gid: u32);
}

/// Build the shape-function variant the configuration selects.
pub fn shape_function_factory(config: &ShapeFunctionConfig) -> Box<dyn LocalShapeFunction> {
    if config.enable_projective {
        Box::new(ProjectiveShapeFunction::new())
    } else {
        Box::new(AffineShapeFunction::new())
    }
}
