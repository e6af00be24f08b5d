//! VikaraDIC - Subset deformation tracking core for digital image
//! correlation
//!
//! Given a reference image and a deformed image of the same physical
//! object, this crate tracks how a small, possibly non-convex, region
//! of pixels (a "subset") moves and deforms between frames. It owns the
//! subset pixel-state machine and the parametric shape-function motion
//! models; an external correlation optimizer drives both.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                  algorithms/                        │  ← Subset state machine,
//! │          (subset, shape_function)                   │    motion models
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │              fields/        image/                  │  ← Persistence seam,
//! │                                                     │    intensity buffers
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                     core/                           │  ← Foundation
//! │               (types, math)                         │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Control flow per correlation step
//!
//! 1. A barrier phase collects every subset's deformed footprint and
//!    installs the cross-subset blocking snapshots
//!    ([`run_blocking_phase`]).
//! 2. For each candidate deformation the optimizer proposes,
//!    [`Subset::turn_off_obstructed_pixels`] recomputes which pixels
//!    are obstructed or claimed; the optimizer reads
//!    [`Subset::num_active_pixels`], [`Subset::contrast_std_dev`] and
//!    [`Subset::noise_std_dev`] to judge subset health.
//! 3. After a candidate is accepted,
//!    [`Subset::turn_on_previously_obstructed_pixels`] reseeds pixels
//!    that are visible again, and the shape function persists its
//!    solution through the [`FieldStore`] seam.
//!
//! Out of scope by design: image decoding, the optimizer and its
//! convergence loop, the distributed mesh/field storage format, and
//! feature-detector bindings for initial guesses.

// ============================================================================
// Layer 1: Core foundation (no internal deps)
// ============================================================================
pub mod core;

// ============================================================================
// Layer 2: Infrastructure (depends on core)
// ============================================================================
pub mod error;
pub mod fields;
pub mod image;

// ============================================================================
// Layer 3: Algorithms (depends on core, fields, image)
// ============================================================================
pub mod algorithms;

// ============================================================================
// Public API re-exports
// ============================================================================

// Core types
pub use crate::core::types::{Deformation, PixelCoord, PixelRegion, PixelSet};

// Error handling
pub use error::{DicError, Result};

// Fields
pub use fields::{
    FieldSpec, FieldState, FieldStore, InMemoryFieldStore, ProjectionMethod, ShapeFunctionConfig,
};

// Image
pub use crate::image::IntensityImage;

// Algorithms - Subset
pub use algorithms::subset::{
    deformed_footprints, install_blocking_sets, run_blocking_phase, BoundaryShape, CircleBoundary,
    ConformalDef, IntensityField, ObstructionConfig, PolygonBoundary, Subset,
};

// Algorithms - Shape functions
pub use algorithms::shape_function::{
    shape_function_factory, AffineDof, AffineShapeFunction, LocalShapeFunction, ProjectiveDof,
    ProjectiveShapeFunction,
};
