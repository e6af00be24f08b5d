//! Core data types for subset deformation tracking.
//!
//! - [`PixelCoord`]: integer image coordinate, row-first
//! - [`PixelRegion`]: inclusive integer bounding box
//! - [`PixelSet`]: ordered pixel membership of a subset with centroid
//! - [`Deformation`]: candidate motion of a subset (rigid + strain or
//!   projective affine)

mod deformation;
mod pixel;

pub use deformation::{
    Deformation, DEFORMATION_SIZE, DEFORMATION_SIZE_PROJECTIVE, DOF_EX, DOF_EY, DOF_GXY,
    DOF_THETA, DOF_U, DOF_V,
};
pub use pixel::{PixelCoord, PixelRegion, PixelSet};
