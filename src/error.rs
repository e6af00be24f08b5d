//! Error types for VikaraDIC

use thiserror::Error;

/// VikaraDIC error type
#[derive(Error, Debug)]
pub enum DicError {
    /// A deformation vector had a length other than 6 (rigid + strain)
    /// or 9 (projective affine).
    #[error("Invalid deformation vector length {0}, expected 6 or 9")]
    InvalidDeformationLength(usize),

    /// The projective affine map had a zero homogeneous term (I == 0),
    /// making the map singular.
    #[error("Projective map is singular (I == 0)")]
    SingularProjectiveMap,

    /// A subset was constructed with no pixels (e.g. a conformal
    /// definition whose boundary shapes cover nothing).
    #[error("Subset footprint is empty")]
    EmptySubset,

    #[error("Image encode failed: {0}")]
    Encode(#[from] image::ImageError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, DicError>;
