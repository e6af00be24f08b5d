//! Candidate deformation passed from the optimizer to subset operations.

use serde::{Deserialize, Serialize};

use crate::error::{DicError, Result};

/// Wire-layout index of `u` in a 6-parameter deformation vector.
pub const DOF_U: usize = 0;
/// Wire-layout index of `v`.
pub const DOF_V: usize = 1;
/// Wire-layout index of `theta`.
pub const DOF_THETA: usize = 2;
/// Wire-layout index of `e_xx`.
pub const DOF_EX: usize = 3;
/// Wire-layout index of `e_yy`.
pub const DOF_EY: usize = 4;
/// Wire-layout index of `g_xy`.
pub const DOF_GXY: usize = 5;

/// Parameter count of the rigid + strain model.
pub const DEFORMATION_SIZE: usize = 6;
/// Parameter count of the projective affine model.
pub const DEFORMATION_SIZE_PROJECTIVE: usize = 9;

/// A candidate deformation of a subset.
///
/// Closed union of the two motion-model variants. The positional wire
/// layout (indices 0..=5 = u, v, theta, e_xx, e_yy, g_xy; indices
/// 0..=8 = A..I) lives entirely at the [`Deformation::from_slice`] /
/// [`Deformation::to_vec`] seam; everything downstream works with the
/// named fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Deformation {
    /// Rigid translation + rotation + normal and shear strain.
    RigidStrain {
        u: f32,
        v: f32,
        theta: f32,
        e_xx: f32,
        e_yy: f32,
        g_xy: f32,
    },
    /// General projective affine map `[A..I]` with `I != 0`.
    Projective { coeffs: [f32; 9] },
}

impl Deformation {
    /// A zero rigid-strain deformation (identity map).
    pub fn identity() -> Self {
        Self::RigidStrain {
            u: 0.0,
            v: 0.0,
            theta: 0.0,
            e_xx: 0.0,
            e_yy: 0.0,
            g_xy: 0.0,
        }
    }

    /// Pure translation.
    pub fn translation(u: f32, v: f32) -> Self {
        Self::RigidStrain {
            u,
            v,
            theta: 0.0,
            e_xx: 0.0,
            e_yy: 0.0,
            g_xy: 0.0,
        }
    }

    /// Parse a positional deformation vector.
    ///
    /// Length 6 yields the rigid + strain model, length 9 the projective
    /// model. Any other length is a configuration error, as is a
    /// projective vector with `I == 0` (singular map). Validating here
    /// keeps every downstream mapping call infallible.
    pub fn from_slice(raw: &[f32]) -> Result<Self> {
        match raw.len() {
            DEFORMATION_SIZE => Ok(Self::RigidStrain {
                u: raw[DOF_U],
                v: raw[DOF_V],
                theta: raw[DOF_THETA],
                e_xx: raw[DOF_EX],
                e_yy: raw[DOF_EY],
                g_xy: raw[DOF_GXY],
            }),
            DEFORMATION_SIZE_PROJECTIVE => {
                if raw[8] == 0.0 {
                    return Err(DicError::SingularProjectiveMap);
                }
                let mut coeffs = [0.0f32; 9];
                coeffs.copy_from_slice(raw);
                Ok(Self::Projective { coeffs })
            }
            n => Err(DicError::InvalidDeformationLength(n)),
        }
    }

    /// Serialize back to the positional wire layout.
    pub fn to_vec(&self) -> Vec<f32> {
        match *self {
            Self::RigidStrain {
                u,
                v,
                theta,
                e_xx,
                e_yy,
                g_xy,
            } => vec![u, v, theta, e_xx, e_yy, g_xy],
            Self::Projective { coeffs } => coeffs.to_vec(),
        }
    }

    /// Map a reference-configuration point to the deformed configuration.
    ///
    /// The rigid + strain variant applies the strain/shear linear part
    /// about the centroid `(cx, cy)`, then the rotation, then the
    /// translation. The projective variant applies the homogeneous map
    /// directly; the centroid is unused.
    #[inline]
    pub fn map(&self, x: f32, y: f32, cx: f32, cy: f32) -> (f32, f32) {
        match *self {
            Self::RigidStrain {
                u,
                v,
                theta,
                e_xx,
                e_yy,
                g_xy,
            } => {
                let (sin_t, cos_t) = theta.sin_cos();
                let dx = x - cx;
                let dy = y - cy;
                let big_dx = (1.0 + e_xx) * dx + g_xy * dy;
                let big_dy = (1.0 + e_yy) * dy + g_xy * dx;
                (
                    cos_t * big_dx - sin_t * big_dy + u + cx,
                    sin_t * big_dx + cos_t * big_dy + v + cy,
                )
            }
            Self::Projective { coeffs } => {
                let [a, b, c, d, e, f, g, h, i] = coeffs;
                let denom = g * x + h * y + i;
                ((a * x + b * y + c) / denom, (d * x + e * y + f) / denom)
            }
        }
    }

    /// Reduce to an equivalent rigid-body motion `(u, v, theta)`.
    ///
    /// The rigid + strain variant reports its components directly. For a
    /// projective map the translation is recovered by mapping the
    /// centroid and the rotation approximated as `atan2(B, A)` — exact
    /// only for shear-free maps.
    pub fn rigid_body_motion(&self, cx: f32, cy: f32) -> (f32, f32, f32) {
        match *self {
            Self::RigidStrain { u, v, theta, .. } => (u, v, theta),
            Self::Projective { coeffs } => {
                let (x_prime, y_prime) = self.map(cx, cy, cx, cy);
                (x_prime - cx, y_prime - cy, coeffs[1].atan2(coeffs[0]))
            }
        }
    }

    /// Translation component, used when shifting bounding boxes.
    pub fn translation_components(&self, cx: f32, cy: f32) -> (f32, f32) {
        let (u, v, _) = self.rigid_body_motion(cx, cy);
        (u, v)
    }
}
