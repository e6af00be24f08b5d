//! Projective affine shape function (9 parameters).

use super::LocalShapeFunction;
use crate::core::types::Deformation;
use crate::fields::{FieldSpec, FieldState, FieldStore, ProjectionMethod};

/// Coefficient of the projective map, in wire-layout order.
///
/// The map is `X = (Ax + By + C) / (Gx + Hy + I)`,
/// `Y = (Dx + Ey + F) / (Gx + Hy + I)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum ProjectiveDof {
    A = 0,
    B = 1,
    C = 2,
    D = 3,
    E = 4,
    F = 5,
    G = 6,
    H = 7,
    I = 8,
}

impl ProjectiveDof {
    /// All coefficients in parameter order.
    pub const ALL: [ProjectiveDof; 9] = [
        ProjectiveDof::A,
        ProjectiveDof::B,
        ProjectiveDof::C,
        ProjectiveDof::D,
        ProjectiveDof::E,
        ProjectiveDof::F,
        ProjectiveDof::G,
        ProjectiveDof::H,
        ProjectiveDof::I,
    ];

    /// Persistence field backing this coefficient.
    pub fn field_spec(self) -> FieldSpec {
        match self {
            ProjectiveDof::A => FieldSpec::AffineA,
            ProjectiveDof::B => FieldSpec::AffineB,
            ProjectiveDof::C => FieldSpec::AffineC,
            ProjectiveDof::D => FieldSpec::AffineD,
            ProjectiveDof::E => FieldSpec::AffineE,
            ProjectiveDof::F => FieldSpec::AffineF,
            ProjectiveDof::G => FieldSpec::AffineG,
            ProjectiveDof::H => FieldSpec::AffineH,
            ProjectiveDof::I => FieldSpec::AffineI,
        }
    }
}

/// Identity coefficients: maps every point to itself, `I = 1`.
const IDENTITY: [f32; 9] = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0];

/// 9-parameter projective affine motion model.
///
/// `clear()` resets to the identity map rather than all-zero so a
/// cleared instance always satisfies the `I != 0` invariant.
#[derive(Debug, Clone)]
pub struct ProjectiveShapeFunction {
    params: [f32; 9],
}

impl ProjectiveShapeFunction {
    /// Create as the identity map.
    pub fn new() -> Self {
        Self { params: IDENTITY }
    }

    /// Current value of one coefficient.
    #[inline]
    pub fn parameter(&self, dof: ProjectiveDof) -> f32 {
        self.params[dof as usize]
    }

    /// Set one coefficient.
    #[inline]
    pub fn set_parameter(&mut self, dof: ProjectiveDof, value: f32) {
        self.params[dof as usize] = value;
    }
}

impl Default for ProjectiveShapeFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalShapeFunction for ProjectiveShapeFunction {
    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn parameters(&self) -> &[f32] {
        &self.params
    }

    fn clear(&mut self) {
        self.params = IDENTITY;
    }

    fn map(&self, x: f32, y: f32, cx: f32, cy: f32) -> (f32, f32) {
        self.deformation().map(x, y, cx, cy)
    }

    fn rigid_body_motion(&self, cx: f32, cy: f32) -> (f32, f32, f32) {
        self.deformation().rigid_body_motion(cx, cy)
    }

    fn deformation(&self) -> Deformation {
        Deformation::Projective {
            coeffs: self.params,
        }
    }

    fn insert_motion(&mut self, u: f32, v: f32, theta: f32) {
        let (sin_t, cos_t) = theta.sin_cos();
        self.params = [cos_t, -sin_t, u, sin_t, cos_t, v, 0.0, 0.0, 1.0];
    }

    fn add_translation(&mut self, u: f32, v: f32) {
        // Post-compose a translation in homogeneous form.
        let [_, _, _, _, _, _, g, h, i] = self.params;
        self.params[ProjectiveDof::A as usize] += u * g;
        self.params[ProjectiveDof::B as usize] += u * h;
        self.params[ProjectiveDof::C as usize] += u * i;
        self.params[ProjectiveDof::D as usize] += v * g;
        self.params[ProjectiveDof::E as usize] += v * h;
        self.params[ProjectiveDof::F as usize] += v * i;
    }

    fn initialize_from_fields(&mut self, store: &dyn FieldStore, subset_gid: u32) {
        // Velocity extrapolation of individual homogeneous coefficients
        // is not meaningful; projective parameters always step-copy.
        if store.config().projection_method == ProjectionMethod::VelocityBased {
            log::debug!(
                "Subset {} projective parameters step-copy (velocity projection ignored)",
                subset_gid
            );
        }
        let mut loaded = [0.0f32; 9];
        for dof in ProjectiveDof::ALL {
            loaded[dof as usize] =
                store.field_value(subset_gid, dof.field_spec(), FieldState::Current);
        }
        if loaded[ProjectiveDof::I as usize] == 0.0 {
            // Nothing solved yet for this subset; stay at the identity.
            log::warn!(
                "Subset {} has no stored projective solution, keeping identity map",
                subset_gid
            );
            self.params = IDENTITY;
        } else {
            self.params = loaded;
        }
    }

    fn save_fields(&self, store: &mut dyn FieldStore, subset_gid: u32) {
        for dof in ProjectiveDof::ALL {
            store.set_field_value(subset_gid, dof.field_spec(), self.parameter(dof));
        }
    }

    fn reset_fields(&self, store: &mut dyn FieldStore, subset_gid: u32) {
        for (dof, &value) in ProjectiveDof::ALL.iter().zip(IDENTITY.iter()) {
            store.set_field_value(subset_gid, dof.field_spec(), value);
        }
    }
}
