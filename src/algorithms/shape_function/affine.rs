//! Rigid + strain shape function (6 parameters).

use super::LocalShapeFunction;
use crate::core::types::Deformation;
use crate::fields::{FieldSpec, FieldState, FieldStore, ProjectionMethod};

/// Degree of freedom of the rigid + strain model, in wire-layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum AffineDof {
    U = 0,
    V = 1,
    Theta = 2,
    Exx = 3,
    Eyy = 4,
    Gxy = 5,
}

impl AffineDof {
    /// All DOFs in parameter order.
    pub const ALL: [AffineDof; 6] = [
        AffineDof::U,
        AffineDof::V,
        AffineDof::Theta,
        AffineDof::Exx,
        AffineDof::Eyy,
        AffineDof::Gxy,
    ];

    /// Persistence field backing this DOF.
    pub fn field_spec(self) -> FieldSpec {
        match self {
            AffineDof::U => FieldSpec::SubsetDisplacementX,
            AffineDof::V => FieldSpec::SubsetDisplacementY,
            AffineDof::Theta => FieldSpec::RotationZ,
            AffineDof::Exx => FieldSpec::NormalStretchXx,
            AffineDof::Eyy => FieldSpec::NormalStretchYy,
            AffineDof::Gxy => FieldSpec::ShearStretchXy,
        }
    }
}

/// 6-parameter motion model: translation, rotation, normal strains,
/// shear. Parameters live in a fixed array indexed by [`AffineDof`], so
/// the mapping hot path never does a name lookup.
#[derive(Debug, Clone)]
pub struct AffineShapeFunction {
    params: [f32; 6],
}

impl AffineShapeFunction {
    /// Create with all parameters zero (the identity map).
    pub fn new() -> Self {
        Self { params: [0.0; 6] }
    }

    /// Current value of one DOF.
    #[inline]
    pub fn parameter(&self, dof: AffineDof) -> f32 {
        self.params[dof as usize]
    }

    /// Set one DOF.
    #[inline]
    pub fn set_parameter(&mut self, dof: AffineDof, value: f32) {
        self.params[dof as usize] = value;
    }
}

impl Default for AffineShapeFunction {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalShapeFunction for AffineShapeFunction {
    fn num_params(&self) -> usize {
        self.params.len()
    }

    fn parameters(&self) -> &[f32] {
        &self.params
    }

    fn clear(&mut self) {
        self.params = [0.0; 6];
    }

    fn map(&self, x: f32, y: f32, cx: f32, cy: f32) -> (f32, f32) {
        self.deformation().map(x, y, cx, cy)
    }

    fn rigid_body_motion(&self, _cx: f32, _cy: f32) -> (f32, f32, f32) {
        (
            self.parameter(AffineDof::U),
            self.parameter(AffineDof::V),
            self.parameter(AffineDof::Theta),
        )
    }

    fn deformation(&self) -> Deformation {
        Deformation::RigidStrain {
            u: self.parameter(AffineDof::U),
            v: self.parameter(AffineDof::V),
            theta: self.parameter(AffineDof::Theta),
            e_xx: self.parameter(AffineDof::Exx),
            e_yy: self.parameter(AffineDof::Eyy),
            g_xy: self.parameter(AffineDof::Gxy),
        }
    }

    fn insert_motion(&mut self, u: f32, v: f32, theta: f32) {
        self.set_parameter(AffineDof::U, u);
        self.set_parameter(AffineDof::V, v);
        self.set_parameter(AffineDof::Theta, theta);
    }

    fn add_translation(&mut self, u: f32, v: f32) {
        self.params[AffineDof::U as usize] += u;
        self.params[AffineDof::V as usize] += v;
    }

    fn initialize_from_fields(&mut self, store: &dyn FieldStore, subset_gid: u32) {
        let config = store.config();
        // Two prior solved steps must exist before extrapolating.
        let extrapolate = config.projection_method == ProjectionMethod::VelocityBased
            && store.frame_id() > store.first_frame_id() + 2;

        let prior = |spec: FieldSpec| store.field_value(subset_gid, spec, FieldState::Current);
        let projected = |spec: FieldSpec| {
            let p = store.field_value(subset_gid, spec, FieldState::Current);
            let pp = store.field_value(subset_gid, spec, FieldState::PreviousStep);
            if extrapolate { p + (p - pp) } else { p }
        };

        // Translation is always solved for.
        self.set_parameter(AffineDof::U, projected(FieldSpec::SubsetDisplacementX));
        self.set_parameter(AffineDof::V, projected(FieldSpec::SubsetDisplacementY));

        if config.enable_rotation {
            log::debug!("Subset {} rotation is enabled", subset_gid);
            self.set_parameter(AffineDof::Theta, projected(FieldSpec::RotationZ));
        }
        if config.enable_normal_strain {
            log::debug!("Subset {} normal strain is enabled", subset_gid);
            // Strains carry over as-is; extrapolating them amplifies noise.
            self.set_parameter(AffineDof::Exx, prior(FieldSpec::NormalStretchXx));
            self.set_parameter(AffineDof::Eyy, prior(FieldSpec::NormalStretchYy));
        }
        if config.enable_shear_strain {
            log::debug!("Subset {} shear strain is enabled", subset_gid);
            self.set_parameter(AffineDof::Gxy, prior(FieldSpec::ShearStretchXy));
        }

        log::debug!(
            "Subset {} initialized: u {} v {} theta {} e_xx {} e_yy {} g_xy {}",
            subset_gid,
            self.parameter(AffineDof::U),
            self.parameter(AffineDof::V),
            self.parameter(AffineDof::Theta),
            self.parameter(AffineDof::Exx),
            self.parameter(AffineDof::Eyy),
            self.parameter(AffineDof::Gxy),
        );
    }

    fn save_fields(&self, store: &mut dyn FieldStore, subset_gid: u32) {
        for dof in AffineDof::ALL {
            store.set_field_value(subset_gid, dof.field_spec(), self.parameter(dof));
        }
    }

    fn reset_fields(&self, store: &mut dyn FieldStore, subset_gid: u32) {
        for dof in AffineDof::ALL {
            store.set_field_value(subset_gid, dof.field_spec(), 0.0);
        }
    }
}
