//! Field-persistence seam between shape functions and the mesh layer.
//!
//! Solved motion parameters outlive a single correlation step: the
//! optimizer seeds each new frame from the previous frame's solution
//! (optionally extrapolating from the two most recent). The distributed
//! mesh that actually stores those values across subsets and frames is
//! out of scope; [`FieldStore`] abstracts the handful of reads and
//! writes the shape functions need, and [`InMemoryFieldStore`] is the
//! reference implementation used by tests and single-process runs.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Named scalar field of the subset solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldSpec {
    SubsetDisplacementX,
    SubsetDisplacementY,
    RotationZ,
    NormalStretchXx,
    NormalStretchYy,
    ShearStretchXy,
    AffineA,
    AffineB,
    AffineC,
    AffineD,
    AffineE,
    AffineF,
    AffineG,
    AffineH,
    AffineI,
}

/// Which step's value of a field to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldState {
    /// The most recently solved value.
    Current,
    /// The value from one step before the current one.
    PreviousStep,
}

/// How the initial guess for a new step is projected from history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProjectionMethod {
    /// Copy the previous step's solution unchanged.
    StepCopy,
    /// First-order extrapolation: `prior + (prior - prior_prior)`.
    ///
    /// Takes effect once at least two solved steps exist; earlier
    /// frames fall back to a plain copy.
    VelocityBased,
}

/// Which DOF families are solved for and which motion model is active.
///
/// Selected once per analysis run; a subset never mixes motion-model
/// variants within its lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeFunctionConfig {
    /// Solve for in-plane rotation.
    pub enable_rotation: bool,

    /// Solve for the normal strains `e_xx`, `e_yy`.
    pub enable_normal_strain: bool,

    /// Solve for the shear strain `g_xy`.
    pub enable_shear_strain: bool,

    /// Use the 9-parameter projective affine model instead of the
    /// rigid + strain model.
    pub enable_projective: bool,

    /// Initial-guess projection from prior steps.
    pub projection_method: ProjectionMethod,
}

impl Default for ShapeFunctionConfig {
    fn default() -> Self {
        Self {
            enable_rotation: true,
            enable_normal_strain: true,
            enable_shear_strain: true,
            enable_projective: false,
            projection_method: ProjectionMethod::StepCopy,
        }
    }
}

/// Read/write access to per-subset solution fields.
pub trait FieldStore {
    /// Value of `spec` for subset `subset_gid` at `state`. Fields that
    /// were never written read as zero.
    fn field_value(&self, subset_gid: u32, spec: FieldSpec, state: FieldState) -> f32;

    /// Write the current-step value of `spec` for subset `subset_gid`.
    fn set_field_value(&mut self, subset_gid: u32, spec: FieldSpec, value: f32);

    /// Index of the frame currently being solved.
    fn frame_id(&self) -> u32;

    /// Index of the first frame of the analysis.
    fn first_frame_id(&self) -> u32;

    /// Active DOF families and motion-model variant.
    fn config(&self) -> &ShapeFunctionConfig;
}

/// HashMap-backed [`FieldStore`] holding current and previous-step
/// values per `(subset, field)`.
#[derive(Debug, Clone)]
pub struct InMemoryFieldStore {
    /// value[0] = current, value[1] = previous step
    values: HashMap<(u32, FieldSpec), [f32; 2]>,
    frame_id: u32,
    first_frame_id: u32,
    config: ShapeFunctionConfig,
}

impl InMemoryFieldStore {
    /// Create an empty store starting at `first_frame_id`.
    pub fn new(first_frame_id: u32, config: ShapeFunctionConfig) -> Self {
        Self {
            values: HashMap::new(),
            frame_id: first_frame_id,
            first_frame_id,
            config,
        }
    }

    /// Advance to the next frame, rolling every field's current value
    /// into its previous-step slot.
    pub fn advance_frame(&mut self) {
        for slots in self.values.values_mut() {
            slots[1] = slots[0];
        }
        self.frame_id += 1;
        log::debug!("Field store advanced to frame {}", self.frame_id);
    }
}

impl FieldStore for InMemoryFieldStore {
    fn field_value(&self, subset_gid: u32, spec: FieldSpec, state: FieldState) -> f32 {
        let slots = match self.values.get(&(subset_gid, spec)) {
            Some(slots) => slots,
            None => return 0.0,
        };
        match state {
            FieldState::Current => slots[0],
            FieldState::PreviousStep => slots[1],
        }
    }

    fn set_field_value(&mut self, subset_gid: u32, spec: FieldSpec, value: f32) {
        self.values.entry((subset_gid, spec)).or_insert([0.0; 2])[0] = value;
    }

    fn frame_id(&self) -> u32 {
        self.frame_id
    }

    fn first_frame_id(&self) -> u32 {
        self.first_frame_id
    }

    fn config(&self) -> &ShapeFunctionConfig {
        &self.config
    }
}
