//! Kinematic solver interface

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{
    ArmCtrlError, ArmPose, ElbowConfig, JointAngles, LinkLengths, TargetPoint,
    NUM_PLANAR_JOINTS, NUM_SPATIAL_JOINTS,
};

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Inverse and forward kinematics for one arm geometry.
///
/// Solvers are stateless. Anything they need to know about the pose the arm
/// is coming from is passed in as `previous`.
pub trait Solver: Send + Sync {
    /// Number of joints, and so of angles in a solution.
    fn num_joints(&self) -> usize;

    /// The link lengths of the arm.
    fn link_lengths(&self) -> &LinkLengths;

    /// Find the joint angles which put the head at the target.
    ///
    /// Targets out of reach are clamped onto the reach boundary first. The
    /// previous pose is used to hold angles which the target leaves
    /// undefined (a target at the origin for example).
    fn inverse(
        &self,
        target: &TargetPoint,
        previous: &JointAngles,
    ) -> Result<Solution, ArmCtrlError>;

    /// Find the positions of the elbow and head for the given joint angles.
    fn forward(&self, angles: &JointAngles) -> Result<ArmPose, ArmCtrlError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Result of an inverse kinematics solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    /// The joint angles reaching the target.
    pub angles: JointAngles,

    /// The target actually solved for, after reach clamping.
    pub target: TargetPoint,

    /// True if the requested target had to be moved to be reachable.
    pub clamped: bool,

    /// Which elbow solution was chosen.
    pub elbow: ElbowConfig,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// The geometries of arm that can be solved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmVariant {
    /// Shoulder and elbow moving in a single plane.
    Planar,

    /// A base rotating about the vertical axis carrying a planar shoulder
    /// and elbow.
    Spatial,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl ArmVariant {
    /// Number of joints on this variant of arm.
    pub fn num_joints(&self) -> usize {
        match self {
            ArmVariant::Planar => NUM_PLANAR_JOINTS,
            ArmVariant::Spatial => NUM_SPATIAL_JOINTS,
        }
    }

    /// Number of coordinates in a target for this variant of arm.
    pub fn target_dims(&self) -> usize {
        match self {
            ArmVariant::Planar => 2,
            ArmVariant::Spatial => 3,
        }
    }
}

/// Check a target is usable at all before attempting a solve.
pub(crate) fn check_target(
    target: &TargetPoint,
    variant: ArmVariant,
) -> Result<(), ArmCtrlError> {
    if target.dims() != variant.target_dims() {
        return Err(ArmCtrlError::UnreachableInput(format!(
            "a {:?} arm needs {} coordinates, found {}",
            variant,
            variant.target_dims(),
            target.dims()
        )));
    }

    if !target.is_finite() {
        return Err(ArmCtrlError::UnreachableInput(format!(
            "target {:?} is not finite",
            target.coords()
        )));
    }

    Ok(())
}
