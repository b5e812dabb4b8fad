//! Three joint spatial arm kinematics
//!
//! The spatial arm is a base rotating about the vertical axis which carries a
//! planar shoulder and elbow. The inverse problem is split into the base
//! angle, found from the direction of the target in the XY plane, and a
//! planar solve in the vertical plane containing the target, on the radial
//! distance `r` and height `z`.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Point3;
use serde::{Deserialize, Serialize};

// Internal
use super::geometry::{clamp_to_inner_reach, clamp_to_reach};
use super::solver::check_target;
use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Solver for an arm with a base, shoulder and elbow.
#[derive(Debug, Clone)]
pub struct SpatialSolver {
    links: LinkLengths,
    policy: ElbowPolicy,
    clamp_inner: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How the spatial solver picks between elbow up and elbow down.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ElbowPolicy {
    /// Always use the same elbow solution.
    Fixed { elbow: ElbowConfig },

    /// Choose based on the base angle.
    ///
    /// Base angles with magnitude up to and including `half_width_deg` use the
    /// `inside` solution, all others the `outside` one.
    BaseAngleWindow {
        half_width_deg: f64,
        inside: ElbowConfig,
        outside: ElbowConfig,
    },
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for ElbowPolicy {
    fn default() -> Self {
        ElbowPolicy::BaseAngleWindow {
            half_width_deg: DEFAULT_ELBOW_WINDOW_DEG,
            inside: ElbowConfig::Up,
            outside: ElbowConfig::Down,
        }
    }
}

impl ElbowPolicy {
    /// Pick the elbow solution for a base angle in radians.
    pub fn select(&self, base_rad: f64) -> ElbowConfig {
        match *self {
            ElbowPolicy::Fixed { elbow } => elbow,
            ElbowPolicy::BaseAngleWindow {
                half_width_deg,
                inside,
                outside,
            } => {
                if base_rad.abs() <= half_width_deg.to_radians() + ELBOW_WINDOW_TOLERANCE_RAD {
                    inside
                } else {
                    outside
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        match self {
            ElbowPolicy::BaseAngleWindow { half_width_deg, .. }
                if !half_width_deg.is_finite() || *half_width_deg < 0.0 =>
            {
                Err(ArmCtrlError::InvalidParams(format!(
                    "elbow window half width must be finite and non-negative, found {}",
                    half_width_deg
                )))
            }
            _ => Ok(()),
        }
    }
}

impl SpatialSolver {
    pub fn new(links: LinkLengths, policy: ElbowPolicy) -> Result<Self, ArmCtrlError> {
        links.validate()?;
        policy.validate()?;

        Ok(Self {
            links,
            policy,
            clamp_inner: false,
        })
    }

    /// Push targets inside the inner reach out onto it instead of rejecting
    /// them.
    pub fn with_inner_clamp(mut self, clamp_inner: bool) -> Self {
        self.clamp_inner = clamp_inner;
        self
    }

    pub fn policy(&self) -> &ElbowPolicy {
        &self.policy
    }
}

impl Solver for SpatialSolver {
    fn num_joints(&self) -> usize {
        NUM_SPATIAL_JOINTS
    }

    fn link_lengths(&self) -> &LinkLengths {
        &self.links
    }

    fn inverse(
        &self,
        target: &TargetPoint,
        previous: &JointAngles,
    ) -> Result<Solution, ArmCtrlError> {
        check_target(target, ArmVariant::Spatial)?;
        previous.check_len(NUM_SPATIAL_JOINTS)?;

        let mut solved = clamp_to_reach(target, &self.links);
        if self.clamp_inner {
            solved = clamp_to_inner_reach(&solved, &self.links);
        }

        let c = solved.coords();
        let (x, y, z) = (c[0], c[1], c[2]);
        let r = x.hypot(y);

        // Directly above or below the base any base angle works, keep the
        // current one
        let base_rad = if r <= ORIGIN_TOLERANCE {
            previous[0]
        } else {
            y.atan2(x)
        };

        let elbow = self.policy.select(base_rad);
        let (shoulder_rad, elbow_rad) =
            inverse_planar(r, z, &self.links, elbow, previous[1])?;

        debug!(
            "Spatial IK {:?} -> base {:.3} deg, shoulder {:.3} deg, elbow {:.3} deg ({:?})",
            c,
            base_rad.to_degrees(),
            shoulder_rad.to_degrees(),
            elbow_rad.to_degrees(),
            elbow
        );

        Ok(Solution {
            angles: JointAngles::from_rad(vec![base_rad, shoulder_rad, elbow_rad]),
            clamped: solved != *target,
            target: solved,
            elbow,
        })
    }

    fn forward(&self, angles: &JointAngles) -> Result<ArmPose, ArmCtrlError> {
        angles.check_len(NUM_SPATIAL_JOINTS)?;
        if !angles.is_finite() {
            return Err(ArmCtrlError::UnreachableInput(format!(
                "joint angles {:?} are not finite",
                angles.as_slice()
            )));
        }

        let (elbow, head) = forward_spatial(angles[0], angles[1], angles[2], &self.links);

        Ok(ArmPose {
            elbow: TargetPoint::Spatial(elbow),
            head: TargetPoint::Spatial(head),
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Positions of the elbow and head of a spatial arm.
pub fn forward_spatial(
    base_rad: f64,
    shoulder_rad: f64,
    elbow_rad: f64,
    links: &LinkLengths,
) -> (Point3<f64>, Point3<f64>) {
    // Solve in the vertical plane of the arm, x is radial and y is up, then
    // rotate that plane about Z
    let (elbow_rz, head_rz) = forward_planar(shoulder_rad, elbow_rad, links);
    let (sin_base, cos_base) = base_rad.sin_cos();

    let to_3d = |r: f64, z: f64| Point3::new(r * cos_base, r * sin_base, z);

    (
        to_3d(elbow_rz.x, elbow_rz.y),
        to_3d(head_rz.x, head_rz.y),
    )
}
