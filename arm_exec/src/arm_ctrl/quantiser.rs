//! Joint angle to motor step quantisation

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use serde::{Deserialize, Serialize};

// Internal
use super::{ArmCtrlError, JointAngles};
use comms_if::eqpt::stepper::{StepDems, MAX_AXES};
use util::maths::round_half_even;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One stepper motor driving a joint of the arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MotorAxisSpec {
    /// Index of the joint the motor drives, in solve order.
    pub joint: usize,

    /// Motor steps for one full revolution of the joint, including any gear
    /// reduction.
    pub steps_per_rev: u32,

    /// True if a positive step count turns the joint negatively.
    #[serde(default)]
    pub reversed: bool,
}

/// Converts changes in joint angles into step demands for each motor axis.
#[derive(Debug, Clone)]
pub struct StepQuantiser {
    axes: Vec<MotorAxisSpec>,
    policy: RoundingPolicy,
    num_joints: usize,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// How fractional steps are turned into whole ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// Drop the fractional part of every demand.
    ///
    /// The dropped fractions are lost, so over many moves the motor position
    /// can drift from the commanded angle by up to one step per move.
    Truncate,

    /// Round to the nearest step and carry the remainder into the next
    /// demand, so the motor never drifts by more than half a step.
    CarryRemainder,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for RoundingPolicy {
    fn default() -> Self {
        RoundingPolicy::Truncate
    }
}

impl StepQuantiser {
    /// Create a new quantiser for an arm with `num_joints` joints.
    ///
    /// Every axis must drive an existing joint and have a non-zero resolution,
    /// and there can be no more axes than a demand line can address.
    pub fn new(
        axes: Vec<MotorAxisSpec>,
        policy: RoundingPolicy,
        num_joints: usize,
    ) -> Result<Self, ArmCtrlError> {
        if axes.is_empty() {
            return Err(ArmCtrlError::InvalidAxis(
                "at least one motor axis is required".into(),
            ));
        }

        if axes.len() > MAX_AXES {
            return Err(ArmCtrlError::InvalidAxis(format!(
                "{} motor axes given, a demand can address at most {}",
                axes.len(),
                MAX_AXES
            )));
        }

        for (i, axis) in axes.iter().enumerate() {
            if axis.joint >= num_joints {
                return Err(ArmCtrlError::InvalidAxis(format!(
                    "axis {} drives joint {} but the arm only has {} joints",
                    i, axis.joint, num_joints
                )));
            }
            if axis.steps_per_rev == 0 {
                return Err(ArmCtrlError::InvalidAxis(format!(
                    "axis {} has zero steps per revolution",
                    i
                )));
            }
        }

        Ok(Self {
            axes,
            policy,
            num_joints,
        })
    }

    pub fn axes(&self) -> &[MotorAxisSpec] {
        &self.axes
    }

    pub fn num_axes(&self) -> usize {
        self.axes.len()
    }

    pub fn policy(&self) -> RoundingPolicy {
        self.policy
    }

    /// Number of joints the quantiser expects angles for.
    pub fn num_joints(&self) -> usize {
        self.num_joints
    }

    /// Residual of an axis set which has no fractional steps outstanding.
    pub fn zero_residual(&self) -> Vec<f64> {
        vec![0.0; self.axes.len()]
    }

    /// Calculate the step demands which move the arm from `previous` to `new`.
    ///
    /// `residual` is the per axis fractional step carried from the last
    /// accepted demand. The new residual is returned alongside the demands and
    /// should only replace the old one once the demands are accepted. Under
    /// `Truncate` the residual is always zero.
    pub fn quantise(
        &self,
        previous: &JointAngles,
        new: &JointAngles,
        residual: &[f64],
    ) -> Result<(StepDems, Vec<f64>), ArmCtrlError> {
        previous.check_len(self.num_joints)?;
        new.check_len(self.num_joints)?;

        if residual.len() != self.axes.len() {
            return Err(ArmCtrlError::InvalidAxis(format!(
                "expected a residual for each of the {} axes, found {}",
                self.axes.len(),
                residual.len()
            )));
        }

        if !previous.is_finite() || !new.is_finite() {
            return Err(ArmCtrlError::UnreachableInput(format!(
                "cannot quantise non-finite angles {:?} -> {:?}",
                previous.as_slice(),
                new.as_slice()
            )));
        }

        let mut steps = Vec::with_capacity(self.axes.len());
        let mut new_residual = Vec::with_capacity(self.axes.len());

        for (axis, carried) in self.axes.iter().zip(residual.iter()) {
            let prev_rad = previous[axis.joint];
            let new_rad = new[axis.joint];

            let (axis_steps, remainder) = match self.policy {
                RoundingPolicy::Truncate => {
                    (steps_between(prev_rad, new_rad, axis.steps_per_rev), 0.0)
                }
                RoundingPolicy::CarryRemainder => {
                    let exact = exact_steps(prev_rad, new_rad, axis.steps_per_rev) + carried;
                    let rounded = round_half_even(exact);
                    (rounded as i64, exact - rounded)
                }
            };

            // The residual is kept in joint direction, only the demand is
            // flipped
            steps.push(if axis.reversed { -axis_steps } else { axis_steps });
            new_residual.push(remainder);
        }

        Ok((StepDems::new(steps), new_residual))
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Fractional number of steps a motor with `steps_per_rev` resolution must
/// make to move a joint from `prev_rad` to `new_rad`.
pub fn exact_steps(prev_rad: f64, new_rad: f64, steps_per_rev: u32) -> f64 {
    let delta_deg = new_rad.to_degrees() - prev_rad.to_degrees();
    delta_deg * f64::from(steps_per_rev) / 360.0
}

/// Whole number of steps to move a joint from `prev_rad` to `new_rad`,
/// truncated towards zero.
pub fn steps_between(prev_rad: f64, new_rad: f64, steps_per_rev: u32) -> i64 {
    exact_steps(prev_rad, new_rad, steps_per_rev).trunc() as i64
}
