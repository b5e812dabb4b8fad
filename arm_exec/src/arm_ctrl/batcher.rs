//! Trajectory batching
//!
//! The batcher owns the last accepted pose of the arm. Planning a trajectory
//! never changes it, so a plan can be inspected, archived or thrown away
//! freely. The pose only moves forward when planned steps are accepted, which
//! happens one step at a time and in order, usually as the transport confirms
//! each demand.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, trace};
use serde::Serialize;
use std::fmt;

// Internal
use super::*;
use comms_if::eqpt::stepper::StepDems;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Something which can take step demands and pass them on to the motors.
pub trait StepSink {
    type Error: fmt::Display;

    /// Send one demand. Returning `Ok` means the demand was accepted and the
    /// motors will execute it.
    fn send(&mut self, index: usize, dems: &StepDems) -> Result<(), Self::Error>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// One planned point of a trajectory.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlannedStep {
    /// Position of the point in the requested trajectory.
    pub index: usize,

    /// The inverse kinematics solution, `None` if the step was planned
    /// directly to a pose.
    pub solution: Option<Solution>,

    /// The pose the step was planned from.
    pub from: JointAngles,

    /// The pose the arm will be in once the step is executed.
    pub angles: JointAngles,

    /// The motor demands moving the arm from `from` to `angles`.
    pub dems: StepDems,

    /// Fractional steps outstanding once the step is executed.
    pub residual: Vec<f64>,
}

/// An ordered, planned sequence of steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Trajectory {
    pub steps: Vec<PlannedStep>,
}

/// Plans and commits trajectories for one arm.
pub struct TrajectoryBatcher {
    solver: Box<dyn Solver>,
    quantiser: StepQuantiser,

    /// Last accepted pose.
    previous: JointAngles,

    /// Fractional steps outstanding at the last accepted pose.
    residual: Vec<f64>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Trajectory {
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// The step demands of every point, in order.
    pub fn dems(&self) -> Vec<StepDems> {
        self.steps.iter().map(|s| s.dems.clone()).collect()
    }

    /// The pose the arm ends up in if every step is executed.
    pub fn final_pose(&self) -> Option<&JointAngles> {
        self.steps.last().map(|s| &s.angles)
    }

    /// Number of points which had to be moved into the arm's reach.
    pub fn num_clamped(&self) -> usize {
        self.steps
            .iter()
            .filter(|s| s.solution.as_ref().map(|sol| sol.clamped).unwrap_or(false))
            .count()
    }

    /// Number of points solved with the given elbow configuration.
    pub fn num_elbow(&self, elbow: ElbowConfig) -> usize {
        self.steps
            .iter()
            .filter(|s| s.solution.as_ref().map(|sol| sol.elbow == elbow).unwrap_or(false))
            .count()
    }
}

impl fmt::Debug for TrajectoryBatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrajectoryBatcher")
            .field("num_joints", &self.solver.num_joints())
            .field("quantiser", &self.quantiser)
            .field("previous", &self.previous)
            .field("residual", &self.residual)
            .finish()
    }
}

impl TrajectoryBatcher {
    /// Create a new batcher with the arm starting at the all zero pose.
    pub fn new(solver: Box<dyn Solver>, quantiser: StepQuantiser) -> Result<Self, ArmCtrlError> {
        if solver.num_joints() != quantiser.num_joints() {
            return Err(ArmCtrlError::WrongNumJoints {
                expected: solver.num_joints(),
                found: quantiser.num_joints(),
            });
        }

        Ok(Self {
            previous: JointAngles::zeros(solver.num_joints()),
            residual: quantiser.zero_residual(),
            solver,
            quantiser,
        })
    }

    /// Start the arm from the given pose instead of all zeros.
    pub fn with_initial_pose(mut self, pose: JointAngles) -> Result<Self, ArmCtrlError> {
        pose.check_len(self.solver.num_joints())?;
        if !pose.is_finite() {
            return Err(ArmCtrlError::UnreachableInput(format!(
                "initial pose {:?} is not finite",
                pose.as_slice()
            )));
        }

        self.previous = pose;
        Ok(self)
    }

    pub fn solver(&self) -> &dyn Solver {
        self.solver.as_ref()
    }

    pub fn quantiser(&self) -> &StepQuantiser {
        &self.quantiser
    }

    /// The last accepted pose of the arm.
    pub fn previous_pose(&self) -> &JointAngles {
        &self.previous
    }

    /// Fractional steps outstanding at the last accepted pose.
    pub fn residual(&self) -> &[f64] {
        &self.residual
    }

    /// Plan a trajectory through the targets, starting at the last accepted
    /// pose.
    ///
    /// Each point is planned from the pose reached at the one before it. If
    /// any point fails the whole plan fails with the index of that point.
    pub fn plan(&self, targets: &[TargetPoint]) -> Result<Trajectory, ArmCtrlError> {
        let mut pose = self.previous.clone();
        let mut residual = self.residual.clone();
        let mut steps = Vec::with_capacity(targets.len());

        for (index, target) in targets.iter().enumerate() {
            let at_index = |e| ArmCtrlError::BatchIndexFailure {
                index,
                source: Box::new(e),
            };

            let solution = self.solver.inverse(target, &pose).map_err(at_index)?;
            let (dems, new_residual) = self
                .quantiser
                .quantise(&pose, &solution.angles, &residual)
                .map_err(at_index)?;

            trace!("Planned point {}: {}", index, dems);

            let angles = solution.angles.clone();
            steps.push(PlannedStep {
                index,
                solution: Some(solution),
                from: pose,
                angles: angles.clone(),
                dems,
                residual: new_residual.clone(),
            });

            pose = angles;
            residual = new_residual;
        }

        debug!("Planned trajectory of {} points", steps.len());

        Ok(Trajectory { steps })
    }

    /// Plan a single step straight to a set of joint angles.
    pub fn plan_to_pose(&self, pose: &JointAngles) -> Result<Trajectory, ArmCtrlError> {
        pose.check_len(self.solver.num_joints())?;

        let (dems, residual) = self
            .quantiser
            .quantise(&self.previous, pose, &self.residual)?;

        Ok(Trajectory {
            steps: vec![PlannedStep {
                index: 0,
                solution: None,
                from: self.previous.clone(),
                angles: pose.clone(),
                dems,
                residual,
            }],
        })
    }

    /// Mark a planned step as executed, moving the arm's pose to the end of
    /// it.
    ///
    /// The step must have been planned from the current pose, so steps of a
    /// trajectory have to be accepted in order.
    pub fn accept(&mut self, step: &PlannedStep) -> Result<(), ArmCtrlError> {
        self.check_fresh(step)?;

        self.previous = step.angles.clone();
        self.residual = step.residual.clone();

        Ok(())
    }

    /// Send each step of the trajectory to the sink in order, accepting it
    /// when the sink does.
    ///
    /// Stops at the first rejected step, leaving the arm at the last accepted
    /// one. Returns the number of steps accepted.
    pub fn submit<S: StepSink>(
        &mut self,
        trajectory: &Trajectory,
        sink: &mut S,
    ) -> Result<usize, ArmCtrlError> {
        let mut num_accepted = 0;

        for step in trajectory.steps.iter() {
            self.check_fresh(step)?;

            sink.send(step.index, &step.dems)
                .map_err(|e| ArmCtrlError::TransportRejected {
                    index: step.index,
                    reason: e.to_string(),
                })?;

            self.accept(step)?;
            num_accepted += 1;
        }

        Ok(num_accepted)
    }

    /// Forget the accepted pose, returning to all zeros.
    pub fn reset(&mut self) {
        self.previous = JointAngles::zeros(self.solver.num_joints());
        self.residual = self.quantiser.zero_residual();
    }

    fn check_fresh(&self, step: &PlannedStep) -> Result<(), ArmCtrlError> {
        if step.from != self.previous {
            Err(ArmCtrlError::StalePlan { index: step.index })
        } else {
            Ok(())
        }
    }
}
