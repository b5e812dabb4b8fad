//! Arm control module
//!
//! Converts requested head positions into joint angles (inverse kinematics)
//! and joint angle changes into incremental stepper motor demands.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod arm_config;
mod batcher;
pub mod geometry;
mod params;
mod planar;
mod quantiser;
mod solver;
mod spatial;
mod state;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// Internal
pub use arm_config::*;
pub use batcher::*;
pub use params::*;
pub use planar::*;
pub use quantiser::*;
pub use solver::*;
pub use spatial::*;
pub use state::*;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Number of joints on a planar arm (shoulder, elbow).
pub const NUM_PLANAR_JOINTS: usize = 2;

/// Number of joints on a spatial arm (base, shoulder, elbow).
pub const NUM_SPATIAL_JOINTS: usize = 3;

/// Default half width of the base angle window inside which a spatial arm
/// solves elbow up.
///
/// Units: degrees
pub const DEFAULT_ELBOW_WINDOW_DEG: f64 = 30.0;

/// Slack on the edges of the elbow window, so base angles which are a whole
/// number of degrees land inside it whichever way they were calculated.
///
/// Units: radians
pub const ELBOW_WINDOW_TOLERANCE_RAD: f64 = 1e-9;

/// How far outside of `[-1, 1]` the elbow cosine may land before the solve
/// is rejected rather than clamped.
pub const ELBOW_COS_TOLERANCE: f64 = 1e-9;

/// Relative tolerance on the reach limit, points within it are not rescaled.
pub const REACH_REL_TOLERANCE: f64 = 1e-12;

/// Distances from the origin below this are treated as the origin itself,
/// where the direction to the target is undefined.
pub const ORIGIN_TOLERANCE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Possible errors that can occur during ArmCtrl operation.
#[derive(Debug, thiserror::Error)]
pub enum ArmCtrlError {
    #[error("Unreachable input: {0}")]
    UnreachableInput(String),

    #[error(
        "Elbow cosine {cos_elbow} is outside [-1, 1], the target cannot be reached with these \
         link lengths"
    )]
    NumericDegenerate { cos_elbow: f64 },

    #[error("Trajectory point {index} failed: {source}")]
    BatchIndexFailure {
        index: usize,
        source: Box<ArmCtrlError>,
    },

    #[error("Trajectory command contains no points")]
    EmptyTrajectory,

    #[error("Expected {expected} joint angles, found {found}")]
    WrongNumJoints { expected: usize, found: usize },

    #[error("Invalid motor axis: {0}")]
    InvalidAxis(String),

    #[error("Invalid arm parameters: {0}")]
    InvalidParams(String),

    #[error("Demand {index} was planned from a different pose than the last accepted one")]
    StalePlan { index: usize },

    #[error("Transport rejected demand {index}: {reason}")]
    TransportRejected { index: usize, reason: String },

    #[error("Arm control has not been initialised")]
    NotInitialised,

    #[error("Could not load the arm parameters: {0}")]
    ParamLoad(#[from] util::params::LoadError),

    #[error("Could not create the arm archives: {0}")]
    Archive(#[from] util::archive::ArchiveError),
}
