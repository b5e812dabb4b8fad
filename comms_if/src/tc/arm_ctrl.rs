//! # Arm control telecommands

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use serde::{Deserialize, Serialize};
use structopt::StructOpt;

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// A requested end effector position in the arm's base frame.
///
/// `z` is only given for spatial arms. Units are the same as the arm's link
/// lengths.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f64,
    pub y: f64,
    pub z: Option<f64>,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// A command that can be completed by arm control.
#[derive(Debug, Clone, Serialize, Deserialize, StructOpt)]
pub enum ArmCmd {
    /// Move the head of the arm to a single position.
    ///
    /// The joint angles are calculated by inverse kinematics and the motor
    /// steps are relative to the last accepted position.
    #[structopt(name = "move")]
    MoveTo {
        /// X coordinate of the head in the base frame.
        #[structopt(allow_hyphen_values = true)]
        x: f64,

        /// Y coordinate of the head in the base frame.
        #[structopt(allow_hyphen_values = true)]
        y: f64,

        /// Z coordinate of the head in the base frame, spatial arms only.
        #[structopt(allow_hyphen_values = true)]
        z: Option<f64>,
    },

    /// Move the head through an ordered list of positions.
    ///
    /// One step demand is produced per position, in the given order. The
    /// points can't be given on the command line, use a waypoint script.
    #[structopt(name = "traj")]
    Trajectory {
        #[structopt(skip)]
        points: Vec<Waypoint>,
    },

    /// Return every joint to its zero angle.
    #[structopt(name = "home")]
    Home,

    /// Stop the arm, discarding any demands which have not been accepted yet.
    #[structopt(name = "stop")]
    Stop,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl Waypoint {
    pub fn planar(x: f64, y: f64) -> Self {
        Self { x, y, z: None }
    }

    pub fn spatial(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z: Some(z) }
    }
}

impl ArmCmd {
    /// The waypoints this command asks the arm to visit, in order.
    pub fn waypoints(&self) -> Vec<Waypoint> {
        match self {
            ArmCmd::MoveTo { x, y, z } => vec![Waypoint { x: *x, y: *y, z: *z }],
            ArmCmd::Trajectory { points } => points.clone(),
            ArmCmd::Home | ArmCmd::Stop => vec![],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_move() {
        let cmd = ArmCmd::from_iter_safe(&["arm", "move", "10", "5.5", "3"]).unwrap();
        assert_eq!(cmd.waypoints(), vec![Waypoint::spatial(10.0, 5.5, 3.0)]);

        let cmd = ArmCmd::from_iter_safe(&["arm", "move", "1", "2"]).unwrap();
        assert_eq!(cmd.waypoints(), vec![Waypoint::planar(1.0, 2.0)]);
    }

    #[test]
    fn test_no_waypoints() {
        assert!(ArmCmd::Home.waypoints().is_empty());
        assert!(ArmCmd::Stop.waypoints().is_empty());
    }
}
