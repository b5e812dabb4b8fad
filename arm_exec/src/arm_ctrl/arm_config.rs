//! Arm configuration structures

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use nalgebra::{Point2, Point3};
use serde::{Deserialize, Serialize};
use std::ops::Index;

// Internal
use super::ArmCtrlError;
use comms_if::tc::arm_ctrl::Waypoint;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Lengths of the two articulated links of the arm.
///
/// Units are arbitrary but must match the units of the targets given to the
/// solver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinkLengths {
    /// The length of the shoulder link, from the shoulder joint to the elbow.
    pub shoulder: f64,

    /// The length of the elbow link, from the elbow joint to the head.
    pub elbow: f64,
}

/// A requested position of the head of the arm in the arm's base frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TargetPoint {
    /// A point in the plane of a planar arm.
    Planar(Point2<f64>),

    /// A point in space for a spatial arm, Z is up.
    Spatial(Point3<f64>),
}

/// Angles of each joint of the arm, in solve order.
///
/// For a spatial arm this is `[base, shoulder, elbow]`, for a planar arm
/// `[shoulder, elbow]`. The shoulder angle is measured from the horizontal,
/// the elbow angle relative to the shoulder link.
///
/// Units: radians
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JointAngles(Vec<f64>);

/// Positions of the joints of the arm, as calculated by forward kinematics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ArmPose {
    /// Position of the elbow joint.
    pub elbow: TargetPoint,

    /// Position of the head of the arm.
    pub head: TargetPoint,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Which of the two mirror image solutions to choose for a reachable target.
///
/// Elbow down has a positive (or zero) elbow angle, elbow up a negative one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElbowConfig {
    Up,
    Down,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl LinkLengths {
    /// Create a new set of link lengths, checking that both are positive.
    pub fn new(shoulder: f64, elbow: f64) -> Result<Self, ArmCtrlError> {
        let links = Self { shoulder, elbow };
        links.validate()?;
        Ok(links)
    }

    /// Check that both lengths are finite and strictly positive.
    pub fn validate(&self) -> Result<(), ArmCtrlError> {
        for (name, length) in &[("shoulder", self.shoulder), ("elbow", self.elbow)] {
            if !length.is_finite() || *length <= 0.0 {
                return Err(ArmCtrlError::UnreachableInput(format!(
                    "{} link length must be positive and finite, found {}",
                    name, length
                )));
            }
        }

        Ok(())
    }

    /// Furthest distance from the shoulder the head can reach.
    pub fn max_reach(&self) -> f64 {
        self.shoulder + self.elbow
    }

    /// Closest distance to the shoulder the head can reach.
    pub fn min_reach(&self) -> f64 {
        (self.shoulder - self.elbow).abs()
    }
}

impl TargetPoint {
    pub fn planar(x: f64, y: f64) -> Self {
        TargetPoint::Planar(Point2::new(x, y))
    }

    pub fn spatial(x: f64, y: f64, z: f64) -> Self {
        TargetPoint::Spatial(Point3::new(x, y, z))
    }

    /// Number of coordinates in the point.
    pub fn dims(&self) -> usize {
        match self {
            TargetPoint::Planar(_) => 2,
            TargetPoint::Spatial(_) => 3,
        }
    }

    /// The coordinates of the point as a slice, `[x, y]` or `[x, y, z]`.
    pub fn coords(&self) -> &[f64] {
        match self {
            TargetPoint::Planar(p) => p.coords.as_slice(),
            TargetPoint::Spatial(p) => p.coords.as_slice(),
        }
    }

    /// True if no coordinate is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.coords().iter().all(|c| c.is_finite())
    }

    /// Scale every coordinate of the point by `factor`.
    pub fn scaled(&self, factor: f64) -> Self {
        match self {
            TargetPoint::Planar(p) => TargetPoint::Planar(*p * factor),
            TargetPoint::Spatial(p) => TargetPoint::Spatial(*p * factor),
        }
    }

    /// Largest per-coordinate difference between this point and another of
    /// the same dimension, or `None` if the dimensions differ.
    pub fn max_abs_diff(&self, other: &TargetPoint) -> Option<f64> {
        if self.dims() != other.dims() {
            return None;
        }

        Some(
            self.coords()
                .iter()
                .zip(other.coords().iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0, f64::max),
        )
    }
}

impl From<Waypoint> for TargetPoint {
    fn from(wp: Waypoint) -> Self {
        match wp.z {
            Some(z) => TargetPoint::spatial(wp.x, wp.y, z),
            None => TargetPoint::planar(wp.x, wp.y),
        }
    }
}

impl JointAngles {
    /// All joints at zero, the pose of the arm at the start of a session.
    pub fn zeros(num_joints: usize) -> Self {
        JointAngles(vec![0.0; num_joints])
    }

    /// Build from angles in radians.
    pub fn from_rad(angles_rad: Vec<f64>) -> Self {
        JointAngles(angles_rad)
    }

    /// Build from angles in degrees.
    pub fn from_deg(angles_deg: &[f64]) -> Self {
        JointAngles(angles_deg.iter().map(|a| a.to_radians()).collect())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// The angles converted to degrees.
    pub fn to_deg(&self) -> Vec<f64> {
        self.0.iter().map(|a| a.to_degrees()).collect()
    }

    /// True if no angle is NaN or infinite.
    pub fn is_finite(&self) -> bool {
        self.0.iter().all(|a| a.is_finite())
    }

    /// Check that there is one angle per joint of the arm.
    pub fn check_len(&self, num_joints: usize) -> Result<(), ArmCtrlError> {
        if self.len() != num_joints {
            return Err(ArmCtrlError::WrongNumJoints {
                expected: num_joints,
                found: self.len(),
            });
        }
        Ok(())
    }
}

impl Index<usize> for JointAngles {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.0[index]
    }
}

impl Default for ElbowConfig {
    fn default() -> Self {
        ElbowConfig::Down
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_link_validation() {
        assert!(LinkLengths::new(10.0, 5.0).is_ok());
        assert!(LinkLengths::new(0.0, 5.0).is_err());
        assert!(LinkLengths::new(10.0, -1.0).is_err());
        assert!(LinkLengths::new(std::f64::NAN, 5.0).is_err());

        let links = LinkLengths::new(21.0, 15.0).unwrap();
        assert_eq!(links.max_reach(), 36.0);
        assert_eq!(links.min_reach(), 6.0);
    }

    #[test]
    fn test_target_point() {
        let p = TargetPoint::spatial(1.0, 2.0, 3.0);
        assert_eq!(p.dims(), 3);
        assert_eq!(p.coords(), &[1.0, 2.0, 3.0]);
        assert_eq!(p.scaled(2.0), TargetPoint::spatial(2.0, 4.0, 6.0));
        assert!(!TargetPoint::planar(std::f64::INFINITY, 0.0).is_finite());

        assert_eq!(
            TargetPoint::from(Waypoint::planar(4.0, 5.0)),
            TargetPoint::planar(4.0, 5.0)
        );
        assert_eq!(p.max_abs_diff(&TargetPoint::spatial(1.5, 2.0, 2.0)), Some(1.0));
        assert_eq!(p.max_abs_diff(&TargetPoint::planar(1.0, 2.0)), None);
    }

    #[test]
    fn test_joint_angles() {
        let a = JointAngles::from_deg(&[90.0, -45.0]);
        assert_eq!(a.len(), 2);
        assert!((a[0] - std::f64::consts::FRAC_PI_2).abs() < 1e-15);
        assert!(a.check_len(2).is_ok());
        assert!(matches!(
            a.check_len(3),
            Err(ArmCtrlError::WrongNumJoints {
                expected: 3,
                found: 2
            })
        ));
        assert_eq!(JointAngles::zeros(3).as_slice(), &[0.0, 0.0, 0.0]);
    }
}
