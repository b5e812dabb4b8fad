//! Two link planar arm kinematics

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::debug;
use nalgebra::Point2;

// Internal
use super::geometry::{clamp_to_inner_reach, clamp_to_reach};
use super::solver::check_target;
use super::*;
use util::maths::clamp;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Solver for an arm with a shoulder and an elbow moving in one plane.
#[derive(Debug, Clone)]
pub struct PlanarSolver {
    links: LinkLengths,
    elbow: ElbowConfig,
    clamp_inner: bool,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl PlanarSolver {
    /// Create a new solver which always picks the given elbow solution.
    pub fn new(links: LinkLengths, elbow: ElbowConfig) -> Result<Self, ArmCtrlError> {
        links.validate()?;

        Ok(Self {
            links,
            elbow,
            clamp_inner: false,
        })
    }

    /// Push targets inside the inner reach out onto it instead of rejecting
    /// them.
    pub fn with_inner_clamp(mut self, clamp_inner: bool) -> Self {
        self.clamp_inner = clamp_inner;
        self
    }

    /// The elbow solution this solver picks.
    pub fn elbow(&self) -> ElbowConfig {
        self.elbow
    }
}

impl Solver for PlanarSolver {
    fn num_joints(&self) -> usize {
        NUM_PLANAR_JOINTS
    }

    fn link_lengths(&self) -> &LinkLengths {
        &self.links
    }

    fn inverse(
        &self,
        target: &TargetPoint,
        previous: &JointAngles,
    ) -> Result<Solution, ArmCtrlError> {
        check_target(target, ArmVariant::Planar)?;
        previous.check_len(NUM_PLANAR_JOINTS)?;

        let mut solved = clamp_to_reach(target, &self.links);
        if self.clamp_inner {
            solved = clamp_to_inner_reach(&solved, &self.links);
        }

        let c = solved.coords();
        let (shoulder_rad, elbow_rad) =
            inverse_planar(c[0], c[1], &self.links, self.elbow, previous[0])?;

        debug!(
            "Planar IK {:?} -> shoulder {:.3} deg, elbow {:.3} deg ({:?})",
            c,
            shoulder_rad.to_degrees(),
            elbow_rad.to_degrees(),
            self.elbow
        );

        Ok(Solution {
            angles: JointAngles::from_rad(vec![shoulder_rad, elbow_rad]),
            clamped: solved != *target,
            target: solved,
            elbow: self.elbow,
        })
    }

    fn forward(&self, angles: &JointAngles) -> Result<ArmPose, ArmCtrlError> {
        angles.check_len(NUM_PLANAR_JOINTS)?;
        if !angles.is_finite() {
            return Err(ArmCtrlError::UnreachableInput(format!(
                "joint angles {:?} are not finite",
                angles.as_slice()
            )));
        }

        let (elbow, head) = forward_planar(angles[0], angles[1], &self.links);

        Ok(ArmPose {
            elbow: TargetPoint::Planar(elbow),
            head: TargetPoint::Planar(head),
        })
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Solve the two link problem for a head position `(x, y)`.
///
/// Returns `(shoulder, elbow)` in radians. The shoulder angle is measured
/// from the X axis, the elbow angle from the line of the shoulder link. Elbow
/// down gives an elbow angle in `[0, pi]`, elbow up its negation.
///
/// The target must already be within the outer reach. At the origin (only
/// reachable with equal links) the shoulder direction is undefined, so
/// `previous_shoulder_rad` is returned for it unchanged.
pub fn inverse_planar(
    x: f64,
    y: f64,
    links: &LinkLengths,
    elbow: ElbowConfig,
    previous_shoulder_rad: f64,
) -> Result<(f64, f64), ArmCtrlError> {
    let l1 = links.shoulder;
    let l2 = links.elbow;
    let dist_sq = x.powi(2) + y.powi(2);

    let cos_elbow = (dist_sq - l1.powi(2) - l2.powi(2)) / (2.0 * l1 * l2);

    if !cos_elbow.is_finite() {
        return Err(ArmCtrlError::UnreachableInput(format!(
            "elbow cosine for ({}, {}) is not finite",
            x, y
        )));
    }

    // Only floating point overshoot at the boundary is absorbed, anything
    // further out means the target was never reachable
    if cos_elbow > 1.0 + ELBOW_COS_TOLERANCE || cos_elbow < -1.0 - ELBOW_COS_TOLERANCE {
        return Err(ArmCtrlError::NumericDegenerate { cos_elbow });
    }
    let cos_elbow = clamp(&cos_elbow, &-1.0, &1.0);

    let elbow_rad = match elbow {
        ElbowConfig::Down => cos_elbow.acos(),
        ElbowConfig::Up => -cos_elbow.acos(),
    };

    let shoulder_rad = if dist_sq.sqrt() <= ORIGIN_TOLERANCE {
        previous_shoulder_rad
    } else {
        y.atan2(x) - (l2 * elbow_rad.sin()).atan2(l1 + l2 * cos_elbow)
    };

    Ok((shoulder_rad, elbow_rad))
}

/// Positions of the elbow and head of a two link arm.
pub fn forward_planar(
    shoulder_rad: f64,
    elbow_rad: f64,
    links: &LinkLengths,
) -> (Point2<f64>, Point2<f64>) {
    let elbow = Point2::new(
        links.shoulder * shoulder_rad.cos(),
        links.shoulder * shoulder_rad.sin(),
    );

    let head = Point2::new(
        elbow.x + links.elbow * (shoulder_rad + elbow_rad).cos(),
        elbow.y + links.elbow * (shoulder_rad + elbow_rad).sin(),
    );

    (elbow, head)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::f64::consts::PI;

    const TOL: f64 = 1e-6;

    fn solver(l1: f64, l2: f64, elbow: ElbowConfig) -> PlanarSolver {
        PlanarSolver::new(LinkLengths::new(l1, l2).unwrap(), elbow).unwrap()
    }

    #[test]
    fn test_round_trip_both_elbows() {
        let targets = [
            TargetPoint::planar(15.0, 5.0),
            TargetPoint::planar(-8.0, 12.0),
            TargetPoint::planar(-3.0, -17.5),
            TargetPoint::planar(0.0, 9.0),
            TargetPoint::planar(19.999, 0.0),
            TargetPoint::planar(4.0, -0.5),
        ];

        for elbow in [ElbowConfig::Up, ElbowConfig::Down].iter() {
            let s = solver(10.0, 10.0, *elbow);
            for t in targets.iter() {
                let sol = s.inverse(t, &JointAngles::zeros(2)).unwrap();
                assert!(sol.angles.is_finite());
                assert!(!sol.clamped);

                let pose = s.forward(&sol.angles).unwrap();
                let err = pose.head.max_abs_diff(t).unwrap();
                assert!(err < TOL, "{:?} {:?}: FK error {}", elbow, t, err);
            }
        }
    }

    #[test]
    fn test_elbow_branch_signs() {
        let t = TargetPoint::planar(12.0, 6.0);

        let down = solver(10.0, 8.0, ElbowConfig::Down)
            .inverse(&t, &JointAngles::zeros(2))
            .unwrap();
        let up = solver(10.0, 8.0, ElbowConfig::Up)
            .inverse(&t, &JointAngles::zeros(2))
            .unwrap();

        assert!(down.angles[1] > 0.0);
        assert!((up.angles[1] + down.angles[1]).abs() < 1e-12);
        assert_eq!(down.elbow, ElbowConfig::Down);
        assert_eq!(up.elbow, ElbowConfig::Up);
        assert_eq!(ElbowConfig::default(), ElbowConfig::Down);
    }

    #[test]
    fn test_unreachable_target_is_clamped() {
        let s = solver(10.0, 10.0, ElbowConfig::Down);
        let sol = s
            .inverse(&TargetPoint::planar(100.0, 0.0), &JointAngles::zeros(2))
            .unwrap();

        assert!(sol.clamped);
        assert!(sol.target.max_abs_diff(&TargetPoint::planar(20.0, 0.0)).unwrap() < 1e-12);
        assert!(sol.angles[0].abs() < 1e-12);
        assert!(sol.angles[1].abs() < 1e-12);
    }

    #[test]
    fn test_huge_target_is_clamped() {
        for (l1, l2) in [(10.0, 10.0), (21.0, 15.0)].iter() {
            let s = solver(*l1, *l2, ElbowConfig::Down);
            let sol = s
                .inverse(&TargetPoint::planar(1e200, 0.0), &JointAngles::zeros(2))
                .unwrap();

            assert!(sol.clamped);
            assert!((sol.target.coords()[0] - (l1 + l2)).abs() < 1e-9);
            assert!(sol.angles[0].abs() < 1e-6);
            assert!(sol.angles[1].abs() < 1e-6);
        }
    }

    #[test]
    fn test_origin_holds_previous_shoulder() {
        let s = solver(10.0, 10.0, ElbowConfig::Down);
        let previous = JointAngles::from_rad(vec![0.7, 0.2]);

        let sol = s.inverse(&TargetPoint::planar(0.0, 0.0), &previous).unwrap();

        assert_eq!(sol.angles[0], 0.7);
        assert!((sol.angles[1] - PI).abs() < 1e-12);

        let head = s.forward(&sol.angles).unwrap().head;
        assert!(head.max_abs_diff(&TargetPoint::planar(0.0, 0.0)).unwrap() < TOL);
    }

    #[test]
    fn test_inside_inner_reach() {
        let t = TargetPoint::planar(1.0, 1.0);

        // Unequal links cannot fold back far enough
        let s = solver(21.0, 15.0, ElbowConfig::Down);
        assert!(matches!(
            s.inverse(&t, &JointAngles::zeros(2)),
            Err(ArmCtrlError::NumericDegenerate { .. })
        ));

        // Unless pushed out onto the inner boundary
        let s = s.with_inner_clamp(true);
        let sol = s.inverse(&t, &JointAngles::zeros(2)).unwrap();
        assert!(sol.clamped);
        assert!((sol.angles[1] - PI).abs() < 1e-6);
        let head = s.forward(&sol.angles).unwrap().head;
        assert!(head.max_abs_diff(&sol.target).unwrap() < TOL);
    }

    #[test]
    fn test_invalid_inputs() {
        let s = solver(10.0, 10.0, ElbowConfig::Down);

        assert!(matches!(
            s.inverse(&TargetPoint::planar(std::f64::NAN, 1.0), &JointAngles::zeros(2)),
            Err(ArmCtrlError::UnreachableInput(_))
        ));
        assert!(matches!(
            s.inverse(&TargetPoint::spatial(1.0, 1.0, 1.0), &JointAngles::zeros(2)),
            Err(ArmCtrlError::UnreachableInput(_))
        ));
        assert!(matches!(
            s.inverse(&TargetPoint::planar(1.0, 1.0), &JointAngles::zeros(3)),
            Err(ArmCtrlError::WrongNumJoints { .. })
        ));
        assert!(PlanarSolver::new(
            LinkLengths {
                shoulder: 0.0,
                elbow: 1.0
            },
            ElbowConfig::Down
        )
        .is_err());
    }

    #[test]
    fn test_forward_known_pose() {
        let links = LinkLengths::new(10.0, 5.0).unwrap();
        let (elbow, head) = forward_planar(PI / 2.0, -PI / 2.0, &links);

        assert!((elbow - Point2::new(0.0, 10.0)).norm() < 1e-12);
        assert!((head - Point2::new(5.0, 10.0)).norm() < 1e-12);
    }
}
