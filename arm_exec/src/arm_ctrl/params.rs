//! Parameters structure for ArmCtrl

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use serde::{Deserialize, Serialize};

use super::*;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Parameters for Arm control.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Params {
    // ---- GEOMETRY ----
    /// Which geometry of arm is fitted.
    pub variant: ArmVariant,

    /// The length of the shoulder link.
    ///
    /// Units: same as the targets, millimeters on the reference arm.
    pub shoulder_length: f64,

    /// The length of the elbow link.
    ///
    /// Units: same as the targets, millimeters on the reference arm.
    pub elbow_length: f64,

    // ---- SOLVER ----
    /// How to choose between elbow up and elbow down.
    ///
    /// Planar arms only accept a fixed policy and default to elbow down.
    /// Spatial arms default to elbow up within 30 degrees of the X axis.
    #[serde(default)]
    pub elbow_policy: Option<ElbowPolicy>,

    /// Push targets inside the inner reach out onto it rather than rejecting
    /// them.
    #[serde(default)]
    pub clamp_inner_reach: bool,

    // ---- MOTORS ----
    /// How fractional steps are rounded.
    #[serde(default)]
    pub rounding: RoundingPolicy,

    /// The stepper motors, in the order their demands are sent.
    pub axes: Vec<MotorAxisSpec>,

    /// Pose of the arm at startup, all zeros if not given.
    ///
    /// Units: degrees
    #[serde(default)]
    pub initial_pose_deg: Option<Vec<f64>>,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Params {
    pub fn link_lengths(&self) -> Result<LinkLengths, ArmCtrlError> {
        LinkLengths::new(self.shoulder_length, self.elbow_length)
    }

    /// Build the solver for the configured arm.
    pub fn build_solver(&self) -> Result<Box<dyn Solver>, ArmCtrlError> {
        let links = self.link_lengths()?;

        Ok(match self.variant {
            ArmVariant::Planar => {
                let elbow = match self.elbow_policy {
                    None => ElbowConfig::default(),
                    Some(ElbowPolicy::Fixed { elbow }) => elbow,
                    Some(ElbowPolicy::BaseAngleWindow { .. }) => {
                        return Err(ArmCtrlError::InvalidParams(
                            "a planar arm has no base angle, use a fixed elbow policy".into(),
                        ))
                    }
                };

                Box::new(
                    PlanarSolver::new(links, elbow)?.with_inner_clamp(self.clamp_inner_reach),
                )
            }
            ArmVariant::Spatial => Box::new(
                SpatialSolver::new(links, self.elbow_policy.unwrap_or_default())?
                    .with_inner_clamp(self.clamp_inner_reach),
            ),
        })
    }

    pub fn build_quantiser(&self) -> Result<StepQuantiser, ArmCtrlError> {
        StepQuantiser::new(self.axes.clone(), self.rounding, self.variant.num_joints())
    }

    /// Build a batcher with the arm at its initial pose.
    pub fn build_batcher(&self) -> Result<TrajectoryBatcher, ArmCtrlError> {
        let batcher = TrajectoryBatcher::new(self.build_solver()?, self.build_quantiser()?)?;

        match self.initial_pose_deg {
            Some(ref pose) => batcher
                .with_initial_pose(JointAngles::from_deg(pose))
                .map_err(|e| ArmCtrlError::InvalidParams(format!("initial pose: {}", e))),
            None => Ok(batcher),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use util::params;

    const SPATIAL: &str = r#"
        variant = "spatial"
        shoulder_length = 21.0
        elbow_length = 15.0
        rounding = "carry_remainder"

        [elbow_policy]
        kind = "base_angle_window"
        half_width_deg = 20.0
        inside = "up"
        outside = "down"

        [[axes]]
        joint = 2
        steps_per_rev = 800
        reversed = true

        [[axes]]
        joint = 0
        steps_per_rev = 800

        [[axes]]
        joint = 1
        steps_per_rev = 1600
    "#;

    #[test]
    fn test_load_spatial() {
        let p: Params = params::from_str(SPATIAL).unwrap();

        assert_eq!(p.variant, ArmVariant::Spatial);
        assert_eq!(p.rounding, RoundingPolicy::CarryRemainder);
        assert!(!p.clamp_inner_reach);
        assert_eq!(p.axes.len(), 3);
        assert!(p.axes[0].reversed);
        assert!(!p.axes[1].reversed);
        assert_eq!(
            p.elbow_policy,
            Some(ElbowPolicy::BaseAngleWindow {
                half_width_deg: 20.0,
                inside: ElbowConfig::Up,
                outside: ElbowConfig::Down
            })
        );

        let b = p.build_batcher().unwrap();
        assert_eq!(b.solver().num_joints(), 3);
        assert_eq!(b.quantiser().num_axes(), 3);
        assert_eq!(b.previous_pose(), &JointAngles::zeros(3));
    }

    #[test]
    fn test_planar_defaults() {
        let p: Params = params::from_str(
            r#"
            variant = "planar"
            shoulder_length = 10.0
            elbow_length = 10.0
            initial_pose_deg = [90.0, -90.0]

            [[axes]]
            joint = 0
            steps_per_rev = 200

            [[axes]]
            joint = 1
            steps_per_rev = 200
            "#,
        )
        .unwrap();

        assert_eq!(p.rounding, RoundingPolicy::Truncate);
        assert!(p.elbow_policy.is_none());

        let b = p.build_batcher().unwrap();
        assert_eq!(b.solver().num_joints(), 2);
        assert_eq!(b.previous_pose(), &JointAngles::from_deg(&[90.0, -90.0]));
    }

    #[test]
    fn test_shipped_params() {
        let spatial: Params =
            params::from_str(include_str!("../../../params/arm_ctrl.toml")).unwrap();
        assert_eq!(spatial.elbow_policy, Some(ElbowPolicy::default()));
        assert!(spatial.build_batcher().is_ok());

        let planar: Params =
            params::from_str(include_str!("../../../params/arm_ctrl_planar.toml")).unwrap();
        assert_eq!(planar.variant, ArmVariant::Planar);
        assert!(planar.build_batcher().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let mut p: Params = params::from_str(SPATIAL).unwrap();

        p.initial_pose_deg = Some(vec![0.0, 0.0]);
        assert!(matches!(
            p.build_batcher(),
            Err(ArmCtrlError::InvalidParams(_))
        ));
        p.initial_pose_deg = None;

        // Window policies make no sense without a base
        p.variant = ArmVariant::Planar;
        assert!(matches!(
            p.build_solver(),
            Err(ArmCtrlError::InvalidParams(_))
        ));

        // Axis 0 drives joint 2 which a planar arm does not have
        p.elbow_policy = None;
        assert!(matches!(
            p.build_batcher(),
            Err(ArmCtrlError::InvalidAxis(_))
        ));

        p.variant = ArmVariant::Spatial;
        p.shoulder_length = -1.0;
        assert!(matches!(
            p.build_solver(),
            Err(ArmCtrlError::UnreachableInput(_))
        ));
    }
}
