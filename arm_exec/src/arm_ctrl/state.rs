//! Implementations for the ArmCtrl state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

// Internal
use super::*;
use comms_if::{eqpt::stepper::StepDems, tc::arm_ctrl::ArmCmd};
use util::{archive::Archiver, module::State, params, session::Session};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Archive of accepted demands, relative to the session archive root.
const DEMS_ARCHIVE_PATH: &str = "arm_ctrl/dems.csv";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Arm control module state
#[derive(Default)]
pub struct ArmCtrl {
    pub(crate) params: Option<Params>,

    pub(crate) report: StatusReport,

    pub(crate) current_cmd: Option<ArmCmd>,

    batcher: Option<TrajectoryBatcher>,

    /// Planned trajectory waiting to be submitted.
    pending: Option<Trajectory>,

    arch_dems: Archiver,
}

/// Input data to Arm Control.
#[derive(Default)]
pub struct InputData {
    /// The command to be executed, or `None` if there is no new command on
    /// this cycle.
    pub cmd: Option<ArmCmd>,
}

/// Status report for ArmCtrl processing.
#[derive(Clone, Copy, Default, Serialize, Deserialize, Debug)]
pub struct StatusReport {
    /// Number of points in the planned trajectory.
    pub num_points: usize,

    /// Number of points which were outside the arm's reach.
    pub num_clamped: usize,

    pub num_elbow_up: usize,
    pub num_elbow_down: usize,

    /// True if the arm was stopped this cycle.
    pub stopped: bool,
}

/// Record of an accepted demand in the archive.
#[derive(Serialize)]
struct DemsRecord {
    index: usize,
    dems: String,
    joint_0_deg: f64,
    joint_1_deg: f64,
    joint_2_deg: Option<f64>,
}

/// Sink wrapper which archives every demand the inner sink accepts.
struct ArchivingSink<'a, S> {
    inner: &'a mut S,
    archiver: &'a mut Archiver,
    trajectory: &'a Trajectory,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl State for ArmCtrl {
    type InitData = String;
    type InitError = ArmCtrlError;

    type InputData = InputData;
    type OutputData = Trajectory;
    type StatusReport = StatusReport;
    type ProcError = ArmCtrlError;

    /// Initialise the ArmCtrl module.
    ///
    /// Expected init data is the path to the parameter file, relative to the
    /// params directory.
    fn init(
        &mut self,
        init_data: Self::InitData,
        session: &Session,
    ) -> Result<(), Self::InitError> {
        let params: Params = params::load(&init_data)?;

        self.setup(params)?;
        self.arch_dems = Archiver::from_path(session, DEMS_ARCHIVE_PATH)?;

        info!("ArmCtrl initialised from {}", init_data);

        Ok(())
    }

    /// Plan the motion for a new command.
    ///
    /// The output is the trajectory still waiting to be submitted, empty if
    /// there is none.
    fn proc(
        &mut self,
        input_data: &Self::InputData,
    ) -> Result<(Self::OutputData, Self::StatusReport), Self::ProcError> {
        // Clear the status report
        self.report = StatusReport::default();

        if let Some(cmd) = &input_data.cmd {
            self.current_cmd = Some(cmd.clone());
            debug!("New ArmCtrl ArmCmd::{:#?}", cmd);

            // Any old plan is replaced, even if the new one fails
            self.pending = None;

            let trajectory = self.plan_cmd(cmd)?;
            self.update_report(&trajectory);

            if !trajectory.is_empty() {
                self.pending = Some(trajectory);
            }
        }

        Ok((self.pending.clone().unwrap_or_default(), self.report))
    }

    /// Function called when entering safe mode.
    ///
    /// Drops any pending trajectory, the accepted pose is kept.
    fn make_safe(&mut self) {
        self.current_cmd = Some(ArmCmd::Stop);

        if self.pending.take().is_some() {
            info!("ArmCtrl safed, pending trajectory discarded");
        }
    }
}

impl ArmCtrl {
    /// Create an initialised module directly from parameters, without a
    /// session or archives.
    pub fn from_params(params: Params) -> Result<Self, ArmCtrlError> {
        let mut arm_ctrl = Self::default();
        arm_ctrl.setup(params)?;
        Ok(arm_ctrl)
    }

    /// Send the pending trajectory to the sink, archiving each accepted
    /// demand. Returns the number of demands accepted.
    pub fn submit<S: StepSink>(&mut self, sink: &mut S) -> Result<usize, ArmCtrlError> {
        let batcher = self.batcher.as_mut().ok_or(ArmCtrlError::NotInitialised)?;

        let trajectory = match self.pending.take() {
            Some(t) => t,
            None => return Ok(0),
        };

        let mut arch_sink = ArchivingSink {
            inner: sink,
            archiver: &mut self.arch_dems,
            trajectory: &trajectory,
        };

        let num_accepted = batcher.submit(&trajectory, &mut arch_sink)?;
        info!("{} demands accepted", num_accepted);

        Ok(num_accepted)
    }

    /// Solve a single target from the current pose without planning any
    /// motion.
    pub fn solve(&self, target: &TargetPoint) -> Result<Solution, ArmCtrlError> {
        let batcher = self.batcher()?;
        batcher.solver().inverse(target, batcher.previous_pose())
    }

    /// Forward kinematics for the configured arm.
    pub fn forward(&self, angles: &JointAngles) -> Result<ArmPose, ArmCtrlError> {
        self.batcher()?.solver().forward(angles)
    }

    /// The last accepted pose of the arm.
    pub fn current_pose(&self) -> Option<&JointAngles> {
        self.batcher.as_ref().map(|b| b.previous_pose())
    }

    pub fn params(&self) -> Option<&Params> {
        self.params.as_ref()
    }

    /// The last command given to the module.
    pub fn current_cmd(&self) -> Option<&ArmCmd> {
        self.current_cmd.as_ref()
    }

    fn setup(&mut self, params: Params) -> Result<(), ArmCtrlError> {
        self.batcher = Some(params.build_batcher()?);
        self.params = Some(params);
        self.pending = None;
        Ok(())
    }

    fn batcher(&self) -> Result<&TrajectoryBatcher, ArmCtrlError> {
        self.batcher.as_ref().ok_or(ArmCtrlError::NotInitialised)
    }

    fn plan_cmd(&mut self, cmd: &ArmCmd) -> Result<Trajectory, ArmCtrlError> {
        if let ArmCmd::Stop = cmd {
            self.report.stopped = true;
            info!("ArmCtrl stopped");
            return Ok(Trajectory::default());
        }

        let batcher = self.batcher()?;

        match cmd {
            ArmCmd::Home => {
                batcher.plan_to_pose(&JointAngles::zeros(batcher.solver().num_joints()))
            }
            _ => {
                let targets: Vec<TargetPoint> =
                    cmd.waypoints().into_iter().map(TargetPoint::from).collect();
                if targets.is_empty() {
                    return Err(ArmCtrlError::EmptyTrajectory);
                }
                batcher.plan(&targets)
            }
        }
    }

    fn update_report(&mut self, trajectory: &Trajectory) {
        for step in trajectory.steps.iter() {
            if let Some(ref sol) = step.solution {
                if sol.clamped {
                    warn!(
                        "Point {} is out of reach, clamped to {:?}",
                        step.index,
                        sol.target.coords()
                    );
                }
            }
        }

        self.report.num_points = trajectory.len();
        self.report.num_clamped = trajectory.num_clamped();
        self.report.num_elbow_up = trajectory.num_elbow(ElbowConfig::Up);
        self.report.num_elbow_down = trajectory.num_elbow(ElbowConfig::Down);
    }
}

impl DemsRecord {
    fn new(step: &PlannedStep) -> Self {
        let deg = step.angles.to_deg();

        Self {
            index: step.index,
            dems: step.dems.to_string(),
            joint_0_deg: deg.get(0).copied().unwrap_or(std::f64::NAN),
            joint_1_deg: deg.get(1).copied().unwrap_or(std::f64::NAN),
            joint_2_deg: deg.get(2).copied(),
        }
    }
}

impl<'a, S: StepSink> StepSink for ArchivingSink<'a, S> {
    type Error = S::Error;

    fn send(&mut self, index: usize, dems: &StepDems) -> Result<(), Self::Error> {
        self.inner.send(index, dems)?;

        if let Some(step) = self.trajectory.steps.get(index) {
            if let Err(e) = self.archiver.serialise(DemsRecord::new(step)) {
                warn!("Could not archive demand {}: {}", index, e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use comms_if::tc::arm_ctrl::Waypoint;

    #[derive(Default)]
    struct LineSink {
        lines: Vec<String>,
    }

    impl StepSink for LineSink {
        type Error = std::convert::Infallible;

        fn send(&mut self, _index: usize, dems: &StepDems) -> Result<(), Self::Error> {
            self.lines.push(dems.to_string());
            Ok(())
        }
    }

    fn arm_ctrl() -> ArmCtrl {
        let p: Params = params::from_str(
            r#"
            variant = "spatial"
            shoulder_length = 10.0
            elbow_length = 10.0

            [[axes]]
            joint = 0
            steps_per_rev = 800

            [[axes]]
            joint = 1
            steps_per_rev = 1600

            [[axes]]
            joint = 2
            steps_per_rev = 800
            "#,
        )
        .unwrap();

        ArmCtrl::from_params(p).unwrap()
    }

    fn input(cmd: ArmCmd) -> InputData {
        InputData { cmd: Some(cmd) }
    }

    #[test]
    fn test_not_initialised() {
        let mut a = ArmCtrl::default();
        assert!(matches!(
            a.proc(&input(ArmCmd::Home)),
            Err(ArmCtrlError::NotInitialised)
        ));
        assert!(matches!(
            a.submit(&mut LineSink::default()),
            Err(ArmCtrlError::NotInitialised)
        ));
    }

    #[test]
    fn test_move_and_submit() {
        let mut a = arm_ctrl();

        let (traj, report) = a
            .proc(&input(ArmCmd::MoveTo {
                x: 10.0,
                y: 10.0,
                z: Some(10.0),
            }))
            .unwrap();

        assert_eq!(traj.len(), 1);
        assert_eq!(report.num_points, 1);
        assert_eq!(report.num_clamped, 0);
        assert_eq!(report.num_elbow_down, 1);

        // With no new command the plan is still pending
        let (traj_again, _) = a.proc(&InputData::default()).unwrap();
        assert_eq!(traj_again, traj);

        let mut sink = LineSink::default();
        assert_eq!(a.submit(&mut sink).unwrap(), 1);
        assert_eq!(sink.lines, vec![traj.steps[0].dems.to_string()]);
        assert_eq!(a.current_pose(), traj.final_pose());

        // Nothing left to submit
        assert_eq!(a.submit(&mut sink).unwrap(), 0);
        let (empty, _) = a.proc(&InputData::default()).unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_trajectory_and_home() {
        let mut a = arm_ctrl();

        let (traj, report) = a
            .proc(&input(ArmCmd::Trajectory {
                points: vec![
                    Waypoint::spatial(12.0, 1.0, 2.0),
                    Waypoint::spatial(100.0, 0.0, 0.0),
                ],
            }))
            .unwrap();
        assert_eq!(traj.len(), 2);
        assert_eq!(report.num_clamped, 1);
        assert_eq!(report.num_elbow_up, 2);

        a.submit(&mut LineSink::default()).unwrap();

        let (home, _) = a.proc(&input(ArmCmd::Home)).unwrap();
        assert_eq!(home.len(), 1);
        a.submit(&mut LineSink::default()).unwrap();
        assert_eq!(a.current_pose(), Some(&JointAngles::zeros(3)));
    }

    #[test]
    fn test_stop_discards_plan() {
        let mut a = arm_ctrl();

        a.proc(&input(ArmCmd::MoveTo {
            x: 5.0,
            y: 5.0,
            z: Some(5.0),
        }))
        .unwrap();

        let (traj, report) = a.proc(&input(ArmCmd::Stop)).unwrap();
        assert!(traj.is_empty());
        assert!(report.stopped);
        assert_eq!(a.submit(&mut LineSink::default()).unwrap(), 0);
        assert_eq!(a.current_pose(), Some(&JointAngles::zeros(3)));

        a.proc(&input(ArmCmd::Home)).unwrap();
        a.make_safe();
        assert!(matches!(a.current_cmd(), Some(ArmCmd::Stop)));
        assert_eq!(a.submit(&mut LineSink::default()).unwrap(), 0);
    }

    #[test]
    fn test_failed_plan_clears_pending() {
        let mut a = arm_ctrl();

        a.proc(&input(ArmCmd::Home)).unwrap();
        assert!(matches!(
            a.proc(&input(ArmCmd::MoveTo {
                x: 1.0,
                y: 1.0,
                z: None
            })),
            Err(ArmCtrlError::BatchIndexFailure { index: 0, .. })
        ));
        assert_eq!(a.submit(&mut LineSink::default()).unwrap(), 0);
    }

    #[test]
    fn test_empty_trajectory_rejected() {
        let mut a = arm_ctrl();

        a.proc(&input(ArmCmd::Home)).unwrap();
        assert!(matches!(
            a.proc(&input(ArmCmd::Trajectory { points: vec![] })),
            Err(ArmCtrlError::EmptyTrajectory)
        ));
        assert_eq!(a.submit(&mut LineSink::default()).unwrap(), 0);
    }

    #[test]
    fn test_archive_accepted_dems() {
        let dir = std::env::temp_dir().join(format!("arm_ctrl_arch_{}", std::process::id()));
        let path = dir.join("dems.csv");

        let mut a = arm_ctrl();
        a.arch_dems = Archiver::create(&path).unwrap();

        a.proc(&input(ArmCmd::Trajectory {
            points: vec![
                Waypoint::spatial(10.0, 10.0, 10.0),
                Waypoint::spatial(12.0, 0.0, 0.0),
            ],
        }))
        .unwrap();
        a.submit(&mut LineSink::default()).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(
            lines[0],
            "index,dems,joint_0_deg,joint_1_deg,joint_2_deg"
        );
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("0,\"A100,"));

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_solve_and_forward() {
        let a = arm_ctrl();
        let target = TargetPoint::spatial(10.0, 10.0, 10.0);

        let sol = a.solve(&target).unwrap();
        let pose = a.forward(&sol.angles).unwrap();
        assert!(pose.head.max_abs_diff(&target).unwrap() < 1e-6);
    }
}
