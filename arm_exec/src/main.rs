//! Main arm executable entry point.
//!
//! # Architecture
//!
//! The executable runs a single arm command and exits:
//!
//!     - Initialise the session, logging and ArmCtrl
//!     - Execute the subcommand:
//!         - `solve`: inverse kinematics for one point
//!         - `fk`: forward kinematics for a set of joint angles
//!         - `run`: plan a waypoint script and send the demands
//!         - `tc`: plan and send a single arm telecommand
//!
//! Demands are "sent" by writing their line format to stdout, which is where
//! a serial bridge to the motor drivers picks them up. Logs go to stderr.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use color_eyre::{eyre::WrapErr, Report};
use log::info;
use serde::Serialize;
use std::io::{self, Write};
use std::path::PathBuf;
use structopt::StructOpt;

// Internal
use arm_lib::{
    arm_ctrl::{ArmCtrl, ArmPose, InputData, JointAngles, Solution, StepSink, TargetPoint},
    waypoints::WaypointScript,
};
use comms_if::{
    eqpt::stepper::StepDems,
    tc::arm_ctrl::{ArmCmd, Waypoint},
};
use util::{
    logger::{level_from_verbosity, logger_init},
    module::State,
    session::Session,
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Command line options of the arm executable.
#[derive(Debug, StructOpt)]
#[structopt(name = "arm_exec", about = "Arm kinematics and motor demand generation")]
struct Opt {
    /// Parameter file, relative to `$ARM_SW_ROOT/params`.
    #[structopt(short, long, default_value = "arm_ctrl.toml")]
    params: String,

    /// More detailed logging, `-v` for debug and `-vv` for trace.
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,

    #[structopt(subcommand)]
    cmd: ExecCmd,
}

#[derive(Debug, StructOpt)]
enum ExecCmd {
    /// Solve the joint angles putting the head at a point.
    Solve {
        #[structopt(allow_hyphen_values = true)]
        x: f64,

        #[structopt(allow_hyphen_values = true)]
        y: f64,

        /// Spatial arms only.
        #[structopt(allow_hyphen_values = true)]
        z: Option<f64>,
    },

    /// Find the positions of the elbow and head for a set of joint angles.
    Fk {
        /// Joint angles in degrees, in solve order.
        #[structopt(allow_hyphen_values = true, required = true)]
        angles_deg: Vec<f64>,
    },

    /// Plan a trajectory through the points of a waypoint script and send it.
    Run {
        #[structopt(parse(from_os_str))]
        script: PathBuf,
    },

    /// Plan and send a single telecommand.
    Tc {
        #[structopt(subcommand)]
        cmd: ArmCmd,
    },
}

/// Writes each demand as a line.
struct LineSink<W: Write> {
    out: W,
    sent: Vec<StepDems>,
}

#[derive(Serialize)]
struct SolveSummary<'a> {
    solution: &'a Solution,
    pose: &'a ArmPose,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<W: Write> StepSink for LineSink<W> {
    type Error = io::Error;

    fn send(&mut self, _index: usize, dems: &StepDems) -> Result<(), Self::Error> {
        writeln!(self.out, "{}", dems)?;
        self.out.flush()?;
        self.sent.push(dems.clone());
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new("arm_exec", "sessions").wrap_err("Failed to create the session")?;

    // Initialise logger
    logger_init(level_from_verbosity(opt.verbose), &session)
        .wrap_err("Failed to initialise logging")?;

    info!("Arm Executable\n");
    info!("Session directory: {:?}\n", session.session_root);

    // ---- INITIALISE MODULES ----

    let mut arm_ctrl = ArmCtrl::default();
    arm_ctrl
        .init(opt.params.clone(), &session)
        .wrap_err("Failed to initialise ArmCtrl")?;
    info!("ArmCtrl init complete\n");

    // ---- EXECUTE ----

    match opt.cmd {
        ExecCmd::Solve { x, y, z } => {
            let target = TargetPoint::from(Waypoint { x, y, z });

            let solution = arm_ctrl
                .solve(&target)
                .wrap_err_with(|| format!("Could not solve for {:?}", target.coords()))?;
            let pose = arm_ctrl
                .forward(&solution.angles)
                .wrap_err("Could not calculate forward kinematics")?;

            if solution.clamped {
                info!("Target clamped to {:?}", solution.target.coords());
            }
            info!(
                "Joint angles (deg): {:.3?}, elbow {:?}",
                solution.angles.to_deg(),
                solution.elbow
            );
            info!("Elbow at {:.3?}", pose.elbow.coords());
            info!("Head at {:.3?}", pose.head.coords());

            session
                .save(
                    "solve.json",
                    &SolveSummary {
                        solution: &solution,
                        pose: &pose,
                    },
                )
                .wrap_err("Could not save the solution")?;
        }
        ExecCmd::Fk { angles_deg } => {
            let angles = JointAngles::from_deg(&angles_deg);
            let pose = arm_ctrl
                .forward(&angles)
                .wrap_err("Could not calculate forward kinematics")?;

            info!("Elbow at {:.3?}", pose.elbow.coords());
            info!("Head at {:.3?}", pose.head.coords());

            session
                .save("fk.json", &pose)
                .wrap_err("Could not save the pose")?;
        }
        ExecCmd::Run { script } => {
            let script = WaypointScript::load(&script).wrap_err("Failed to load script")?;
            info!("Loaded script containing {} waypoints\n", script.len());

            exec_cmd(&mut arm_ctrl, &session, script.into_cmd())?;
        }
        ExecCmd::Tc { cmd } => {
            exec_cmd(&mut arm_ctrl, &session, cmd)?;
        }
    }

    info!("End of execution");

    Ok(())
}

/// Plan a command and send the resulting demands.
fn exec_cmd(arm_ctrl: &mut ArmCtrl, session: &Session, cmd: ArmCmd) -> Result<(), Report> {
    let (trajectory, report) = arm_ctrl
        .proc(&InputData { cmd: Some(cmd) })
        .wrap_err("Failed to plan the command")?;

    info!("ArmCtrl status: {:#?}", report);

    session
        .save("trajectory.json", &trajectory)
        .wrap_err("Could not save the trajectory")?;

    let mut sink = LineSink {
        out: io::stdout(),
        sent: Vec::new(),
    };

    let num_accepted = match arm_ctrl.submit(&mut sink) {
        Ok(n) => n,
        Err(e) => {
            arm_ctrl.make_safe();
            return Err(Report::new(e).wrap_err("Failed to send the demands"));
        }
    };

    info!(
        "Sent {} of {} demands: {}",
        num_accepted,
        trajectory.len(),
        StepDems::format_batch(&sink.sent)
    );

    Ok(())
}
