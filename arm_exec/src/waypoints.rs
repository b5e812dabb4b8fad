//! # Waypoint scripts
//!
//! A waypoint script lists the positions the arm's head should visit, one per
//! line:
//!
//! ```text
//! # x    y     z
//! 10.0, 10.0, 10.0
//! 12    -3    4;
//! ```
//!
//! Coordinates are separated by whitespace or commas and a line may end with
//! a `;`. Everything after a `#` is a comment. Every point in a script must
//! have the same number of coordinates, 2 for planar arms and 3 for spatial
//! ones.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

// Internal
use crate::arm_ctrl::TargetPoint;
use comms_if::tc::arm_ctrl::{ArmCmd, Waypoint};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const COMMENT_START: char = '#';

const LINE_END: char = ';';

const COORD_SEPARATOR_PATTERN: &str = r"[\s,]+";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// A parsed waypoint script.
#[derive(Debug, Clone, PartialEq)]
pub struct WaypointScript {
    path: Option<PathBuf>,
    points: Vec<Waypoint>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum WaypointError {
    #[error("Could not find the waypoint script at {0}")]
    ScriptNotFound(String),

    #[error("Could not load the waypoint script: {0}")]
    ScriptLoadError(std::io::Error),

    #[error("The waypoint script contains no waypoints")]
    ScriptEmpty,

    #[error("Line {line}: expected 2 or 3 coordinates, found {found}")]
    WrongNumCoords { line: usize, found: usize },

    #[error("Line {line}: {token:?} is not a finite number")]
    InvalidNumber { line: usize, token: String },

    #[error("Line {line}: expected {expected} coordinates like the previous lines, found {found}")]
    MixedDims {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Invalid coordinate pattern: {0}")]
    Pattern(#[from] regex::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl WaypointScript {
    /// Load and parse the script at the given path.
    pub fn load<P: AsRef<Path>>(script_path: P) -> Result<Self, WaypointError> {
        let path = PathBuf::from(script_path.as_ref());

        if !path.exists() {
            return Err(WaypointError::ScriptNotFound(
                path.display().to_string(),
            ));
        }

        let script = fs::read_to_string(&path).map_err(WaypointError::ScriptLoadError)?;

        let mut parsed = Self::parse(&script)?;
        parsed.path = Some(path);

        Ok(parsed)
    }

    /// Parse a script from a string.
    pub fn parse(script: &str) -> Result<Self, WaypointError> {
        let sep = Regex::new(COORD_SEPARATOR_PATTERN)?;
        let mut points = Vec::new();
        let mut dims: Option<usize> = None;

        for (i, raw_line) in script.lines().enumerate() {
            // Lines are numbered from 1 in errors
            let line = i + 1;

            let content = raw_line
                .split(COMMENT_START)
                .next()
                .unwrap_or("")
                .trim()
                .trim_end_matches(LINE_END)
                .trim();

            if content.is_empty() {
                continue;
            }

            let coords = sep
                .split(content)
                .filter(|t| !t.is_empty())
                .map(|token| match token.parse::<f64>() {
                    Ok(v) if v.is_finite() => Ok(v),
                    _ => Err(WaypointError::InvalidNumber {
                        line,
                        token: token.to_string(),
                    }),
                })
                .collect::<Result<Vec<f64>, _>>()?;

            let point = match coords.as_slice() {
                [x, y] => Waypoint::planar(*x, *y),
                [x, y, z] => Waypoint::spatial(*x, *y, *z),
                _ => {
                    return Err(WaypointError::WrongNumCoords {
                        line,
                        found: coords.len(),
                    })
                }
            };

            match dims {
                Some(expected) if expected != coords.len() => {
                    return Err(WaypointError::MixedDims {
                        line,
                        expected,
                        found: coords.len(),
                    })
                }
                _ => dims = Some(coords.len()),
            }

            points.push(point);
        }

        if points.is_empty() {
            return Err(WaypointError::ScriptEmpty);
        }

        Ok(Self { path: None, points })
    }

    /// Where the script was loaded from, `None` if it was parsed from a
    /// string.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn points(&self) -> &[Waypoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of coordinates of every point in the script.
    pub fn dims(&self) -> usize {
        match self.points.first() {
            Some(Waypoint { z: Some(_), .. }) => 3,
            _ => 2,
        }
    }

    /// The waypoints as solver targets.
    pub fn targets(&self) -> Vec<TargetPoint> {
        self.points.iter().copied().map(TargetPoint::from).collect()
    }

    /// A trajectory command visiting every waypoint in order.
    pub fn into_cmd(self) -> ArmCmd {
        ArmCmd::Trajectory {
            points: self.points,
        }
    }
}

impl FromStr for WaypointScript {
    type Err = WaypointError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
