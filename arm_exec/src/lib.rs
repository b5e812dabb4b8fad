//! # Arm library.
//!
//! This library allows other crates in the workspace (and the benchmarks) to
//! access items defined inside the arm executable crate.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

/// Arm control module - converts head positions into joint angles and motor
/// step demands
pub mod arm_ctrl;

/// Waypoint scripts - lists of head positions loaded from file
pub mod waypoints;
