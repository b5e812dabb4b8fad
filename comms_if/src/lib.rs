//! # Communications interface crate.
//!
//! Provides the interfaces shared between the arm control software and its
//! collaborators: telecommands coming in from a front end, and step demands
//! going out to the motor transport.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

pub mod tc;

/// Demand definitions for equipment (the stepper motor transport)
pub mod eqpt;
