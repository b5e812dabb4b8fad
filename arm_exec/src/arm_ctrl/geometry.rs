//! Reachability geometry shared by the solvers
//!
//! Distances are measured from the shoulder joint, which is the origin of the
//! arm's base frame.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::trace;

// Internal
use super::{LinkLengths, TargetPoint, ORIGIN_TOLERANCE, REACH_REL_TOLERANCE};
use util::maths::norm;

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Euclidean distance of the point from the origin.
pub fn distance(p: &TargetPoint) -> f64 {
    let origin = [0.0; 3];

    // Dimensions always match as the origin is cut to the point's size
    norm(p.coords(), &origin[..p.dims()]).unwrap_or(std::f64::NAN)
}

/// Project a target onto the outer boundary of the arm's reach if it lies
/// outside of it.
///
/// Points further than `shoulder + elbow` from the origin are scaled radially
/// so that they sit on the boundary. Points already within reach (or within a
/// relative `REACH_REL_TOLERANCE` of it) are returned unchanged, so clamping
/// an already clamped point is a no-op.
pub fn clamp_to_reach(target: &TargetPoint, links: &LinkLengths) -> TargetPoint {
    let reach = links.max_reach();
    let dist = distance(target);

    if dist > reach * (1.0 + REACH_REL_TOLERANCE) {
        trace!("Target {:?} is {} from origin, clamping to {}", target, dist, reach);
        target.scaled(reach / dist)
    } else {
        *target
    }
}

/// Push a target out onto the inner boundary of the arm's reach if it lies
/// inside of it.
///
/// With unequal links the head can never get closer to the origin than
/// `|shoulder - elbow|`. Targets inside that radius are scaled radially out
/// onto it. A target at the origin has no direction to scale along and is
/// returned unchanged.
pub fn clamp_to_inner_reach(target: &TargetPoint, links: &LinkLengths) -> TargetPoint {
    let inner = links.min_reach();
    let dist = distance(target);

    if dist > ORIGIN_TOLERANCE && dist < inner * (1.0 - REACH_REL_TOLERANCE) {
        trace!("Target {:?} is {} from origin, pushing out to {}", target, dist, inner);
        target.scaled(inner / dist)
    } else {
        *target
    }
}

/// True if the target is within the outer reach of the arm.
pub fn is_within_reach(target: &TargetPoint, links: &LinkLengths) -> bool {
    distance(target) <= links.max_reach() * (1.0 + REACH_REL_TOLERANCE)
}
