//! Camera facing at the control samples.
//!
//! The camera looks along its direction of travel: yaw comes from the
//! horizontal part of the launch velocity, pitch from its vertical part. At the
//! apex the camera levels out; at landing it takes the pitch of the reversed
//! launch direction, a stylized nose-down look rather than the true path
//! tangent. Roll is always zero.

use std::f64::consts::PI;

use crate::trajectory::SampleRole;
use crate::value::{EulerAngles, Vector3};

/// Horizontal direction length under which yaw is taken as undefined.
pub const DEGENERATE_HORIZONTAL_EPS: f64 = 1e-12;

/// Yaw that faces the camera along `direction`.
///
/// With no horizontal component (straight up/down or zero velocity) the
/// heading is undefined; `atan2(0, 0)` is taken as 0 regardless of the sign of
/// the zeros, so the yaw is exactly π.
pub fn yaw_for(direction: Vector3) -> f64 {
    if direction.horizontal_length() < DEGENERATE_HORIZONTAL_EPS {
        return PI;
    }
    direction.x.atan2(direction.z) + PI
}

/// Pitch of a unit direction.
pub fn pitch_for(direction: Vector3) -> f64 {
    direction.y.clamp(-1.0, 1.0).asin()
}

/// Orientation at one control sample for a launch with `velocity`.
pub fn orientation_for(velocity: Vector3, role: SampleRole) -> EulerAngles {
    let d = velocity.normalize();
    let yaw = yaw_for(d);
    let pitch = match role {
        SampleRole::Start => pitch_for(d),
        SampleRole::Middle => 0.0,
        SampleRole::End => pitch_for(-d),
    };
    EulerAngles::new(pitch, yaw, 0.0)
}
