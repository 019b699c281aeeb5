//! Launch parameters: the validated, immutable input of one launch.

use serde::{Deserialize, Serialize};

use crate::value::Vector3;

pub const DEFAULT_GRAVITY: f64 = -9.81;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchParameters {
    /// Camera node that receives the keys.
    pub camera: String,
    /// World-space translation of the camera when the command was parsed.
    pub start_position: Vector3,
    pub velocity: Vector3,
    /// Vertical acceleration; negative pulls down.
    pub gravity: f64,
    pub start_frame: i64,
}

impl LaunchParameters {
    pub fn new(camera: impl Into<String>, start_position: Vector3, velocity: Vector3) -> Self {
        Self {
            camera: camera.into(),
            start_position,
            velocity,
            gravity: DEFAULT_GRAVITY,
            start_frame: 0,
        }
    }

    /// Launch given as speed, elevation and heading (degrees) instead of a
    /// velocity vector.
    pub fn from_speed_and_angle(
        camera: impl Into<String>,
        start_position: Vector3,
        speed: f64,
        elevation_deg: f64,
        heading_deg: f64,
    ) -> Self {
        Self::new(
            camera,
            start_position,
            velocity_from_speed_and_angle(speed, elevation_deg, heading_deg),
        )
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_start_frame(mut self, start_frame: i64) -> Self {
        self.start_frame = start_frame;
        self
    }
}

/// Velocity for a launch given as speed, elevation and heading.
///
/// Elevation is measured up from the ground plane; heading rotates around +Y
/// with 0 pointing along +X. Both are in degrees.
pub fn velocity_from_speed_and_angle(speed: f64, elevation_deg: f64, heading_deg: f64) -> Vector3 {
    let elevation = elevation_deg.to_radians();
    let heading = heading_deg.to_radians();
    let ground = speed * elevation.cos();
    Vector3::new(
        ground * heading.cos(),
        speed * elevation.sin(),
        -ground * heading.sin(),
    )
}
