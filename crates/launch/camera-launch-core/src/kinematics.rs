//! Constant-gravity projectile motion.
//!
//! Gravity is signed (negative pulls down). Formulas that need a duration use its
//! magnitude; positions use the signed value so a non-negative gravity still
//! produces a finite (if unphysical) path.

use serde::{Deserialize, Serialize};

use crate::config::LaunchConfig;
use crate::frames::FrameScheduler;
use crate::params::LaunchParameters;
use crate::value::Vector3;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub start: Vector3,
    pub velocity: Vector3,
    pub gravity: f64,
}

impl Kinematics {
    pub fn new(start: Vector3, velocity: Vector3, gravity: f64) -> Self {
        Self {
            start,
            velocity,
            gravity,
        }
    }

    pub fn from_params(params: &LaunchParameters) -> Self {
        Self::new(params.start_position, params.velocity, params.gravity)
    }

    /// Rising launch under downward gravity: the only input with an apex.
    pub fn is_ballistic(&self) -> bool {
        self.velocity.y > 0.0 && self.gravity < 0.0 && self.velocity.y.is_finite()
    }

    /// Seconds until vertical velocity reaches zero.
    pub fn time_to_apex(&self) -> Option<f64> {
        self.is_ballistic().then(|| -self.velocity.y / self.gravity)
    }

    /// Seconds until the camera is back at launch height.
    pub fn flight_time(&self) -> Option<f64> {
        self.is_ballistic()
            .then(|| 2.0 * self.velocity.y / self.gravity.abs())
    }

    pub fn position_at_time(&self, t: f64) -> Vector3 {
        let p = self.start;
        let v = self.velocity;
        Vector3::new(
            p.x + v.x * t,
            p.y + v.y * t + 0.5 * self.gravity * t * t,
            p.z + v.z * t,
        )
    }

    pub fn apex_position(&self) -> Option<Vector3> {
        self.time_to_apex().map(|t| self.position_at_time(t))
    }

    /// Flight length in whole frames, in `1..=config.max_flight_frames`.
    ///
    /// One frame is added past ground contact so the landing key sits strictly
    /// after it. Inputs without an arc get `config.fallback_flight_frames`.
    pub fn flight_frames(&self, scheduler: &FrameScheduler, config: &LaunchConfig) -> i64 {
        let Some(flight) = self.flight_time() else {
            log::debug!(
                "no ballistic arc (vy={}, g={}); using {} fallback frames",
                self.velocity.y,
                self.gravity,
                config.fallback_flight_frames
            );
            return config.fallback_flight_frames;
        };
        let frames = scheduler.seconds_to_frames(flight).saturating_add(1);
        if !(flight.is_finite() && frames > 0) {
            return config.min_flight_frames;
        }
        if frames > config.max_flight_frames {
            log::warn!(
                "flight of {frames} frames cut to {} frames",
                config.max_flight_frames
            );
            return config.max_flight_frames;
        }
        frames
    }

    /// Seconds from launch to the landing sample.
    pub fn landing_time(&self, scheduler: &FrameScheduler, config: &LaunchConfig) -> f64 {
        scheduler.frames_to_seconds(self.flight_frames(scheduler, config))
    }
}
