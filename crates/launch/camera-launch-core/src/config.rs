//! Launch configuration.

use serde::{Deserialize, Serialize};

use crate::error::LaunchError;
use crate::params::DEFAULT_GRAVITY;

/// How the trajectory is turned into keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Three keys per channel (launch, apex, landing) with fitted tangents.
    #[default]
    Analytic,
    /// One linear key per frame over the whole flight.
    Baked,
}

/// Defaults and tuning knobs for a launch command.
/// Flags given to a single invocation override these.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LaunchConfig {
    /// Flight length used when the input has no ballistic arc.
    pub fallback_flight_frames: i64,
    /// Flight length used when a ballistic arc rounds to zero frames.
    pub min_flight_frames: i64,
    /// Longest flight, in frames; longer arcs are cut at this landing frame.
    pub max_flight_frames: i64,
    /// Longest flight baked mode will key, both ends inclusive.
    pub max_baked_frames: i64,
    /// Gravity applied when no `-gravity` flag is given.
    pub default_gravity: f64,
    /// Below this the quadratic fit denominator counts as degenerate.
    pub tangent_epsilon: f64,
    /// Weight written with every fitted tangent.
    pub tangent_weight: f64,
    pub key_mode: KeyMode,
    /// Fit the host playback range to the flight (restored on undo).
    pub update_playback_range: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            fallback_flight_frames: 120,
            min_flight_frames: 60,
            max_flight_frames: 100_000,
            max_baked_frames: 10_000,
            default_gravity: DEFAULT_GRAVITY,
            tangent_epsilon: 1e-10,
            tangent_weight: 1.0,
            key_mode: KeyMode::Analytic,
            update_playback_range: false,
        }
    }
}

impl LaunchConfig {
    /// Parse a (possibly partial) JSON document; missing fields keep their defaults.
    pub fn from_json(s: &str) -> Result<Self, LaunchError> {
        let cfg: LaunchConfig = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.fallback_flight_frames <= 0 || self.min_flight_frames <= 0 {
            return Err(LaunchError::Config {
                reason: "fallback frame counts must be > 0".into(),
            });
        }
        if self.max_flight_frames < self.fallback_flight_frames
            || self.max_flight_frames < self.min_flight_frames
        {
            return Err(LaunchError::Config {
                reason: "max_flight_frames must cover the fallback frame counts".into(),
            });
        }
        if self.max_baked_frames <= 0 {
            return Err(LaunchError::Config {
                reason: "max_baked_frames must be > 0".into(),
            });
        }
        if !self.default_gravity.is_finite() {
            return Err(LaunchError::Config {
                reason: "default_gravity must be finite".into(),
            });
        }
        if !(self.tangent_epsilon.is_finite() && self.tangent_epsilon >= 0.0) {
            return Err(LaunchError::Config {
                reason: "tangent_epsilon must be finite and >= 0".into(),
            });
        }
        if !(self.tangent_weight.is_finite() && self.tangent_weight > 0.0) {
            return Err(LaunchError::Config {
                reason: "tangent_weight must be finite and > 0".into(),
            });
        }
        Ok(())
    }
}
