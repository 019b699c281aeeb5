//! Frame timing: seconds <-> frames at the host's current frame rate, and the
//! three control frames of a launch.

use serde::{Deserialize, Serialize};

use crate::config::LaunchConfig;
use crate::error::LaunchError;
use crate::kinematics::Kinematics;

/// Absorbs representation error before flooring (2.0 s at 24 fps must be frame 48).
const FRAME_SNAP: f64 = 1e-9;

const FALLBACK_FPS: f64 = 24.0;

/// Host frame-rate units.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    /// 15 fps
    Game,
    /// 24 fps
    #[default]
    Film,
    /// 25 fps
    Pal,
    /// 30 fps
    Ntsc,
    /// 48 fps
    Show,
    /// 50 fps
    PalField,
    /// 60 fps
    NtscField,
    /// Any other rate.
    Fps(f64),
}

impl TimeUnit {
    pub fn fps(&self) -> f64 {
        match self {
            TimeUnit::Game => 15.0,
            TimeUnit::Film => 24.0,
            TimeUnit::Pal => 25.0,
            TimeUnit::Ntsc => 30.0,
            TimeUnit::Show => 48.0,
            TimeUnit::PalField => 50.0,
            TimeUnit::NtscField => 60.0,
            TimeUnit::Fps(fps) => *fps,
        }
    }

    pub fn seconds_per_frame(&self) -> f64 {
        self.fps().recip()
    }
}

/// Frame numbers of the launch, apex and landing samples.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlFrames {
    pub start: i64,
    pub middle: i64,
    pub end: i64,
}

impl ControlFrames {
    pub fn as_array(&self) -> [i64; 3] {
        [self.start, self.middle, self.end]
    }

    /// True when no two control frames coincide.
    pub fn is_strictly_increasing(&self) -> bool {
        self.start < self.middle && self.middle < self.end
    }

    /// Total number of frames covered, both ends inclusive.
    pub fn span(&self) -> i64 {
        self.end.saturating_sub(self.start).saturating_add(1)
    }
}

/// Rejects launch frames where even the longest allowed flight would land past
/// the last representable frame.
pub fn check_start_frame(start_frame: i64, config: &LaunchConfig) -> Result<(), LaunchError> {
    if start_frame.checked_add(config.max_flight_frames).is_none() {
        return Err(LaunchError::invalid_value(
            "-startFrame",
            format!(
                "{start_frame} leaves no room for a {}-frame flight",
                config.max_flight_frames
            ),
        ));
    }
    Ok(())
}

/// Converts between physical time and integer frames for one launch.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FrameScheduler {
    fps: f64,
    start_frame: i64,
}

impl FrameScheduler {
    /// A non-finite or non-positive rate falls back to 24 fps.
    pub fn new(unit: TimeUnit, start_frame: i64) -> Self {
        let fps = unit.fps();
        let fps = if fps.is_finite() && fps > 0.0 {
            fps
        } else {
            log::warn!("invalid frame rate {fps}; using {FALLBACK_FPS} fps");
            FALLBACK_FPS
        };
        Self { fps, start_frame }
    }

    #[inline]
    pub fn fps(&self) -> f64 {
        self.fps
    }

    #[inline]
    pub fn seconds_per_frame(&self) -> f64 {
        self.fps.recip()
    }

    #[inline]
    pub fn start_frame(&self) -> i64 {
        self.start_frame
    }

    /// Whole frames elapsed after `seconds` (floor). Non-finite input maps to 0.
    pub fn seconds_to_frames(&self, seconds: f64) -> i64 {
        let frames = (seconds * self.fps + FRAME_SNAP).floor();
        if frames.is_finite() {
            frames as i64
        } else {
            0
        }
    }

    pub fn frames_to_seconds(&self, frames: i64) -> f64 {
        frames as f64 / self.fps
    }

    /// Seconds since the launch frame at which `frame` plays.
    pub fn frame_to_time(&self, frame: i64) -> f64 {
        self.frames_to_seconds(frame - self.start_frame)
    }

    /// Launch, apex and landing frames.
    ///
    /// Without a ballistic apex the middle sample sits halfway through the
    /// fallback flight. The middle frame is clamped into `[start, end]`.
    pub fn control_frames(&self, kinematics: &Kinematics, config: &LaunchConfig) -> ControlFrames {
        let flight = kinematics.flight_frames(self, config);
        let start = self.start_frame;
        let end = start.saturating_add(flight);
        let middle = match kinematics.time_to_apex() {
            Some(apex) => start.saturating_add(self.seconds_to_frames(apex)),
            None => start.saturating_add(flight / 2),
        };
        ControlFrames {
            start,
            middle: middle.clamp(start, end),
            end,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Vector3;

    #[test]
    fn film_rate_round_numbers() {
        let s = FrameScheduler::new(TimeUnit::Film, 10);
        assert_eq!(s.seconds_to_frames(2.0), 48);
        assert_eq!(s.seconds_to_frames(0.99 / 24.0), 0);
        assert_eq!(s.frame_to_time(34), 1.0);
        assert_eq!(s.frames_to_seconds(12), 0.5);
    }

    #[test]
    fn invalid_custom_rate_falls_back() {
        let s = FrameScheduler::new(TimeUnit::Fps(0.0), 0);
        assert_eq!(s.fps(), 24.0);
        let s = FrameScheduler::new(TimeUnit::Fps(f64::NAN), 0);
        assert_eq!(s.fps(), 24.0);
    }

    #[test]
    fn control_frames_for_simple_arc() {
        let k = Kinematics::new(Vector3::ZERO, Vector3::new(0.0, 20.0, 0.0), -10.0);
        let s = FrameScheduler::new(TimeUnit::Film, 5);
        let frames = s.control_frames(&k, &LaunchConfig::default());
        // apex at 2s, flight of 4s -> 96 frames + 1
        assert_eq!(
            frames,
            ControlFrames {
                start: 5,
                middle: 53,
                end: 102
            }
        );
        assert!(frames.is_strictly_increasing());
    }

    #[test]
    fn control_frames_without_apex_use_fallback_midpoint() {
        let k = Kinematics::new(Vector3::ZERO, Vector3::new(5.0, 0.0, 5.0), -9.81);
        let s = FrameScheduler::new(TimeUnit::Ntsc, 0);
        let frames = s.control_frames(&k, &LaunchConfig::default());
        assert_eq!(
            frames,
            ControlFrames {
                start: 0,
                middle: 60,
                end: 120
            }
        );
    }

    #[test]
    fn tiny_arc_collapses_apex_onto_start() {
        // apex after 0.01 s: well under one frame at 24 fps
        let k = Kinematics::new(Vector3::ZERO, Vector3::new(1.0, 0.1, 0.0), -10.0);
        let s = FrameScheduler::new(TimeUnit::Film, 0);
        let frames = s.control_frames(&k, &LaunchConfig::default());
        assert_eq!(frames.start, frames.middle);
        assert_eq!(frames.end, 1);
        assert!(!frames.is_strictly_increasing());
    }

    #[test]
    fn frames_near_the_end_of_the_range_saturate() {
        let k = Kinematics::new(Vector3::ZERO, Vector3::new(0.0, 20.0, 0.0), -10.0);
        let s = FrameScheduler::new(TimeUnit::Film, i64::MAX - 10);
        let frames = s.control_frames(&k, &LaunchConfig::default());
        assert_eq!(frames.end, i64::MAX);
        assert_eq!(frames.middle, i64::MAX);
        assert_eq!(frames.span(), 11);

        let wide = ControlFrames {
            start: i64::MIN,
            middle: 0,
            end: i64::MAX,
        };
        assert_eq!(wide.span(), i64::MAX);
    }

    #[test]
    fn start_frame_must_leave_room_for_the_flight() {
        let cfg = LaunchConfig::default();
        assert!(check_start_frame(0, &cfg).is_ok());
        assert!(check_start_frame(i64::MIN, &cfg).is_ok());
        assert!(check_start_frame(i64::MAX - cfg.max_flight_frames, &cfg).is_ok());
        let err = check_start_frame(i64::MAX, &cfg).unwrap_err();
        assert!(matches!(err, LaunchError::InvalidFlagValue { .. }));
        assert!(err.is_recoverable());
    }
}
