//! Baked mode: one key per frame over the whole flight.
//!
//! Positions are sampled from the exact projectile formula on every frame and
//! keyed with linear tangents, so no tangent fitting is involved. Pitch is
//! interpolated linearly launch -> apex -> landing; yaw is constant.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelAttr, ChannelId};
use crate::config::LaunchConfig;
use crate::error::LaunchError;
use crate::trajectory::{channel_value, SampleRole, Trajectory};
use crate::value::{EulerAngles, Vector3};
use crate::writer::{ChannelPlan, KeySpec};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BakedSample {
    pub frame: i64,
    pub position: Vector3,
    pub orientation: EulerAngles,
}

/// Refuse flights longer than `config.max_baked_frames`; checked before any
/// sample is built.
pub fn check_bake_span(trajectory: &Trajectory, config: &LaunchConfig) -> Result<(), LaunchError> {
    let frames = trajectory.frames.span();
    if frames > config.max_baked_frames {
        return Err(LaunchError::BakeTooLong {
            frames,
            limit: config.max_baked_frames,
        });
    }
    Ok(())
}

/// Sample every frame from launch to landing, both inclusive.
pub fn bake_trajectory(trajectory: &Trajectory) -> Vec<BakedSample> {
    let frames = trajectory.frames;
    let start = trajectory.sample(SampleRole::Start);
    let middle = trajectory.sample(SampleRole::Middle);
    let end = trajectory.sample(SampleRole::End);

    (frames.start..=frames.end)
        .map(|frame| {
            let t = trajectory.scheduler.frame_to_time(frame);
            let pitch = if frame <= middle.frame {
                lerp_frames(
                    start.frame,
                    start.orientation.pitch,
                    middle.frame,
                    middle.orientation.pitch,
                    frame,
                )
            } else {
                lerp_frames(
                    middle.frame,
                    middle.orientation.pitch,
                    end.frame,
                    end.orientation.pitch,
                    frame,
                )
            };
            BakedSample {
                frame,
                position: trajectory.kinematics.position_at_time(t),
                orientation: EulerAngles::new(pitch, start.orientation.yaw, 0.0),
            }
        })
        .collect()
}

/// Linear interpolation between two keyed frames; a zero-length span holds the
/// later value.
fn lerp_frames(f0: i64, v0: f64, f1: i64, v1: f64, frame: i64) -> f64 {
    if f1 <= f0 {
        return v1;
    }
    let u = (frame - f0) as f64 / (f1 - f0) as f64;
    v0 + (v1 - v0) * u.clamp(0.0, 1.0)
}

/// Channel plans with one linear key per baked frame.
pub fn bake_channel_plans(trajectory: &Trajectory, node: &str) -> Vec<ChannelPlan> {
    let samples = bake_trajectory(trajectory);
    ChannelAttr::LAUNCH
        .iter()
        .map(|&attr| ChannelPlan {
            channel: ChannelId::new(node, attr),
            keys: samples
                .iter()
                .map(|s| {
                    let value = channel_value(&s.position, &s.orientation, attr);
                    KeySpec::linear(s.frame as f64, value)
                })
                .collect(),
        })
        .collect()
}

/// Export baked samples as serde_json::Value.
pub fn export_baked_json(samples: &[BakedSample]) -> serde_json::Value {
    serde_json::to_value(samples).unwrap_or(serde_json::Value::Null)
}
