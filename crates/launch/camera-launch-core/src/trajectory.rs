//! Trajectory solve: kinematics -> control frames -> orientation -> tangents,
//! and the analytic three-key channel plans built from it.

use serde::{Deserialize, Serialize};

use crate::channel::{ChannelAttr, ChannelId, Tangent, TangentSide};
use crate::config::LaunchConfig;
use crate::frames::{ControlFrames, FrameScheduler, TimeUnit};
use crate::kinematics::Kinematics;
use crate::orientation::orientation_for;
use crate::params::LaunchParameters;
use crate::tangent::{solve_vertical_tangents, SampleTangents};
use crate::value::{EulerAngles, Vector3};
use crate::writer::{ChannelPlan, KeySpec};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SampleRole {
    Start,
    Middle,
    End,
}

impl SampleRole {
    pub const ALL: [SampleRole; 3] = [SampleRole::Start, SampleRole::Middle, SampleRole::End];
}

/// Launch, apex or landing waypoint.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ControlSample {
    pub frame: i64,
    pub position: Vector3,
    pub orientation: EulerAngles,
    pub role: SampleRole,
}

/// Everything computed for one launch before anything is written.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub kinematics: Kinematics,
    pub scheduler: FrameScheduler,
    pub frames: ControlFrames,
    /// Ordered by role: start, middle, end.
    pub samples: [ControlSample; 3],
    /// `None` when the vertical fit was degenerate.
    pub vertical_tangents: Option<[SampleTangents; 3]>,
}

impl Trajectory {
    pub fn solve(params: &LaunchParameters, unit: TimeUnit, config: &LaunchConfig) -> Self {
        let kinematics = Kinematics::from_params(params);
        let scheduler = FrameScheduler::new(unit, params.start_frame);
        let frames = scheduler.control_frames(&kinematics, config);

        let samples = SampleRole::ALL.map(|role| {
            let frame = match role {
                SampleRole::Start => frames.start,
                SampleRole::Middle => frames.middle,
                SampleRole::End => frames.end,
            };
            ControlSample {
                frame,
                position: kinematics.position_at_time(scheduler.frame_to_time(frame)),
                orientation: orientation_for(params.velocity, role),
                role,
            }
        });

        let times = samples.map(|s| scheduler.frame_to_time(s.frame));
        let heights = samples.map(|s| s.position.y);
        let vertical_tangents = solve_vertical_tangents(times, heights, config.tangent_epsilon);

        Self {
            kinematics,
            scheduler,
            frames,
            samples,
            vertical_tangents,
        }
    }

    pub fn sample(&self, role: SampleRole) -> &ControlSample {
        match role {
            SampleRole::Start => &self.samples[0],
            SampleRole::Middle => &self.samples[1],
            SampleRole::End => &self.samples[2],
        }
    }

    /// Three keys per launch channel. Only translateY gets fitted tangents;
    /// the other channels stay linear.
    pub fn channel_plans(&self, node: &str, tangent_weight: f64) -> Vec<ChannelPlan> {
        ChannelAttr::LAUNCH
            .iter()
            .map(|&attr| {
                let keys = self
                    .samples
                    .iter()
                    .enumerate()
                    .map(|(i, sample)| {
                        let key = KeySpec::linear(sample.frame as f64, sample_value(sample, attr));
                        match (attr, &self.vertical_tangents) {
                            (ChannelAttr::TranslateY, Some(tangents)) => {
                                apply_tangents(key, tangents[i], tangent_weight)
                            }
                            _ => key,
                        }
                    })
                    .collect();
                ChannelPlan {
                    channel: ChannelId::new(node, attr),
                    keys,
                }
            })
            .collect()
    }
}

/// Channel value of a position/orientation pair.
pub(crate) fn channel_value(
    position: &Vector3,
    orientation: &EulerAngles,
    attr: ChannelAttr,
) -> f64 {
    match attr {
        ChannelAttr::TranslateX => position.x,
        ChannelAttr::TranslateY => position.y,
        ChannelAttr::TranslateZ => position.z,
        ChannelAttr::RotateX => orientation.pitch,
        ChannelAttr::RotateY => orientation.yaw,
        ChannelAttr::RotateZ => orientation.roll,
    }
}

fn sample_value(sample: &ControlSample, attr: ChannelAttr) -> f64 {
    channel_value(&sample.position, &sample.orientation, attr)
}

fn apply_tangents(mut key: KeySpec, tangents: SampleTangents, weight: f64) -> KeySpec {
    if let Some(angle) = tangents.incoming {
        key = key.with_fixed(TangentSide::In, Tangent::new(angle, weight));
    }
    if let Some(angle) = tangents.outgoing {
        key = key.with_fixed(TangentSide::Out, Tangent::new(angle, weight));
    }
    key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::TangentType;

    fn approx(a: f64, b: f64, eps: f64) {
        assert!((a - b).abs() <= eps, "left={a} right={b} eps={eps}");
    }

    fn vertical_launch() -> LaunchParameters {
        LaunchParameters::new("cam", Vector3::new(0.0, 1.0, 0.0), Vector3::new(0.0, 20.0, 0.0))
            .with_gravity(-10.0)
    }

    #[test]
    fn samples_hit_apex_and_landing() {
        let traj = Trajectory::solve(&vertical_launch(), TimeUnit::Film, &LaunchConfig::default());
        assert_eq!(traj.frames.as_array(), [0, 48, 97]);
        approx(traj.sample(SampleRole::Middle).position.y, 21.0, 1e-9);
        // landing is one frame past ground contact
        assert!(traj.sample(SampleRole::End).position.y < 1.0);
        assert!(traj.vertical_tangents.is_some());
    }

    #[test]
    fn five_channels_of_three_keys() {
        let traj = Trajectory::solve(&vertical_launch(), TimeUnit::Film, &LaunchConfig::default());
        let plans = traj.channel_plans("cam", 1.0);
        assert_eq!(plans.len(), 5);
        for plan in &plans {
            assert_eq!(plan.keys.len(), 3);
            let times: Vec<f64> = plan.keys.iter().map(|k| k.time).collect();
            assert_eq!(times, vec![0.0, 48.0, 97.0]);
        }
        let ty = plans
            .iter()
            .find(|p| p.channel.attr == ChannelAttr::TranslateY)
            .unwrap();
        assert_eq!(ty.keys[0].in_type, TangentType::Linear);
        assert_eq!(ty.keys[0].out_type, TangentType::Fixed);
        assert_eq!(ty.keys[1].in_tangent, Some(Tangent::new(0.0, 1.0)));
        assert_eq!(ty.keys[1].out_tangent, Some(Tangent::new(0.0, 1.0)));
        assert_eq!(ty.keys[2].in_type, TangentType::Fixed);
        assert_eq!(ty.keys[2].out_type, TangentType::Linear);

        let tx = plans
            .iter()
            .find(|p| p.channel.attr == ChannelAttr::TranslateX)
            .unwrap();
        assert!(tx.keys.iter().all(|k| k.in_tangent.is_none() && k.out_tangent.is_none()));
    }

    #[test]
    fn launch_tangent_matches_launch_velocity() {
        let traj = Trajectory::solve(&vertical_launch(), TimeUnit::Film, &LaunchConfig::default());
        let [start, _, end] = traj.vertical_tangents.unwrap();
        // samples lie on the true parabola, so the fit recovers vy = 20
        approx(start.outgoing.unwrap(), 20.0f64.atan(), 1e-9);
        let landing_t = traj.scheduler.frame_to_time(traj.frames.end);
        approx(end.incoming.unwrap(), (20.0 - 10.0 * landing_t).atan(), 1e-9);
    }

    #[test]
    fn degenerate_frames_keep_linear_tangents() {
        let params = LaunchParameters::new("cam", Vector3::ZERO, Vector3::new(1.0, 0.1, 0.0))
            .with_gravity(-10.0);
        let traj = Trajectory::solve(&params, TimeUnit::Film, &LaunchConfig::default());
        assert_eq!(traj.frames.start, traj.frames.middle);
        assert!(traj.vertical_tangents.is_none());
        let plans = traj.channel_plans("cam", 1.0);
        for plan in plans {
            for key in plan.keys {
                assert_eq!(key.in_type, TangentType::Linear);
                assert_eq!(key.out_type, TangentType::Linear);
            }
        }
    }
}
