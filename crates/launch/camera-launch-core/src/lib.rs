//! Camera Launch Core (host-agnostic)
//!
//! Turns a camera's start position, a launch velocity and gravity into keyed
//! animation: translate and rotate channels keyed at launch, apex and landing,
//! with vertical tangents fitted to the projectile arc. The `cameraLaunch`
//! command writes the keys through host traits and can undo them exactly.
//!
//! Hosts implement [`AnimationChannelStore`] and [`SceneHost`]. [`MemoryHost`]
//! is an in-process implementation for tooling and tests.

pub mod args;
pub mod baking;
pub mod channel;
pub mod command;
pub mod config;
pub mod error;
pub mod frames;
pub mod kinematics;
pub mod memory;
pub mod orientation;
pub mod params;
pub mod tangent;
pub mod trajectory;
pub mod undo;
pub mod value;
pub mod writer;

// Re-exports for hosts
pub use args::{syntax, FlagSpec, LaunchArgs};
pub use baking::{bake_trajectory, export_baked_json, BakedSample};
pub use channel::{
    AnimationChannelStore, ChannelAttr, ChannelId, LaunchHost, NodeKind, SceneHost, Tangent,
    TangentSide, TangentType,
};
pub use command::{CameraLaunchCommand, CommandState, LaunchReport, COMMAND_NAME};
pub use config::{KeyMode, LaunchConfig};
pub use error::LaunchError;
pub use frames::{ControlFrames, FrameScheduler, TimeUnit};
pub use kinematics::Kinematics;
pub use memory::{MemoryHost, SceneDescription};
pub use orientation::orientation_for;
pub use params::{velocity_from_speed_and_angle, LaunchParameters, DEFAULT_GRAVITY};
pub use tangent::{solve_vertical_tangents, QuadraticFit, SampleTangents};
pub use trajectory::{ControlSample, SampleRole, Trajectory};
pub use undo::{ChannelSnapshot, KeySnapshot, UndoStore};
pub use value::{EulerAngles, Vector3};
pub use writer::{ChannelPlan, ChannelWriter, KeySpec};

pub type Result<T> = core::result::Result<T, LaunchError>;
