//! Channel identifiers, key/tangent types, and the host traits.
//!
//! The engine never owns scene nodes or animation curves. Hosts implement
//! [`AnimationChannelStore`] and [`SceneHost`]; anything that implements both is a
//! [`LaunchHost`]. [`crate::memory::MemoryHost`] is the in-process reference.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::LaunchError;
use crate::frames::TimeUnit;
use crate::value::Vector3;

/// Transform attribute driven by one scalar channel.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChannelAttr {
    TranslateX,
    TranslateY,
    TranslateZ,
    RotateX,
    RotateY,
    RotateZ,
}

impl ChannelAttr {
    /// Channels a launch writes. Pitch drives rotateX, yaw drives rotateY; roll
    /// is never keyed.
    pub const LAUNCH: [ChannelAttr; 5] = [
        ChannelAttr::TranslateX,
        ChannelAttr::TranslateY,
        ChannelAttr::TranslateZ,
        ChannelAttr::RotateX,
        ChannelAttr::RotateY,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ChannelAttr::TranslateX => "translateX",
            ChannelAttr::TranslateY => "translateY",
            ChannelAttr::TranslateZ => "translateZ",
            ChannelAttr::RotateX => "rotateX",
            ChannelAttr::RotateY => "rotateY",
            ChannelAttr::RotateZ => "rotateZ",
        }
    }
}

/// One scalar animation track on a node: `camera1.translateY`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ChannelId {
    pub node: String,
    pub attr: ChannelAttr,
}

impl ChannelId {
    pub fn new(node: impl Into<String>, attr: ChannelAttr) -> Self {
        Self {
            node: node.into(),
            attr,
        }
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.node, self.attr.name())
    }
}

/// Tangent types understood by animation hosts.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TangentType {
    Global,
    Fixed,
    #[default]
    Linear,
    Flat,
    Smooth,
    Step,
    StepNext,
    Spline,
    Clamped,
    Plateau,
    Auto,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TangentSide {
    In,
    Out,
}

/// Tangent angle (radians) and weight on one side of a key.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tangent {
    pub angle: f64,
    pub weight: f64,
}

impl Tangent {
    pub const fn new(angle: f64, weight: f64) -> Self {
        Self { angle, weight }
    }
}

impl Default for Tangent {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Transform with a camera shape underneath.
    Camera,
    Transform,
    Other,
}

/// Host-owned animation curve storage.
///
/// Key times are frame numbers. Keys are kept sorted by time; adding a key at
/// an existing time replaces that key. Setting a tangent never changes the
/// key's tangent types.
pub trait AnimationChannelStore {
    /// True when an animation curve currently drives the channel.
    fn has_animation(&self, channel: &ChannelId) -> bool;

    /// Create an empty curve driving the channel.
    fn create_channel(&mut self, channel: &ChannelId) -> Result<(), LaunchError>;

    /// Disconnect and delete the curve driving the channel.
    fn remove_channel(&mut self, channel: &ChannelId) -> Result<(), LaunchError>;

    /// Insert a key and return its index.
    fn add_key(
        &mut self,
        channel: &ChannelId,
        time: f64,
        value: f64,
        in_type: TangentType,
        out_type: TangentType,
    ) -> Result<usize, LaunchError>;

    fn set_tangent(
        &mut self,
        channel: &ChannelId,
        key: usize,
        side: TangentSide,
        tangent: Tangent,
    ) -> Result<(), LaunchError>;

    fn tangent(&self, channel: &ChannelId, key: usize, side: TangentSide)
        -> Result<Tangent, LaunchError>;

    /// `(in, out)` tangent types of a key.
    fn tangent_types(
        &self,
        channel: &ChannelId,
        key: usize,
    ) -> Result<(TangentType, TangentType), LaunchError>;

    /// Number of keys; 0 for a channel without animation.
    fn num_keys(&self, channel: &ChannelId) -> usize;

    fn key_time(&self, channel: &ChannelId, key: usize) -> Result<f64, LaunchError>;

    fn key_value(&self, channel: &ChannelId, key: usize) -> Result<f64, LaunchError>;
}

/// Scene, selection and time services of the host.
pub trait SceneHost {
    /// `None` when the name does not resolve.
    fn node_kind(&self, name: &str) -> Option<NodeKind>;

    fn world_translation(&self, node: &str) -> Result<Vector3, LaunchError>;

    fn active_selection(&self) -> Vec<String>;

    fn set_active_selection(&mut self, names: &[String]) -> Result<(), LaunchError>;

    /// Current frame-rate unit.
    fn time_unit(&self) -> TimeUnit;

    /// Fire-and-forget redraw request.
    fn refresh_viewport(&mut self) {}

    /// `(min, max)` playback frames, if the host has a playback range.
    fn playback_range(&self) -> Option<(f64, f64)> {
        None
    }

    fn set_playback_range(&mut self, _min: f64, _max: f64) -> Result<(), LaunchError> {
        Ok(())
    }
}

/// Everything a launch command needs from its host.
pub trait LaunchHost: AnimationChannelStore + SceneHost {}

impl<T: AnimationChannelStore + SceneHost + ?Sized> LaunchHost for T {}
