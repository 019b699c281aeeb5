//! In-memory host.
//!
//! `MemoryHost` implements both host traits over plain maps. It stores tangents
//! verbatim and never evaluates tangent types, which makes it suitable for
//! headless tooling and for checking exact round-trips. Scenes can be loaded
//! from JSON ([`SceneDescription`]).

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

use crate::channel::{
    AnimationChannelStore, ChannelId, NodeKind, SceneHost, Tangent, TangentSide, TangentType,
};
use crate::error::LaunchError;
use crate::frames::TimeUnit;
use crate::undo::ChannelSnapshot;
use crate::value::Vector3;
use crate::writer::ChannelWriter;

/// Keys closer than this (in frames) share a time.
const SAME_TIME_EPS: f64 = 1e-9;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryNode {
    pub kind: NodeKind,
    #[serde(default)]
    pub translation: Vector3,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MemoryKey {
    pub time: f64,
    pub value: f64,
    pub in_type: TangentType,
    pub out_type: TangentType,
    pub in_tangent: Tangent,
    pub out_tangent: Tangent,
}

/// Serializable scene used to seed a [`MemoryHost`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneDescription {
    pub nodes: HashMap<String, MemoryNode>,
    pub curves: Vec<ChannelSnapshot>,
    pub selection: Vec<String>,
    pub time_unit: TimeUnit,
    pub playback_range: Option<(f64, f64)>,
}

#[derive(Clone, Debug, Default)]
pub struct MemoryHost {
    nodes: HashMap<String, MemoryNode>,
    curves: HashMap<ChannelId, Vec<MemoryKey>>,
    selection: Vec<String>,
    time_unit: TimeUnit,
    playback_range: Option<(f64, f64)>,
    refresh_count: usize,
    /// Remaining `add_key` calls before one write is refused.
    write_budget: Option<usize>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_scene(scene: SceneDescription) -> Result<Self, LaunchError> {
        let mut host = Self {
            nodes: scene.nodes,
            selection: scene.selection,
            time_unit: scene.time_unit,
            playback_range: scene.playback_range,
            ..Self::default()
        };
        for curve in &scene.curves {
            if curve.is_empty() {
                continue;
            }
            ChannelWriter::new(&mut host).write(&curve.to_plan())?;
        }
        Ok(host)
    }

    pub fn from_json(s: &str) -> Result<Self, LaunchError> {
        let scene: SceneDescription = serde_json::from_str(s)?;
        Self::from_scene(scene)
    }

    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind, translation: Vector3) {
        self.nodes
            .insert(name.into(), MemoryNode { kind, translation });
    }

    pub fn set_time_unit(&mut self, unit: TimeUnit) {
        self.time_unit = unit;
    }

    /// Keys of a channel in time order.
    pub fn curve(&self, channel: &ChannelId) -> Option<&[MemoryKey]> {
        self.curves.get(channel).map(Vec::as_slice)
    }

    /// Number of animated channels in the scene.
    pub fn curve_count(&self) -> usize {
        self.curves.len()
    }

    /// How many viewport refreshes were requested.
    pub fn refresh_count(&self) -> usize {
        self.refresh_count
    }

    /// Let `n` more keys be written, then refuse the next `add_key`. The
    /// refusal clears the budget, so later writes succeed again.
    pub fn fail_writes_after(&mut self, n: usize) {
        self.write_budget = Some(n);
    }

    pub fn clear_write_failure(&mut self) {
        self.write_budget = None;
    }

    fn keys(&self, channel: &ChannelId) -> Result<&Vec<MemoryKey>, LaunchError> {
        self.curves
            .get(channel)
            .ok_or_else(|| LaunchError::ChannelNotFound {
                channel: channel.to_string(),
            })
    }

    fn key(&self, channel: &ChannelId, key: usize) -> Result<&MemoryKey, LaunchError> {
        let keys = self.keys(channel)?;
        keys.get(key).ok_or_else(|| LaunchError::KeyOutOfRange {
            channel: channel.to_string(),
            index: key,
            len: keys.len(),
        })
    }
}

impl AnimationChannelStore for MemoryHost {
    fn has_animation(&self, channel: &ChannelId) -> bool {
        self.curves.contains_key(channel)
    }

    fn create_channel(&mut self, channel: &ChannelId) -> Result<(), LaunchError> {
        if !self.nodes.contains_key(&channel.node) {
            return Err(LaunchError::ChannelNotFound {
                channel: channel.to_string(),
            });
        }
        if self.curves.contains_key(channel) {
            return Err(LaunchError::host(format!("{channel} is already animated")));
        }
        self.curves.insert(channel.clone(), Vec::new());
        Ok(())
    }

    fn remove_channel(&mut self, channel: &ChannelId) -> Result<(), LaunchError> {
        self.curves
            .remove(channel)
            .map(|_| ())
            .ok_or_else(|| LaunchError::ChannelNotFound {
                channel: channel.to_string(),
            })
    }

    fn add_key(
        &mut self,
        channel: &ChannelId,
        time: f64,
        value: f64,
        in_type: TangentType,
        out_type: TangentType,
    ) -> Result<usize, LaunchError> {
        if let Some(budget) = self.write_budget.as_mut() {
            if *budget == 0 {
                self.write_budget = None;
                return Err(LaunchError::host(format!("write to {channel} refused")));
            }
            *budget -= 1;
        }
        let keys = self
            .curves
            .get_mut(channel)
            .ok_or_else(|| LaunchError::ChannelNotFound {
                channel: channel.to_string(),
            })?;
        let key = MemoryKey {
            time,
            value,
            in_type,
            out_type,
            in_tangent: Tangent::default(),
            out_tangent: Tangent::default(),
        };
        // only the neighbours of the insertion point can share the time
        let i = keys.partition_point(|k| k.time < time);
        let same = [Some(i), i.checked_sub(1)]
            .into_iter()
            .flatten()
            .find(|&j| keys.get(j).is_some_and(|k| (k.time - time).abs() < SAME_TIME_EPS));
        if let Some(j) = same {
            keys[j] = key;
            return Ok(j);
        }
        keys.insert(i, key);
        Ok(i)
    }

    fn set_tangent(
        &mut self,
        channel: &ChannelId,
        key: usize,
        side: TangentSide,
        tangent: Tangent,
    ) -> Result<(), LaunchError> {
        let keys = self
            .curves
            .get_mut(channel)
            .ok_or_else(|| LaunchError::ChannelNotFound {
                channel: channel.to_string(),
            })?;
        let len = keys.len();
        let k = keys.get_mut(key).ok_or_else(|| LaunchError::KeyOutOfRange {
            channel: channel.to_string(),
            index: key,
            len,
        })?;
        match side {
            TangentSide::In => k.in_tangent = tangent,
            TangentSide::Out => k.out_tangent = tangent,
        }
        Ok(())
    }

    fn tangent(
        &self,
        channel: &ChannelId,
        key: usize,
        side: TangentSide,
    ) -> Result<Tangent, LaunchError> {
        let k = self.key(channel, key)?;
        Ok(match side {
            TangentSide::In => k.in_tangent,
            TangentSide::Out => k.out_tangent,
        })
    }

    fn tangent_types(
        &self,
        channel: &ChannelId,
        key: usize,
    ) -> Result<(TangentType, TangentType), LaunchError> {
        let k = self.key(channel, key)?;
        Ok((k.in_type, k.out_type))
    }

    fn num_keys(&self, channel: &ChannelId) -> usize {
        self.curves.get(channel).map_or(0, Vec::len)
    }

    fn key_time(&self, channel: &ChannelId, key: usize) -> Result<f64, LaunchError> {
        self.key(channel, key).map(|k| k.time)
    }

    fn key_value(&self, channel: &ChannelId, key: usize) -> Result<f64, LaunchError> {
        self.key(channel, key).map(|k| k.value)
    }
}

impl SceneHost for MemoryHost {
    fn node_kind(&self, name: &str) -> Option<NodeKind> {
        self.nodes.get(name).map(|n| n.kind)
    }

    fn world_translation(&self, node: &str) -> Result<Vector3, LaunchError> {
        self.nodes
            .get(node)
            .map(|n| n.translation)
            .ok_or_else(|| LaunchError::host(format!("no transform for '{node}'")))
    }

    fn active_selection(&self) -> Vec<String> {
        self.selection.clone()
    }

    fn set_active_selection(&mut self, names: &[String]) -> Result<(), LaunchError> {
        if let Some(missing) = names.iter().find(|n| !self.nodes.contains_key(n.as_str())) {
            return Err(LaunchError::host(format!("cannot select '{missing}'")));
        }
        self.selection = names.to_vec();
        Ok(())
    }

    fn time_unit(&self) -> TimeUnit {
        self.time_unit
    }

    fn refresh_viewport(&mut self) {
        self.refresh_count += 1;
    }

    fn playback_range(&self) -> Option<(f64, f64)> {
        self.playback_range
    }

    fn set_playback_range(&mut self, min: f64, max: f64) -> Result<(), LaunchError> {
        self.playback_range = Some((min, max));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ChannelAttr;

    fn host() -> (MemoryHost, ChannelId) {
        let mut host = MemoryHost::new();
        host.add_node("cam", NodeKind::Camera, Vector3::new(1.0, 2.0, 3.0));
        let ch = ChannelId::new("cam", ChannelAttr::TranslateX);
        host.create_channel(&ch).unwrap();
        (host, ch)
    }

    #[test]
    fn keys_stay_sorted_and_same_time_replaces() {
        let (mut host, ch) = host();
        let l = TangentType::Linear;
        assert_eq!(host.add_key(&ch, 10.0, 1.0, l, l).unwrap(), 0);
        assert_eq!(host.add_key(&ch, 0.0, 2.0, l, l).unwrap(), 0);
        assert_eq!(host.add_key(&ch, 5.0, 3.0, l, l).unwrap(), 1);
        assert_eq!(host.add_key(&ch, 10.0, 4.0, l, l).unwrap(), 2);
        let times: Vec<f64> = host.curve(&ch).unwrap().iter().map(|k| k.time).collect();
        assert_eq!(times, vec![0.0, 5.0, 10.0]);
        assert_eq!(host.key_value(&ch, 2).unwrap(), 4.0);
    }

    #[test]
    fn near_equal_times_replace_from_either_side() {
        let (mut host, ch) = host();
        let l = TangentType::Linear;
        for (n, t) in [0.0, 5.0, 10.0].into_iter().enumerate() {
            host.add_key(&ch, t, n as f64, l, l).unwrap();
        }
        assert_eq!(host.add_key(&ch, 5.0 + 1e-12, 7.0, l, l).unwrap(), 1);
        assert_eq!(host.add_key(&ch, 5.0 - 1e-12, 8.0, l, l).unwrap(), 1);
        assert_eq!(host.add_key(&ch, 10.0 - 1e-12, 9.0, l, l).unwrap(), 2);
        assert_eq!(host.num_keys(&ch), 3);
        assert_eq!(host.key_value(&ch, 1).unwrap(), 8.0);
        assert_eq!(host.key_value(&ch, 2).unwrap(), 9.0);

        // just outside the tolerance is a new key
        assert_eq!(host.add_key(&ch, 5.0 + 1e-6, 1.0, l, l).unwrap(), 2);
        assert_eq!(host.num_keys(&ch), 4);
    }

    #[test]
    fn out_of_range_and_missing_channels() {
        let (host, ch) = host();
        assert!(matches!(
            host.key_time(&ch, 0),
            Err(LaunchError::KeyOutOfRange { index: 0, len: 0, .. })
        ));
        let other = ChannelId::new("cam", ChannelAttr::RotateZ);
        assert!(matches!(
            host.tangent_types(&other, 0),
            Err(LaunchError::ChannelNotFound { .. })
        ));
        assert_eq!(host.num_keys(&other), 0);
    }

    #[test]
    fn write_budget_refuses_one_write() {
        let (mut host, ch) = host();
        host.fail_writes_after(1);
        let l = TangentType::Linear;
        assert!(host.add_key(&ch, 0.0, 0.0, l, l).is_ok());
        assert!(host.add_key(&ch, 1.0, 0.0, l, l).is_err());
        assert!(host.add_key(&ch, 1.0, 0.0, l, l).is_ok());

        host.fail_writes_after(0);
        host.clear_write_failure();
        assert!(host.add_key(&ch, 2.0, 0.0, l, l).is_ok());
        assert_eq!(host.num_keys(&ch), 3);
    }

    #[test]
    fn selection_must_name_nodes() {
        let (mut host, _) = host();
        assert!(host.set_active_selection(&["nope".to_string()]).is_err());
        host.set_active_selection(&["cam".to_string()]).unwrap();
        assert_eq!(host.active_selection(), vec!["cam".to_string()]);
    }

    #[test]
    fn scene_from_json() {
        let host = MemoryHost::from_json(
            r#"{
                "nodes": { "cam": { "kind": "camera", "translation": { "x": 0, "y": 5, "z": 0 } } },
                "curves": [
                    { "channel": { "node": "cam", "attr": "translateY" },
                      "keys": [ {
                          "time": 1, "value": 5,
                          "in_type": "spline", "out_type": "spline",
                          "in_angle": 0.1, "out_angle": 0.2,
                          "in_weight": 1, "out_weight": 2
                      } ] }
                ],
                "time_unit": "ntsc"
            }"#,
        )
        .unwrap();
        let ch = ChannelId::new("cam", ChannelAttr::TranslateY);
        assert_eq!(host.num_keys(&ch), 1);
        assert_eq!(host.tangent(&ch, 0, TangentSide::Out).unwrap(), Tangent::new(0.2, 2.0));
        assert_eq!(host.time_unit(), TimeUnit::Ntsc);
        assert_eq!(host.node_kind("cam"), Some(NodeKind::Camera));
    }
}
