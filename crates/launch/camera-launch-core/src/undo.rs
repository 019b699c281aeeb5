//! Snapshot and verbatim replay of channel contents.
//!
//! A snapshot records every key of a channel with both tangent types, angles
//! and weights, exactly as the host reports them. Replaying it recreates the
//! channel bit for bit; a channel that had no animation is captured as empty
//! and is left without animation on restore.

use serde::{Deserialize, Serialize};

use crate::channel::{AnimationChannelStore, ChannelId, Tangent, TangentSide, TangentType};
use crate::error::LaunchError;
use crate::writer::{ChannelPlan, ChannelWriter, KeySpec};

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySnapshot {
    pub time: f64,
    pub value: f64,
    pub in_type: TangentType,
    pub out_type: TangentType,
    /// Radians.
    pub in_angle: f64,
    pub out_angle: f64,
    pub in_weight: f64,
    pub out_weight: f64,
}

impl KeySnapshot {
    fn to_key_spec(self) -> KeySpec {
        KeySpec {
            time: self.time,
            value: self.value,
            in_type: self.in_type,
            out_type: self.out_type,
            in_tangent: Some(Tangent::new(self.in_angle, self.in_weight)),
            out_tangent: Some(Tangent::new(self.out_angle, self.out_weight)),
        }
    }
}

/// Contents of one channel before a launch touched it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelSnapshot {
    pub channel: ChannelId,
    /// Empty when the channel had no animation.
    #[serde(default)]
    pub keys: Vec<KeySnapshot>,
}

impl ChannelSnapshot {
    pub fn capture<S: AnimationChannelStore + ?Sized>(
        store: &S,
        channel: &ChannelId,
    ) -> Result<Self, LaunchError> {
        if !store.has_animation(channel) {
            return Ok(Self {
                channel: channel.clone(),
                keys: Vec::new(),
            });
        }
        let n = store.num_keys(channel);
        let mut keys = Vec::with_capacity(n);
        for k in 0..n {
            let (in_type, out_type) = store.tangent_types(channel, k)?;
            let in_tangent = store.tangent(channel, k, TangentSide::In)?;
            let out_tangent = store.tangent(channel, k, TangentSide::Out)?;
            keys.push(KeySnapshot {
                time: store.key_time(channel, k)?,
                value: store.key_value(channel, k)?,
                in_type,
                out_type,
                in_angle: in_tangent.angle,
                out_angle: out_tangent.angle,
                in_weight: in_tangent.weight,
                out_weight: out_tangent.weight,
            });
        }
        Ok(Self {
            channel: channel.clone(),
            keys,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Replay plan with every tangent pinned to its recorded value.
    pub fn to_plan(&self) -> ChannelPlan {
        ChannelPlan {
            channel: self.channel.clone(),
            keys: self.keys.iter().map(|k| k.to_key_spec()).collect(),
        }
    }
}

/// Holds the snapshot set of a single command instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UndoStore {
    snapshots: Option<Vec<ChannelSnapshot>>,
}

impl UndoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Capture the channels about to be modified. Any earlier set is replaced.
    pub fn capture<S: AnimationChannelStore + ?Sized>(
        &mut self,
        store: &S,
        channels: &[ChannelId],
    ) -> Result<(), LaunchError> {
        let snapshots = channels
            .iter()
            .map(|ch| ChannelSnapshot::capture(store, ch))
            .collect::<Result<Vec<_>, _>>()?;
        log::debug!(
            "captured {} channel(s), {} key(s)",
            snapshots.len(),
            snapshots.iter().map(|s| s.keys.len()).sum::<usize>()
        );
        self.snapshots = Some(snapshots);
        Ok(())
    }

    pub fn is_captured(&self) -> bool {
        self.snapshots.is_some()
    }

    pub fn snapshots(&self) -> &[ChannelSnapshot] {
        self.snapshots.as_deref().unwrap_or(&[])
    }

    /// Put every captured channel back the way it was and consume the set.
    ///
    /// Current animation on the channels is removed first. If the store fails
    /// part way, the set is kept so the restore can be retried. Returns the
    /// number of channels recreated.
    pub fn restore<S: AnimationChannelStore + ?Sized>(
        &mut self,
        store: &mut S,
    ) -> Result<usize, LaunchError> {
        let Some(snapshots) = self.snapshots.as_ref() else {
            return Ok(0);
        };
        for snapshot in snapshots {
            if store.has_animation(&snapshot.channel) {
                store.remove_channel(&snapshot.channel)?;
            }
        }
        let mut writer = ChannelWriter::new(store);
        let mut recreated = 0;
        for snapshot in snapshots.iter().filter(|s| !s.is_empty()) {
            writer.write(&snapshot.to_plan())?;
            recreated += 1;
        }
        self.snapshots = None;
        Ok(recreated)
    }

    /// Drop the captured set without touching the host.
    pub fn discard(&mut self) {
        self.snapshots = None;
    }
}
