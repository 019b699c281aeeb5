//! Writing planned keys into host channels.

use serde::{Deserialize, Serialize};

use crate::channel::{AnimationChannelStore, ChannelId, Tangent, TangentSide, TangentType};
use crate::error::LaunchError;

/// One key to write. Tangents left as `None` keep whatever the host computes
/// for the given tangent type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySpec {
    /// Frame number.
    pub time: f64,
    pub value: f64,
    pub in_type: TangentType,
    pub out_type: TangentType,
    pub in_tangent: Option<Tangent>,
    pub out_tangent: Option<Tangent>,
}

impl KeySpec {
    /// Key with linear tangents on both sides.
    pub fn linear(time: f64, value: f64) -> Self {
        Self {
            time,
            value,
            in_type: TangentType::Linear,
            out_type: TangentType::Linear,
            in_tangent: None,
            out_tangent: None,
        }
    }

    /// Pin one side to a fixed tangent.
    pub fn with_fixed(mut self, side: TangentSide, tangent: Tangent) -> Self {
        match side {
            TangentSide::In => {
                self.in_type = TangentType::Fixed;
                self.in_tangent = Some(tangent);
            }
            TangentSide::Out => {
                self.out_type = TangentType::Fixed;
                self.out_tangent = Some(tangent);
            }
        }
        self
    }
}

/// Full contents of one channel, in key order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChannelPlan {
    pub channel: ChannelId,
    pub keys: Vec<KeySpec>,
}

/// Applies [`ChannelPlan`]s to a host store.
pub struct ChannelWriter<'a, S: AnimationChannelStore + ?Sized> {
    store: &'a mut S,
}

impl<'a, S: AnimationChannelStore + ?Sized> ChannelWriter<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        Self { store }
    }

    /// Create the channel and write every key of the plan. Returns the number
    /// of keys written.
    ///
    /// The channel must not already be animated; callers clear it first.
    pub fn write(&mut self, plan: &ChannelPlan) -> Result<usize, LaunchError> {
        self.store.create_channel(&plan.channel)?;
        for key in &plan.keys {
            let index = self.store.add_key(
                &plan.channel,
                key.time,
                key.value,
                key.in_type,
                key.out_type,
            )?;
            if let Some(tangent) = key.in_tangent {
                self.store
                    .set_tangent(&plan.channel, index, TangentSide::In, tangent)?;
            }
            if let Some(tangent) = key.out_tangent {
                self.store
                    .set_tangent(&plan.channel, index, TangentSide::Out, tangent)?;
            }
        }
        Ok(plan.keys.len())
    }

    /// Remove any animation from every planned channel, then write them all.
    pub fn replace_all(&mut self, plans: &[ChannelPlan]) -> Result<usize, LaunchError> {
        for plan in plans {
            if self.store.has_animation(&plan.channel) {
                self.store.remove_channel(&plan.channel)?;
            }
        }
        let mut written = 0;
        for plan in plans {
            written += self.write(plan)?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::{ChannelAttr, NodeKind};
    use crate::memory::MemoryHost;
    use crate::value::Vector3;

    #[test]
    fn writes_keys_and_fixed_tangents() {
        let mut host = MemoryHost::new();
        host.add_node("cam", NodeKind::Camera, Vector3::ZERO);
        let channel = ChannelId::new("cam", ChannelAttr::TranslateY);
        let plan = ChannelPlan {
            channel: channel.clone(),
            keys: vec![
                KeySpec::linear(0.0, 1.0).with_fixed(TangentSide::Out, Tangent::new(0.5, 1.0)),
                KeySpec::linear(10.0, 2.0),
            ],
        };
        let written = ChannelWriter::new(&mut host).write(&plan).unwrap();
        assert_eq!(written, 2);
        assert_eq!(host.num_keys(&channel), 2);
        assert_eq!(
            host.tangent_types(&channel, 0).unwrap(),
            (TangentType::Linear, TangentType::Fixed)
        );
        assert_eq!(
            host.tangent(&channel, 0, TangentSide::Out).unwrap(),
            Tangent::new(0.5, 1.0)
        );
        assert_eq!(host.key_value(&channel, 1).unwrap(), 2.0);
    }

    #[test]
    fn replace_all_clears_existing_curves() {
        let mut host = MemoryHost::new();
        host.add_node("cam", NodeKind::Camera, Vector3::ZERO);
        let channel = ChannelId::new("cam", ChannelAttr::TranslateX);
        let old = ChannelPlan {
            channel: channel.clone(),
            keys: vec![KeySpec::linear(-5.0, 9.0), KeySpec::linear(50.0, 9.0)],
        };
        ChannelWriter::new(&mut host).write(&old).unwrap();

        let new = ChannelPlan {
            channel: channel.clone(),
            keys: vec![KeySpec::linear(0.0, 1.0)],
        };
        ChannelWriter::new(&mut host).replace_all(&[new]).unwrap();
        assert_eq!(host.num_keys(&channel), 1);
        assert_eq!(host.key_time(&channel, 0).unwrap(), 0.0);
    }
}
