//! Output pose of a playback graph.
//!
//! A [`Pose`] maps `(joint, property)` channels to sampled values. Clip nodes
//! produce one pose each; the mixer folds them together through a
//! [`PoseAccumulator`] using unnormalized input weights.

use glam::{Quat, Vec3, Vec4};
use rustc_hash::FxHashMap;

/// Joint property driven by a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetPath {
    Translation,
    Rotation,
    Scale,
    /// Scalar blend weight attached to the joint (e.g. a morph or IK weight).
    Weight,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ChannelKey {
    pub joint: String,
    pub target: TargetPath,
}

impl ChannelKey {
    #[must_use]
    pub fn new(joint: impl Into<String>, target: TargetPath) -> Self {
        Self {
            joint: joint.into(),
            target,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PoseValue {
    Vector3(Vec3),
    Quaternion(Quat),
    Scalar(f32),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Pose {
    channels: FxHashMap<ChannelKey, PoseValue>,
}

impl Pose {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn insert(&mut self, key: ChannelKey, value: PoseValue) {
        self.channels.insert(key, value);
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    #[must_use]
    pub fn get(&self, joint: &str, target: TargetPath) -> Option<PoseValue> {
        self.channels.get(&ChannelKey::new(joint, target)).copied()
    }

    #[must_use]
    pub fn translation(&self, joint: &str) -> Option<Vec3> {
        match self.get(joint, TargetPath::Translation)? {
            PoseValue::Vector3(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn rotation(&self, joint: &str) -> Option<Quat> {
        match self.get(joint, TargetPath::Rotation)? {
            PoseValue::Quaternion(q) => Some(q),
            _ => None,
        }
    }

    #[must_use]
    pub fn scale(&self, joint: &str) -> Option<Vec3> {
        match self.get(joint, TargetPath::Scale)? {
            PoseValue::Vector3(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn weight(&self, joint: &str) -> Option<f32> {
        match self.get(joint, TargetPath::Weight)? {
            PoseValue::Scalar(w) => Some(w),
            _ => None,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChannelKey, &PoseValue)> {
        self.channels.iter()
    }
}

#[derive(Debug, Clone, Copy)]
enum Accum {
    Vector3(Vec3),
    /// Running sum and the first contribution, which fixes the hemisphere.
    Quaternion { sum: Vec4, reference: Vec4 },
    Scalar(f32),
}

/// Weighted sum of sampled values, one slot per channel.
///
/// Weights are applied as given and never normalized: two inputs at weight 1
/// driving the same translation produce the sum of both translations.
/// Rotations are summed as 4-vectors aligned to the first contribution's
/// hemisphere and normalized in [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct PoseAccumulator {
    slots: FxHashMap<ChannelKey, Accum>,
}

impl PoseAccumulator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `weight × value` to the channel. Mismatched value kinds are ignored.
    pub fn add(&mut self, key: &ChannelKey, value: PoseValue, weight: f32) {
        if let Some(slot) = self.slots.get_mut(key) {
            match (slot, value) {
                (Accum::Vector3(acc), PoseValue::Vector3(v)) => *acc += v * weight,
                (Accum::Scalar(acc), PoseValue::Scalar(s)) => *acc += s * weight,
                (Accum::Quaternion { sum, reference }, PoseValue::Quaternion(q)) => {
                    let q = Vec4::from(q);
                    let sign = if reference.dot(q) < 0.0 { -1.0 } else { 1.0 };
                    *sum += q * (weight * sign);
                }
                (_, value) => {
                    log::trace!("Channel {key:?} received mismatched value {value:?}; skipped");
                }
            }
            return;
        }

        let slot = match value {
            PoseValue::Vector3(v) => Accum::Vector3(v * weight),
            PoseValue::Scalar(s) => Accum::Scalar(s * weight),
            PoseValue::Quaternion(q) => {
                let q = Vec4::from(q);
                Accum::Quaternion {
                    sum: q * weight,
                    reference: q,
                }
            }
        };
        self.slots.insert(key.clone(), slot);
    }

    /// Writes the accumulated values into `pose`, replacing its contents.
    pub fn finish(self, pose: &mut Pose) {
        pose.clear();
        for (key, slot) in self.slots {
            let value = match slot {
                Accum::Vector3(v) => PoseValue::Vector3(v),
                Accum::Scalar(s) => PoseValue::Scalar(s),
                Accum::Quaternion { sum: q, .. } => {
                    let len = q.length();
                    if len > 1e-6 {
                        PoseValue::Quaternion(Quat::from_vec4(q / len))
                    } else {
                        PoseValue::Quaternion(Quat::IDENTITY)
                    }
                }
            };
            pose.insert(key, value);
        }
    }
}
