use crate::animation::clip::{ClipHandle, TrackData};
use crate::animation::pose::{ChannelKey, PoseAccumulator, PoseValue};
use crate::animation::tracks::KeyframeCursor;

/// Samples one clip at an arbitrary local time.
///
/// Local time is never clamped or wrapped; sampling past the clip end holds
/// the last keyframe, and progress may exceed 1.
#[derive(Debug, Clone)]
pub struct ClipNode {
    clip: ClipHandle,
    time: f32,
    channels: Vec<ChannelKey>,
    cursors: Vec<KeyframeCursor>,
}

impl ClipNode {
    #[must_use]
    pub fn new(clip: ClipHandle) -> Self {
        let channels = clip
            .tracks
            .iter()
            .map(|t| ChannelKey::new(t.meta.joint.clone(), t.meta.target))
            .collect();
        let cursors = vec![KeyframeCursor::default(); clip.tracks.len()];
        Self {
            clip,
            time: 0.0,
            channels,
            cursors,
        }
    }

    #[must_use]
    pub fn clip(&self) -> &ClipHandle {
        &self.clip
    }

    /// Local sample time in seconds.
    #[must_use]
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn set_time(&mut self, time: f32) {
        self.time = time;
    }

    pub fn advance(&mut self, dt: f32) {
        self.time += dt;
    }

    /// `time / duration`.
    #[must_use]
    pub fn progress(&self) -> f32 {
        self.time / self.clip.duration()
    }

    /// Samples every track at the current time into `acc`, scaled by `weight`.
    pub fn accumulate(&mut self, weight: f32, acc: &mut PoseAccumulator) {
        let time = self.time;
        for ((track, key), cursor) in self
            .clip
            .tracks
            .iter()
            .zip(&self.channels)
            .zip(&mut self.cursors)
        {
            let value = match &track.data {
                TrackData::Vector3(t) => t.sample_with_cursor(time, cursor).map(PoseValue::Vector3),
                TrackData::Quaternion(t) => {
                    t.sample_with_cursor(time, cursor).map(PoseValue::Quaternion)
                }
                TrackData::Scalar(t) => t.sample_with_cursor(time, cursor).map(PoseValue::Scalar),
            };
            if let Some(value) = value {
                acc.add(key, value, weight);
            }
        }
    }
}
