use std::sync::Arc;

use glam::{Quat, Vec3};
use uuid::Uuid;

use crate::animation::pose::TargetPath;
use crate::animation::tracks::KeyframeTrack;
use crate::errors::{PlaybackError, Result};

/// Shared, immutable clip reference. Controllers never own or mutate clips.
pub type ClipHandle = Arc<AnimationClip>;

#[derive(Debug, Clone)]
pub struct TrackMeta {
    pub joint: String,
    pub target: TargetPath,
}

#[derive(Debug, Clone)]
pub enum TrackData {
    Vector3(KeyframeTrack<Vec3>),
    Quaternion(KeyframeTrack<Quat>),
    Scalar(KeyframeTrack<f32>),
}

impl TrackData {
    #[must_use]
    pub fn end_time(&self) -> f32 {
        match self {
            TrackData::Vector3(t) => t.end_time(),
            TrackData::Quaternion(t) => t.end_time(),
            TrackData::Scalar(t) => t.end_time(),
        }
    }

    /// `(expected, actual)` value counts.
    #[must_use]
    pub fn value_counts(&self) -> (usize, usize) {
        match self {
            TrackData::Vector3(t) => (t.expected_value_count(), t.value_count()),
            TrackData::Quaternion(t) => (t.expected_value_count(), t.value_count()),
            TrackData::Scalar(t) => (t.expected_value_count(), t.value_count()),
        }
    }
}

/// Keyframes for one joint property.
#[derive(Debug, Clone)]
pub struct Track {
    pub meta: TrackMeta,
    pub data: TrackData,
}

impl Track {
    #[must_use]
    pub fn new(joint: impl Into<String>, target: TargetPath, data: TrackData) -> Self {
        Self {
            meta: TrackMeta {
                joint: joint.into(),
                target,
            },
            data,
        }
    }
}

/// An immutable animation-motion asset with a known duration.
#[derive(Debug, Clone)]
pub struct AnimationClip {
    id: Uuid,
    pub name: String,
    duration: f32,
    pub tracks: Vec<Track>,
}

impl AnimationClip {
    /// Creates a clip whose duration is the latest keyframe across all tracks.
    #[must_use]
    pub fn new(name: impl Into<String>, tracks: Vec<Track>) -> Self {
        let duration = tracks
            .iter()
            .map(|t| t.data.end_time())
            .fold(0.0_f32, f32::max);

        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration,
            tracks,
        }
    }

    /// Overrides the computed duration, e.g. when the asset declares a
    /// length that extends past its last key.
    #[must_use]
    pub fn with_duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }

    #[must_use]
    pub fn into_handle(self) -> ClipHandle {
        Arc::new(self)
    }

    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Length in seconds.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Progress is `time / duration`, so the duration must be positive.
    /// Every track must also carry as many values as its keys and
    /// interpolation mode require.
    pub fn validate(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(PlaybackError::InvalidClipDuration {
                name: self.name.clone(),
                duration: self.duration,
            });
        }
        for track in &self.tracks {
            let (expected, actual) = track.data.value_counts();
            if expected != actual {
                return Err(PlaybackError::MalformedTrack {
                    clip: self.name.clone(),
                    joint: track.meta.joint.clone(),
                    expected,
                    actual,
                });
            }
        }
        Ok(())
    }
}
