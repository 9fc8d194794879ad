pub mod values;
pub mod tracks;
pub mod clip;
pub mod pose;
pub mod graph;
pub mod wait;
pub mod controller;
pub mod scrub;
pub mod system;

pub use clip::{AnimationClip, ClipHandle, Track, TrackData, TrackMeta};
pub use controller::{ListenerId, PlaybackController, PlaybackState};
pub use graph::{ClipBinding, ClipNode, GraphState, MixerNode, PlaybackGraph};
pub use pose::{ChannelKey, Pose, PoseValue, TargetPath};
pub use scrub::ScrubDriver;
pub use system::{AnimationSystem, ControllerKey};
pub use tracks::{InterpolationMode, KeyframeCursor, KeyframeTrack};
pub use wait::{PlaybackWait, WaitOutcome};
