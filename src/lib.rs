//! Blend-graph animation playback.
//!
//! A [`PlaybackController`] builds a small blend graph over animation clips,
//! plays it forward or holds it at a scrubbed time, detects completion by
//! polling normalized progress once per frame, and notifies observers. It
//! drives a host's skeletal animator through the [`SkeletalHost`] capability
//! and never owns the host's frame scheduler.
//!
//! ```rust,ignore
//! use playgraph::{AnimationClip, PlaybackController, RigWorld};
//!
//! let mut world = RigWorld::new();
//! let hero = world.spawn("hero");
//! let clip = AnimationClip::new("wave", tracks).into_handle();
//!
//! let mut controller = PlaybackController::new(hero);
//! controller.on_animation_end(|| log::info!("wave finished"));
//! controller.play_animation(&mut world, &clip, 1.0, false)?;
//!
//! // once per rendered frame
//! controller.update(&mut world, dt);
//! ```

#![allow(clippy::float_cmp)]

pub mod animation;
pub mod errors;
pub mod rig;
pub mod settings;

pub use animation::{
    AnimationClip, AnimationSystem, ClipHandle, PlaybackController, PlaybackGraph, PlaybackState,
    PlaybackWait, ScrubDriver, WaitOutcome,
};
pub use errors::{PlaybackError, Result};
pub use rig::{AnimatorLease, RigWorld, SkeletalHost};
pub use settings::PlaybackSettings;
