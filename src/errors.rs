//! Error Types
//!
//! This module defines the error types used throughout the playback engine.
//!
//! # Overview
//!
//! The main error type [`PlaybackError`] covers the failure modes that are
//! surfaced at API entry points:
//! - Invalid or missing skeletal targets
//! - Exclusive animator lease conflicts
//! - Invalid clip arguments
//! - Settings validation and parsing
//!
//! Conditions detected while ticking a controller are never returned; they are
//! reported through the `log` facade so a stalled tick cannot take down the
//! host frame loop.
//!
//! ```rust,ignore
//! use playgraph::errors::Result;
//!
//! fn start(controller: &mut PlaybackController, host: &mut RigWorld) -> Result<()> {
//!     controller.play_animation(host, &clip, 1.0, false)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

use crate::rig::EntityKey;

/// The main error type for the playback engine.
#[derive(Error, Debug)]
pub enum PlaybackError {
    // ========================================================================
    // Target & Animator Errors
    // ========================================================================
    /// The target entity does not exist in the skeletal host.
    #[error("Target entity does not exist: {0:?}")]
    InvalidTarget(EntityKey),

    /// The entity has no skeletal animator to operate on.
    #[error("Entity {0:?} has no skeletal animator")]
    AnimatorMissing(EntityKey),

    /// The entity's animator is already exclusively leased by another graph.
    #[error("Animator on entity {0:?} is already leased by another playback graph")]
    AnimatorLeased(EntityKey),

    // ========================================================================
    // Clip Errors
    // ========================================================================
    /// A play operation was given no clips.
    #[error("Clip list is empty")]
    EmptyClipList,

    /// A clip declares a duration that cannot be used to compute progress.
    #[error("Clip '{name}' has invalid duration {duration}")]
    InvalidClipDuration {
        /// Name of the offending clip
        name: String,
        /// The declared duration in seconds
        duration: f32,
    },

    /// A track's value count does not match its keys and interpolation mode.
    #[error("Clip '{clip}' track on '{joint}' has {actual} values, expected {expected}")]
    MalformedTrack {
        /// Name of the offending clip
        clip: String,
        /// Joint the track drives
        joint: String,
        expected: usize,
        actual: usize,
    },

    // ========================================================================
    // Settings Errors
    // ========================================================================
    /// Settings failed validation.
    #[error("Invalid playback settings: {0}")]
    InvalidSettings(String),

    /// Settings JSON could not be decoded.
    #[error("Settings parse error: {0}")]
    SettingsParse(#[from] serde_json::Error),
}

/// Alias for `Result<T, PlaybackError>`.
pub type Result<T> = std::result::Result<T, PlaybackError>;
