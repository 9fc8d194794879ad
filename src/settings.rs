//! Playback Settings
//!
//! Tunables for the playback controller. All values have defaults matching the
//! engine's historical behavior, so most hosts never construct this by hand.
//!
//! ```rust,ignore
//! use playgraph::PlaybackSettings;
//!
//! // Slow frame loops may need a longer async-wait budget.
//! let settings = PlaybackSettings::default().with_wait_timeout_factor(2.0);
//!
//! // Or load from a JSON config file.
//! let settings = PlaybackSettings::from_json(r#"{ "wait_timeout_factor": 2.0 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{PlaybackError, Result};

/// Default multiplier applied to a clip's duration to bound async waits.
pub const DEFAULT_WAIT_TIMEOUT_FACTOR: f32 = 1.5;

/// Default near-terminal progress used for static poses and completion clamping.
pub const DEFAULT_TERMINAL_PROGRESS: f32 = 0.99;

/// Configuration for [`PlaybackController`](crate::animation::PlaybackController).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Async waits give up after `wait_timeout_factor × clip.duration` seconds.
    ///
    /// Completion is detected by per-frame polling of normalized progress,
    /// which can drift under variable frame rates, so the wait needs a margin.
    pub wait_timeout_factor: f32,

    /// Progress written to every binding by `set_states` and on completion.
    ///
    /// Kept just below 1 so the pose never samples past the clip end.
    pub terminal_progress: f32,

    /// Mixer speed used by hosts that do not pick one explicitly.
    pub default_speed: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            wait_timeout_factor: DEFAULT_WAIT_TIMEOUT_FACTOR,
            terminal_progress: DEFAULT_TERMINAL_PROGRESS,
            default_speed: 1.0,
        }
    }
}

impl PlaybackSettings {
    #[must_use]
    pub fn with_wait_timeout_factor(mut self, factor: f32) -> Self {
        self.wait_timeout_factor = factor;
        self
    }

    #[must_use]
    pub fn with_terminal_progress(mut self, progress: f32) -> Self {
        self.terminal_progress = progress;
        self
    }

    #[must_use]
    pub fn with_default_speed(mut self, speed: f32) -> Self {
        self.default_speed = speed;
        self
    }

    /// Parses settings from JSON. Missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Checks that every field is usable by the controller.
    pub fn validate(&self) -> Result<()> {
        if !(self.wait_timeout_factor.is_finite() && self.wait_timeout_factor > 0.0) {
            return Err(PlaybackError::InvalidSettings(format!(
                "wait_timeout_factor must be positive, got {}",
                self.wait_timeout_factor
            )));
        }
        if !(self.terminal_progress > 0.0 && self.terminal_progress <= 1.0) {
            return Err(PlaybackError::InvalidSettings(format!(
                "terminal_progress must be in (0, 1], got {}",
                self.terminal_progress
            )));
        }
        if !self.default_speed.is_finite() {
            return Err(PlaybackError::InvalidSettings(format!(
                "default_speed must be finite, got {}",
                self.default_speed
            )));
        }
        Ok(())
    }
}
