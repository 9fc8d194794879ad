use crate::animation::clip::ClipHandle;
use crate::animation::controller::PlaybackController;
use crate::errors::Result;
use crate::rig::SkeletalHost;

/// Editor-style driver: holds a clip list and a scrub position and forwards
/// them to a controller every tick.
#[derive(Debug, Clone, Default)]
pub struct ScrubDriver {
    pub clips: Vec<ClipHandle>,
    update_requested: bool,
    progress: f32,
}

impl ScrubDriver {
    #[must_use]
    pub fn new(clips: Vec<ClipHandle>) -> Self {
        Self {
            clips,
            update_requested: true,
            progress: 0.0,
        }
    }

    #[must_use]
    pub fn progress(&self) -> f32 {
        self.progress
    }

    /// Clamped to `[0, 1]`.
    pub fn set_progress(&mut self, progress: f32) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    /// Rebuild the controller's graph from `clips` on the next tick.
    pub fn request_update(&mut self) {
        self.update_requested = true;
    }

    pub fn tick(
        &mut self,
        controller: &mut PlaybackController,
        host: &mut dyn SkeletalHost,
    ) -> Result<()> {
        if self.update_requested {
            self.update_requested = false;
            controller.set_states(host, &self.clips)?;
        }
        controller.set_progress(host, self.progress);
        Ok(())
    }
}
