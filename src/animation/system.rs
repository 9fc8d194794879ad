use slotmap::{SlotMap, new_key_type};

use crate::animation::controller::PlaybackController;
use crate::rig::SkeletalHost;

new_key_type! {
    pub struct ControllerKey;
}

/// Animation system.
///
/// Ticks every playback controller once per frame.
pub struct AnimationSystem;

impl AnimationSystem {
    /// Updates all playback controllers.
    ///
    /// # Arguments
    /// * `controllers` - Controllers owned by the host scene
    /// * `host` - Skeletal host receiving poses
    /// * `dt` - Delta time per frame (in seconds)
    #[inline]
    pub fn update(
        controllers: &mut SlotMap<ControllerKey, PlaybackController>,
        host: &mut dyn SkeletalHost,
        dt: f32,
    ) {
        for (_key, controller) in controllers.iter_mut() {
            controller.update(host, dt);
        }
    }

    /// Removes a controller whose owner is going away and hands its animator
    /// back to the host. Returns `false` if the key was already gone.
    pub fn remove(
        controllers: &mut SlotMap<ControllerKey, PlaybackController>,
        key: ControllerKey,
        host: &mut dyn SkeletalHost,
    ) -> bool {
        match controllers.remove(key) {
            Some(controller) => {
                controller.shutdown(host);
                true
            }
            None => false,
        }
    }
}
