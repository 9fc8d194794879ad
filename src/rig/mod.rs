//! Skeletal Target Capability
//!
//! The playback controller does not own the skeletal-rigging subsystem. It
//! drives it through the [`SkeletalHost`] capability:
//!
//! - fetch-or-create the native animator of an entity
//! - enable/disable the animator's engine-driven animation
//! - destroy the animator (it can be recreated later on the same entity)
//! - receive blended poses
//!
//! A playback graph needs exclusive control of the animator while it is
//! attached. That exclusivity is expressed as an [`AnimatorLease`]: a
//! non-clonable token acquired from the host, moved into the graph, and given
//! back (released or destroyed) on cleanup.
//!
//! [`RigWorld`] is a slotmap-backed host used by tests and by hosts without a
//! skeletal system of their own.

pub mod world;

pub use world::{Animator, RigEntity, RigWorld};

use slotmap::new_key_type;

use crate::animation::pose::Pose;
use crate::errors::{PlaybackError, Result};

new_key_type! {
    pub struct EntityKey;
    pub struct AnimatorKey;
}

/// Host-side operations the playback controller relies on.
pub trait SkeletalHost {
    fn contains_entity(&self, entity: EntityKey) -> bool;

    /// Returns the entity's animator, creating one if it has none.
    fn ensure_animator(&mut self, entity: EntityKey) -> Result<AnimatorKey>;

    /// Marks the animator as exclusively held. Returns `false` if it already is
    /// or no longer exists.
    fn begin_lease(&mut self, animator: AnimatorKey) -> bool;

    fn end_lease(&mut self, animator: AnimatorKey);

    /// Toggles native engine-driven animation. Returns `false` if the animator
    /// no longer exists.
    fn set_animator_enabled(&mut self, animator: AnimatorKey, enabled: bool) -> bool;

    /// Destroys the animator and returns the entity it was attached to.
    fn destroy_animator(&mut self, animator: AnimatorKey) -> Option<EntityKey>;

    fn apply_pose(&mut self, animator: AnimatorKey, pose: &Pose);
}

/// Exclusive hold on an entity's animator.
#[derive(Debug)]
pub struct AnimatorLease {
    animator: AnimatorKey,
    owner: EntityKey,
}

impl AnimatorLease {
    /// Fetches or creates the animator on `entity` and leases it.
    pub fn acquire(host: &mut dyn SkeletalHost, entity: EntityKey) -> Result<Self> {
        if !host.contains_entity(entity) {
            return Err(PlaybackError::InvalidTarget(entity));
        }
        let animator = host.ensure_animator(entity)?;
        if !host.begin_lease(animator) {
            return Err(PlaybackError::AnimatorLeased(entity));
        }
        log::debug!("Leased animator {animator:?} on entity {entity:?}");
        Ok(Self {
            animator,
            owner: entity,
        })
    }

    #[must_use]
    pub fn animator(&self) -> AnimatorKey {
        self.animator
    }

    #[must_use]
    pub fn owner(&self) -> EntityKey {
        self.owner
    }

    /// Gives the animator back to the entity, leaving it alive.
    pub fn release(self, host: &mut dyn SkeletalHost) {
        host.end_lease(self.animator);
        log::debug!("Released animator {:?} on entity {:?}", self.animator, self.owner);
    }

    /// Destroys the animator and returns the entity it belonged to, so it can
    /// be recreated there later.
    pub fn destroy(self, host: &mut dyn SkeletalHost) -> EntityKey {
        let owner = host.destroy_animator(self.animator).unwrap_or(self.owner);
        log::debug!("Destroyed animator {:?} on entity {owner:?}", self.animator);
        owner
    }
}
