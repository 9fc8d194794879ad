use slotmap::SlotMap;

use crate::animation::pose::Pose;
use crate::errors::{PlaybackError, Result};
use crate::rig::{AnimatorKey, EntityKey, SkeletalHost};

#[derive(Debug, Clone)]
pub struct RigEntity {
    pub name: String,
    pub animator: Option<AnimatorKey>,
}

/// Native pose consumer attached to an entity.
#[derive(Debug, Clone)]
pub struct Animator {
    pub owner: EntityKey,
    /// Whether engine-driven animation is active.
    pub enabled: bool,
    leased: bool,
    pose: Pose,
    poses_applied: u64,
}

impl Animator {
    fn new(owner: EntityKey) -> Self {
        Self {
            owner,
            enabled: true,
            leased: false,
            pose: Pose::new(),
            poses_applied: 0,
        }
    }

    #[must_use]
    pub fn is_leased(&self) -> bool {
        self.leased
    }

    /// Last pose written by a playback graph.
    #[must_use]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    #[must_use]
    pub fn poses_applied(&self) -> u64 {
        self.poses_applied
    }
}

/// Slotmap-backed [`SkeletalHost`].
#[derive(Debug, Default)]
pub struct RigWorld {
    entities: SlotMap<EntityKey, RigEntity>,
    animators: SlotMap<AnimatorKey, Animator>,
}

impl RigWorld {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, name: &str) -> EntityKey {
        self.entities.insert(RigEntity {
            name: name.to_string(),
            animator: None,
        })
    }

    /// Removes the entity together with its animator.
    pub fn despawn(&mut self, entity: EntityKey) -> Option<RigEntity> {
        let removed = self.entities.remove(entity)?;
        if let Some(animator) = removed.animator {
            self.animators.remove(animator);
        }
        Some(removed)
    }

    #[must_use]
    pub fn entity(&self, entity: EntityKey) -> Option<&RigEntity> {
        self.entities.get(entity)
    }

    #[must_use]
    pub fn animator(&self, animator: AnimatorKey) -> Option<&Animator> {
        self.animators.get(animator)
    }

    #[must_use]
    pub fn animator_of(&self, entity: EntityKey) -> Option<&Animator> {
        let key = self.entities.get(entity)?.animator?;
        self.animators.get(key)
    }

    #[must_use]
    pub fn animator_count(&self) -> usize {
        self.animators.len()
    }

    /// Clears a lease left behind by a controller that was dropped without
    /// shutting down. Returns `true` if a lease was held.
    pub fn revoke_lease(&mut self, entity: EntityKey) -> bool {
        let Some(key) = self.entities.get(entity).and_then(|e| e.animator) else {
            return false;
        };
        match self.animators.get_mut(key) {
            Some(a) if a.leased => {
                a.leased = false;
                log::warn!("Revoked orphaned lease on animator {key:?} of entity {entity:?}");
                true
            }
            _ => false,
        }
    }
}

impl SkeletalHost for RigWorld {
    fn contains_entity(&self, entity: EntityKey) -> bool {
        self.entities.contains_key(entity)
    }

    fn ensure_animator(&mut self, entity: EntityKey) -> Result<AnimatorKey> {
        let record = self
            .entities
            .get_mut(entity)
            .ok_or(PlaybackError::InvalidTarget(entity))?;

        if let Some(existing) = record.animator
            && self.animators.contains_key(existing)
        {
            return Ok(existing);
        }

        let key = self.animators.insert(Animator::new(entity));
        record.animator = Some(key);
        log::debug!("Created animator {key:?} on entity '{}'", record.name);
        Ok(key)
    }

    fn begin_lease(&mut self, animator: AnimatorKey) -> bool {
        match self.animators.get_mut(animator) {
            Some(a) if !a.leased => {
                a.leased = true;
                true
            }
            _ => false,
        }
    }

    fn end_lease(&mut self, animator: AnimatorKey) {
        if let Some(a) = self.animators.get_mut(animator) {
            a.leased = false;
        }
    }

    fn set_animator_enabled(&mut self, animator: AnimatorKey, enabled: bool) -> bool {
        let Some(a) = self.animators.get_mut(animator) else {
            return false;
        };
        a.enabled = enabled;
        true
    }

    fn destroy_animator(&mut self, animator: AnimatorKey) -> Option<EntityKey> {
        let removed = self.animators.remove(animator)?;
        if let Some(record) = self.entities.get_mut(removed.owner)
            && record.animator == Some(animator)
        {
            record.animator = None;
        }
        Some(removed.owner)
    }

    fn apply_pose(&mut self, animator: AnimatorKey, pose: &Pose) {
        if let Some(a) = self.animators.get_mut(animator) {
            a.pose.clone_from(pose);
            a.poses_applied += 1;
        }
    }
}
