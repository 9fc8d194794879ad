//! Playback Controller
//!
//! Owns at most one [`PlaybackGraph`] per target entity and drives it from the
//! host's per-frame update. The controller never schedules frames itself; the
//! host calls [`PlaybackController::update`] once per rendered frame.
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──set_animations──▶ Built ──play_*──▶ Playing ──progress ≥ 1──▶ Done
//!   ▲                        │  ▲               │
//!   │                        │  └──play_*───────┤ pause_animations
//!   │                        ▼                  ▼
//!   └────────clear───────  Paused ◀─────────────┘
//! ```
//!
//! Building a graph leases the entity's animator exclusively. On completion
//! (or an explicit [`cleanup`](PlaybackController::cleanup)) the animator is
//! destroyed and its entity remembered, so the next
//! [`init`](PlaybackController::init) recreates it in the same place.

use std::rc::Rc;

use crate::animation::clip::ClipHandle;
use crate::animation::graph::{ClipBinding, PlaybackGraph};
use crate::animation::pose::Pose;
use crate::animation::wait::{PlaybackSignal, PlaybackWait};
use crate::errors::{PlaybackError, Result};
use crate::rig::{AnimatorKey, AnimatorLease, EntityKey, SkeletalHost};
use crate::settings::PlaybackSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// No graph.
    Idle,
    /// Graph built and holding a pose at speed 0.
    Built,
    /// Mixer advancing.
    Playing,
    /// Mixer explicitly paused; only a new play call resumes.
    Paused,
    /// Completion observed; graph stopped.
    Done,
}

/// Handle returned by [`PlaybackController::on_animation_end`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type EndListener = Box<dyn FnMut()>;

pub struct PlaybackController {
    owner: EntityKey,
    settings: PlaybackSettings,
    graph: Option<PlaybackGraph>,
    /// Lease held while no graph owns it.
    lease: Option<AnimatorLease>,
    /// Entity the animator lived on before it was destroyed by cleanup.
    animator_entity: Option<EntityKey>,
    signal: Rc<PlaybackSignal>,
    listeners: Vec<(ListenerId, EndListener)>,
    next_listener: u64,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("owner", &self.owner)
            .field("state", &self.state())
            .field("done", &self.signal.is_done())
            .field("animator", &self.animator())
            .field("listeners", &self.listeners.len())
            .finish_non_exhaustive()
    }
}

impl PlaybackController {
    #[must_use]
    pub fn new(owner: EntityKey) -> Self {
        Self::from_parts(owner, PlaybackSettings::default())
    }

    /// Creates a controller with custom settings, rejecting unusable ones.
    pub fn with_settings(owner: EntityKey, settings: PlaybackSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self::from_parts(owner, settings))
    }

    fn from_parts(owner: EntityKey, settings: PlaybackSettings) -> Self {
        Self {
            owner,
            settings,
            graph: None,
            lease: None,
            animator_entity: None,
            signal: Rc::new(PlaybackSignal::default()),
            listeners: Vec::new(),
            next_listener: 0,
        }
    }

    #[must_use]
    pub fn owner(&self) -> EntityKey {
        self.owner
    }

    #[must_use]
    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    // ========================================================================
    // Animator lifecycle
    // ========================================================================

    /// Acquires the animator, creating it if needed. After a cleanup the
    /// animator is recreated on the entity it was removed from.
    pub fn init(&mut self, host: &mut dyn SkeletalHost) -> Result<()> {
        if self.animator().is_some() {
            return Ok(());
        }
        let entity = self.animator_entity.unwrap_or(self.owner);
        self.lease = Some(AnimatorLease::acquire(host, entity)?);
        Ok(())
    }

    /// Animator currently leased by this controller or its graph.
    #[must_use]
    pub fn animator(&self) -> Option<AnimatorKey> {
        self.lease
            .as_ref()
            .or_else(|| self.graph.as_ref().and_then(PlaybackGraph::sink))
            .map(AnimatorLease::animator)
    }

    /// Entity remembered by the last cleanup.
    #[must_use]
    pub fn animator_entity(&self) -> Option<EntityKey> {
        self.animator_entity
    }

    fn take_lease(&mut self) -> Option<AnimatorLease> {
        self.lease
            .take()
            .or_else(|| self.graph.as_mut().and_then(PlaybackGraph::take_sink))
    }

    pub fn enable_animator(&mut self, host: &mut dyn SkeletalHost) -> Result<()> {
        self.set_animator_enabled(host, true)
    }

    pub fn disable_animator(&mut self, host: &mut dyn SkeletalHost) -> Result<()> {
        self.set_animator_enabled(host, false)
    }

    fn set_animator_enabled(&mut self, host: &mut dyn SkeletalHost, enabled: bool) -> Result<()> {
        let animator = self
            .animator()
            .ok_or(PlaybackError::AnimatorMissing(self.owner))?;
        if host.set_animator_enabled(animator, enabled) {
            Ok(())
        } else {
            Err(PlaybackError::AnimatorMissing(self.owner))
        }
    }

    /// Destroys the held animator and remembers its entity so a later
    /// [`init`](Self::init) can recreate it. Returns that entity, or `None`
    /// if no animator was held.
    pub fn cleanup(&mut self, host: &mut dyn SkeletalHost) -> Option<EntityKey> {
        let lease = self.take_lease()?;
        let entity = lease.destroy(host);
        self.animator_entity = Some(entity);
        Some(entity)
    }

    /// Discards the graph and returns the animator to the entity without
    /// destroying it.
    pub fn clear(&mut self, host: &mut dyn SkeletalHost) {
        if let Some(lease) = self.take_lease() {
            lease.release(host);
        }
        if self.graph.take().is_some() {
            log::debug!("Cleared playback graph for entity {:?}", self.owner);
        }
    }

    /// Tears the controller down together with its owner, handing the
    /// animator back so another controller can lease the same entity.
    pub fn shutdown(mut self, host: &mut dyn SkeletalHost) {
        self.clear(host);
        self.listeners.clear();
    }

    // ========================================================================
    // Graph construction
    // ========================================================================

    pub fn set_state(&mut self, host: &mut dyn SkeletalHost, clip: &ClipHandle) -> Result<()> {
        self.set_states(host, std::slice::from_ref(clip))
    }

    /// Builds a graph and holds it at the near-terminal pose. Never plays.
    pub fn set_states(&mut self, host: &mut dyn SkeletalHost, clips: &[ClipHandle]) -> Result<()> {
        self.set_animations(host, clips)?;
        let terminal = self.settings.terminal_progress;
        if let Some(graph) = self.graph.as_mut() {
            graph.set_progress(terminal);
            graph.push_pose(host);
        }
        Ok(())
    }

    /// Replaces the current graph with a fresh one at time 0 and speed 0.
    pub fn set_animations(
        &mut self,
        host: &mut dyn SkeletalHost,
        clips: &[ClipHandle],
    ) -> Result<()> {
        for clip in clips {
            clip.validate()?;
        }
        self.init(host)?;
        let lease = self
            .take_lease()
            .ok_or(PlaybackError::AnimatorMissing(self.owner))?;

        if self.graph.take().is_some() {
            log::debug!("Discarding previous playback graph for entity {:?}", self.owner);
        }

        let mut graph = PlaybackGraph::build(lease, clips);
        graph.push_pose(host);
        self.graph = Some(graph);
        Ok(())
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn play_animation(
        &mut self,
        host: &mut dyn SkeletalHost,
        clip: &ClipHandle,
        speed: f32,
        continuous: bool,
    ) -> Result<()> {
        self.play_animations(host, std::slice::from_ref(clip), speed, continuous)
    }

    /// Builds a graph and starts it at `speed`.
    ///
    /// Continuous playback is marked done up front, so the completion tick
    /// never fires, clamps, or stops it.
    pub fn play_animations(
        &mut self,
        host: &mut dyn SkeletalHost,
        clips: &[ClipHandle],
        speed: f32,
        continuous: bool,
    ) -> Result<()> {
        if clips.is_empty() {
            return Err(PlaybackError::EmptyClipList);
        }
        self.set_animations(host, clips)?;
        self.signal.set_done(continuous);

        if let Some(graph) = self.graph.as_mut() {
            let mixer = graph.mixer_mut();
            mixer.set_speed(speed);
            mixer.play();
            graph.play();
        }
        log::debug!(
            "Playing {} clip(s) at speed {speed} (continuous: {continuous})",
            clips.len()
        );
        Ok(())
    }

    /// [`play_animation`](Self::play_animation) at the configured
    /// `default_speed`.
    pub fn play_animation_default(
        &mut self,
        host: &mut dyn SkeletalHost,
        clip: &ClipHandle,
        continuous: bool,
    ) -> Result<()> {
        let speed = self.settings.default_speed;
        self.play_animations(host, std::slice::from_ref(clip), speed, continuous)
    }

    /// [`play_animations`](Self::play_animations) at the configured
    /// `default_speed`.
    pub fn play_animations_default(
        &mut self,
        host: &mut dyn SkeletalHost,
        clips: &[ClipHandle],
        continuous: bool,
    ) -> Result<()> {
        let speed = self.settings.default_speed;
        self.play_animations(host, clips, speed, continuous)
    }

    /// Plays one clip and returns a future resolving on completion or after
    /// `wait_timeout_factor × clip.duration` seconds of frame time.
    pub fn play_animation_async(
        &mut self,
        host: &mut dyn SkeletalHost,
        clip: &ClipHandle,
        speed: f32,
    ) -> Result<PlaybackWait> {
        self.play_animation(host, clip, speed, false)?;
        let budget = clip.duration() * self.settings.wait_timeout_factor;
        Ok(PlaybackWait::new(Rc::clone(&self.signal), budget))
    }

    /// Freezes the mixer in place. Bindings keep their current time.
    pub fn pause_animations(&mut self) {
        match self.graph.as_mut() {
            Some(graph) => graph.mixer_mut().pause(),
            None => log::debug!("pause_animations called with no playback graph"),
        }
    }

    /// Scrubs every binding to `progress × clip.duration` and writes the
    /// resulting pose to the animator. `progress` is not clamped.
    pub fn set_progress(&mut self, host: &mut dyn SkeletalHost, progress: f32) {
        if let Some(graph) = self.graph.as_mut() {
            graph.set_progress(progress);
            graph.push_pose(host);
        }
    }

    /// Normalized time of the first binding. Warns and returns `0` when no
    /// clip is bound yet.
    #[must_use]
    pub fn get_progress(&self) -> f32 {
        if let Some(progress) = self.graph.as_ref().and_then(PlaybackGraph::progress) {
            progress
        } else {
            log::warn!("Trying to get progress but no clip is bound; returning 0");
            0.0
        }
    }

    // ========================================================================
    // Completion
    // ========================================================================

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.signal.is_done()
    }

    /// Forces the completion flag, ending pending async waits on their next
    /// poll and suppressing the completion tick.
    pub fn mark_done(&mut self) {
        self.signal.set_done(true);
    }

    /// Registers an observer fired once per completed non-continuous playback.
    pub fn on_animation_end(&mut self, listener: impl FnMut() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener);
        self.next_listener += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    /// Per-frame tick. Runs the completion check against the current times,
    /// then advances the graph by `dt` and pushes the pose.
    pub fn update(&mut self, host: &mut dyn SkeletalHost, dt: f32) {
        self.check_completion(host);

        if let Some(graph) = self.graph.as_mut()
            && graph.is_playing()
        {
            graph.advance(dt);
            graph.push_pose(host);
        }

        self.signal.publish_frame(dt);
    }

    fn check_completion(&mut self, host: &mut dyn SkeletalHost) {
        if self.signal.is_done() {
            return;
        }
        let Some(graph) = self.graph.as_ref() else {
            return;
        };
        if graph.bindings().is_empty() || !graph.is_playing() {
            return;
        }
        if self.get_progress() < 1.0 {
            return;
        }

        self.signal.set_done(true);
        let terminal = self.settings.terminal_progress;
        if let Some(graph) = self.graph.as_mut() {
            graph.set_progress(terminal);
            graph.push_pose(host);
        }

        log::debug!("Playback finished for entity {:?}", self.owner);
        for (_, listener) in &mut self.listeners {
            listener();
        }

        if let Some(graph) = self.graph.as_mut() {
            graph.mixer_mut().pause();
            graph.stop();
        }
        self.cleanup(host);
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    #[must_use]
    pub fn state(&self) -> PlaybackState {
        let Some(graph) = self.graph.as_ref() else {
            return PlaybackState::Idle;
        };
        let mixer = graph.mixer();
        if !graph.is_playing() {
            PlaybackState::Done
        } else if mixer.is_paused() {
            PlaybackState::Paused
        } else if mixer.speed() == 0.0 {
            PlaybackState::Built
        } else {
            PlaybackState::Playing
        }
    }

    #[must_use]
    pub fn graph(&self) -> Option<&PlaybackGraph> {
        self.graph.as_ref()
    }

    /// Bindings of the current graph; empty when idle.
    #[must_use]
    pub fn bindings(&self) -> &[ClipBinding] {
        match &self.graph {
            Some(graph) => graph.bindings(),
            None => &[],
        }
    }

    #[must_use]
    pub fn current_pose(&self) -> Option<&Pose> {
        self.graph.as_ref().map(PlaybackGraph::pose)
    }

    /// Number of frames ticked so far.
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.signal.frames()
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        if let Some(animator) = self.animator() {
            log::warn!(
                "Playback controller for entity {:?} dropped while leasing animator {animator:?}; \
                 call shutdown to hand it back",
                self.owner
            );
        }
    }
}
