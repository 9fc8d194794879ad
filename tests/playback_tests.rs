//! Playback Controller Tests
//!
//! Tests for:
//! - set_states / set_animations / play_* graph setup
//! - Per-frame completion detection, clamping and observer firing
//! - Continuous playback suppressing completion
//! - Frame-polled async waits and their timeout budget
//! - Animator lease lifecycle (init, cleanup, re-init, exclusivity)
//! - Empty-graph progress warning
//! - AnimationSystem and ScrubDriver glue

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::sync::Once;
use std::task::{Context, Poll};

use futures::task::noop_waker_ref;
use glam::Vec3;
use slotmap::SlotMap;

use playgraph::animation::clip::{AnimationClip, ClipHandle, Track, TrackData};
use playgraph::animation::pose::TargetPath;
use playgraph::animation::tracks::{InterpolationMode, KeyframeTrack};
use playgraph::animation::{AnimationSystem, ControllerKey, PlaybackState, ScrubDriver};
use playgraph::{
    PlaybackController, PlaybackError, PlaybackSettings, PlaybackWait, RigWorld, WaitOutcome,
};

const EPSILON: f32 = 1e-5;

fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

fn slide(name: &str, end: Vec3, duration: f32) -> ClipHandle {
    AnimationClip::new(
        name,
        vec![Track::new(
            "hip",
            TargetPath::Translation,
            TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, duration],
                vec![Vec3::ZERO, end],
                InterpolationMode::Linear,
            )),
        )],
    )
    .into_handle()
}

fn setup() -> (RigWorld, PlaybackController) {
    let mut world = RigWorld::new();
    let hero = world.spawn("hero");
    (world, PlaybackController::new(hero))
}

/// Counts `on_animation_end` firings.
fn count_endings(controller: &mut PlaybackController) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let counter = Rc::clone(&count);
    controller.on_animation_end(move || counter.set(counter.get() + 1));
    count
}

fn poll_once(wait: &mut PlaybackWait) -> Poll<WaitOutcome> {
    let mut cx = Context::from_waker(noop_waker_ref());
    Pin::new(wait).poll(&mut cx)
}

// ============================================================================
// Warning capture
// ============================================================================

thread_local! {
    static WARNINGS: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl log::Log for CaptureLogger {
    fn enabled(&self, _: &log::Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &log::Record<'_>) {
        if record.level() == log::Level::Warn && record.target().starts_with("playgraph") {
            WARNINGS.with(|w| w.borrow_mut().push(record.args().to_string()));
        }
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INIT_LOGGER: Once = Once::new();

/// Test threads are independent, so each test sees only its own warnings.
fn capture_warnings() {
    INIT_LOGGER.call_once(|| {
        log::set_logger(&LOGGER).expect("logger already installed");
        log::set_max_level(log::LevelFilter::Trace);
    });
    WARNINGS.with(|w| w.borrow_mut().clear());
}

fn warning_count() -> usize {
    WARNINGS.with(|w| w.borrow().len())
}

// ============================================================================
// Graph setup
// ============================================================================

#[test]
fn fresh_controller_is_idle() {
    let (_world, controller) = setup();
    assert_eq!(controller.state(), PlaybackState::Idle);
    assert!(controller.bindings().is_empty());
    assert!(controller.animator().is_none());
}

#[test]
fn progress_without_graph_warns_once_and_returns_zero() {
    capture_warnings();
    let (_world, controller) = setup();

    assert_eq!(controller.get_progress(), 0.0);
    assert_eq!(warning_count(), 1);
}

#[test]
fn progress_on_empty_clip_list_warns() {
    capture_warnings();
    let (mut world, mut controller) = setup();
    controller.set_animations(&mut world, &[]).unwrap();

    assert_eq!(controller.state(), PlaybackState::Built);
    assert_eq!(controller.get_progress(), 0.0);
    assert_eq!(warning_count(), 1);
}

#[test]
fn set_states_holds_near_terminal_pose() {
    let (mut world, mut controller) = setup();
    let clips = [slide("a", Vec3::X, 2.0), slide("b", Vec3::Y, 3.0)];
    controller.set_states(&mut world, &clips).unwrap();

    assert_eq!(controller.state(), PlaybackState::Built);
    for binding in controller.bindings() {
        let node = controller.graph().unwrap().node(binding.node()).unwrap();
        assert!(approx(node.progress(), 0.99));
    }
    assert!(approx(controller.get_progress(), 0.99));

    // The held pose is already on the animator.
    let pose = world.animator_of(controller.owner()).unwrap().pose();
    let hip = pose.translation("hip").unwrap();
    assert!(approx(hip.x, 0.99) && approx(hip.y, 0.99));
}

#[test]
fn set_states_never_plays() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    controller.set_state(&mut world, &slide("a", Vec3::X, 1.0)).unwrap();

    for _ in 0..10 {
        controller.update(&mut world, 0.5);
    }
    assert!(approx(controller.get_progress(), 0.99));
    assert_eq!(ended.get(), 0);
}

#[test]
fn set_animations_replaces_previous_graph() {
    let (mut world, mut controller) = setup();
    controller
        .set_animations(&mut world, &[slide("a", Vec3::X, 1.0)])
        .unwrap();
    let animator = controller.animator();
    controller
        .set_animations(&mut world, &[slide("b", Vec3::X, 1.0), slide("c", Vec3::Y, 1.0)])
        .unwrap();

    assert_eq!(controller.bindings().len(), 2);
    assert_eq!(controller.get_progress(), 0.0);
    assert_eq!(controller.graph().unwrap().mixer().speed(), 0.0);
    assert_eq!(controller.animator(), animator, "lease carried over to the new graph");
    assert_eq!(world.animator_count(), 1);
}

#[test]
fn invalid_clip_is_rejected_before_building() {
    let (mut world, mut controller) = setup();
    let bad = AnimationClip::new("bad", vec![]).into_handle();
    let err = controller.set_animations(&mut world, &[bad]).unwrap_err();

    assert!(matches!(err, PlaybackError::InvalidClipDuration { .. }));
    assert_eq!(controller.state(), PlaybackState::Idle);
}

#[test]
fn malformed_clip_is_rejected_before_building() {
    let (mut world, mut controller) = setup();
    let broken = AnimationClip::new(
        "broken",
        vec![Track::new(
            "hip",
            TargetPath::Translation,
            TrackData::Vector3(KeyframeTrack::new(
                vec![0.0, 1.0],
                vec![Vec3::X],
                InterpolationMode::Linear,
            )),
        )],
    )
    .into_handle();

    let err = controller
        .play_animation(&mut world, &broken, 1.0, false)
        .unwrap_err();
    assert!(matches!(err, PlaybackError::MalformedTrack { .. }));
    assert_eq!(controller.state(), PlaybackState::Idle);
    controller.update(&mut world, 0.5);
}

#[test]
fn invalid_settings_are_rejected() {
    let mut world = RigWorld::new();
    let hero = world.spawn("hero");
    let settings = PlaybackSettings::default().with_wait_timeout_factor(-1.0);
    assert!(matches!(
        PlaybackController::with_settings(hero, settings),
        Err(PlaybackError::InvalidSettings(_))
    ));
}

#[test]
fn scrub_writes_pose_to_animator() {
    let (mut world, mut controller) = setup();
    let hero = controller.owner();
    controller
        .set_states(&mut world, &[slide("a", Vec3::X, 1.0)])
        .unwrap();

    controller.set_progress(&mut world, 0.5);
    let pose = world.animator_of(hero).unwrap().pose();
    assert!(approx(pose.translation("hip").unwrap().x, 0.5));
}

#[test]
fn play_without_clips_is_rejected() {
    let (mut world, mut controller) = setup();
    let err = controller.play_animations(&mut world, &[], 1.0, false).unwrap_err();
    assert!(matches!(err, PlaybackError::EmptyClipList));
}

#[test]
fn missing_target_fails_fast() {
    let mut world = RigWorld::new();
    let ghost = world.spawn("ghost");
    world.despawn(ghost);
    let mut controller = PlaybackController::new(ghost);

    let err = controller
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, false)
        .unwrap_err();
    assert!(matches!(err, PlaybackError::InvalidTarget(e) if e == ghost));
}

// ============================================================================
// Playback & completion
// ============================================================================

#[test]
fn play_to_completion_scenario() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    let hero = controller.owner();

    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 2.0), 1.0, false)
        .unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);

    // Frames 1-4 advance the clip to exactly its end.
    for _ in 0..4 {
        controller.update(&mut world, 0.5);
    }
    assert!(approx(controller.get_progress(), 1.0));
    assert_eq!(ended.get(), 0);

    // Frame 5 observes progress >= 1.
    controller.update(&mut world, 0.5);
    assert_eq!(ended.get(), 1);
    assert!(controller.is_done());
    assert!(approx(controller.get_progress(), 0.99));
    assert_eq!(controller.state(), PlaybackState::Done);
    assert!(controller.graph().unwrap().mixer().is_paused());

    // The animator was released by destroying it; its entity is remembered.
    assert!(controller.animator().is_none());
    assert!(world.animator_of(hero).is_none());
    assert_eq!(controller.animator_entity(), Some(hero));
    assert_eq!(controller.cleanup(&mut world), None);
}

#[test]
fn completion_tick_is_idempotent() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, false)
        .unwrap();

    for _ in 0..20 {
        controller.update(&mut world, 0.25);
    }
    assert_eq!(ended.get(), 1);
    assert!(approx(controller.get_progress(), 0.99));
}

#[test]
fn fresh_graph_is_not_completed_in_its_first_frame() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, false)
        .unwrap();

    // A frame longer than the whole clip still reports progress 0 to the check.
    controller.update(&mut world, 10.0);
    assert_eq!(ended.get(), 0);
    controller.update(&mut world, 0.0);
    assert_eq!(ended.get(), 1);
}

#[test]
fn continuous_playback_never_completes() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    controller
        .play_animations(&mut world, &[slide("loop", Vec3::X, 1.0)], 1.0, true)
        .unwrap();

    for _ in 0..50 {
        controller.update(&mut world, 0.25);
    }
    assert_eq!(ended.get(), 0);
    assert!(controller.get_progress() > 10.0);
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert!(controller.animator().is_some());
}

#[test]
fn speed_scales_completion_time() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 2.0), 2.0, false)
        .unwrap();

    controller.update(&mut world, 0.5);
    controller.update(&mut world, 0.5);
    assert!(approx(controller.get_progress(), 1.0));
    controller.update(&mut world, 0.5);
    assert_eq!(ended.get(), 1);
}

#[test]
fn default_speed_comes_from_settings() {
    let mut world = RigWorld::new();
    let hero = world.spawn("hero");
    let settings = PlaybackSettings::default().with_default_speed(2.0);
    let mut controller = PlaybackController::with_settings(hero, settings).unwrap();

    controller
        .play_animation_default(&mut world, &slide("a", Vec3::X, 2.0), false)
        .unwrap();
    assert_eq!(controller.graph().unwrap().mixer().speed(), 2.0);
    controller.update(&mut world, 0.5);
    assert!(approx(controller.get_progress(), 0.5));
}

#[test]
fn pause_freezes_time_until_next_play() {
    let (mut world, mut controller) = setup();
    let clip = slide("a", Vec3::X, 2.0);
    controller.play_animation(&mut world, &clip, 1.0, false).unwrap();
    controller.update(&mut world, 0.5);

    controller.pause_animations();
    assert_eq!(controller.state(), PlaybackState::Paused);
    for _ in 0..10 {
        controller.update(&mut world, 0.5);
    }
    assert!(approx(controller.get_progress(), 0.25));

    // A new play call restarts from zero.
    controller.play_animation(&mut world, &clip, 1.0, false).unwrap();
    assert_eq!(controller.state(), PlaybackState::Playing);
    assert_eq!(controller.get_progress(), 0.0);
}

#[test]
fn pose_follows_playback() {
    let (mut world, mut controller) = setup();
    controller
        .play_animation(&mut world, &slide("a", Vec3::X * 2.0, 2.0), 1.0, false)
        .unwrap();
    controller.update(&mut world, 0.5);

    let hip = world
        .animator_of(controller.owner())
        .unwrap()
        .pose()
        .translation("hip")
        .unwrap();
    assert!(approx(hip.x, 0.5));
    assert_eq!(controller.current_pose().unwrap().translation("hip"), Some(hip));
}

#[test]
fn removed_listener_is_not_called() {
    let (mut world, mut controller) = setup();
    let kept = count_endings(&mut controller);
    let dropped = Rc::new(Cell::new(0));
    let counter = Rc::clone(&dropped);
    let id = controller.on_animation_end(move || counter.set(counter.get() + 1));
    assert!(controller.remove_listener(id));
    assert!(!controller.remove_listener(id));

    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 0.5), 1.0, false)
        .unwrap();
    controller.update(&mut world, 1.0);
    controller.update(&mut world, 1.0);
    assert_eq!(kept.get(), 1);
    assert_eq!(dropped.get(), 0);
}

// ============================================================================
// Async wait
// ============================================================================

#[test]
fn async_wait_completes_with_playback() {
    let (mut world, mut controller) = setup();
    let mut wait = controller
        .play_animation_async(&mut world, &slide("a", Vec3::X, 1.0), 1.0)
        .unwrap();
    assert!((wait.budget() - 1.5).abs() < 1e-9);

    let mut frames = 0;
    while poll_once(&mut wait).is_pending() {
        controller.update(&mut world, 0.25);
        frames += 1;
        assert!(frames < 100, "wait never resolved");
    }
    assert_eq!(poll_once(&mut wait), Poll::Ready(WaitOutcome::Completed));
    assert_eq!(frames, 5);
}

#[test]
fn async_wait_times_out_without_completion() {
    let (mut world, mut controller) = setup();
    let mut wait = controller
        .play_animation_async(&mut world, &slide("a", Vec3::X, 2.0), 1.0)
        .unwrap();
    controller.pause_animations();

    // Budget is 1.5 × 2.0 = 3.0s of frame time.
    for _ in 0..5 {
        controller.update(&mut world, 0.5);
        assert!(poll_once(&mut wait).is_pending());
    }
    controller.update(&mut world, 0.5);
    assert_eq!(poll_once(&mut wait), Poll::Ready(WaitOutcome::TimedOut));
    assert!(!controller.is_done());
}

#[test]
fn async_wait_budget_is_configurable() {
    let mut world = RigWorld::new();
    let hero = world.spawn("hero");
    let settings = PlaybackSettings::default().with_wait_timeout_factor(3.0);
    let mut controller = PlaybackController::with_settings(hero, settings).unwrap();

    let wait = controller
        .play_animation_async(&mut world, &slide("a", Vec3::X, 2.0), 1.0)
        .unwrap();
    assert!((wait.budget() - 6.0).abs() < 1e-9);
}

#[test]
fn mark_done_ends_wait_early() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    let mut wait = controller
        .play_animation_async(&mut world, &slide("a", Vec3::X, 10.0), 1.0)
        .unwrap();
    assert!(poll_once(&mut wait).is_pending());

    controller.mark_done();
    assert_eq!(poll_once(&mut wait), Poll::Ready(WaitOutcome::Completed));

    // Completion tick is suppressed once done is forced.
    for _ in 0..30 {
        controller.update(&mut world, 1.0);
    }
    assert_eq!(ended.get(), 0);
}

#[test]
fn async_wait_runs_on_local_executor() {
    use futures::executor::LocalPool;
    use futures::task::LocalSpawnExt;

    let (mut world, mut controller) = setup();
    let wait = controller
        .play_animation_async(&mut world, &slide("a", Vec3::X, 1.0), 1.0)
        .unwrap();

    let outcome = Rc::new(Cell::new(None));
    let slot = Rc::clone(&outcome);
    let mut pool = LocalPool::new();
    pool.spawner()
        .spawn_local(async move { slot.set(Some(wait.await)) })
        .unwrap();

    for _ in 0..10 {
        pool.run_until_stalled();
        if outcome.get().is_some() {
            break;
        }
        controller.update(&mut world, 0.25);
    }
    assert_eq!(outcome.get(), Some(WaitOutcome::Completed));
}

// ============================================================================
// Animator lease lifecycle
// ============================================================================

#[test]
fn init_creates_animator_lazily() {
    let (mut world, mut controller) = setup();
    assert_eq!(world.animator_count(), 0);
    controller.init(&mut world).unwrap();
    assert_eq!(world.animator_count(), 1);
    assert!(world.animator_of(controller.owner()).unwrap().is_leased());

    controller.init(&mut world).unwrap();
    assert_eq!(world.animator_count(), 1);
}

#[test]
fn cleanup_then_init_recreates_on_remembered_entity() {
    let (mut world, mut controller) = setup();
    let hero = controller.owner();
    controller.init(&mut world).unwrap();

    assert_eq!(controller.cleanup(&mut world), Some(hero));
    assert_eq!(world.animator_count(), 0);

    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, false)
        .unwrap();
    assert_eq!(world.animator_count(), 1);
    assert!(world.animator_of(hero).is_some());
}

#[test]
fn replay_after_completion_recreates_animator() {
    let (mut world, mut controller) = setup();
    let ended = count_endings(&mut controller);
    let clip = slide("a", Vec3::X, 0.5);

    for round in 1..=2 {
        controller.play_animation(&mut world, &clip, 1.0, false).unwrap();
        assert!(controller.animator().is_some());
        controller.update(&mut world, 1.0);
        controller.update(&mut world, 1.0);
        assert_eq!(ended.get(), round);
        assert!(controller.animator().is_none());
    }
}

#[test]
fn second_controller_cannot_lease_same_target() {
    let (mut world, mut first) = setup();
    let mut second = PlaybackController::new(first.owner());
    first
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, false)
        .unwrap();

    let err = second
        .play_animation(&mut world, &slide("b", Vec3::X, 1.0), 1.0, false)
        .unwrap_err();
    assert!(matches!(err, PlaybackError::AnimatorLeased(_)));

    first.clear(&mut world);
    assert_eq!(first.state(), PlaybackState::Idle);
    second
        .play_animation(&mut world, &slide("b", Vec3::X, 1.0), 1.0, false)
        .unwrap();
}

#[test]
fn shutdown_frees_target_for_a_new_controller() {
    let (mut world, mut first) = setup();
    let hero = first.owner();
    first
        .set_states(&mut world, &[slide("a", Vec3::X, 1.0)])
        .unwrap();
    first.shutdown(&mut world);

    let mut second = PlaybackController::new(hero);
    second
        .set_states(&mut world, &[slide("b", Vec3::Y, 1.0)])
        .unwrap();
    assert!(world.animator_of(hero).unwrap().is_leased());
}

#[test]
fn dropped_controller_lease_can_be_revoked() {
    let (mut world, mut first) = setup();
    let hero = first.owner();
    first
        .set_states(&mut world, &[slide("a", Vec3::X, 1.0)])
        .unwrap();
    drop(first);

    let mut second = PlaybackController::new(hero);
    assert!(matches!(
        second.set_states(&mut world, &[slide("b", Vec3::Y, 1.0)]),
        Err(PlaybackError::AnimatorLeased(_))
    ));
    assert!(world.revoke_lease(hero));
    second
        .set_states(&mut world, &[slide("b", Vec3::Y, 1.0)])
        .unwrap();
}

#[test]
fn enable_and_disable_animator() {
    let (mut world, mut controller) = setup();
    assert!(matches!(
        controller.disable_animator(&mut world),
        Err(PlaybackError::AnimatorMissing(_))
    ));

    controller.set_state(&mut world, &slide("a", Vec3::X, 1.0)).unwrap();
    controller.disable_animator(&mut world).unwrap();
    assert!(!world.animator_of(controller.owner()).unwrap().enabled);
    controller.enable_animator(&mut world).unwrap();
    assert!(world.animator_of(controller.owner()).unwrap().enabled);
}

// ============================================================================
// System & scrub driver
// ============================================================================

#[test]
fn animation_system_ticks_every_controller() {
    let mut world = RigWorld::new();
    let mut controllers: SlotMap<ControllerKey, PlaybackController> = SlotMap::with_key();
    let clip = slide("a", Vec3::X, 1.0);

    let mut keys = Vec::new();
    for name in ["a", "b", "c"] {
        let entity = world.spawn(name);
        let mut controller = PlaybackController::new(entity);
        controller.play_animation(&mut world, &clip, 1.0, false).unwrap();
        keys.push(controllers.insert(controller));
    }

    AnimationSystem::update(&mut controllers, &mut world, 0.5);
    for key in &keys {
        assert!(approx(controllers[*key].get_progress(), 0.5));
    }
    AnimationSystem::update(&mut controllers, &mut world, 0.5);
    AnimationSystem::update(&mut controllers, &mut world, 0.5);
    for key in keys {
        assert!(controllers[key].is_done());
    }
}

#[test]
fn animation_system_remove_releases_lease() {
    let mut world = RigWorld::new();
    let mut controllers: SlotMap<ControllerKey, PlaybackController> = SlotMap::with_key();
    let hero = world.spawn("hero");

    let mut controller = PlaybackController::new(hero);
    controller
        .play_animation(&mut world, &slide("a", Vec3::X, 1.0), 1.0, true)
        .unwrap();
    let key = controllers.insert(controller);

    assert!(AnimationSystem::remove(&mut controllers, key, &mut world));
    assert!(!AnimationSystem::remove(&mut controllers, key, &mut world));
    assert!(!world.animator_of(hero).unwrap().is_leased());

    let mut replacement = PlaybackController::new(hero);
    replacement
        .play_animation(&mut world, &slide("b", Vec3::X, 1.0), 1.0, true)
        .unwrap();
}

#[test]
fn scrub_driver_rebuilds_then_scrubs() -> anyhow::Result<()> {
    let (mut world, mut controller) = setup();
    let mut driver = ScrubDriver::new(vec![slide("a", Vec3::X, 2.0)]);

    driver.tick(&mut controller, &mut world)?;
    assert_eq!(controller.bindings().len(), 1);
    assert_eq!(controller.get_progress(), 0.0);

    driver.set_progress(0.4);
    driver.tick(&mut controller, &mut world)?;
    assert!(approx(controller.get_progress(), 0.4));
    let pose = world.animator_of(controller.owner()).unwrap().pose();
    assert!(approx(pose.translation("hip").unwrap().x, 0.4));

    driver.set_progress(7.0);
    assert_eq!(driver.progress(), 1.0);

    driver.clips.push(slide("b", Vec3::Y, 1.0));
    driver.request_update();
    driver.tick(&mut controller, &mut world)?;
    assert_eq!(controller.bindings().len(), 2);
    assert!(approx(controller.get_progress(), 1.0));
    Ok(())
}
