//! Frame-polled waiting for playback completion.
//!
//! [`PlaybackWait`] is a future that resolves once the controller reports
//! completion or once a time budget has elapsed, whichever comes first. It is
//! re-checked once per controller tick: every
//! [`PlaybackController::update`](crate::animation::PlaybackController::update)
//! publishes the frame's delta time and wakes pending waits. Nothing blocks;
//! the host frame loop keeps running while the wait is pending.
//!
//! There is no cancel token. A caller that needs to stop waiting early can
//! call [`PlaybackController::mark_done`](crate::animation::PlaybackController::mark_done)
//! or simply drop the future.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

/// Completion flag and frame clock shared between a controller and its waits.
#[derive(Debug, Default)]
pub(crate) struct PlaybackSignal {
    done: Cell<bool>,
    /// Seconds accumulated over every published frame.
    clock: Cell<f64>,
    frames: Cell<u64>,
    wakers: RefCell<Vec<Waker>>,
}

impl PlaybackSignal {
    pub(crate) fn is_done(&self) -> bool {
        self.done.get()
    }

    pub(crate) fn set_done(&self, done: bool) {
        self.done.set(done);
    }

    pub(crate) fn clock(&self) -> f64 {
        self.clock.get()
    }

    pub(crate) fn frames(&self) -> u64 {
        self.frames.get()
    }

    /// Records one rendered frame and wakes every pending wait.
    pub(crate) fn publish_frame(&self, dt: f32) {
        self.clock.set(self.clock.get() + f64::from(dt));
        self.frames.set(self.frames.get() + 1);
        let wakers = std::mem::take(&mut *self.wakers.borrow_mut());
        for waker in wakers {
            waker.wake();
        }
    }

    fn register(&self, waker: &Waker) {
        let mut wakers = self.wakers.borrow_mut();
        if !wakers.iter().any(|w| w.will_wake(waker)) {
            wakers.push(waker.clone());
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The completion flag was observed.
    Completed,
    /// The time budget ran out first.
    TimedOut,
}

/// Future returned by
/// [`PlaybackController::play_animation_async`](crate::animation::PlaybackController::play_animation_async).
#[must_use = "futures do nothing unless polled"]
#[derive(Debug)]
pub struct PlaybackWait {
    signal: Rc<PlaybackSignal>,
    started_at: f64,
    budget: f64,
}

impl PlaybackWait {
    pub(crate) fn new(signal: Rc<PlaybackSignal>, budget: f32) -> Self {
        let started_at = signal.clock();
        Self {
            signal,
            started_at,
            budget: f64::from(budget),
        }
    }

    /// Seconds of frame time observed since the wait started.
    #[must_use]
    pub fn elapsed(&self) -> f64 {
        self.signal.clock() - self.started_at
    }

    /// Seconds after which the wait gives up.
    #[must_use]
    pub fn budget(&self) -> f64 {
        self.budget
    }
}

impl Future for PlaybackWait {
    type Output = WaitOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        if this.signal.is_done() {
            return Poll::Ready(WaitOutcome::Completed);
        }
        if this.elapsed() >= this.budget {
            log::debug!(
                "Playback wait timed out after {:.3}s (budget {:.3}s)",
                this.elapsed(),
                this.budget
            );
            return Poll::Ready(WaitOutcome::TimedOut);
        }
        this.signal.register(cx.waker());
        Poll::Pending
    }
}
