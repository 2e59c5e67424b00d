//! Cooperative step scheduler.
//!
//! Multi-step flows (the wave loop, respawn replay, boss intros, death beats,
//! post-victory cutscenes, level transitions) are written as an explicit queue
//! of steps and advanced once per frame by the system that owns them.
//!
//! ```text
//!   Do(a)         release `a` and keep going in the same frame
//!   Wait(secs)    countdown; starts counting on the frame *after* it is reached
//!   WaitFrame     yield exactly one frame
//!   WaitUntil(g)  block until the owner's gate predicate accepts `g`
//! ```
//!
//! Timing rules:
//! - A wait reached during a tick is "fresh": it is not charged that tick's `dt`.
//!   So a positive wait never completes in the frame it starts, and the first
//!   frame it sees is one whose state was produced after it was scheduled.
//! - A zero-length wait completes the frame it is reached.
//! - `cancel()` drops every pending step and bumps the epoch; nothing queued
//!   before the cancel can resume afterwards.

use std::collections::VecDeque;

/// Clamped-at-zero seconds.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Countdown(f32);

impl Countdown {
    #[inline]
    pub fn new(secs: f32) -> Self {
        Self(secs.max(0.0))
    }
    #[inline]
    pub fn get(self) -> f32 {
        self.0
    }
    #[inline]
    pub fn tick_down(&mut self, dt: f32) {
        self.0 = (self.0 - dt).max(0.0);
    }
    #[inline]
    pub fn set_max(&mut self, secs: f32) {
        self.0 = self.0.max(secs.max(0.0));
    }
    #[inline]
    pub fn is_positive(self) -> bool {
        self.0 > 0.0
    }
    #[inline]
    pub fn expired(self) -> bool {
        self.0 <= 0.0
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Step<A, G> {
    Do(A),
    Wait(Countdown),
    WaitFrame,
    WaitUntil(G),
}

#[derive(Clone, Debug)]
pub struct Sequence<A, G = ()> {
    steps: VecDeque<Step<A, G>>,
    head_fresh: bool,
    epoch: u32,
}

impl<A, G> Default for Sequence<A, G> {
    fn default() -> Self {
        Self {
            steps: VecDeque::new(),
            head_fresh: true,
            epoch: 0,
        }
    }
}

impl<A, G> Sequence<A, G> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Step<A, G>) {
        if self.steps.is_empty() {
            self.head_fresh = true;
        }
        self.steps.push_back(step);
    }

    pub fn then(mut self, action: A) -> Self {
        self.push(Step::Do(action));
        self
    }

    pub fn wait(mut self, secs: f32) -> Self {
        self.push(Step::Wait(Countdown::new(secs)));
        self
    }

    pub fn frame(mut self) -> Self {
        self.push(Step::WaitFrame);
        self
    }

    pub fn until(mut self, gate: G) -> Self {
        self.push(Step::WaitUntil(gate));
        self
    }

    /// Append every step of `other` (its epoch is discarded).
    pub fn extend(&mut self, other: Sequence<A, G>) {
        for step in other.steps {
            self.push(step);
        }
    }

    #[inline]
    pub fn is_idle(&self) -> bool {
        self.steps.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    #[inline]
    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn front(&self) -> Option<&Step<A, G>> {
        self.steps.front()
    }

    pub fn cancel(&mut self) {
        self.steps.clear();
        self.head_fresh = true;
        self.epoch = self.epoch.wrapping_add(1);
    }

    /// Replace the pending steps with `next`, cancelling the old continuation.
    pub fn restart(&mut self, next: Sequence<A, G>) {
        self.cancel();
        self.extend(next);
    }

    /// Advance by one frame and return the actions released, in order.
    pub fn tick(&mut self, dt: f32, mut gate: impl FnMut(&G) -> bool) -> Vec<A> {
        let mut released = Vec::new();

        while let Some(step) = self.steps.front_mut() {
            let done = match step {
                Step::Do(_) => true,
                Step::Wait(left) => {
                    if !self.head_fresh {
                        left.tick_down(dt);
                    }
                    left.expired()
                }
                Step::WaitFrame => !self.head_fresh,
                Step::WaitUntil(g) => gate(g),
            };

            if !done {
                break;
            }

            if let Some(Step::Do(action)) = self.steps.pop_front() {
                released.push(action);
            }
            self.head_fresh = true;
        }

        self.head_fresh = false;
        released
    }
}
