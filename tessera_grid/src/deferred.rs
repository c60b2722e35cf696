// Copyright 2025 the Tessera Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Work that has to wait for the next render.
//!
//! The engine never touches a rendering surface directly. Focus moves and layout passes are
//! queued here and the host drains them once it has rendered. Both primitives are gated by a
//! detached flag: after [`DeferredQueue::detach`] or [`Debouncer::detach`] nothing fires, so
//! work scheduled before a teardown is dropped.
//!
//! Time is passed in explicitly so the scheduling is deterministic.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Quiet window before a burst of resize observations triggers a layout pass.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(200);

/// Zero-delay tasks, delivered in order after the next render.
#[derive(Clone, Debug)]
pub struct DeferredQueue<T> {
    tasks: VecDeque<T>,
    detached: bool,
}

impl<T> Default for DeferredQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DeferredQueue<T> {
    /// An empty, attached queue.
    pub fn new() -> Self {
        Self {
            tasks: VecDeque::new(),
            detached: false,
        }
    }

    /// Schedules `task`. Ignored while detached.
    pub fn push(&mut self, task: T) {
        if !self.detached {
            self.tasks.push_back(task);
        }
    }

    /// Schedules every task of `tasks`, in order.
    pub fn extend(&mut self, tasks: impl IntoIterator<Item = T>) {
        if !self.detached {
            self.tasks.extend(tasks);
        }
    }

    /// Takes every pending task, oldest first.
    pub fn drain(&mut self) -> Vec<T> {
        self.tasks.drain(..).collect()
    }

    /// Number of pending tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether nothing is pending.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Drops pending tasks and refuses new ones.
    pub fn detach(&mut self) {
        self.detached = true;
        self.tasks.clear();
    }

    /// Accepts tasks again.
    pub fn attach(&mut self) {
        self.detached = false;
    }

    /// Whether the queue is detached.
    pub fn is_detached(&self) -> bool {
        self.detached
    }
}

/// Trailing-edge debouncer.
///
/// Every [`signal`](Self::signal) pushes the deadline to `now + window`. [`poll`](Self::poll)
/// reports `true` once, when the deadline has passed.
#[derive(Clone, Debug)]
pub struct Debouncer {
    window: Duration,
    deadline: Option<Instant>,
    detached: bool,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(RESIZE_DEBOUNCE)
    }
}

impl Debouncer {
    /// A debouncer with the given quiet window.
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            deadline: None,
            detached: false,
        }
    }

    /// The quiet window.
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Records an event at `now`. Ignored while detached.
    pub fn signal(&mut self, now: Instant) {
        if !self.detached {
            self.deadline = Some(now + self.window);
        }
    }

    /// Whether the debounced action should run at `now`. Fires at most once per burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if !self.detached && now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// When the pending burst will fire.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Whether a burst is waiting.
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Forgets the pending burst.
    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    /// Forgets the pending burst and ignores further signals.
    pub fn detach(&mut self) {
        self.detached = true;
        self.deadline = None;
    }

    /// Accepts signals again.
    pub fn attach(&mut self) {
        self.detached = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_delivers_in_order() {
        let mut queue = DeferredQueue::new();
        queue.push(1);
        queue.extend([2, 3]);
        assert_eq!(queue.len(), 3);
        assert_eq!(queue.drain(), vec![1, 2, 3]);
        assert!(queue.is_empty());
    }

    #[test]
    fn detached_queue_drops_work() {
        let mut queue = DeferredQueue::new();
        queue.push("focus");
        queue.detach();
        queue.push("blur");
        assert!(queue.drain().is_empty(), "nothing survives a teardown");

        queue.attach();
        queue.push("focus");
        assert_eq!(queue.drain(), vec!["focus"]);
    }

    #[test]
    fn debouncer_fires_after_the_quiet_window() {
        let start = Instant::now();
        let mut debouncer = Debouncer::default();
        debouncer.signal(start);
        debouncer.signal(start + Duration::from_millis(150));
        assert!(!debouncer.poll(start + Duration::from_millis(300)), "window restarted at 150ms");
        assert!(debouncer.poll(start + Duration::from_millis(350)));
        assert!(!debouncer.poll(start + Duration::from_millis(400)), "fires once per burst");
    }

    #[test]
    fn detached_debouncer_never_fires() {
        let start = Instant::now();
        let mut debouncer = Debouncer::new(Duration::from_millis(10));
        debouncer.signal(start);
        debouncer.detach();
        assert!(!debouncer.poll(start + Duration::from_secs(1)));
        debouncer.signal(start);
        assert!(!debouncer.is_pending());
    }
}
