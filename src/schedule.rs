//! Single-slot deferred tasks.
//!
//! Scheduling replaces whatever was pending, so a burst of reschedules
//! collapses into the last one. The host event loop drives time by calling
//! [`SingleSlotTimer::take_due`] from its tick.

use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct SingleSlotTimer<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for SingleSlotTimer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> SingleSlotTimer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `task` once `delay` has passed since `now`, cancelling any
    /// previously scheduled task.
    pub fn schedule(&mut self, now: Instant, delay: Duration, task: T) {
        self.pending = Some((now + delay, task));
    }

    /// Drop the pending task, returning it.
    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, task)| task)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The pending task if its deadline has been reached.
    pub fn take_due(&mut self, now: Instant) -> Option<T> {
        let due = matches!(&self.pending, Some((deadline, _)) if *deadline <= now);
        if due {
            self.cancel()
        } else {
            None
        }
    }
}
