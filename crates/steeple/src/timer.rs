//! Named single-slot timers driven by an explicit clock.
//!
//! Nothing here sleeps. The owner asks for the next deadline, waits for it
//! however it likes, then calls [`Deadline::poll`] with the current instant.

use std::time::{Duration, Instant};

/// A cancellable timer holding at most one pending payload.
///
/// Starting it again replaces the pending payload and pushes the deadline
/// out, which is exactly a debounce.
#[derive(Debug, Clone)]
pub struct Deadline<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Deadline<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Deadline<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, now: Instant, delay: Duration, payload: T) {
        self.pending = Some((now + delay, payload));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(at, _)| *at)
    }

    /// Takes the payload if the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        if self.deadline().is_some_and(|at| at <= now) {
            self.cancel()
        } else {
            None
        }
    }
}

/// Earliest of a set of optional deadlines.
pub(crate) fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}
