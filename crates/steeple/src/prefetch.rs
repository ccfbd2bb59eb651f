//! Debounced speculative hints for the page a user is about to open.
//!
//! Two intent channels, each with its own single-slot timer: keyboard
//! selection and pointer hover. A path is hinted at most once per session.

use std::time::{Duration, Instant};

use ahash::AHashSet as HashSet;
use tracing::debug;

use crate::timer::{Deadline, earliest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntentChannel {
    Selection,
    Hover,
}

#[derive(Debug, Clone)]
pub struct PrefetchScheduler {
    selection: Deadline<String>,
    hover: Deadline<String>,
    selection_delay: Duration,
    hover_delay: Duration,
    seen: HashSet<String>,
}

impl PrefetchScheduler {
    pub fn new(selection_delay: Duration, hover_delay: Duration) -> Self {
        Self {
            selection: Deadline::new(),
            hover: Deadline::new(),
            selection_delay,
            hover_delay,
            seen: HashSet::new(),
        }
    }

    fn timer(&mut self, channel: IntentChannel) -> (&mut Deadline<String>, Duration) {
        match channel {
            IntentChannel::Selection => (&mut self.selection, self.selection_delay),
            IntentChannel::Hover => (&mut self.hover, self.hover_delay),
        }
    }

    /// Restarts the channel's debounce with `path` as the candidate.
    ///
    /// Paths already hinted this session don't arm a timer at all.
    pub fn on_intent(&mut self, channel: IntentChannel, path: String, now: Instant) {
        if self.seen.contains(&path) {
            self.timer(channel).0.cancel();
            return;
        }
        let (timer, delay) = self.timer(channel);
        timer.start(now, delay, path);
    }

    pub fn cancel(&mut self, channel: IntentChannel) {
        self.timer(channel).0.cancel();
    }

    pub fn cancel_all(&mut self) {
        self.selection.cancel();
        self.hover.cancel();
    }

    /// Paths whose debounce expired and that were not hinted before.
    pub fn tick(&mut self, now: Instant) -> Vec<String> {
        let mut hints = Vec::new();
        for path in [self.selection.poll(now), self.hover.poll(now)]
            .into_iter()
            .flatten()
        {
            if self.seen.insert(path.clone()) {
                debug!(path = %path, "Emitting resource hint");
                hints.push(path);
            }
        }
        hints
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.selection.deadline(), self.hover.deadline()])
    }

    pub fn has_hinted(&self, path: &str) -> bool {
        self.seen.contains(path)
    }

    /// Cancels both channels and forgets every hinted path.
    pub fn reset(&mut self) {
        self.cancel_all();
        self.seen.clear();
    }
}
