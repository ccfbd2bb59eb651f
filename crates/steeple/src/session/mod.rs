//! The quick-search session: one search surface and everything it shows.
//!
//! [`QuickSearch`] is a synchronous state machine. Every operation takes the
//! current instant and returns the [`Effect`]s the host must carry out;
//! nothing in here performs I/O or sleeps. Timers (the deferred loading
//! indicator and the two prefetch debounces) are expired by [`QuickSearch::tick`],
//! and [`QuickSearch::next_deadline`] says when that next needs to happen.

mod input;

use std::time::Instant;

use steeple_data::Collections;
use tracing::{debug, info, warn};

pub use input::{FocusTarget, Key, KeyEvent, KeyOutcome};

use crate::{
    config::SearchConfig,
    prefetch::{IntentChannel, PrefetchScheduler},
    render::{ViewModel, render},
    search::{RankedResult, SearchIndex, match_query},
    timer::{Deadline, earliest},
};

/// Work the host performs on the session's behalf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Consult the cache, fetch if it is missing or stale, and report back
    /// with [`QuickSearch::data_arrived`], [`QuickSearch::stale_data_served`],
    /// [`QuickSearch::data_still_fresh`] or [`QuickSearch::data_failed`].
    LoadData,
    /// Leave the page for this canonical path.
    Navigate(String),
    /// Speculatively warm this path.
    ResourceHint(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Closed,
    /// Open and waiting on data.
    Opening,
    /// Open, data ready, nothing typed.
    Idle,
    /// Open, data ready, a query in the box.
    Typing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DataStatus {
    #[default]
    Loading,
    Ready,
    /// The last fetch failed. Retried on the next open.
    Unavailable,
}

/// Everything the renderer needs, and nothing it doesn't.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub is_open: bool,
    pub phase: SessionPhase,
    pub query: String,
    pub results: Vec<RankedResult>,
    /// `None` means nothing is highlighted.
    pub selected_index: Option<usize>,
    pub data_ready: bool,
    pub data_status: DataStatus,
    /// Query typed before data was ready, replayed once it arrives.
    pub pending_query: Option<String>,
    /// The loading indicator has outlived its deferral.
    pub loading_visible: bool,
}

impl SessionState {
    pub fn selected(&self) -> Option<&RankedResult> {
        self.selected_index.and_then(|i| self.results.get(i))
    }
}

/// Owns one search surface: its state, index, timers and prefetch scheduler.
#[derive(Debug)]
pub struct QuickSearch {
    config: SearchConfig,
    state: SessionState,
    index: SearchIndex,
    loading: Deadline<()>,
    prefetch: PrefetchScheduler,
    fetch_in_flight: bool,
}

impl QuickSearch {
    pub fn new(config: SearchConfig) -> Self {
        let prefetch = PrefetchScheduler::new(config.selection_debounce, config.hover_debounce);
        Self {
            config,
            state: SessionState::default(),
            index: SearchIndex::default(),
            loading: Deadline::new(),
            prefetch,
            fetch_in_flight: false,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn index(&self) -> &SearchIndex {
        &self.index
    }

    pub fn view(&self) -> ViewModel {
        render(&self.state)
    }

    pub fn prefetch(&self) -> &PrefetchScheduler {
        &self.prefetch
    }

    /// Shows the surface with an empty query and asks the host for data,
    /// unless a fetch is already on its way.
    ///
    /// The request goes out on every open, not just the first: the host checks
    /// the cache and refreshes a stale snapshot in the background.
    pub fn open(&mut self, now: Instant) -> Vec<Effect> {
        if self.state.is_open {
            return Vec::new();
        }

        self.state.is_open = true;
        self.state.query.clear();
        self.state.results.clear();
        self.state.selected_index = None;
        self.state.pending_query = None;
        self.state.loading_visible = false;

        if self.state.data_ready {
            self.state.phase = SessionPhase::Idle;
        } else {
            self.state.phase = SessionPhase::Opening;
            self.state.data_status = DataStatus::Loading;
            self.loading.start(now, self.config.loading_delay, ());
        }

        if self.fetch_in_flight {
            debug!("Opened while a fetch is already in flight");
            return Vec::new();
        }
        self.fetch_in_flight = true;
        if self.state.data_ready {
            debug!("Opened with data, checking freshness");
        } else {
            info!("Opened without data, requesting collections");
        }
        vec![Effect::LoadData]
    }

    /// Whether a requested load has not been answered yet.
    pub fn fetch_in_flight(&self) -> bool {
        self.fetch_in_flight
    }

    /// New text in the search box.
    pub fn type_query(&mut self, query: &str, now: Instant) {
        if !self.state.is_open {
            return;
        }
        self.state.query = query.to_string();

        if self.state.data_ready {
            self.run_query(now);
            return;
        }

        self.state.pending_query = (!query.trim().is_empty()).then(|| query.to_string());
        if self.state.data_status == DataStatus::Loading
            && !self.loading.is_armed()
            && !self.state.loading_visible
        {
            self.loading.start(now, self.config.loading_delay, ());
        }
    }

    fn run_query(&mut self, now: Instant) {
        self.state.results = match_query(
            &self.state.query,
            &self.index,
            self.config.viewer_role,
            &self.config.matching,
        );
        self.state.pending_query = None;
        self.state.phase = if self.state.query.trim().is_empty() {
            SessionPhase::Idle
        } else {
            SessionPhase::Typing
        };
        let selected = (!self.state.results.is_empty()).then_some(0);
        self.select(selected, now);
    }

    fn select(&mut self, index: Option<usize>, now: Instant) {
        self.state.selected_index = index;
        match self.state.selected() {
            Some(result) => {
                let path = result.path();
                self.prefetch.on_intent(IntentChannel::Selection, path, now);
            }
            None => self.prefetch.cancel(IntentChannel::Selection),
        }
    }

    /// Moves the highlight by `delta` rows, clamped to `[none, last]`.
    pub fn move_selection(&mut self, delta: isize, now: Instant) {
        if !self.state.is_open || self.state.results.is_empty() {
            return;
        }
        let last = self.state.results.len() as isize - 1;
        let current = self.state.selected_index.map_or(-1, |i| i as isize);
        let next = current.saturating_add(delta).clamp(-1, last);
        if next == current {
            return;
        }
        self.select(usize::try_from(next).ok(), now);
    }

    /// Navigates to the highlighted result (the first one if none is
    /// highlighted) and closes the surface.
    pub fn commit(&mut self) -> Vec<Effect> {
        if !self.state.is_open || self.state.results.is_empty() {
            return Vec::new();
        }
        let index = self.state.selected_index.unwrap_or(0);
        let Some(result) = self.state.results.get(index) else {
            return Vec::new();
        };
        let path = result.path();
        info!(path = %path, exact = result.exact_match, "Committing result");
        self.close();
        vec![Effect::Navigate(path)]
    }

    /// Hides the surface, cancelling every timer. Fetches keep running.
    pub fn close(&mut self) {
        if !self.state.is_open {
            return;
        }
        self.loading.cancel();
        self.prefetch.reset();
        self.state = SessionState {
            data_ready: self.state.data_ready,
            data_status: self.state.data_status,
            ..SessionState::default()
        };
    }

    pub fn hover(&mut self, index: usize, now: Instant) {
        if !self.state.is_open {
            return;
        }
        if let Some(result) = self.state.results.get(index) {
            self.prefetch
                .on_intent(IntentChannel::Hover, result.path(), now);
        }
    }

    pub fn pointer_leave(&mut self) {
        self.prefetch.cancel(IntentChannel::Hover);
    }

    /// Answers a load with a fresh snapshot, from the network or the cache.
    ///
    /// The first arrival replays any pending query. Later arrivals are
    /// background refreshes: the index is swapped but the visible results
    /// stay until the next keystroke.
    pub fn data_arrived(&mut self, collections: &Collections, now: Instant) {
        self.fetch_in_flight = false;
        self.install(collections, now);
    }

    /// Installs a stale cached snapshot while the host refreshes it. The load
    /// stays in flight until [`data_arrived`](Self::data_arrived) or
    /// [`data_failed`](Self::data_failed).
    pub fn stale_data_served(&mut self, collections: &Collections, now: Instant) {
        self.install(collections, now);
    }

    /// Answers a load whose cached snapshot is still fresh and already
    /// installed. Nothing changes except that the next open may ask again.
    pub fn data_still_fresh(&mut self) {
        self.fetch_in_flight = false;
    }

    fn install(&mut self, collections: &Collections, now: Instant) {
        self.index = SearchIndex::build(collections);

        if self.state.data_ready {
            debug!(items = self.index.len(), "Swapped in refreshed index");
            return;
        }

        self.state.data_ready = true;
        self.state.data_status = DataStatus::Ready;
        self.state.loading_visible = false;
        self.loading.cancel();

        if !self.state.is_open {
            return;
        }
        match self.state.pending_query.take() {
            Some(query) => {
                debug!(query = %query, "Replaying pending query");
                self.state.query = query;
                self.run_query(now);
            }
            None => self.state.phase = SessionPhase::Idle,
        }
    }

    /// The requested fetch failed. Nothing retries until the next open.
    pub fn data_failed(&mut self) {
        self.fetch_in_flight = false;
        if self.state.data_ready {
            debug!("Background refresh failed, keeping current index");
            return;
        }
        warn!("No collections available to search");
        self.state.data_status = DataStatus::Unavailable;
        self.state.loading_visible = false;
        self.loading.cancel();
    }

    /// Expires due timers.
    pub fn tick(&mut self, now: Instant) -> Vec<Effect> {
        if self.loading.poll(now).is_some() && self.state.is_open && !self.state.data_ready {
            self.state.loading_visible = true;
        }
        self.prefetch
            .tick(now)
            .into_iter()
            .map(Effect::ResourceHint)
            .collect()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.loading.deadline(), self.prefetch.next_deadline()])
    }

    /// Routes a key press: the shortcut while closed, navigation keys while open.
    pub fn handle_key(&mut self, event: &KeyEvent, now: Instant) -> KeyOutcome {
        if !self.state.is_open {
            if event.is_shortcut(self.config.shortcut_key) {
                return KeyOutcome::consumed(self.open(now));
            }
            return KeyOutcome::ignored();
        }

        match event.key {
            Key::Escape => {
                self.close();
                KeyOutcome::consumed(Vec::new())
            }
            Key::ArrowDown => {
                self.move_selection(1, now);
                KeyOutcome::consumed(Vec::new())
            }
            Key::ArrowUp => {
                self.move_selection(-1, now);
                KeyOutcome::consumed(Vec::new())
            }
            Key::Enter => KeyOutcome::consumed(self.commit()),
            Key::Char(_) | Key::Other => KeyOutcome::ignored(),
        }
    }
}
