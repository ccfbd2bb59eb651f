//! Async shell around [`QuickSearch`].
//!
//! One task owns the session and multiplexes three sources: UI events from
//! the host, collections arriving from spawned fetches, and the session's
//! next timer deadline. Fetches are the only work that leaves the task and
//! closing the surface never cancels them.

use std::{sync::Arc, time::Instant};

use chrono::Utc;
use steeple_data::{
    CacheLookup, CacheStorage, CollectionSource, Collections, DataLoader,
};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, instrument, warn};

use crate::{
    config::SearchConfig,
    render::ViewModel,
    session::{Effect, KeyEvent, QuickSearch},
};

/// Carries out navigation on the host's behalf.
pub trait Navigator: Send {
    fn navigate(&mut self, path: &str);

    fn resource_hint(&mut self, path: &str);
}

/// Input from the page hosting the search surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Key(KeyEvent),
    Open,
    Input(String),
    Hover(usize),
    PointerLeave,
    Close,
    Shutdown,
}

#[derive(Debug)]
enum DataEvent {
    Arrived(Collections),
    Failed,
}

pub struct SearchRuntime<S, St, N> {
    search: QuickSearch,
    loader: Arc<DataLoader<S, St>>,
    navigator: N,
    data_tx: mpsc::Sender<DataEvent>,
    data_rx: mpsc::Receiver<DataEvent>,
    views: watch::Sender<ViewModel>,
}

impl<S, St, N> SearchRuntime<S, St, N>
where
    S: CollectionSource + 'static,
    St: CacheStorage + 'static,
    N: Navigator,
{
    pub fn new(config: SearchConfig, loader: Arc<DataLoader<S, St>>, navigator: N) -> Self {
        let search = QuickSearch::new(config);
        let (data_tx, data_rx) = mpsc::channel(4);
        let (views, _) = watch::channel(search.view());
        Self {
            search,
            loader,
            navigator,
            data_tx,
            data_rx,
            views,
        }
    }

    /// Latest rendered view, updated after every event.
    pub fn subscribe(&self) -> watch::Receiver<ViewModel> {
        self.views.subscribe()
    }

    pub fn search(&self) -> &QuickSearch {
        &self.search
    }

    /// Drives the session until [`UiEvent::Shutdown`] or the sender is
    /// dropped, then hands the session back.
    #[instrument(name = "Quick search runtime", skip_all, level = "info")]
    pub async fn run(mut self, mut events: mpsc::Receiver<UiEvent>) -> QuickSearch {
        info!("Quick search runtime started");
        loop {
            let deadline = self.search.next_deadline();
            tokio::select! {
                event = events.recv() => match event {
                    Some(UiEvent::Shutdown) | None => break,
                    Some(event) => self.handle_event(event),
                },
                Some(data) = self.data_rx.recv() => self.handle_data(data),
                () = sleep_until(deadline) => {
                    let effects = self.search.tick(now());
                    self.apply(effects);
                }
            }
            self.views.send_replace(self.search.view());
        }
        info!("Quick search runtime stopped");
        self.search
    }

    fn handle_event(&mut self, event: UiEvent) {
        let now = now();
        let effects = match event {
            UiEvent::Key(key) => self.search.handle_key(&key, now).effects,
            UiEvent::Open => self.search.open(now),
            UiEvent::Input(query) => {
                self.search.type_query(&query, now);
                Vec::new()
            }
            UiEvent::Hover(index) => {
                self.search.hover(index, now);
                Vec::new()
            }
            UiEvent::PointerLeave => {
                self.search.pointer_leave();
                Vec::new()
            }
            UiEvent::Close => {
                self.search.close();
                Vec::new()
            }
            UiEvent::Shutdown => Vec::new(),
        };
        self.apply(effects);
    }

    fn handle_data(&mut self, data: DataEvent) {
        match data {
            DataEvent::Arrived(collections) => self.search.data_arrived(&collections, now()),
            DataEvent::Failed => self.search.data_failed(),
        }
    }

    fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::LoadData => self.load(),
                Effect::Navigate(path) => self.navigator.navigate(&path),
                Effect::ResourceHint(path) => self.navigator.resource_hint(&path),
            }
        }
    }

    /// Answers a load request from the cache, fetching in the background when
    /// the cached snapshot is stale or missing.
    ///
    /// The session emits at most one [`Effect::LoadData`] until it is
    /// answered, so every path here ends in exactly one answer.
    fn load(&mut self) {
        let now = now();
        match self.loader.lookup(Utc::now()) {
            CacheLookup::Fresh(_) if self.search.state().data_ready => {
                debug!("Cached collections still fresh");
                self.search.data_still_fresh();
            }
            CacheLookup::Fresh(collections) => self.search.data_arrived(&collections, now),
            CacheLookup::Stale(collections) => {
                self.search.stale_data_served(&collections, now);
                self.spawn_fetch();
            }
            CacheLookup::Miss => self.spawn_fetch(),
        }
    }

    fn spawn_fetch(&self) {
        debug!("Spawning collection fetch");
        let loader = Arc::clone(&self.loader);
        let tx = self.data_tx.clone();
        tokio::spawn(async move {
            let event = match loader.fetch().await {
                Ok(collections) => DataEvent::Arrived(collections),
                Err(e) => {
                    warn!(error = %e, "Collections unavailable");
                    DataEvent::Failed
                }
            };
            // The runtime may have shut down; the cache is written either way.
            let _ = tx.send(event).await;
        });
    }
}

#[cfg(feature = "download_data")]
impl<N: Navigator> SearchRuntime<steeple_data::HttpSource, steeple_data::FileStorage, N> {
    /// Runtime backed by the directory's read API and the default cache directory.
    pub fn from_http(
        base_url: &str,
        config: SearchConfig,
        navigator: N,
    ) -> crate::error::Result<Self> {
        let storage =
            steeple_data::FileStorage::in_default_dir().map_err(steeple_data::DataError::from)?;
        let source = steeple_data::HttpSource::new(base_url);
        let loader = DataLoader::new(source, storage, steeple_data::CacheConfig::default());
        Ok(Self::new(config, Arc::new(loader), navigator))
    }
}

fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(tokio::time::Instant::from_std(at)).await,
        None => std::future::pending().await,
    }
}
