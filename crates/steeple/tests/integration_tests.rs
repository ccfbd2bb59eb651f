//! Integration tests for the Steeple quick search
//!
//! These run against the public API only: the match engine, the session
//! state machine, the data loader and the async runtime driving all three.

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::{Duration, Instant},
};

use chrono::{TimeDelta, Utc};
use steeple::{
    Church, Collections, Effect, EntityKind, Key, KeyEvent, MatchParams, Navigator,
    QuickSearch, SearchConfig, SearchConfigBuilder, SearchIndex, SearchRuntime, UiEvent,
    ViewStatus, ViewerRole, VisibilityStatus,
    data::{
        Affiliation, CacheConfig, CacheLookup, CollectionSource, County, DataError, DataLoader,
        MemoryStorage,
    },
    match_query,
};
use tokio::sync::mpsc;

const FIXTURE: &str = r#"{
  "churches": [
    {"id": 1, "name": "Grace Community Church", "urlSlug": "grace-community",
     "websiteUrl": "https://www.gracecc.org/", "visibilityStatus": "listed"},
    {"id": 2, "name": "Community Church", "urlSlug": "community-church",
     "visibilityStatus": "listed"},
    {"id": 3, "name": "First Baptist Church of Austin", "urlSlug": "fbc-austin",
     "address": "901 Trinity St", "visibilityStatus": "listed"},
    {"id": 4, "name": "Harvest Fellowship", "urlSlug": "harvest-fellowship",
     "visibilityStatus": "heretical"},
    {"id": 5, "name": "Hope Chapel", "urlSlug": "hope-chapel", "visibilityStatus": "unlisted"},
    {"id": 6, "name": "   ", "urlSlug": "nameless", "visibilityStatus": "listed"},
    {"id": 7, "urlSlug": "no-name-at-all", "visibilityStatus": "something-new"}
  ],
  "counties": [
    {"id": 10, "name": "Travis County", "urlSlug": "travis"},
    {"id": 11, "name": "Hays County", "urlSlug": "hays", "description": "Hill Country"}
  ],
  "affiliations": [
    {"id": 20, "name": "Presbyterian Church in America", "urlSlug": "pca"},
    {"id": 21, "name": "Southern Baptist Convention"}
  ]
}"#;

fn setup_test_env() {
    let _ = steeple::init_logging(tracing::Level::WARN);
}

fn fixture() -> Collections {
    serde_json::from_str(FIXTURE).expect("fixture parses")
}

fn search_as(role: ViewerRole, query: &str) -> Vec<steeple::RankedResult> {
    match_query(
        query,
        &SearchIndex::build(&fixture()),
        role,
        &MatchParams::default(),
    )
}

fn ready_session(config: SearchConfig, now: Instant) -> QuickSearch {
    let mut search = QuickSearch::new(config);
    search.data_arrived(&fixture(), now);
    search.open(now);
    search
}

#[test]
fn test_fixture_indexing() {
    setup_test_env();
    let index = SearchIndex::build(&fixture());
    // Two blank-named churches are dropped.
    assert_eq!(index.len(), 9);
    assert!(index.items().all(|item| !item.name().trim().is_empty()));
}

#[test]
fn test_acronym_matches_and_near_misses() {
    setup_test_env();

    let results = search_as(ViewerRole::None, "gcc");
    assert!(results[0].exact_match);
    assert_eq!(results[0].item.id(), 1);

    let results = search_as(ViewerRole::None, "gcx");
    assert!(results.iter().all(|r| !r.exact_match));

    let results = search_as(ViewerRole::None, "fbc austin");
    assert_eq!(results[0].item.id(), 3);
    assert!(results[0].exact_match);
}

#[test]
fn test_typo_falls_back_to_fuzzy() {
    setup_test_env();
    let results = search_as(ViewerRole::None, "Comunity");
    let hit = results
        .iter()
        .find(|r| r.item.id() == 2 && r.item.kind() == EntityKind::Church)
        .expect("Community Church found by fuzzy pass");
    assert!(!hit.exact_match);
    assert!(hit.score.is_some_and(|s| s > 0.0 && s <= 1.0));
}

#[test]
fn test_exact_results_always_precede_fuzzy() {
    setup_test_env();
    for query in ["grace", "comunity", "church", "hope", "bapt", "county", "prebyterian"] {
        let results = search_as(ViewerRole::Admin, query);
        let first_fuzzy = results
            .iter()
            .position(|r| !r.exact_match)
            .unwrap_or(results.len());
        assert!(
            results[first_fuzzy..].iter().all(|r| !r.exact_match),
            "exact after fuzzy for {query:?}"
        );
        assert!(
            results[..first_fuzzy].iter().all(|r| r.score.is_none()),
            "exact results carry no score for {query:?}"
        );
        assert!(results[first_fuzzy..].iter().all(|r| {
            r.score.is_some_and(|s| (0.5..=1.0).contains(&s))
        }));
    }
}

#[test]
fn test_result_caps() {
    setup_test_env();
    let collections = Collections {
        churches: (0..20)
            .map(|id| Church {
                id,
                name: format!("Riverside Church {id}"),
                url_slug: format!("riverside-{id}"),
                address: None,
                website_url: None,
                visibility_status: VisibilityStatus::Listed,
            })
            .collect(),
        counties: (0..6)
            .map(|id| County {
                id,
                name: format!("Riverside County {id}"),
                url_slug: format!("riverside-county-{id}"),
                description: None,
            })
            .collect(),
        affiliations: (0..5)
            .map(|id| Affiliation {
                id,
                name: format!("Riverside Network {id}"),
                url_slug: None,
                notes: None,
            })
            .collect(),
    };
    let index = SearchIndex::build(&collections);

    let results = match_query("riverside", &index, ViewerRole::None, &MatchParams::default());
    assert_eq!(results.len(), 10);
    let count = |kind| results.iter().filter(|r| r.item.kind() == kind).count();
    assert_eq!(count(EntityKind::Church), 5);
    assert_eq!(count(EntityKind::County), 3);
    assert_eq!(count(EntityKind::Affiliation), 2);

    // A transposition misses every exact test; the fuzzy pass fills the list.
    let results = match_query("rivreside", &index, ViewerRole::None, &MatchParams::default());
    assert_eq!(results.len(), 10);
    assert!(results.iter().all(|r| !r.exact_match));

    let tight = SearchConfigBuilder::new().max_results(4).build();
    let results = match_query("riverside", &index, ViewerRole::None, &tight.matching);
    assert_eq!(results.len(), 4);
}

#[test]
fn test_restricted_listings_hidden_from_unprivileged_viewers() {
    setup_test_env();
    for role in [ViewerRole::None, ViewerRole::Contributor] {
        for query in ["harvest", "harvst fellowship", "harvest-fellowship"] {
            assert!(
                search_as(role, query).iter().all(|r| r.item.id() != 4
                    || r.item.kind() != EntityKind::Church),
                "{role:?} saw a restricted listing for {query:?}"
            );
        }
    }
    assert!(
        search_as(ViewerRole::Admin, "harvest")
            .iter()
            .any(|r| r.item.id() == 4)
    );
}

#[test]
fn test_unlisted_churches_are_searchable_but_rank_last() {
    setup_test_env();
    let churches: Vec<_> = search_as(ViewerRole::None, "ch")
        .into_iter()
        .filter(|r| r.item.kind() == EntityKind::Church)
        .map(|r| r.item.id())
        .collect();
    assert_eq!(churches, vec![2, 3, 1, 5]);
}

#[test]
fn test_selection_stays_in_bounds() {
    setup_test_env();
    let now = Instant::now();
    let mut search = ready_session(SearchConfig::default(), now);
    search.type_query("church", now);
    let len = search.state().results.len();
    assert!(len > 1);

    for delta in [1, 1, -3, -1, 5, 20, -1, 2, -40, 1] {
        search.move_selection(delta, now);
        if let Some(i) = search.state().selected_index {
            assert!(i < len);
        }
    }
    search.move_selection(-100, now);
    assert_eq!(search.state().selected_index, None);
    search.move_selection(100, now);
    assert_eq!(search.state().selected_index, Some(len - 1));
}

#[test]
fn test_pending_query_replay_matches_direct_typing() {
    setup_test_env();
    let now = Instant::now();
    for query in ["gcc", "comunity", "travis", "pca", "zzzz"] {
        let mut early = QuickSearch::new(SearchConfig::default());
        assert_eq!(early.open(now), vec![Effect::LoadData]);
        early.type_query(query, now);
        assert_eq!(early.view().status, ViewStatus::NotReady);
        early.data_arrived(&fixture(), now);

        let mut late = ready_session(SearchConfig::default(), now);
        late.type_query(query, now);

        assert_eq!(early.state().results, late.state().results, "{query}");
        assert_eq!(early.state().selected_index, late.state().selected_index);
        assert_eq!(early.state().pending_query, None);
    }
}

#[test]
fn test_prefetch_hints_each_path_once() {
    setup_test_env();
    let t0 = Instant::now();
    let mut search = ready_session(SearchConfig::default(), t0);
    search.type_query("travis", t0);

    let mut hints = Vec::new();
    let mut now = t0;
    for _ in 0..3 {
        search.hover(0, now);
        search.move_selection(0, now);
        now += Duration::from_millis(200);
        hints.extend(search.tick(now));
    }
    assert_eq!(
        hints,
        vec![Effect::ResourceHint("/regions/travis".to_string())]
    );

    // Closing forgets what was hinted.
    search.close();
    search.open(now);
    search.type_query("travis", now);
    now += Duration::from_millis(200);
    assert_eq!(search.tick(now).len(), 1);
}

#[test]
fn test_pointer_leave_cancels_hover_hint() {
    setup_test_env();
    let t0 = Instant::now();
    let config = SearchConfigBuilder::new()
        .prefetch_debounce(Duration::from_secs(60), Duration::from_millis(65))
        .build();
    let mut search = ready_session(config, t0);
    search.type_query("hays", t0);
    search.hover(0, t0);
    search.pointer_leave();
    assert!(search.tick(t0 + Duration::from_millis(100)).is_empty());
}

#[test]
fn test_shortcut_ignored_while_typing_elsewhere() {
    setup_test_env();
    let now = Instant::now();
    let config = SearchConfigBuilder::new()
        .shortcut_key('k')
        .expect("valid key")
        .build();
    let mut search = QuickSearch::new(config);

    let in_textarea = KeyEvent::new(Key::Char('k')).with_focus(steeple::FocusTarget::TextArea);
    assert!(!search.handle_key(&in_textarea, now).consumed);
    assert!(!search.handle_key(&KeyEvent::new(Key::Char('/')), now).consumed);

    let outcome = search.handle_key(&KeyEvent::new(Key::Char('k')), now);
    assert!(outcome.consumed);
    assert_eq!(outcome.effects, vec![Effect::LoadData]);
}

/// Serves the fixture, or fails, and counts endpoint hits.
#[derive(Clone)]
struct FixtureSource {
    collections: Collections,
    fail: bool,
    calls: Arc<AtomicUsize>,
}

impl FixtureSource {
    fn new(collections: Collections) -> Self {
        Self {
            collections,
            fail: false,
            calls: Arc::default(),
        }
    }

    fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Collections::default())
        }
    }

    fn respond<T: Clone>(&self, items: &[T]) -> steeple::data::Result<Vec<T>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataError::SourceUnavailable("connection refused".to_string()));
        }
        Ok(items.to_vec())
    }
}

impl CollectionSource for FixtureSource {
    async fn fetch_churches(&self) -> steeple::data::Result<Vec<Church>> {
        self.respond(&self.collections.churches)
    }

    async fn fetch_counties(&self) -> steeple::data::Result<Vec<County>> {
        self.respond(&self.collections.counties)
    }

    async fn fetch_affiliations(&self) -> steeple::data::Result<Vec<Affiliation>> {
        self.respond(&self.collections.affiliations)
    }
}

#[derive(Clone, Default)]
struct RecordingNavigator {
    log: Arc<Mutex<Vec<String>>>,
}

impl RecordingNavigator {
    fn entries(&self) -> Vec<String> {
        self.log.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&mut self, path: &str) {
        self.log.lock().unwrap().push(format!("navigate {path}"));
    }

    fn resource_hint(&mut self, path: &str) {
        self.log.lock().unwrap().push(format!("hint {path}"));
    }
}

#[tokio::test]
async fn test_expired_cache_forces_fetch() {
    setup_test_env();
    let storage = Arc::new(MemoryStorage::new());
    let source = FixtureSource::new(fixture());
    let calls = Arc::clone(&source.calls);
    let loader = DataLoader::new(source, Arc::clone(&storage), CacheConfig::default());

    assert!(loader.cache().store(&fixture(), Utc::now() - TimeDelta::hours(2)));
    // Entries are still stored, just no longer valid.
    assert_eq!(storage.len(), 3);
    assert_eq!(loader.lookup(Utc::now()), CacheLookup::Miss);

    let collections = loader.fetch().await.unwrap();
    assert_eq!(collections, fixture());
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(loader.lookup(Utc::now()), CacheLookup::Fresh(_)));
}

#[tokio::test(start_paused = true)]
async fn test_runtime_loads_replays_and_navigates() {
    setup_test_env();
    let source = FixtureSource::new(fixture());
    let calls = Arc::clone(&source.calls);
    let loader = Arc::new(DataLoader::new(
        source,
        MemoryStorage::new(),
        CacheConfig::default(),
    ));
    let navigator = RecordingNavigator::default();
    let runtime = SearchRuntime::new(SearchConfig::default(), loader, navigator.clone());
    let views = runtime.subscribe();

    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    tx.send(UiEvent::Key(KeyEvent::new(Key::Char('/')))).await.unwrap();
    tx.send(UiEvent::Input("gcc".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(views.borrow().status, ViewStatus::Results);
    assert_eq!(views.borrow().rows[0].path, "/entities/grace-community");

    tx.send(UiEvent::Key(KeyEvent::new(Key::Enter))).await.unwrap();
    tx.send(UiEvent::Shutdown).await.unwrap();
    let search = handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(!search.state().is_open);
    assert!(search.state().data_ready);
    assert_eq!(
        navigator.entries(),
        vec![
            "hint /entities/grace-community".to_string(),
            "navigate /entities/grace-community".to_string(),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_runtime_serves_stale_cache_and_refreshes() {
    setup_test_env();
    let mut fresh = fixture();
    fresh.counties.push(County {
        id: 12,
        name: "Williamson County".to_string(),
        url_slug: "williamson".to_string(),
        description: None,
    });
    let source = FixtureSource::new(fresh);
    let calls = Arc::clone(&source.calls);
    let loader = Arc::new(DataLoader::new(
        source,
        MemoryStorage::new(),
        CacheConfig::default(),
    ));
    loader
        .cache()
        .store(&fixture(), Utc::now() - TimeDelta::minutes(30));
    assert!(matches!(
        loader.lookup(Utc::now()),
        CacheLookup::Stale(_)
    ));

    let runtime = SearchRuntime::new(
        SearchConfig::default(),
        Arc::clone(&loader),
        RecordingNavigator::default(),
    );
    let views = runtime.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    tx.send(UiEvent::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Served from cache: no spinner, ready to search.
    assert_eq!(views.borrow().status, ViewStatus::Prompt);

    tx.send(UiEvent::Input("williamson".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(views.borrow().rows[0].title, "Williamson County");

    tx.send(UiEvent::Shutdown).await.unwrap();
    handle.await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(matches!(loader.lookup(Utc::now()), CacheLookup::Fresh(_)));
}

#[tokio::test(start_paused = true)]
async fn test_runtime_reopen_refreshes_stale_data() {
    setup_test_env();
    let source = FixtureSource::new(fixture());
    let calls = Arc::clone(&source.calls);
    // Everything cached goes stale the moment it is written.
    let cache_config = CacheConfig::new(TimeDelta::hours(1), TimeDelta::zero()).unwrap();
    let loader = Arc::new(DataLoader::new(source, MemoryStorage::new(), cache_config));
    let runtime = SearchRuntime::new(
        SearchConfig::default(),
        Arc::clone(&loader),
        RecordingNavigator::default(),
    );
    let views = runtime.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    tx.send(UiEvent::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(views.borrow().status, ViewStatus::Prompt);
    assert_eq!(calls.load(Ordering::SeqCst), 3);

    tx.send(UiEvent::Close).await.unwrap();
    tx.send(UiEvent::Open).await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    // Served from the stale cache right away, refreshed behind it.
    assert_eq!(views.borrow().status, ViewStatus::Prompt);
    assert_eq!(calls.load(Ordering::SeqCst), 6);

    tx.send(UiEvent::Shutdown).await.unwrap();
    let search = handle.await.unwrap();
    assert!(!search.fetch_in_flight());
}

#[tokio::test(start_paused = true)]
async fn test_runtime_reopen_with_fresh_cache_skips_fetch() {
    setup_test_env();
    let source = FixtureSource::new(fixture());
    let calls = Arc::clone(&source.calls);
    let loader = Arc::new(DataLoader::new(
        source,
        MemoryStorage::new(),
        CacheConfig::default(),
    ));
    let runtime = SearchRuntime::new(
        SearchConfig::default(),
        loader,
        RecordingNavigator::default(),
    );
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    for _ in 0..3 {
        tx.send(UiEvent::Open).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        tx.send(UiEvent::Close).await.unwrap();
    }
    tx.send(UiEvent::Shutdown).await.unwrap();
    let search = handle.await.unwrap();

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert!(search.state().data_ready);
    assert!(!search.fetch_in_flight());
}

#[tokio::test(start_paused = true)]
async fn test_runtime_failure_retries_on_next_open() {
    setup_test_env();
    let source = FixtureSource::failing();
    let calls = Arc::clone(&source.calls);
    let loader = Arc::new(DataLoader::new(
        source,
        MemoryStorage::new(),
        CacheConfig::default(),
    ));
    let runtime = SearchRuntime::new(
        SearchConfig::default(),
        loader,
        RecordingNavigator::default(),
    );
    let views = runtime.subscribe();
    let (tx, rx) = mpsc::channel(16);
    let handle = tokio::spawn(runtime.run(rx));

    tx.send(UiEvent::Open).await.unwrap();
    tx.send(UiEvent::Input("grace".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(views.borrow().status, ViewStatus::NotReady);
    let first_attempt = calls.load(Ordering::SeqCst);
    assert!(first_attempt > 0);

    // No retry loop: waiting longer fetches nothing.
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(calls.load(Ordering::SeqCst), first_attempt);

    tx.send(UiEvent::Close).await.unwrap();
    tx.send(UiEvent::Open).await.unwrap();
    tx.send(UiEvent::Shutdown).await.unwrap();
    let search = handle.await.unwrap();
    // The retry was spawned and outlives the runtime.
    tokio::time::sleep(Duration::from_millis(10)).await;

    assert!(calls.load(Ordering::SeqCst) > first_attempt);
    assert!(search.state().is_open);
    assert!(!search.state().data_ready);
}
