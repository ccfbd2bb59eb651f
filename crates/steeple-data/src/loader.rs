//! Cache-first loading of the three collections.
//!
//! [`DataLoader::lookup`] is synchronous and never touches the network; it is
//! what the session consults the moment the search surface opens.
//! [`DataLoader::fetch`] fans out to the three endpoints concurrently and
//! writes the result back to the cache. Deciding *when* to fetch (cache miss,
//! stale snapshot) is left to the caller so a stale snapshot can be served
//! immediately while a refresh runs in the background.

use chrono::{DateTime, Utc};
use tracing::{info, instrument, warn};

use crate::{
    Result,
    cache::{CacheConfig, CacheStorage, EntityCache},
    fetch::CollectionSource,
    model::Collections,
};

/// Outcome of a synchronous cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    /// Valid and inside the freshness window.
    Fresh(Collections),
    /// Valid but old; serve it and refresh in the background.
    Stale(Collections),
    /// Nothing usable cached; a fetch is required.
    Miss,
}

impl CacheLookup {
    pub fn collections(&self) -> Option<&Collections> {
        match self {
            Self::Fresh(c) | Self::Stale(c) => Some(c),
            Self::Miss => None,
        }
    }

    pub fn needs_fetch(&self) -> bool {
        !matches!(self, Self::Fresh(_))
    }
}

pub struct DataLoader<S, St> {
    source: S,
    cache: EntityCache<St>,
}

impl<S: CollectionSource, St: CacheStorage> DataLoader<S, St> {
    pub fn new(source: S, storage: St, config: CacheConfig) -> Self {
        Self {
            source,
            cache: EntityCache::new(storage, config),
        }
    }

    pub fn cache(&self) -> &EntityCache<St> {
        &self.cache
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    #[instrument(name = "Cache lookup", skip(self), level = "debug")]
    pub fn lookup(&self, now: DateTime<Utc>) -> CacheLookup {
        match self.cache.snapshot(now) {
            Some(snapshot) if snapshot.stale => {
                info!(expires_at = %snapshot.expires_at, "Serving stale cached collections");
                CacheLookup::Stale(snapshot.collections)
            }
            Some(snapshot) => CacheLookup::Fresh(snapshot.collections),
            None => CacheLookup::Miss,
        }
    }

    /// Fetches all three collections concurrently and caches them.
    ///
    /// Any single failure fails the whole fetch; nothing is written in that
    /// case. A cache write failure is not an error: the collections are still
    /// returned for in-memory use.
    #[instrument(name = "Fetch collections", skip_all, level = "info")]
    pub async fn fetch(&self) -> Result<Collections> {
        let t_fetch = std::time::Instant::now();

        let (churches, counties, affiliations) = tokio::try_join!(
            self.source.fetch_churches(),
            self.source.fetch_counties(),
            self.source.fetch_affiliations(),
        )
        .inspect_err(|e| warn!(error = %e, "Collection fetch failed"))?;

        let collections = Collections {
            churches,
            counties,
            affiliations,
        };
        info!(
            churches = collections.churches.len(),
            counties = collections.counties.len(),
            affiliations = collections.affiliations.len(),
            elapsed = ?t_fetch.elapsed(),
            "Fetched collections"
        );

        // Stamp expiry from completion time, not start time.
        self.cache.store(&collections, Utc::now());
        Ok(collections)
    }
}
