//! Expiring snapshot cache for the three entity collections.
//!
//! Each collection is stored under its own fixed key as a JSON
//! [`CacheEntry`]. Expiry is logical: an entry whose `expiresAt` has passed is
//! treated as absent but left in storage until it is overwritten. The only
//! physical deletion is [`EntityCache::purge`], used when a write runs out of
//! space, which drops all three keys together.

mod storage;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

pub use storage::{CacheStorage, FileStorage, MemoryStorage, StorageError, StorageResult};

use crate::{
    DataError, Result,
    model::{CollectionKind, Collections},
};

/// A cached value plus the instant after which it must be ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub value: T,
    pub expires_at: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    pub fn new(value: T, expires_at: DateTime<Utc>) -> Self {
        Self { value, expires_at }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Expiry and refresh windows for cached collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a fetched snapshot stays usable.
    pub ttl: TimeDelta,
    /// Snapshots older than this are still served but refreshed in the background.
    pub freshness: TimeDelta,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: TimeDelta::hours(1),
            freshness: TimeDelta::minutes(10),
        }
    }
}

impl CacheConfig {
    pub fn new(ttl: TimeDelta, freshness: TimeDelta) -> Result<Self> {
        if ttl <= TimeDelta::zero() {
            return Err(DataError::Config(format!(
                "cache ttl must be positive, got {ttl}"
            )));
        }
        if freshness < TimeDelta::zero() || freshness > ttl {
            return Err(DataError::Config(format!(
                "cache freshness window must lie within [0, {ttl}], got {freshness}"
            )));
        }
        Ok(Self { ttl, freshness })
    }
}

/// All three collections read back from cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedSnapshot {
    pub collections: Collections,
    /// Earliest expiry among the three entries.
    pub expires_at: DateTime<Utc>,
    /// Older than the freshness window, so a background refresh is due.
    pub stale: bool,
}

pub struct EntityCache<S> {
    storage: S,
    config: CacheConfig,
}

impl<S: CacheStorage> EntityCache<S> {
    pub fn new(storage: S, config: CacheConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Reads one collection. Missing, expired, unreadable and malformed
    /// entries all come back as `None`.
    pub fn get<T: DeserializeOwned>(
        &self,
        kind: CollectionKind,
        now: DateTime<Utc>,
    ) -> Option<CacheEntry<T>> {
        let raw = match self.storage.read(kind.cache_key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(collection = %kind, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(collection = %kind, error = %e, "Ignoring malformed cache entry");
                return None;
            }
        };

        if entry.is_expired(now) {
            debug!(collection = %kind, expires_at = %entry.expires_at, "Cache entry expired");
            return None;
        }
        Some(entry)
    }

    /// Writes one collection with a fresh expiry of `now + ttl`.
    pub fn put<T: Serialize>(
        &self,
        kind: CollectionKind,
        value: &T,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        let expires_at = now + self.config.ttl;
        let raw = serde_json::to_string(&CacheEntry::new(value, expires_at))?;
        self.storage.write(kind.cache_key(), &raw)?;
        Ok(expires_at)
    }

    /// Removes every key owned by the quick search.
    pub fn purge(&self) {
        for kind in CollectionKind::ALL {
            if let Err(e) = self.storage.remove(kind.cache_key()) {
                warn!(collection = %kind, error = %e, "Failed to purge cache entry");
            }
        }
    }

    /// Returns the cached collections only when all three entries are valid.
    pub fn snapshot(&self, now: DateTime<Utc>) -> Option<CachedSnapshot> {
        let churches = self.get(CollectionKind::Churches, now)?;
        let counties = self.get(CollectionKind::Counties, now)?;
        let affiliations = self.get(CollectionKind::Affiliations, now)?;

        let expires_at = churches
            .expires_at
            .min(counties.expires_at)
            .min(affiliations.expires_at);

        Some(CachedSnapshot {
            stale: self.is_stale(expires_at, now),
            expires_at,
            collections: Collections {
                churches: churches.value,
                counties: counties.value,
                affiliations: affiliations.value,
            },
        })
    }

    /// Persists a full snapshot. A failed write purges all three keys so the
    /// cache never holds a mix of old and new collections; the caller keeps
    /// using its in-memory copy. Returns whether the snapshot was persisted.
    pub fn store(&self, collections: &Collections, now: DateTime<Utc>) -> bool {
        let written = self
            .put(CollectionKind::Churches, &collections.churches, now)
            .and_then(|_| self.put(CollectionKind::Counties, &collections.counties, now))
            .and_then(|_| {
                self.put(CollectionKind::Affiliations, &collections.affiliations, now)
            });

        match written {
            Ok(expires_at) => {
                info!(%expires_at, items = collections.len(), "Cached collections");
                true
            }
            Err(e) => {
                warn!(error = %e, "Cache write failed, purging cached collections");
                self.purge();
                false
            }
        }
    }

    fn is_stale(&self, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let age = self.config.ttl - (expires_at - now);
        age > self.config.freshness
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Church, County, VisibilityStatus};
    use std::sync::Arc;

    fn sample() -> Collections {
        Collections {
            churches: vec![Church {
                id: 1,
                name: "Grace Community Church".to_string(),
                url_slug: "grace".to_string(),
                address: None,
                website_url: None,
                visibility_status: VisibilityStatus::Listed,
            }],
            counties: vec![County {
                id: 2,
                name: "Travis".to_string(),
                url_slug: "travis".to_string(),
                description: None,
            }],
            affiliations: vec![],
        }
    }

    fn t0() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-03-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_expired_entry_is_absent_but_still_stored() {
        let storage = Arc::new(MemoryStorage::new());
        let cache = EntityCache::new(storage.clone(), CacheConfig::default());
        assert!(cache.store(&sample(), t0()));

        assert!(cache.snapshot(t0() + TimeDelta::minutes(59)).is_some());
        assert!(cache.snapshot(t0() + TimeDelta::minutes(61)).is_none());
        // Logical deletion only.
        assert_eq!(storage.len(), 3);
    }

    #[test]
    fn test_entry_valid_exactly_at_expiry() {
        let cache = EntityCache::new(MemoryStorage::new(), CacheConfig::default());
        cache.put(CollectionKind::Counties, &vec![1, 2, 3], t0()).unwrap();
        let at_expiry = t0() + TimeDelta::hours(1);
        assert!(cache.get::<Vec<u32>>(CollectionKind::Counties, at_expiry).is_some());
        assert!(
            cache
                .get::<Vec<u32>>(CollectionKind::Counties, at_expiry + TimeDelta::seconds(1))
                .is_none()
        );
    }

    #[test]
    fn test_staleness_follows_freshness_window() {
        let cache = EntityCache::new(MemoryStorage::new(), CacheConfig::default());
        cache.store(&sample(), t0());

        let fresh = cache.snapshot(t0() + TimeDelta::minutes(5)).unwrap();
        assert!(!fresh.stale);
        let stale = cache.snapshot(t0() + TimeDelta::minutes(15)).unwrap();
        assert!(stale.stale);
        assert_eq!(stale.collections, sample());
    }

    #[test]
    fn test_malformed_entry_is_a_miss() {
        let storage = MemoryStorage::new();
        storage
            .write(CollectionKind::Churches.cache_key(), "{not json")
            .unwrap();
        let cache = EntityCache::new(storage, CacheConfig::default());
        assert!(cache.get::<Vec<Church>>(CollectionKind::Churches, t0()).is_none());
    }

    #[test]
    fn test_partial_snapshot_is_a_miss() {
        let cache = EntityCache::new(MemoryStorage::new(), CacheConfig::default());
        cache
            .put(CollectionKind::Churches, &sample().churches, t0())
            .unwrap();
        assert!(cache.snapshot(t0()).is_none());
    }

    #[test]
    fn test_quota_exceeded_purges_all_keys() {
        let storage = Arc::new(MemoryStorage::with_capacity(64));
        let cache = EntityCache::new(storage.clone(), CacheConfig::default());

        assert!(!cache.store(&sample(), t0()));
        assert!(storage.is_empty());
        assert!(cache.snapshot(t0()).is_none());
    }

    #[test]
    fn test_cache_config_validation() {
        assert!(CacheConfig::new(TimeDelta::hours(1), TimeDelta::minutes(5)).is_ok());
        assert!(CacheConfig::new(TimeDelta::zero(), TimeDelta::zero()).is_err());
        assert!(CacheConfig::new(TimeDelta::minutes(5), TimeDelta::hours(1)).is_err());
    }
}
