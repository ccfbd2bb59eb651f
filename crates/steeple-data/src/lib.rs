//! Data acquisition for the Steeple quick search.
//!
//! Fetches the church, county and affiliation collections from the
//! directory's read API and keeps an expiring JSON snapshot of them in durable
//! storage so warm starts never wait on the network.
use once_cell::sync::Lazy;
use std::path::{Path, PathBuf};
use tracing::debug;

pub mod cache;
pub mod fetch;
pub mod loader;
pub mod model;

pub const CACHE_DIR_DEFAULT: &str = "./steeple_cache";
pub const CACHE_DIR_ENV: &str = "STEEPLE_CACHE_DIR";

/// Cache directory used by [`cache::FileStorage::in_default_dir`].
///
/// Resolution order: `$STEEPLE_CACHE_DIR`, the platform cache directory
/// (with the `system-dirs` feature), then `./steeple_cache`.
pub static CACHE_DIR: Lazy<PathBuf> = Lazy::new(|| {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        return PathBuf::from(dir);
    }

    #[cfg(feature = "system-dirs")]
    if let Some(dirs) = directories::ProjectDirs::from("org", "steeple", "steeple") {
        let dir = dirs.cache_dir().join("search");
        debug!(dir = ?dir, "Using platform cache directory");
        return dir;
    }

    debug!("Falling back to local cache directory");
    PathBuf::from(CACHE_DIR_DEFAULT)
});

pub fn get_cache_dir() -> &'static Path {
    CACHE_DIR.as_path()
}

mod error {
    use thiserror::Error;

    use crate::cache::StorageError;

    #[derive(Error, Debug)]
    pub enum DataError {
        #[error("IO error: {0}")]
        Io(#[from] std::io::Error),
        #[cfg(feature = "download_data")]
        #[error("HTTP error: {0}")]
        Http(#[from] reqwest::Error),
        #[error("Serialization error: {0}")]
        Serde(#[from] serde_json::Error),
        #[error("Storage error: {0}")]
        Storage(#[from] StorageError),
        #[error("Collection source unavailable: {0}")]
        SourceUnavailable(String),
        #[error("Configuration error: {0}")]
        Config(String),
    }

    pub type Result<T> = std::result::Result<T, DataError>;
}

pub use error::{DataError, Result};

// Re-export main types
pub use cache::{
    CacheConfig, CacheEntry, CacheStorage, CachedSnapshot, EntityCache, FileStorage,
    MemoryStorage, StorageError,
};
#[cfg(feature = "download_data")]
pub use fetch::{HttpSource, HttpSourceConfig};
pub use fetch::CollectionSource;
pub use loader::{CacheLookup, DataLoader};
pub use model::{
    Affiliation, Church, CollectionKind, Collections, County, EntityKind, SearchableItem,
    ViewerRole, VisibilityStatus,
};
