//! Durable key/value backends for the entity cache.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use ahash::AHashMap as HashMap;
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Storage quota exceeded: writing {requested} bytes would exceed the {capacity} byte capacity")]
    QuotaExceeded { requested: u64, capacity: u64 },
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded { .. })
    }
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// String key/value storage that survives between sessions.
///
/// Implementations use interior mutability so a single store can be shared
/// between the foreground session and a background refresh.
pub trait CacheStorage: Send + Sync {
    /// Returns `Ok(None)` when nothing is stored under `key`.
    fn read(&self, key: &str) -> StorageResult<Option<String>>;

    fn write(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Removing a missing key is not an error.
    fn remove(&self, key: &str) -> StorageResult<()>;
}

impl<T: CacheStorage + ?Sized> CacheStorage for std::sync::Arc<T> {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        (**self).read(key)
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        (**self).write(key, value)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        (**self).remove(key)
    }
}

fn check_capacity(capacity: Option<u64>, used: u64, requested: u64) -> StorageResult<()> {
    match capacity {
        Some(capacity) if used + requested > capacity => {
            Err(StorageError::QuotaExceeded { requested, capacity })
        }
        _ => Ok(()),
    }
}

/// One JSON file per key inside a cache directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    capacity_bytes: Option<u64>,
}

impl FileStorage {
    const EXTENSION: &'static str = "json";

    /// Opens (and creates if needed) a cache directory.
    pub fn new(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = ?dir, "Opened file cache storage");
        Ok(Self {
            dir,
            capacity_bytes: None,
        })
    }

    /// Opens the cache directory resolved by [`crate::get_cache_dir`].
    pub fn in_default_dir() -> StorageResult<Self> {
        Self::new(crate::get_cache_dir())
    }

    /// Caps the total size of all stored values.
    pub fn with_capacity(mut self, bytes: u64) -> Self {
        self.capacity_bytes = Some(bytes);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.{}", Self::EXTENSION))
    }

    fn used_bytes_excluding(&self, excluded: &Path) -> io::Result<u64> {
        let mut total = 0;
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path == excluded
                || path.extension().and_then(|ext| ext.to_str()) != Some(Self::EXTENSION)
            {
                continue;
            }
            total += fs::metadata(&path)?.len();
        }
        Ok(total)
    }
}

impl CacheStorage for FileStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let path = self.path_for(key);
        if self.capacity_bytes.is_some() {
            let used = self.used_bytes_excluding(&path)?;
            check_capacity(self.capacity_bytes, used, value.len() as u64)?;
        }
        fs::write(&path, value)?;
        trace!(path = ?path, bytes = value.len(), "Wrote cache file");
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
            _ => Ok(()),
        }
    }
}

/// In-process storage, handy for tests and for hosts without a writable disk.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
    capacity_bytes: Option<u64>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bytes: u64) -> Self {
        Self {
            entries: Mutex::default(),
            capacity_bytes: Some(bytes),
        }
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl CacheStorage for MemoryStorage {
    fn read(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let used: u64 = entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(_, v)| v.len() as u64)
            .sum();
        check_capacity(self.capacity_bytes, used, value.len() as u64)?;
        entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
