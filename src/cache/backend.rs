// file: src/cache/backend.rs
// description: key/value storage backends behind the cache store
// reference: persisted metadata store pattern (json file in a directory)

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    #[error("storage quota exceeded ({used} of {quota} bytes)")]
    QuotaExceeded { used: usize, quota: usize },

    #[error("storage write failed: {0}")]
    Write(String),
}

/// A flat string namespace shared by every cache consumer, in the manner of
/// browser local storage. Implementations must be safe to share.
pub trait StorageBackend: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove_item(&self, key: &str);
    fn keys(&self) -> Vec<String>;
}

fn used_bytes(items: &BTreeMap<String, String>) -> usize {
    items.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn check_quota(
    items: &BTreeMap<String, String>,
    key: &str,
    value: &str,
    quota: Option<usize>,
) -> Result<(), StorageError> {
    let Some(quota) = quota else {
        return Ok(());
    };

    let replaced = items.get(key).map(|v| key.len() + v.len()).unwrap_or(0);
    let used = used_bytes(items) - replaced + key.len() + value.len();
    if used > quota {
        return Err(StorageError::QuotaExceeded { used, quota });
    }
    Ok(())
}

fn lock(items: &Mutex<BTreeMap<String, String>>) -> MutexGuard<'_, BTreeMap<String, String>> {
    items.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-process storage, optionally bounded by a byte quota.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota_bytes: usize) -> Self {
        Self {
            items: Mutex::new(BTreeMap::new()),
            quota_bytes: Some(quota_bytes),
        }
    }

    pub fn len(&self) -> usize {
        lock(&self.items).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.items).is_empty()
    }
}

impl StorageBackend for MemoryBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        check_quota(&items, key, value, self.quota_bytes)?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        lock(&self.items).remove(key);
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }
}

/// Storage persisted as a single JSON object in `<directory>/cache.json`.
/// The whole map is rewritten after every change.
#[derive(Debug)]
pub struct FileBackend {
    storage_path: PathBuf,
    items: Mutex<BTreeMap<String, String>>,
    quota_bytes: Option<usize>,
}

impl FileBackend {
    pub fn open(directory: &Path, quota_bytes: Option<usize>) -> std::io::Result<Self> {
        fs::create_dir_all(directory)?;
        let storage_path = directory.join("cache.json");

        let items = if storage_path.exists() {
            let contents = fs::read_to_string(&storage_path)?;
            match serde_json::from_str(&contents) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Failed to parse cache file, starting fresh: {}", e);
                    BTreeMap::new()
                }
            }
        } else {
            debug!("No existing cache file found at {:?}", storage_path);
            BTreeMap::new()
        };

        info!("Loaded {} cache entries from {:?}", items.len(), storage_path);

        Ok(Self {
            storage_path,
            items: Mutex::new(items),
            quota_bytes,
        })
    }

    pub fn storage_path(&self) -> &Path {
        &self.storage_path
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> Result<(), StorageError> {
        let contents =
            serde_json::to_string(items).map_err(|e| StorageError::Write(e.to_string()))?;
        fs::write(&self.storage_path, contents).map_err(|e| StorageError::Write(e.to_string()))
    }
}

impl StorageBackend for FileBackend {
    fn get_item(&self, key: &str) -> Option<String> {
        lock(&self.items).get(key).cloned()
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut items = lock(&self.items);
        check_quota(&items, key, value, self.quota_bytes)?;

        let previous = items.insert(key.to_string(), value.to_string());
        if let Err(e) = self.persist(&items) {
            // memory never holds what the file does not
            match previous {
                Some(previous) => items.insert(key.to_string(), previous),
                None => items.remove(key),
            };
            return Err(e);
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) {
        let mut items = lock(&self.items);
        if items.remove(key).is_some()
            && let Err(e) = self.persist(&items)
        {
            warn!("Failed to persist cache removal of {}: {}", key, e);
        }
    }

    fn keys(&self) -> Vec<String> {
        lock(&self.items).keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_quota() {
        let backend = MemoryBackend::with_quota(10);
        assert!(backend.set_item("a", "1234").is_ok());
        assert!(matches!(
            backend.set_item("b", "123456789"),
            Err(StorageError::QuotaExceeded { .. })
        ));
        // overwriting an existing key only counts the difference
        assert!(backend.set_item("a", "12345678").is_ok());
    }

    #[test]
    fn test_file_backend_persistence() {
        let dir = tempdir().unwrap();

        {
            let backend = FileBackend::open(dir.path(), None).unwrap();
            backend.set_item("dochub_cache_markdown_dsa_a.md", "{}").unwrap();
            backend.set_item("other", "x").unwrap();
            backend.remove_item("other");
        }

        let backend = FileBackend::open(dir.path(), None).unwrap();
        assert_eq!(backend.keys(), vec!["dochub_cache_markdown_dsa_a.md".to_string()]);
        assert_eq!(
            backend.get_item("dochub_cache_markdown_dsa_a.md").as_deref(),
            Some("{}")
        );
    }

    #[test]
    fn test_failed_write_is_rolled_back() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path(), None).unwrap();
        backend.set_item("kept", "1").unwrap();

        // a directory in place of the cache file makes every write fail
        fs::remove_file(backend.storage_path()).unwrap();
        fs::create_dir(backend.storage_path()).unwrap();

        assert!(matches!(
            backend.set_item("lost", "2"),
            Err(StorageError::Write(_))
        ));
        assert!(matches!(
            backend.set_item("kept", "3"),
            Err(StorageError::Write(_))
        ));
        assert_eq!(backend.get_item("lost"), None);
        assert_eq!(backend.get_item("kept").as_deref(), Some("1"));
        assert_eq!(backend.keys(), vec!["kept".to_string()]);
    }

    #[test]
    fn test_file_backend_recovers_from_corrupt_file() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("cache.json"), "not json").unwrap();

        let backend = FileBackend::open(dir.path(), None).unwrap();
        assert!(backend.keys().is_empty());
    }
}
