// file: src/cache/store.rs
// description: versioned TTL cache over a pluggable key/value backend
// reference: browser local storage caching of GitHub API responses

use crate::cache::backend::{StorageBackend, StorageError};
use chrono::Utc;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

pub const CACHE_PREFIX: &str = "dochub_cache_";
pub const CACHE_VERSION: &str = "1.0";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    FileTree,
    Markdown,
}

impl CacheKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheKind::FileTree => "filetree",
            CacheKind::Markdown => "markdown",
        }
    }
}

impl fmt::Display for CacheKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry<T> {
    pub data: T,
    /// Creation time, unix milliseconds
    pub timestamp: i64,
    /// Lifetime in milliseconds
    pub ttl: u64,
    pub version: String,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            timestamp: Utc::now().timestamp_millis(),
            ttl: ttl.as_millis() as u64,
            version: CACHE_VERSION.to_string(),
        }
    }

    pub fn is_valid_at(&self, now_millis: i64) -> bool {
        self.version == CACHE_VERSION && now_millis - self.timestamp <= self.ttl as i64
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct CacheStats {
    pub count: usize,
    pub total_bytes: usize,
}

/// Advisory cache: reads never fail and writes never propagate errors.
#[derive(Clone)]
pub struct CacheStore {
    backend: Arc<dyn StorageBackend>,
}

impl fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore").finish_non_exhaustive()
    }
}

pub fn cache_key(kind: CacheKind, repo_id: &str, path: &str) -> String {
    format!("{}{}_{}_{}", CACHE_PREFIX, kind.as_str(), repo_id, path)
}

impl CacheStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    pub fn get<T: DeserializeOwned>(
        &self,
        kind: CacheKind,
        repo_id: &str,
        path: &str,
    ) -> Option<T> {
        let key = cache_key(kind, repo_id, path);
        let raw = self.backend.get_item(&key)?;

        let entry: CacheEntry<T> = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Discarding unreadable cache entry {}: {}", key, e);
                self.backend.remove_item(&key);
                return None;
            }
        };

        if entry.version != CACHE_VERSION {
            debug!("Cache entry {} has stale version {}", key, entry.version);
            self.backend.remove_item(&key);
            return None;
        }

        if !entry.is_valid_at(Utc::now().timestamp_millis()) {
            debug!("Cache entry {} expired", key);
            self.backend.remove_item(&key);
            return None;
        }

        Some(entry.data)
    }

    pub fn set<T: Serialize + ?Sized>(
        &self,
        kind: CacheKind,
        repo_id: &str,
        data: &T,
        ttl: Duration,
        path: &str,
    ) {
        let key = cache_key(kind, repo_id, path);
        let serialized = match serde_json::to_string(&CacheEntry::new(data, ttl)) {
            Ok(serialized) => serialized,
            Err(e) => {
                error!("Error serializing cache entry {}: {}", key, e);
                return;
            }
        };

        match self.backend.set_item(&key, &serialized) {
            Ok(()) => {}
            Err(StorageError::QuotaExceeded { .. }) => {
                warn!("Cache storage quota exceeded, clearing old entries");
                let removed = self.sweep();
                debug!("Sweep removed {} invalid cache entries", removed);

                if let Err(e) = self.backend.set_item(&key, &serialized) {
                    error!("Failed to cache after cleanup: {}", e);
                }
            }
            Err(e) => error!("Error writing to cache: {}", e),
        }
    }

    /// Removes every owned entry that is expired, version-mismatched or
    /// unreadable. Returns the number of entries removed.
    pub fn sweep(&self) -> usize {
        let now = Utc::now().timestamp_millis();
        let mut removed = 0;

        for key in self.owned_keys() {
            let Some(raw) = self.backend.get_item(&key) else {
                continue;
            };

            let keep = serde_json::from_str::<CacheEntry<IgnoredAny>>(&raw)
                .map(|entry| entry.is_valid_at(now))
                .unwrap_or(false);

            if !keep {
                self.backend.remove_item(&key);
                removed += 1;
            }
        }

        removed
    }

    /// Removes every entry of one repository, across resource kinds.
    pub fn clear(&self, repo_id: &str) {
        let repo_prefix = format!("{}_", repo_id);

        for key in self.owned_keys() {
            let rest = &key[CACHE_PREFIX.len()..];
            let belongs = [CacheKind::FileTree, CacheKind::Markdown]
                .iter()
                .filter_map(|kind| rest.strip_prefix(kind.as_str())?.strip_prefix('_'))
                .any(|tail| tail.starts_with(&repo_prefix));

            if belongs {
                self.backend.remove_item(&key);
            }
        }
    }

    pub fn clear_all(&self) {
        for key in self.owned_keys() {
            self.backend.remove_item(&key);
        }
    }

    pub fn stats(&self) -> CacheStats {
        self.owned_keys()
            .iter()
            .fold(CacheStats::default(), |mut stats, key| {
                if let Some(raw) = self.backend.get_item(key) {
                    stats.count += 1;
                    stats.total_bytes += raw.len();
                }
                stats
            })
    }

    fn owned_keys(&self) -> Vec<String> {
        self.backend
            .keys()
            .into_iter()
            .filter(|key| key.starts_with(CACHE_PREFIX))
            .collect()
    }
}
