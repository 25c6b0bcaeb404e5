// file: src/cache/mod.rs
// description: cache module exports
// reference: internal module structure

pub mod backend;
pub mod store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend, StorageError};
pub use store::{CACHE_PREFIX, CACHE_VERSION, CacheEntry, CacheKind, CacheStats, CacheStore, cache_key};
