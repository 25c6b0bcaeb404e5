// file: src/pipeline/mod.rs
// description: pipeline module exports and public api
// reference: document loading, search and cache prefetching

mod document;
mod prefetch;
mod progress;
mod search;

pub use document::{DocumentPipeline, LoadedDocument};
pub use prefetch::{DEFAULT_CONCURRENCY, Prefetcher};
pub use progress::{PrefetchStats, ProgressTracker};
pub use search::{DEFAULT_LIMIT, SearchIndex};
