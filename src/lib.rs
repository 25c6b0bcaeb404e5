// file: src/lib.rs
// description: library entry point and public api exports
// reference: rust library patterns
#![doc = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/readme.md"))]

pub mod cache;
pub mod config;
pub mod error;
pub mod exporter;
pub mod models;
pub mod pipeline;
pub mod render;
pub mod repository;
pub mod resolver;
pub mod sanitizer;
pub mod snapshot;
pub mod utils;

pub use cache::{CacheKind, CacheStats, CacheStore, FileBackend, MemoryBackend, StorageBackend};
pub use config::{
    CacheConfig, Config, ExecutionMode, RendererConfig, RepositoryConfig, ResolverConfig,
    SnapshotLocation,
};
pub use error::{DocHubError, Result};
pub use exporter::{DocumentExporter, ExportFormat};
pub use models::{
    EmbedDescriptor, EmbedKind, FileTreeNode, FlatFile, NodeKind, RenderedDocument, SearchResult,
    Segment,
};
pub use pipeline::{DocumentPipeline, LoadedDocument, PrefetchStats, Prefetcher, SearchIndex};
pub use render::{MarkdownRenderer, TableOfContents, TocEntry};
pub use repository::RepositoryRegistry;
pub use resolver::{ContentResolver, HttpTransport, Transport};
pub use sanitizer::{SanitizePolicy, Sanitizer};
pub use snapshot::{SnapshotSource, TreeGenerator};
pub use utils::Validator;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let config = Config::default_config();
        assert!(config.validate().is_ok());
        let _renderer = MarkdownRenderer::new(&config.renderer);
        let _sanitizer = Sanitizer::new(SanitizePolicy::from_config(&config.renderer));
    }
}
