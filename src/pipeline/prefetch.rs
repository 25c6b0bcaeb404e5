// file: src/pipeline/prefetch.rs
// description: warms the document cache for every markdown file of a repository
// reference: bounded concurrent fetching over a flattened repository tree

use crate::error::Result;
use crate::pipeline::progress::{PrefetchStats, ProgressTracker};
use crate::resolver::ContentResolver;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

pub const DEFAULT_CONCURRENCY: usize = 4;

pub struct Prefetcher {
    resolver: Arc<ContentResolver>,
    max_concurrent_tasks: usize,
    show_progress: bool,
}

impl Prefetcher {
    pub fn new(resolver: Arc<ContentResolver>) -> Self {
        Self {
            resolver,
            max_concurrent_tasks: DEFAULT_CONCURRENCY,
            show_progress: true,
        }
    }

    pub fn with_concurrency(mut self, max_concurrent_tasks: usize) -> Self {
        self.max_concurrent_tasks = max_concurrent_tasks.max(1);
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    /// Fetches every document once, filling the cache. Individual failures
    /// are counted, only a failure to list the repository is an error.
    pub async fn run(&self, repo_id: &str, force_refresh: bool) -> Result<PrefetchStats> {
        let files = self.resolver.flatten_tree(repo_id).await?;
        info!("Found {} documents to prefetch in {}", files.len(), repo_id);

        if files.is_empty() {
            warn!("No documents found in {}", repo_id);
            return Ok(PrefetchStats::new());
        }

        let progress = Arc::new(if self.show_progress {
            ProgressTracker::new(files.len())
        } else {
            ProgressTracker::hidden(files.len())
        });

        let tasks = files.into_iter().map(|file| {
            let resolver = self.resolver.clone();
            let progress = progress.clone();

            async move {
                progress.set_message(file.path.clone());
                match resolver
                    .fetch_markdown(&file.repository_id, &file.path, force_refresh)
                    .await
                {
                    Ok(body) => progress.inc_fetched(body.len() as u64),
                    Err(e) => {
                        progress.inc_failed();
                        warn!("Failed to prefetch {}: {}", file.path, e);
                    }
                }
            }
        });

        stream::iter(tasks)
            .buffer_unordered(self.max_concurrent_tasks)
            .collect::<Vec<()>>()
            .await;

        let stats = progress.get_stats();
        progress.finish();

        info!(
            "Prefetch of {} finished: {} cached, {} failed",
            repo_id, stats.documents_fetched, stats.documents_failed
        );
        Ok(stats)
    }
}
