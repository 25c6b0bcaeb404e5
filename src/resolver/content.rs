// file: src/resolver/content.rs
// description: local snapshot -> cache -> remote resolution of documents and listings
// reference: https://docs.github.com/en/rest/using-the-rest-api/rate-limits-for-the-rest-api

use crate::cache::{CacheKind, CacheStore};
use crate::config::{Config, ExecutionMode, RepositoryConfig, ResolverConfig};
use crate::error::{DocHubError, Result};
use crate::models::file_tree::strip_base_path;
use crate::models::{FileTreeNode, FlatFile, parse_listing};
use crate::repository::RepositoryRegistry;
use crate::resolver::images::process_image_paths;
use crate::resolver::transport::{Transport, TransportError};
use crate::snapshot::SnapshotSource;
use crate::utils::validation::{Validator, file_display_name, is_markdown_file};
use async_trait::async_trait;
use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A resource the resolver can fetch: document bodies or directory listings.
#[async_trait]
trait Resource: Serialize + DeserializeOwned + Send + Sync + Sized {
    const KIND: CacheKind;

    async fn read_local(resolver: &ContentResolver, repo_id: &str, path: &str) -> Option<Self>;

    fn remote_url(resolver: &ContentResolver, repo: &RepositoryConfig, path: &str) -> String;

    fn decode_remote(body: String, repo: &RepositoryConfig) -> Result<Self>;
}

#[async_trait]
impl Resource for String {
    const KIND: CacheKind = CacheKind::Markdown;

    async fn read_local(resolver: &ContentResolver, repo_id: &str, path: &str) -> Option<Self> {
        resolver
            .snapshot
            .read_markdown(resolver.transport.as_ref(), repo_id, path, resolver.timeout)
            .await
    }

    fn remote_url(resolver: &ContentResolver, repo: &RepositoryConfig, path: &str) -> String {
        repo.raw_url(&resolver.config.raw_base_url, path)
    }

    fn decode_remote(body: String, _repo: &RepositoryConfig) -> Result<Self> {
        Ok(body)
    }
}

#[async_trait]
impl Resource for Vec<FileTreeNode> {
    const KIND: CacheKind = CacheKind::FileTree;

    async fn read_local(resolver: &ContentResolver, repo_id: &str, path: &str) -> Option<Self> {
        resolver
            .snapshot
            .read_tree(resolver.transport.as_ref(), repo_id, path, resolver.timeout)
            .await
    }

    fn remote_url(resolver: &ContentResolver, repo: &RepositoryConfig, path: &str) -> String {
        repo.contents_url(&resolver.config.api_base_url, path)
    }

    fn decode_remote(body: String, repo: &RepositoryConfig) -> Result<Self> {
        let mut nodes = parse_listing(&body)?;
        if let Some(base) = repo.base_segment() {
            strip_base_path(&mut nodes, base);
        }
        Ok(nodes)
    }
}

/// Request/response pipeline over the snapshot, the cache and the remote API.
/// Holds no per-request state.
pub struct ContentResolver {
    registry: RepositoryRegistry,
    cache: CacheStore,
    snapshot: SnapshotSource,
    transport: Arc<dyn Transport>,
    config: ResolverConfig,
    timeout: Duration,
    filetree_ttl: Duration,
    markdown_ttl: Duration,
}

impl ContentResolver {
    pub fn new(config: &Config, cache: CacheStore, transport: Arc<dyn Transport>) -> Self {
        Self {
            registry: RepositoryRegistry::new(config.repositories.clone()),
            cache,
            snapshot: SnapshotSource::from_location(config.resolver.snapshot.as_ref()),
            transport,
            config: config.resolver.clone(),
            timeout: config.resolver.timeout(),
            filetree_ttl: config.cache.filetree_ttl(),
            markdown_ttl: config.cache.markdown_ttl(),
        }
    }

    pub fn with_snapshot(mut self, snapshot: SnapshotSource) -> Self {
        self.snapshot = snapshot;
        self
    }

    pub fn registry(&self) -> &RepositoryRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    pub async fn fetch_markdown(
        &self,
        repo_id: &str,
        path: &str,
        force_refresh: bool,
    ) -> Result<String> {
        Validator::validate_document_path(path)?;
        self.resolve::<String>(repo_id, path, force_refresh).await
    }

    /// One directory level; `path` is empty for the repository root.
    pub async fn fetch_file_tree(
        &self,
        repo_id: &str,
        path: &str,
        force_refresh: bool,
    ) -> Result<Vec<FileTreeNode>> {
        Validator::validate_directory_path(path)?;
        let path = path.trim_matches('/');
        self.resolve::<Vec<FileTreeNode>>(repo_id, path, force_refresh)
            .await
    }

    /// Rewrites relative image references in a document fetched from `repo_id`.
    pub fn rewrite_image_paths(
        &self,
        repo_id: &str,
        document_path: &str,
        markdown: &str,
    ) -> Result<String> {
        let repo = self.registry.require(repo_id)?;
        Ok(process_image_paths(
            markdown,
            repo,
            &self.config.raw_base_url,
            document_path,
        ))
    }

    /// Every markdown file of a repository. Directories without nested
    /// listings are expanded one level at a time; a subdirectory that fails
    /// to load is skipped.
    pub async fn flatten_tree(&self, repo_id: &str) -> Result<Vec<FlatFile>> {
        let root = self.fetch_file_tree(repo_id, "", false).await?;
        let mut files = Vec::new();
        self.collect_files(repo_id, root, &mut files).await;
        debug!("Flattened {} markdown files from {}", files.len(), repo_id);
        Ok(files)
    }

    fn collect_files<'a>(
        &'a self,
        repo_id: &'a str,
        nodes: Vec<FileTreeNode>,
        files: &'a mut Vec<FlatFile>,
    ) -> BoxFuture<'a, ()> {
        async move {
            for node in nodes {
                if node.is_dir() {
                    let children = match node.children {
                        Some(children) => children,
                        None => match self.fetch_file_tree(repo_id, &node.path, false).await {
                            Ok(children) => children,
                            Err(e) => {
                                warn!("Failed to load directory {}: {}", node.path, e);
                                continue;
                            }
                        },
                    };
                    self.collect_files(repo_id, children, files).await;
                } else if is_markdown_file(&node.name) {
                    files.push(FlatFile {
                        repository_id: repo_id.to_string(),
                        display_name: file_display_name(&node.name),
                        path: node.path,
                        name: node.name,
                    });
                }
            }
        }
        .boxed()
    }

    async fn resolve<T: Resource>(&self, repo_id: &str, path: &str, force_refresh: bool) -> Result<T> {
        let repo = self.registry.require(repo_id)?;

        if !force_refresh {
            if let Some(local) = T::read_local(self, repo_id, path).await {
                self.cache.set(T::KIND, repo_id, &local, self.ttl(T::KIND), path);
                return Ok(local);
            }

            if let Some(cached) = self.cache.get::<T>(T::KIND, repo_id, path) {
                debug!("Serving {} {} from cache", T::KIND, display_path(path));
                return Ok(cached);
            }

            if self.config.strict_snapshot {
                return Err(DocHubError::SnapshotMissing {
                    path: display_path(path).to_string(),
                });
            }

            if self.config.mode == ExecutionMode::Development {
                info!(
                    "[DEV] Local {} not found, fetching from GitHub API: {}",
                    T::KIND,
                    display_path(path)
                );
            }
        }

        let url = self.cache_busted(T::remote_url(self, repo, path), force_refresh);

        match self.transport.get(&url, self.timeout).await {
            Ok(response) if response.is_success() => {
                let data = T::decode_remote(response.body, repo)?;
                self.cache.set(T::KIND, repo_id, &data, self.ttl(T::KIND), path);
                Ok(data)
            }
            Ok(response) if response.status == 403 => {
                match self.recover::<T>(repo_id, path, "Rate limited").await {
                    Some(data) => Ok(data),
                    None => Err(DocHubError::RateLimited),
                }
            }
            Ok(response) => Err(DocHubError::Upstream {
                source_name: repo.name.clone(),
                path: display_path(path).to_string(),
                status: response.status,
            }),
            Err(TransportError::Network(message)) => {
                match self.recover::<T>(repo_id, path, "Network error").await {
                    Some(data) => Ok(data),
                    None => Err(DocHubError::Network {
                        source_name: repo.name.clone(),
                        message,
                    }),
                }
            }
            Err(TransportError::Timeout) => {
                match self.recover::<T>(repo_id, path, "Request timeout").await {
                    Some(data) => Ok(data),
                    None => Err(DocHubError::Timeout {
                        source_name: repo.name.clone(),
                    }),
                }
            }
        }
    }

    /// Local snapshot, then cache. Used once the remote read has failed.
    async fn recover<T: Resource>(&self, repo_id: &str, path: &str, reason: &str) -> Option<T> {
        if let Some(local) = T::read_local(self, repo_id, path).await {
            warn!("{}, returning local {}", reason, T::KIND);
            return Some(local);
        }

        let cached = self.cache.get::<T>(T::KIND, repo_id, path);
        if cached.is_some() {
            warn!("{}, returning cached {}", reason, T::KIND);
        }
        cached
    }

    fn cache_busted(&self, url: String, force_refresh: bool) -> String {
        if !force_refresh && self.config.mode != ExecutionMode::Development {
            return url;
        }
        let separator = if url.contains('?') { '&' } else { '?' };
        format!("{}{}t={}", url, separator, Utc::now().timestamp_millis())
    }

    fn ttl(&self, kind: CacheKind) -> Duration {
        match kind {
            CacheKind::FileTree => self.filetree_ttl,
            CacheKind::Markdown => self.markdown_ttl,
        }
    }
}

fn display_path(path: &str) -> &str {
    if path.is_empty() { "root" } else { path }
}
