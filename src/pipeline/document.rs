// file: src/pipeline/document.rs
// description: resolve, render and sanitize a document into its presentable form
// reference: combines the content resolver, markdown renderer and sanitizer

use crate::config::RendererConfig;
use crate::error::{DocHubError, Result};
use crate::models::RenderedDocument;
use crate::render::{MarkdownRenderer, TableOfContents};
use crate::resolver::ContentResolver;
use crate::sanitizer::{SanitizePolicy, Sanitizer};
use crate::utils::validation::reading_time_minutes;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error};

/// A rendered document together with the metadata shown next to it.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub repository_id: String,
    pub path: String,
    pub document: RenderedDocument,
    pub toc: TableOfContents,
    pub reading_time_minutes: usize,
}

pub struct DocumentPipeline {
    resolver: Arc<ContentResolver>,
    renderer: MarkdownRenderer,
    sanitizer: Sanitizer,
}

impl DocumentPipeline {
    pub fn new(resolver: Arc<ContentResolver>, config: &RendererConfig) -> Self {
        Self {
            resolver,
            renderer: MarkdownRenderer::new(config),
            sanitizer: Sanitizer::new(SanitizePolicy::from_config(config)),
        }
    }

    pub fn with_renderer(mut self, renderer: MarkdownRenderer) -> Self {
        self.renderer = renderer;
        self
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.resolver
    }

    pub fn renderer(&self) -> &MarkdownRenderer {
        &self.renderer
    }

    /// Retrieval errors propagate; rendering never fails.
    pub async fn load(
        &self,
        repo_id: &str,
        path: &str,
        force_refresh: bool,
    ) -> Result<RenderedDocument> {
        let markdown = self.fetch(repo_id, path, force_refresh).await?;
        Ok(self.render_text(&markdown))
    }

    pub async fn load_full(
        &self,
        repo_id: &str,
        path: &str,
        force_refresh: bool,
    ) -> Result<LoadedDocument> {
        let markdown = self.fetch(repo_id, path, force_refresh).await?;
        let toc = self
            .renderer
            .table_of_contents(&markdown)
            .unwrap_or_default();

        Ok(LoadedDocument {
            repository_id: repo_id.to_string(),
            path: path.to_string(),
            document: self.render_text(&markdown),
            toc,
            reading_time_minutes: reading_time_minutes(&markdown),
        })
    }

    pub async fn table_of_contents(
        &self,
        repo_id: &str,
        path: &str,
        force_refresh: bool,
    ) -> Result<TableOfContents> {
        let markdown = self
            .resolver
            .fetch_markdown(repo_id, path, force_refresh)
            .await?;
        self.renderer.table_of_contents(&markdown)
    }

    /// Renders text the caller already holds. Any failure inside the renderer,
    /// including a panic in a math backend, yields the fixed error document.
    pub fn render_text(&self, markdown: &str) -> RenderedDocument {
        match self.try_render_text(markdown) {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to render markdown: {}", e);
                RenderedDocument::render_error()
            }
        }
    }

    /// Like [`render_text`](Self::render_text), but reports the failure. A
    /// renderer panic surfaces as [`DocHubError::Render`].
    pub fn try_render_text(&self, markdown: &str) -> Result<RenderedDocument> {
        let html = panic::catch_unwind(AssertUnwindSafe(|| self.renderer.render(markdown)))
            .map_err(|payload| DocHubError::Render(panic_message(payload.as_ref())))??;

        let document = self.sanitizer.sanitize(&html);
        debug!(
            "Rendered {} bytes of HTML with {} embeds",
            document.html.len(),
            document.embeds.len()
        );
        Ok(document)
    }

    async fn fetch(&self, repo_id: &str, path: &str, force_refresh: bool) -> Result<String> {
        let markdown = self
            .resolver
            .fetch_markdown(repo_id, path, force_refresh)
            .await?;
        self.resolver.rewrite_image_paths(repo_id, path, &markdown)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("renderer panicked: {}", message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("renderer panicked: {}", message)
    } else {
        "renderer panicked".to_string()
    }
}
