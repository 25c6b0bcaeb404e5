// file: src/exporter/json.rs
// description: json and standalone html export of rendered documents

use crate::error::Result;
use crate::models::{EmbedDescriptor, EmbedKind, Segment};
use crate::pipeline::LoadedDocument;
use crate::render::TableOfContents;
use crate::render::escape::escape_attr;
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Html,
}

#[derive(Debug, Serialize)]
pub struct ExportedDocument<'a> {
    pub exported_at: String,
    pub repository_id: &'a str,
    pub path: &'a str,
    pub html: &'a str,
    pub embeds: &'a [EmbedDescriptor],
    pub toc: &'a TableOfContents,
    pub reading_time_minutes: usize,
}

impl<'a> ExportedDocument<'a> {
    pub fn from_loaded(loaded: &'a LoadedDocument) -> Self {
        Self {
            exported_at: Utc::now().to_rfc3339(),
            repository_id: &loaded.repository_id,
            path: &loaded.path,
            html: &loaded.document.html,
            embeds: &loaded.document.embeds,
            toc: &loaded.toc,
            reading_time_minutes: loaded.reading_time_minutes,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DocumentExporter {
    pretty: bool,
}

impl DocumentExporter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    pub fn to_json(&self, loaded: &LoadedDocument) -> Result<String> {
        let exported = ExportedDocument::from_loaded(loaded);
        let json = if self.pretty {
            serde_json::to_string_pretty(&exported)?
        } else {
            serde_json::to_string(&exported)?
        };
        Ok(json)
    }

    /// Sanitized HTML with each placeholder token replaced by its embed markup.
    pub fn to_html(&self, loaded: &LoadedDocument) -> String {
        loaded
            .document
            .segments()
            .into_iter()
            .map(|segment| match segment {
                Segment::Html(html) => html.to_string(),
                Segment::Embed(embed) => embed_markup(embed),
            })
            .collect()
    }

    pub fn render(&self, loaded: &LoadedDocument, format: ExportFormat) -> Result<String> {
        match format {
            ExportFormat::Json => self.to_json(loaded),
            ExportFormat::Html => Ok(self.to_html(loaded)),
        }
    }

    pub fn export(
        &self,
        loaded: &LoadedDocument,
        format: ExportFormat,
        output: &Path,
    ) -> Result<()> {
        let contents = self.render(loaded, format)?;
        if let Some(parent) = output.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(output, contents)?;

        info!(
            "Exported {}/{} to {}",
            loaded.repository_id,
            loaded.path,
            output.display()
        );
        Ok(())
    }
}

fn embed_markup(embed: &EmbedDescriptor) -> String {
    let id = escape_attr(&embed.id);
    match embed.kind {
        EmbedKind::Video => format!(
            r#"<div class="youtube-embed"><iframe src="https://www.youtube.com/embed/{}" frameborder="0" allowfullscreen loading="lazy"></iframe></div>"#,
            id
        ),
        EmbedKind::Gist => format!(
            r#"<div class="gist-embed"><a href="https://gist.github.com/{}" target="_blank" rel="noopener noreferrer">View gist</a></div>"#,
            id
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RenderedDocument;
    use crate::render::TocEntry;
    use tempfile::tempdir;

    fn loaded() -> LoadedDocument {
        let token = EmbedKind::Video.token(0);
        LoadedDocument {
            repository_id: "dsa".to_string(),
            path: "intro.md".to_string(),
            document: RenderedDocument::new(
                format!("<p>a</p>{}<p>b</p>", token),
                vec![EmbedDescriptor {
                    kind: EmbedKind::Video,
                    id: "abc123".to_string(),
                    token,
                }],
            ),
            toc: TableOfContents {
                entries: vec![TocEntry {
                    level: 1,
                    text: "Intro".to_string(),
                    id: "intro".to_string(),
                }],
            },
            reading_time_minutes: 1,
        }
    }

    #[test]
    fn test_html_export_expands_embeds() {
        let html = DocumentExporter::default().to_html(&loaded());
        assert!(html.starts_with("<p>a</p><div class=\"youtube-embed\">"));
        assert!(html.contains("https://www.youtube.com/embed/abc123"));
        assert!(html.ends_with("<p>b</p>"));
        assert!(!html.contains("__YOUTUBE_EMBED_0__"));
    }

    #[test]
    fn test_json_export_fields() {
        let json = DocumentExporter::new(true).to_json(&loaded()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["repository_id"], "dsa");
        assert_eq!(value["embeds"][0]["kind"], "video");
        assert_eq!(value["toc"]["entries"][0]["id"], "intro");
        assert!(value["exported_at"].is_string());
    }

    #[test]
    fn test_export_creates_parent_directories() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("nested").join("intro.html");

        DocumentExporter::default()
            .export(&loaded(), ExportFormat::Html, &output)
            .unwrap();

        let written = fs::read_to_string(output).unwrap();
        assert!(written.contains("<p>a</p>"));
    }
}
