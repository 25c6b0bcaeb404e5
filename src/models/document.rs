// file: src/models/document.rs
// description: rendered document model with embed placeholders
// reference: internal data structures

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedKind {
    Video,
    Gist,
}

impl EmbedKind {
    pub const ALL: [EmbedKind; 2] = [EmbedKind::Video, EmbedKind::Gist];

    /// The part of every placeholder token that precedes its index.
    pub fn token_prefix(&self) -> &'static str {
        match self {
            EmbedKind::Video => "__YOUTUBE_EMBED_",
            EmbedKind::Gist => "__GIST_EMBED_",
        }
    }

    pub fn token(&self, index: usize) -> String {
        format!("{}{}__", self.token_prefix(), index)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedDescriptor {
    pub kind: EmbedKind,
    pub id: String,
    pub token: String,
}

/// Sanitized HTML in which each embed is replaced by its placeholder token.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub html: String,
    pub embeds: Vec<EmbedDescriptor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Html(&'a str),
    Embed(&'a EmbedDescriptor),
}

impl RenderedDocument {
    pub const ERROR_HTML: &'static str =
        r#"<div class="error">Error parsing markdown content</div>"#;

    pub fn new(html: String, embeds: Vec<EmbedDescriptor>) -> Self {
        Self { html, embeds }
    }

    pub fn render_error() -> Self {
        Self {
            html: Self::ERROR_HTML.to_string(),
            embeds: Vec::new(),
        }
    }

    /// Splits the HTML at each placeholder token, in document order.
    /// Empty HTML runs between adjacent tokens are omitted. Sanitized HTML
    /// only spells a token where an embed was extracted.
    pub fn segments(&self) -> Vec<Segment<'_>> {
        let mut segments = Vec::with_capacity(self.embeds.len() * 2 + 1);
        let mut rest = self.html.as_str();

        for embed in &self.embeds {
            let Some(pos) = rest.find(&embed.token) else {
                continue;
            };
            if pos > 0 {
                segments.push(Segment::Html(&rest[..pos]));
            }
            segments.push(Segment::Embed(embed));
            rest = &rest[pos + embed.token.len()..];
        }

        if !rest.is_empty() {
            segments.push(Segment::Html(rest));
        }

        segments
    }

    /// The document with every placeholder removed.
    pub fn html_without_embeds(&self) -> String {
        self.segments()
            .into_iter()
            .filter_map(|segment| match segment {
                Segment::Html(html) => Some(html),
                Segment::Embed(_) => None,
            })
            .collect()
    }
}
