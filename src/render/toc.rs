// file: src/render/toc.rs
// description: table of contents extraction from markdown headings
// reference: https://docs.rs/pulldown-cmark

use crate::render::slug::{heading_text, slugify};
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TocEntry {
    pub level: u32,
    pub text: String,
    /// Same id the renderer puts on the heading element
    pub id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableOfContents {
    pub entries: Vec<TocEntry>,
}

impl TableOfContents {
    pub fn extract(markdown: &str) -> Self {
        Self::extract_with(markdown, Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH)
    }

    /// Headings as the parser sees them with `options`, so fenced code and
    /// emphasis markers never leak into entries.
    pub fn extract_with(markdown: &str, options: Options) -> Self {
        let mut entries = Vec::new();
        let mut current: Option<(u32, String)> = None;

        for event in Parser::new_ext(markdown, options) {
            match event {
                Event::Start(Tag::Heading { level, .. }) => {
                    current = Some((level as u32, String::new()));
                }
                Event::End(TagEnd::Heading(_)) => {
                    if let Some((level, text)) = current.take() {
                        let text = text.trim().to_string();
                        entries.push(TocEntry {
                            level,
                            id: slugify(&text),
                            text,
                        });
                    }
                }
                ref other => {
                    if let Some((_, ref mut text)) = current
                        && let Some(fragment) = heading_text(other)
                    {
                        text.push_str(fragment);
                    }
                }
            }
        }

        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}
