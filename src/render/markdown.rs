// file: src/render/markdown.rs
// description: markdown to HTML rendering with pulldown-cmark and GitHub-style enhancement
// reference: https://docs.rs/pulldown-cmark

use crate::config::RendererConfig;
use crate::error::Result;
use crate::models::EmbedKind;
use crate::render::embeds::{TextPiece, block_placeholder, inline_placeholder, split_directives};
use crate::render::escape::{escape_attr, escape_text};
use crate::render::math::{MathBackend, MathMlBackend, MathMode, render_span};
use crate::render::normalizer::MarkdownNormalizer;
use crate::render::notation::normalize_notation;
use crate::render::slug::slugify;
use crate::render::toc::TableOfContents;
use pulldown_cmark::{
    CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd, TextMergeStream,
    html,
};
use std::sync::Arc;

const LINK_ICON: &str = r#"<svg class="octicon octicon-link" viewBox="0 0 16 16" width="16" height="16" aria-hidden="true"><path fill-rule="evenodd" d="M7.775 3.275a.75.75 0 001.06 1.06l1.25-1.25a2 2 0 112.83 2.83l-2.5 2.5a2 2 0 01-2.83 0 .75.75 0 00-1.06 1.06 3.5 3.5 0 004.95 0l2.5-2.5a3.5 3.5 0 00-4.95-4.95l-1.25 1.25zm-4.69 9.64a2 2 0 010-2.83l2.5-2.5a2 2 0 012.83 0 .75.75 0 001.06-1.06 3.5 3.5 0 00-4.95 0l-2.5 2.5a3.5 3.5 0 004.95 4.95l1.25-1.25a.75.75 0 00-1.06-1.06l-1.25 1.25a2 2 0 01-2.83 0z"></path></svg>"#;
const ANCHOR_CLASS: &str = "anchor absolute -ml-10 flex items-center opacity-0 group-hover:opacity-100 transition-opacity duration-200";
const TABLE_OPEN: &str = r#"<div class="table-wrapper"><table class="highlight tab-size js-file-line-container">"#;
const BLOCKQUOTE_OPEN: &str = "<blockquote class=\"border-l-4 border-primary pl-4 my-4 text-muted-foreground bg-muted/50 rounded-r-lg py-2\">\n";
const IMAGE_CLASS: &str = "max-w-full h-auto border border-border rounded-lg shadow-sm";

/// Stateless apart from its parser options; one instance serves every render.
pub struct MarkdownRenderer {
    options: Options,
    enhanced: bool,
    normalizer: MarkdownNormalizer,
    math: Arc<dyn MathBackend>,
}

impl MarkdownRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        let mut options =
            Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS;
        if config.enhanced {
            options.insert(Options::ENABLE_MATH);
        }

        Self {
            options,
            enhanced: config.enhanced,
            normalizer: MarkdownNormalizer::new(),
            math: Arc::new(MathMlBackend),
        }
    }

    pub fn with_math_backend(mut self, backend: Arc<dyn MathBackend>) -> Self {
        self.math = backend;
        self
    }

    pub fn options(&self) -> Options {
        self.options
    }

    pub fn is_enhanced(&self) -> bool {
        self.enhanced
    }

    /// Structural normalization, plus shorthand notation rewriting when enhanced.
    pub fn preprocess(&self, markdown: &str) -> Result<String> {
        let normalized = self.normalizer.normalize(markdown)?;
        if self.enhanced {
            Ok(normalize_notation(&normalized))
        } else {
            Ok(normalized)
        }
    }

    /// Produces unsanitized HTML. Soft line breaks stay soft.
    pub fn render(&self, markdown: &str) -> Result<String> {
        let source = self.preprocess(markdown)?;
        let parser = TextMergeStream::new(Parser::new_ext(&source, self.options));

        let mut transform = Transform::new(self.math.as_ref());
        for event in parser {
            transform.handle(event);
        }

        let mut output = String::with_capacity(source.len() * 3 / 2);
        html::push_html(&mut output, transform.finish().into_iter());
        Ok(output)
    }

    pub fn table_of_contents(&self, markdown: &str) -> Result<TableOfContents> {
        let source = self.preprocess(markdown)?;
        Ok(TableOfContents::extract_with(&source, self.options))
    }
}

enum Frame<'a> {
    Heading {
        level: HeadingLevel,
        events: Vec<Event<'a>>,
        text: String,
    },
    CodeBlock {
        language: Option<String>,
        code: String,
    },
    Table {
        events: Vec<Event<'a>>,
    },
    Image {
        events: Vec<Event<'a>>,
    },
    Paragraph {
        events: Vec<Event<'a>>,
        directives: Vec<(EmbedKind, String)>,
        other_content: bool,
    },
}

/// Event rewriter. Elements that need their rendered children (headings,
/// code blocks, tables, images, paragraphs) are collected on a frame stack
/// and emitted as raw HTML once closed.
struct Transform<'a, 'm> {
    math: &'m dyn MathBackend,
    frames: Vec<Frame<'a>>,
    output: Vec<Event<'a>>,
}

impl<'a, 'm> Transform<'a, 'm> {
    fn new(math: &'m dyn MathBackend) -> Self {
        Self {
            math,
            frames: Vec::new(),
            output: Vec::new(),
        }
    }

    fn finish(mut self) -> Vec<Event<'a>> {
        // unbalanced input never reaches here with pulldown-cmark, but flush anyway
        while let Some(frame) = self.frames.pop() {
            let events = match frame {
                Frame::Heading { events, .. }
                | Frame::Table { events }
                | Frame::Image { events }
                | Frame::Paragraph { events, .. } => events,
                Frame::CodeBlock { code, .. } => vec![Event::Text(code.into())],
            };
            for event in events {
                self.emit(event);
            }
        }
        self.output
    }

    fn handle(&mut self, event: Event<'a>) {
        if let Some(Frame::CodeBlock { code, .. }) = self.frames.last_mut() {
            match event {
                Event::Text(text) => code.push_str(&text),
                Event::End(TagEnd::CodeBlock) => self.close_code_block(),
                _ => {}
            }
            return;
        }

        match event {
            Event::Start(Tag::Heading { level, .. }) => self.frames.push(Frame::Heading {
                level,
                events: Vec::new(),
                text: String::new(),
            }),
            Event::End(TagEnd::Heading(_)) => self.close_heading(),
            Event::Start(Tag::CodeBlock(kind)) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(|lang| lang.to_string()),
                    CodeBlockKind::Indented => None,
                };
                self.frames.push(Frame::CodeBlock {
                    language,
                    code: String::new(),
                });
            }
            Event::Start(tag @ Tag::Table(_)) => self.frames.push(Frame::Table {
                events: vec![Event::Start(tag)],
            }),
            Event::End(TagEnd::Table) => self.close_table(),
            Event::Start(tag @ Tag::Image { .. }) => self.frames.push(Frame::Image {
                events: vec![Event::Start(tag)],
            }),
            Event::End(TagEnd::Image) => self.close_image(),
            Event::Start(Tag::Paragraph) => self.frames.push(Frame::Paragraph {
                events: Vec::new(),
                directives: Vec::new(),
                other_content: false,
            }),
            Event::End(TagEnd::Paragraph) => self.close_paragraph(),
            Event::Start(Tag::BlockQuote(_)) => self.emit(Event::Html(BLOCKQUOTE_OPEN.into())),
            Event::Text(text) => self.text(text),
            Event::Code(code) => {
                self.record_heading_text(&code);
                self.emit(Event::InlineHtml(
                    format!(r#"<code class="notranslate">{}</code>"#, escape_text(&code)).into(),
                ));
            }
            Event::InlineMath(tex) => {
                self.record_heading_text(&tex);
                let markup = render_span(self.math, &tex, MathMode::Inline);
                self.emit(Event::InlineHtml(markup.into()));
            }
            Event::DisplayMath(tex) => {
                self.record_heading_text(&tex);
                let markup = render_span(self.math, &tex, MathMode::Display);
                self.emit(Event::InlineHtml(markup.into()));
            }
            other => self.emit(other),
        }
    }

    fn text(&mut self, text: CowStr<'a>) {
        self.record_heading_text(&text);

        let pieces = split_directives(&text);
        if pieces.iter().all(|p| matches!(p, TextPiece::Text(_))) {
            self.emit(Event::Text(text));
            return;
        }

        for piece in pieces {
            match piece {
                TextPiece::Text(plain) => self.emit(Event::Text(plain.to_string().into())),
                TextPiece::Directive(kind, id) => self.emit_directive(kind, id),
            }
        }
    }

    fn emit_directive(&mut self, kind: EmbedKind, id: &str) {
        let placeholder = Event::InlineHtml(inline_placeholder(kind, id).into());
        match self.frames.last_mut() {
            Some(Frame::Paragraph {
                events, directives, ..
            }) => {
                directives.push((kind, id.to_string()));
                events.push(placeholder);
            }
            _ => self.emit(placeholder),
        }
    }

    fn emit(&mut self, event: Event<'a>) {
        match self.frames.last_mut() {
            Some(Frame::Heading { events, .. })
            | Some(Frame::Table { events })
            | Some(Frame::Image { events }) => events.push(event),
            Some(Frame::Paragraph {
                events,
                other_content,
                ..
            }) => {
                let blank = matches!(&event, Event::Text(t) if t.trim().is_empty())
                    || matches!(event, Event::SoftBreak);
                if !blank {
                    *other_content = true;
                }
                events.push(event);
            }
            Some(Frame::CodeBlock { code, .. }) => {
                if let Event::Text(text) = event {
                    code.push_str(&text);
                }
            }
            None => self.output.push(event),
        }
    }

    fn record_heading_text(&mut self, fragment: &str) {
        let heading = self.frames.iter_mut().rev().find_map(|frame| match frame {
            Frame::Heading { text, .. } => Some(text),
            _ => None,
        });
        if let Some(text) = heading {
            text.push_str(fragment);
        }
    }

    fn close_heading(&mut self) {
        let Some(Frame::Heading {
            level,
            events,
            text,
        }) = self.frames.pop()
        else {
            return;
        };

        let level = level as u32;
        let id = slugify(&text);
        let mut inner = String::new();
        html::push_html(&mut inner, events.into_iter());

        let markup = format!(
            "<h{level} id=\"{id}\" class=\"group relative scroll-mt-20 {class}\"><a class=\"{anchor}\" aria-label=\"Link to this section\" href=\"#{id}\">{icon}</a><span>{inner}</span></h{level}>\n",
            level = level,
            id = escape_attr(&id),
            class = heading_class(level),
            anchor = ANCHOR_CLASS,
            icon = LINK_ICON,
            inner = inner,
        );
        self.emit(Event::Html(markup.into()));
    }

    fn close_code_block(&mut self) {
        let Some(Frame::CodeBlock { language, code }) = self.frames.pop() else {
            return;
        };

        let code = escape_text(code.trim_start_matches(['\n', '\r']));
        let markup = match language {
            Some(lang) => {
                let lang = escape_attr(&lang);
                format!(
                    "<div class=\"highlight highlight-{lang} notranslate\"><pre class=\"notranslate\"><code class=\"language-{lang}\">{code}</code></pre></div>\n",
                    lang = lang,
                    code = code,
                )
            }
            None => format!(
                "<div class=\"highlight notranslate\"><pre class=\"notranslate\"><code>{}</code></pre></div>\n",
                code
            ),
        };
        self.emit(Event::Html(markup.into()));
    }

    fn close_table(&mut self) {
        let Some(Frame::Table { mut events }) = self.frames.pop() else {
            return;
        };
        events.push(Event::End(TagEnd::Table));

        let mut table = String::new();
        html::push_html(&mut table, events.into_iter());
        let table = table.replacen("<table>", TABLE_OPEN, 1);
        self.emit(Event::Html(format!("{}</div>\n", table.trim_end()).into()));
    }

    fn close_image(&mut self) {
        let Some(Frame::Image { mut events }) = self.frames.pop() else {
            return;
        };
        events.push(Event::End(TagEnd::Image));

        let mut image = String::new();
        html::push_html(&mut image, events.into_iter());
        let image = image.replacen("<img ", &format!("<img class=\"{}\" ", IMAGE_CLASS), 1);
        self.emit(Event::InlineHtml(
            format!("<span class=\"image-wrapper\">{}</span>", image).into(),
        ));
    }

    fn close_paragraph(&mut self) {
        let Some(Frame::Paragraph {
            events,
            mut directives,
            other_content,
        }) = self.frames.pop()
        else {
            return;
        };

        if directives.len() == 1 && !other_content {
            if let Some((kind, id)) = directives.pop() {
                self.emit(Event::Html(format!("{}\n", block_placeholder(kind, &id)).into()));
            }
            return;
        }

        self.emit(Event::Start(Tag::Paragraph));
        for event in events {
            self.emit(event);
        }
        self.emit(Event::End(TagEnd::Paragraph));
    }
}

fn heading_class(level: u32) -> &'static str {
    match level {
        1 => "text-3xl font-bold mb-4 mt-6 border-b border-border pb-2",
        2 => "text-2xl font-semibold mb-4 mt-6 border-b border-border pb-2",
        3 => "text-xl font-semibold mb-3 mt-5",
        4 => "text-lg font-semibold mb-3 mt-4",
        5 => "text-base font-semibold mb-2 mt-3",
        6 => "text-sm font-semibold mb-2 mt-3 text-muted-foreground",
        _ => "text-base font-semibold mb-2 mt-3",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DocHubError;
    use pretty_assertions::assert_eq;

    fn plain() -> MarkdownRenderer {
        MarkdownRenderer::new(&RendererConfig {
            enhanced: false,
            ..RendererConfig::default()
        })
    }

    struct Bracketing;

    impl MathBackend for Bracketing {
        fn render(&self, tex: &str, mode: MathMode) -> Result<String> {
            if tex.contains("\\fail") {
                return Err(DocHubError::MathRender {
                    span: tex.to_string(),
                    message: "unknown command".to_string(),
                });
            }
            Ok(match mode {
                MathMode::Inline => format!("<math>{}</math>", tex),
                MathMode::Display => format!("<math display=\"block\">{}</math>", tex),
            })
        }
    }

    fn enhanced() -> MarkdownRenderer {
        MarkdownRenderer::new(&RendererConfig::default()).with_math_backend(Arc::new(Bracketing))
    }

    #[test]
    fn test_heading_anchor() {
        let html = plain().render("## Getting Started!").unwrap();

        assert!(html.starts_with("<h2 id=\"getting-started\""));
        assert!(html.contains("href=\"#getting-started\""));
        assert!(html.contains("<span>Getting Started!</span>"));
        assert!(html.contains("octicon-link"));
    }

    #[test]
    fn test_heading_with_inline_markup() {
        let html = plain().render("# Use `cargo` *now*").unwrap();

        assert!(html.contains("id=\"use-cargo-now\""));
        assert!(html.contains("<code class=\"notranslate\">cargo</code>"));
        assert!(html.contains("<em>now</em>"));
    }

    #[test]
    fn test_duplicate_headings_are_not_deduplicated() {
        let html = plain().render("# Notes\n\n# Notes\n").unwrap();
        assert_eq!(html.matches("id=\"notes\"").count(), 2);
    }

    #[test]
    fn test_fenced_code_block() {
        let html = plain().render("```rust\nfn main() {}\n```\n").unwrap();
        assert_eq!(
            html,
            "<div class=\"highlight highlight-rust notranslate\"><pre class=\"notranslate\"><code class=\"language-rust\">fn main() {}\n</code></pre></div>\n"
        );
    }

    #[test]
    fn test_code_without_language_is_escaped() {
        let html = plain().render("    a < b\n").unwrap();
        assert!(html.contains("<div class=\"highlight notranslate\">"));
        assert!(html.contains("a &lt; b"));
    }

    #[test]
    fn test_table_wrapper() {
        let html = plain().render("| a | b |\n|---|---|\n| 1 | 2 |\n").unwrap();
        assert!(html.starts_with(
            "<div class=\"table-wrapper\"><table class=\"highlight tab-size js-file-line-container\">"
        ));
        assert!(html.contains("<td>1</td>"));
        assert!(html.trim_end().ends_with("</table></div>"));
    }

    #[test]
    fn test_blockquote_and_image() {
        let html = plain()
            .render("> quoted\n\n![diagram](https://example.com/d.png \"Flow\")\n")
            .unwrap();
        assert!(html.contains("<blockquote class=\"border-l-4"));
        assert!(html.contains("<span class=\"image-wrapper\"><img class=\"max-w-full"));
        assert!(html.contains("src=\"https://example.com/d.png\""));
        assert!(html.contains("alt=\"diagram\""));
        assert!(html.contains("title=\"Flow\""));
    }

    #[test]
    fn test_soft_breaks_are_not_hard_breaks() {
        let html = plain().render("one\ntwo\n").unwrap();
        assert_eq!(html, "<p>one\ntwo</p>\n");
    }

    #[test]
    fn test_block_embed() {
        let html = plain().render("Intro\n\n@youtube[abc123]\n\nOutro\n").unwrap();
        assert!(html.contains(
            "<div class=\"youtube-embed-placeholder\" data-video-id=\"abc123\"></div>"
        ));
        assert_eq!(html.matches("abc123").count(), 1);
        assert!(!html.contains("<p>@youtube"));
    }

    #[test]
    fn test_inline_embed_and_code_untouched() {
        let html = plain()
            .render("See @gist[octo/1f2e] and `@youtube[nope]`\n\n```\n@youtube[nope]\n```\n")
            .unwrap();
        assert!(html.contains("<span class=\"gist-embed-wrapper\" data-gist-id=\"octo/1f2e\"></span>"));
        assert!(!html.contains("data-video-id"));
        assert_eq!(html.matches("@youtube[nope]").count(), 2);
    }

    #[test]
    fn test_plain_variant_leaves_dollars_alone() {
        let html = plain().render("costs $5 or $6\n").unwrap();
        assert_eq!(html, "<p>costs $5 or $6</p>\n");
    }

    #[test]
    fn test_enhanced_math_rendering() {
        let html = enhanced().render("Cost is $O(n2)$.\n\n$$\nx^2\n$$\n").unwrap();
        assert!(html.contains("<math>O(n^{2})</math>"));
        assert!(html.contains("<math display=\"block\">"));
    }

    #[test]
    fn test_enhanced_prose_notation() {
        let html = enhanced().render("Insertion sort is O(n2).\n").unwrap();
        assert_eq!(html, "<p>Insertion sort is <math>O(n^{2})</math>.</p>\n");
    }

    #[test]
    fn test_math_failure_keeps_span_text() {
        let html = enhanced().render("ok $a$ bad $\\fail{x}$ ok $b$\n").unwrap();
        assert!(html.contains("<math>a</math>"));
        assert!(html.contains("$\\fail{x}$"));
        assert!(html.contains("<math>b</math>"));
    }

    #[test]
    fn test_math_not_rendered_in_code() {
        let html = enhanced().render("`$x$`\n\n```\n$y$\n```\n").unwrap();
        assert!(!html.contains("<math>"));
        assert!(html.contains("$x$"));
        assert!(html.contains("$y$"));
    }

    #[test]
    fn test_table_of_contents_matches_heading_ids() {
        let renderer = plain();
        let markdown = "# Intro\n\n## Big `O` notes\n";
        let toc = renderer.table_of_contents(markdown).unwrap();
        let html = renderer.render(markdown).unwrap();

        for entry in &toc.entries {
            assert!(html.contains(&format!("id=\"{}\"", entry.id)));
        }
    }
}
