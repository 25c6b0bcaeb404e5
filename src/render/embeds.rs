// file: src/render/embeds.rs
// description: @youtube[...] and @gist[...] directive recognition
// reference: placeholder elements consumed by the sanitizer's embed extraction

use crate::models::EmbedKind;
use crate::render::escape::escape_attr;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DIRECTIVE: Regex =
        Regex::new(r"@(youtube|gist)\[([^\]\s]+)\]").expect("DIRECTIVE regex is valid");
}

pub const VIDEO_CLASS: &str = "youtube-embed-placeholder";
pub const GIST_CLASS: &str = "gist-embed-wrapper";
pub const VIDEO_ID_ATTR: &str = "data-video-id";
pub const GIST_ID_ATTR: &str = "data-gist-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPiece<'a> {
    Text(&'a str),
    Directive(EmbedKind, &'a str),
}

/// Splits text into plain runs and embed directives, in order.
pub fn split_directives(text: &str) -> Vec<TextPiece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;

    for caps in DIRECTIVE.captures_iter(text) {
        let (Some(whole), Some(kind), Some(id)) = (caps.get(0), caps.get(1), caps.get(2)) else {
            continue;
        };
        if whole.start() > last {
            pieces.push(TextPiece::Text(&text[last..whole.start()]));
        }
        let kind = match kind.as_str() {
            "youtube" => EmbedKind::Video,
            _ => EmbedKind::Gist,
        };
        pieces.push(TextPiece::Directive(kind, id.as_str()));
        last = whole.end();
    }

    if last < text.len() {
        pieces.push(TextPiece::Text(&text[last..]));
    }
    pieces
}

/// Block placeholder used when a directive stands on its own line.
pub fn block_placeholder(kind: EmbedKind, id: &str) -> String {
    match kind {
        EmbedKind::Video => format!(
            r#"<div class="{}" {}="{}"></div>"#,
            VIDEO_CLASS,
            VIDEO_ID_ATTR,
            escape_attr(id)
        ),
        EmbedKind::Gist => format!(
            r#"<div class="{} my-6" {}="{}"><div class="gist-loading">Loading Gist...</div></div>"#,
            GIST_CLASS,
            GIST_ID_ATTR,
            escape_attr(id)
        ),
    }
}

/// Inline placeholder for a directive inside running text.
pub fn inline_placeholder(kind: EmbedKind, id: &str) -> String {
    let (class, attr) = match kind {
        EmbedKind::Video => (VIDEO_CLASS, VIDEO_ID_ATTR),
        EmbedKind::Gist => (GIST_CLASS, GIST_ID_ATTR),
    };
    format!(
        r#"<span class="{}" {}="{}"></span>"#,
        class,
        attr,
        escape_attr(id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_directives() {
        let pieces = split_directives("watch @youtube[abc123] then @gist[octo/9f1e]");
        assert_eq!(
            pieces,
            vec![
                TextPiece::Text("watch "),
                TextPiece::Directive(EmbedKind::Video, "abc123"),
                TextPiece::Text(" then "),
                TextPiece::Directive(EmbedKind::Gist, "octo/9f1e"),
            ]
        );
    }

    #[test]
    fn test_placeholders() {
        assert_eq!(
            block_placeholder(EmbedKind::Video, "abc123"),
            r#"<div class="youtube-embed-placeholder" data-video-id="abc123"></div>"#
        );
        assert!(inline_placeholder(EmbedKind::Gist, "x\"y").contains(r#"data-gist-id="x&quot;y""#));
    }

    #[test]
    fn test_ignores_malformed() {
        assert_eq!(split_directives("@youtube[] @vimeo[x]").len(), 1);
    }
}
