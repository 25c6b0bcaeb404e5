// file: src/sanitizer/walker.rs
// description: allow-list tree walker that serializes safe HTML and extracts embeds
// reference: https://docs.rs/scraper

use crate::models::{EmbedDescriptor, EmbedKind, RenderedDocument};
use crate::render::embeds::{GIST_CLASS, GIST_ID_ATTR, VIDEO_CLASS, VIDEO_ID_ATTR};
use crate::render::escape::{escape_attr, escape_text};
use crate::sanitizer::policy::{
    SanitizePolicy, is_dropped_with_content, is_safe_url, is_url_attribute, is_void,
};
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use tracing::debug;

const MAX_EMBED_ID_LEN: usize = 128;
const NEW_TAB_REL: [&str; 2] = ["noopener", "noreferrer"];

/// The only path from rendered HTML to presentation.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sanitizer {
    policy: SanitizePolicy,
}

#[derive(Default)]
struct WalkState {
    output: String,
    embeds: Vec<EmbedDescriptor>,
    videos: usize,
    gists: usize,
}

enum Embed {
    Valid(EmbedKind, String),
    Rejected,
}

impl Sanitizer {
    pub fn new(policy: SanitizePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &SanitizePolicy {
        &self.policy
    }

    /// Re-serializes `html` keeping only allow-listed tags and attributes.
    /// Unknown tags are unwrapped, dangerous ones removed with their content.
    /// Embed placeholders become tokens in the returned document.
    pub fn sanitize(&self, html: &str) -> RenderedDocument {
        let fragment = Html::parse_fragment(html);
        let mut state = WalkState {
            output: String::with_capacity(html.len()),
            ..WalkState::default()
        };

        self.walk(fragment.root_element(), &mut state);
        RenderedDocument::new(state.output, state.embeds)
    }

    fn walk(&self, node: ElementRef, state: &mut WalkState) {
        for child in node.children() {
            match child.value() {
                Node::Text(text) => {
                    state
                        .output
                        .push_str(&neutralize_tokens(escape_text(&text.text)))
                }
                Node::Element(elem) => {
                    let Some(element_ref) = ElementRef::wrap(child) else {
                        continue;
                    };
                    let tag = elem.name().to_ascii_lowercase();

                    if is_dropped_with_content(&tag) {
                        debug!("Dropping <{}> element and its content", tag);
                        continue;
                    }

                    match embed_of(&tag, elem) {
                        Some(Embed::Valid(kind, id)) => {
                            push_embed(state, kind, id);
                            continue;
                        }
                        Some(Embed::Rejected) => {
                            debug!("Dropping embed placeholder with invalid id");
                            continue;
                        }
                        None => {}
                    }

                    if !self.policy.allows_tag(&tag) {
                        self.walk(element_ref, state);
                        continue;
                    }

                    self.open_tag(&tag, elem, state);
                    if is_void(&tag) {
                        continue;
                    }
                    self.walk(element_ref, state);
                    state.output.push_str("</");
                    state.output.push_str(&tag);
                    state.output.push('>');
                }
                _ => {}
            }
        }
    }

    fn open_tag(&self, tag: &str, elem: &Element, state: &mut WalkState) {
        let mut attributes: Vec<(String, String)> = elem
            .attrs()
            .filter_map(|(name, value)| {
                let lower = name.to_ascii_lowercase();
                if !self.policy.allows_attribute(&lower, value) {
                    return None;
                }
                if is_url_attribute(&lower) && !is_safe_url(tag, value) {
                    debug!("Dropping unsafe {} on <{}>", lower, tag);
                    return None;
                }
                Some((name.to_string(), value.to_string()))
            })
            .collect();

        if tag == "a" && self.policy.open_links_in_new_tab {
            open_in_new_tab(&mut attributes);
        }

        attributes.sort_by(|a, b| a.0.to_ascii_lowercase().cmp(&b.0.to_ascii_lowercase()));

        state.output.push('<');
        state.output.push_str(tag);
        for (name, value) in &attributes {
            state.output.push(' ');
            state.output.push_str(name);
            state.output.push_str("=\"");
            state.output.push_str(&neutralize_tokens(escape_attr(value)));
            state.output.push('"');
        }
        state.output.push('>');
    }
}

/// Non-fragment links without an explicit target open in a new context
/// without opener or referrer.
fn open_in_new_tab(attributes: &mut Vec<(String, String)>) {
    let Some(href) = attributes
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case("href"))
        .map(|(_, value)| value.clone())
    else {
        return;
    };

    if href.starts_with('#')
        || attributes
            .iter()
            .any(|(name, _)| name.eq_ignore_ascii_case("target"))
    {
        return;
    }

    attributes.push(("target".to_string(), "_blank".to_string()));

    match attributes
        .iter_mut()
        .find(|(name, _)| name.eq_ignore_ascii_case("rel"))
    {
        Some((_, rel)) => {
            let mut tokens: Vec<String> = rel.split_whitespace().map(str::to_string).collect();
            for token in NEW_TAB_REL {
                if !tokens.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    tokens.push(token.to_string());
                }
            }
            *rel = tokens.join(" ");
        }
        None => attributes.push(("rel".to_string(), NEW_TAB_REL.join(" "))),
    }
}

fn embed_of(tag: &str, elem: &Element) -> Option<Embed> {
    if tag != "div" && tag != "span" {
        return None;
    }

    let (kind, attr) = if elem.classes().any(|c| c == VIDEO_CLASS) {
        (EmbedKind::Video, VIDEO_ID_ATTR)
    } else if elem.classes().any(|c| c == GIST_CLASS) {
        (EmbedKind::Gist, GIST_ID_ATTR)
    } else {
        return None;
    };

    match elem.attr(attr) {
        Some(id) if is_valid_embed_id(id) => Some(Embed::Valid(kind, id.to_string())),
        _ => Some(Embed::Rejected),
    }
}

/// Author content that spells a placeholder token gets its first underscore
/// as a character reference, so only extracted embeds produce real tokens.
fn neutralize_tokens(mut escaped: String) -> String {
    for kind in EmbedKind::ALL {
        let prefix = kind.token_prefix();
        // loop, since a replaced run can expose an overlapping one
        while escaped.contains(prefix) {
            escaped = escaped.replace(prefix, &format!("&#95;{}", &prefix[1..]));
        }
    }
    escaped
}

fn is_valid_embed_id(id: &str) -> bool {
    !id.is_empty()
        && id.len() <= MAX_EMBED_ID_LEN
        && !id.contains("..")
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/' | '.'))
}

fn push_embed(state: &mut WalkState, kind: EmbedKind, id: String) {
    let index = match kind {
        EmbedKind::Video => {
            state.videos += 1;
            state.videos - 1
        }
        EmbedKind::Gist => {
            state.gists += 1;
            state.gists - 1
        }
    };

    let token = kind.token(index);
    state.output.push_str(&token);
    state.embeds.push(EmbedDescriptor { kind, id, token });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Segment;
    use pretty_assertions::assert_eq;

    fn sanitizer() -> Sanitizer {
        Sanitizer::default()
    }

    #[test]
    fn test_script_never_survives() {
        let doc = sanitizer().sanitize("<script>alert(1)</script><p>hi</p>");
        assert_eq!(doc.html, "<p>hi</p>");
        assert!(!doc.html.contains("<script"));

        let nested = sanitizer().sanitize("<div><svg><script>x()</script></svg><p>ok</p></div>");
        assert!(!nested.html.contains("script"));
        assert!(nested.html.contains("<p>ok</p>"));
    }

    #[test]
    fn test_unknown_tags_keep_text() {
        let doc = sanitizer().sanitize("<p><custom-tag>keep <b>me</b></custom-tag></p>");
        assert_eq!(doc.html, "<p>keep <b>me</b></p>");
    }

    #[test]
    fn test_disallowed_attributes_removed() {
        let doc = sanitizer()
            .sanitize(r#"<p onclick="steal()" class="lead">x</p><a href="javascript:alert(1)">y</a>"#);
        assert_eq!(doc.html, r#"<p class="lead">x</p><a>y</a>"#);
    }

    #[test]
    fn test_comments_dropped_and_text_escaped() {
        let doc = sanitizer().sanitize("<p>a &lt; b<!-- secret --></p>");
        assert_eq!(doc.html, "<p>a &lt; b</p>");
    }

    #[test]
    fn test_external_links_open_in_new_tab() {
        let doc = sanitizer().sanitize(r#"<a href="https://example.com">out</a>"#);
        assert_eq!(
            doc.html,
            r#"<a href="https://example.com" rel="noopener noreferrer" target="_blank">out</a>"#
        );
    }

    #[test]
    fn test_fragment_and_targeted_links_untouched() {
        let doc = sanitizer()
            .sanitize(r##"<a href="#intro">in</a><a href="/x" target="_self">self</a>"##);
        assert_eq!(
            doc.html,
            r##"<a href="#intro">in</a><a href="/x" target="_self">self</a>"##
        );
    }

    #[test]
    fn test_existing_rel_is_merged() {
        let doc = sanitizer().sanitize(r#"<a href="https://x.dev" rel="nofollow noopener">x</a>"#);
        assert!(doc.html.contains(r#"rel="nofollow noopener noreferrer""#));
        assert!(doc.html.contains(r#"target="_blank""#));
    }

    #[test]
    fn test_link_rewrite_can_be_disabled() {
        let policy = SanitizePolicy {
            open_links_in_new_tab: false,
            ..SanitizePolicy::default()
        };
        let doc = Sanitizer::new(policy).sanitize(r#"<a href="https://example.com">out</a>"#);
        assert_eq!(doc.html, r#"<a href="https://example.com">out</a>"#);
    }

    #[test]
    fn test_embed_extraction() {
        let html = concat!(
            "<p>a</p>",
            r#"<div class="youtube-embed-placeholder" data-video-id="abc123"></div>"#,
            "<p>b</p>",
            r#"<div class="gist-embed-wrapper my-6" data-gist-id="octo/9f1e"><div class="gist-loading">Loading Gist...</div></div>"#,
        );
        let doc = sanitizer().sanitize(html);

        assert_eq!(doc.html, "<p>a</p>__YOUTUBE_EMBED_0__<p>b</p>__GIST_EMBED_0__");
        assert_eq!(doc.embeds.len(), 2);
        assert_eq!(doc.embeds[0].id, "abc123");
        assert_eq!(doc.embeds[1].kind, EmbedKind::Gist);
        assert_eq!(doc.html_without_embeds(), "<p>a</p><p>b</p>");
        assert!(matches!(doc.segments()[1], Segment::Embed(e) if e.id == "abc123"));
    }

    #[test]
    fn test_token_text_in_content_is_neutralized() {
        let html = concat!(
            "<p>Token is <code>__YOUTUBE_EMBED_0__</code> and __GIST_EMBED_0__</p>",
            r#"<p title="__YOUTUBE_EMBED_1__">t</p>"#,
            r#"<div class="youtube-embed-placeholder" data-video-id="abc123"></div>"#,
            "<p>__YOUTUBE_EMBED__YOUTUBE_EMBED_0__</p>",
        );
        let doc = sanitizer().sanitize(html);

        assert_eq!(doc.embeds.len(), 1);
        assert_eq!(doc.html.matches("__YOUTUBE_EMBED_").count(), 1);
        assert!(!doc.html.contains("__GIST_EMBED_"));
        assert!(doc.html.contains("<code>&#95;_YOUTUBE_EMBED_0__</code>"));

        let segments = doc.segments();
        assert_eq!(segments.len(), 3);
        assert!(matches!(segments[0], Segment::Html(html) if html.ends_with("<p title=\"&#95;_YOUTUBE_EMBED_1__\">t</p>")));
        assert!(matches!(segments[1], Segment::Embed(e) if e.id == "abc123"));
    }

    #[test]
    fn test_invalid_embed_id_dropped() {
        let doc = sanitizer().sanitize(
            r#"<div class="youtube-embed-placeholder" data-video-id="x&quot; onload=&quot;y"></div><p>ok</p>"#,
        );
        assert!(doc.embeds.is_empty());
        assert_eq!(doc.html, "<p>ok</p>");
    }

    #[test]
    fn test_svg_anchor_icon_survives() {
        let doc = sanitizer().sanitize(
            r##"<a href="#x" aria-label="Link"><svg class="octicon" viewBox="0 0 16 16" aria-hidden="true"><path fill-rule="evenodd" d="M0 0z"></path></svg></a>"##,
        );
        assert!(doc.html.contains(r#"viewBox="0 0 16 16""#));
        assert!(doc.html.contains(r#"<path d="M0 0z" fill-rule="evenodd"></path>"#));
    }

    #[test]
    fn test_math_markup_follows_policy() {
        let html = r#"<p><math display="inline"><msup><mi>x</mi><mn>2</mn></msup></math></p>"#;

        let enhanced = sanitizer().sanitize(html);
        assert!(enhanced.html.contains("<msup><mi>x</mi><mn>2</mn></msup>"));

        let plain = Sanitizer::new(SanitizePolicy {
            allow_math: false,
            ..SanitizePolicy::default()
        })
        .sanitize(html);
        assert_eq!(plain.html, "<p>x2</p>");
    }

    #[test]
    fn test_void_elements_and_images() {
        let doc = sanitizer().sanitize(
            r#"<p>a<br>b</p><img src="data:image/png;base64,AAAA" alt="dot"><img src="javascript:x" alt="bad">"#,
        );
        assert_eq!(
            doc.html,
            r#"<p>a<br>b</p><img alt="dot" src="data:image/png;base64,AAAA"><img alt="bad">"#
        );
    }
}
