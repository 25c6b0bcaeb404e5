// file: src/render/escape.rs
// description: HTML text and attribute escaping
// reference: https://docs.rs/pulldown-cmark-escape

use pulldown_cmark_escape::{escape_html, escape_html_body_text};

/// Escapes `&`, `<` and `>` for use in a text node.
pub fn escape_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // writing into a String cannot fail
    let _ = escape_html_body_text(&mut escaped, text);
    escaped
}

/// Escapes quotes as well, for use inside a double- or single-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let _ = escape_html(&mut escaped, value);
    escaped
}
