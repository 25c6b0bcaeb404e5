// file: src/render/slug.rs
// description: heading slug generation
// reference: GitHub heading anchor conventions

use pulldown_cmark::Event;

/// Lowercases, drops everything but letters, digits, `_`, `-` and
/// whitespace, then turns whitespace and hyphen runs into single hyphens.
/// The slug never starts or ends with a hyphen.
/// Identical headings produce identical slugs; no deduplication happens.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;

    for c in text.trim().to_lowercase().chars() {
        if c.is_whitespace() || c == '-' {
            pending_hyphen = true;
        } else if c.is_alphanumeric() || c == '_' {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        }
    }

    slug
}

/// The text an event contributes to a heading's slug.
pub(crate) fn heading_text<'e>(event: &'e Event<'_>) -> Option<&'e str> {
    match event {
        Event::Text(text) | Event::Code(text) => Some(&**text),
        Event::InlineMath(tex) | Event::DisplayMath(tex) => Some(&**tex),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started!"), "getting-started");
        assert_eq!(slugify("Getting Started!"), slugify("Getting Started!"));
        assert_eq!(slugify("A  --  B"), "a-b");
        assert_eq!(slugify("C++ & Rust_lang"), "c-rust_lang");
        assert_eq!(slugify("  Trim me  "), "trim-me");
        assert_eq!(slugify("Über Graphen"), "über-graphen");
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("Foo -"), "foo");
        assert_eq!(slugify("Step 1 --- "), "step-1");
        assert_eq!(slugify("- Lead"), "lead");
    }
}
