// file: src/sanitizer/policy.rs
// description: tag, attribute and URL allow-lists for rendered documents
// reference: https://cheatsheetseries.owasp.org/cheatsheets/Cross_Site_Scripting_Prevention_Cheat_Sheet.html

use crate::config::RendererConfig;

const ALLOWED_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "br", "strong", "em", "b", "i", "u", "s", "del",
    "ins", "sup", "sub", "kbd", "mark", "ul", "ol", "li", "a", "img", "iframe", "table", "thead",
    "tbody", "tfoot", "tr", "th", "td", "pre", "code", "blockquote", "hr", "div", "span", "svg",
    "path", "button", "input",
];

const MATH_TAGS: &[&str] = &[
    "math", "semantics", "annotation", "mrow", "mi", "mn", "mo", "ms", "mtext", "mspace", "msup",
    "msub", "msubsup", "mfrac", "msqrt", "mroot", "mstyle", "merror", "mpadded", "mphantom",
    "mfenced", "menclose", "mover", "munder", "munderover", "mtable", "mtr", "mtd",
    "mmultiscripts", "mprescripts", "none",
];

const ALLOWED_ATTRIBUTES: &[&str] = &[
    "href", "src", "alt", "title", "class", "id", "target", "rel", "loading", "aria-label",
    "aria-hidden", "type", "checked", "disabled", "fill", "viewbox", "fill-rule", "clip-rule",
    "d", "stroke-linecap", "stroke-linejoin", "stroke-width", "stroke", "frameborder",
    "allowfullscreen", "allow", "width", "height", "start", "colspan", "rowspan", "align",
];

const MATH_ATTRIBUTES: &[&str] = &[
    "display", "mathvariant", "mathsize", "stretchy", "fence", "separator", "lspace", "rspace",
    "accent", "accentunder", "movablelimits", "largeop", "symmetric", "minsize", "maxsize",
    "linethickness", "columnalign", "rowalign", "columnspacing", "rowspacing", "columnlines",
    "rowlines", "frame", "notation", "displaystyle", "scriptlevel", "open", "close",
    "separators", "form", "depth", "voffset", "encoding",
];

/// Removed together with everything inside them.
const DROPPED_WITH_CONTENT: &[&str] = &[
    "script", "style", "noscript", "template", "object", "embed", "applet", "frame", "frameset",
    "noframes", "noembed", "xmp", "plaintext", "title", "textarea", "select", "head", "meta",
    "link", "base",
];

const VOID_TAGS: &[&str] = &["br", "hr", "img", "input", "wbr"];

const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto", "tel"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SanitizePolicy {
    pub allow_math: bool,
    pub allow_inline_style: bool,
    pub allow_data_attributes: bool,
    pub open_links_in_new_tab: bool,
}

impl Default for SanitizePolicy {
    fn default() -> Self {
        Self::from_config(&RendererConfig::default())
    }
}

impl SanitizePolicy {
    pub fn from_config(config: &RendererConfig) -> Self {
        Self {
            allow_math: config.enhanced,
            allow_inline_style: config.allow_inline_style,
            allow_data_attributes: config.allow_data_attributes,
            open_links_in_new_tab: config.open_links_in_new_tab,
        }
    }

    /// `tag` must already be lowercase.
    pub fn allows_tag(&self, tag: &str) -> bool {
        ALLOWED_TAGS.contains(&tag) || (self.allow_math && MATH_TAGS.contains(&tag))
    }

    /// `name` must already be lowercase.
    pub fn allows_attribute(&self, name: &str, value: &str) -> bool {
        if ALLOWED_ATTRIBUTES.contains(&name) {
            return true;
        }
        if self.allow_math && MATH_ATTRIBUTES.contains(&name) {
            return true;
        }
        if name == "style" {
            return self.allow_inline_style && is_safe_style(value);
        }
        if let Some(rest) = name.strip_prefix("data-") {
            return self.allow_data_attributes
                && !rest.is_empty()
                && rest
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        }
        false
    }
}

pub fn is_dropped_with_content(tag: &str) -> bool {
    DROPPED_WITH_CONTENT.contains(&tag)
}

pub fn is_void(tag: &str) -> bool {
    VOID_TAGS.contains(&tag)
}

pub fn is_url_attribute(name: &str) -> bool {
    matches!(name, "href" | "src")
}

/// Relative URLs and a few schemes are allowed. `img` may also carry inline
/// raster data, and `iframe` only loads http(s).
pub fn is_safe_url(tag: &str, value: &str) -> bool {
    let cleaned: String = value
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_control())
        .collect::<String>()
        .to_ascii_lowercase();

    let scheme_end = cleaned.find(':');
    let path_start = cleaned.find(['/', '?', '#']);
    let scheme = match (scheme_end, path_start) {
        (Some(colon), Some(path)) if path < colon => None,
        (Some(colon), _) => Some(&cleaned[..colon]),
        (None, _) => None,
    };

    match (tag, scheme) {
        ("iframe", Some(scheme)) => matches!(scheme, "http" | "https"),
        ("iframe", None) => false,
        (_, None) => true,
        ("img", Some("data")) => {
            cleaned.starts_with("data:image/") && !cleaned.starts_with("data:image/svg")
        }
        (_, Some(scheme)) => SAFE_SCHEMES.contains(&scheme),
    }
}

fn is_safe_style(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    !(lower.contains("javascript:")
        || lower.contains("expression(")
        || lower.contains("url(")
        || lower.contains("@import"))
}
