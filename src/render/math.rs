// file: src/render/math.rs
// description: pluggable TeX rendering for inline and display math spans
// reference: https://docs.rs/latex2mathml

use crate::error::{DocHubError, Result};
use crate::render::escape::escape_text;
use crate::render::notation::normalize_math;
use latex2mathml::{DisplayStyle, latex_to_mathml};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathMode {
    Inline,
    Display,
}

impl MathMode {
    fn delimiter(&self) -> &'static str {
        match self {
            MathMode::Inline => "$",
            MathMode::Display => "$$",
        }
    }
}

pub trait MathBackend: Send + Sync {
    fn render(&self, tex: &str, mode: MathMode) -> Result<String>;
}

/// Renders TeX to MathML markup.
#[derive(Debug, Clone, Copy, Default)]
pub struct MathMlBackend;

impl MathBackend for MathMlBackend {
    fn render(&self, tex: &str, mode: MathMode) -> Result<String> {
        let style = match mode {
            MathMode::Inline => DisplayStyle::Inline,
            MathMode::Display => DisplayStyle::Block,
        };

        latex_to_mathml(tex, style).map_err(|e| DocHubError::MathRender {
            span: tex.to_string(),
            message: e.to_string(),
        })
    }
}

/// Renders one span. A failure is logged and the original delimited text
/// is returned escaped, so sibling spans and the document are unaffected.
pub fn render_span(backend: &dyn MathBackend, tex: &str, mode: MathMode) -> String {
    let fallback = || {
        let delimiter = mode.delimiter();
        escape_text(&format!("{}{}{}", delimiter, tex, delimiter))
    };

    if tex.trim().is_empty() {
        return fallback();
    }

    match backend.render(&normalize_math(tex), mode) {
        Ok(markup) => markup,
        Err(e) => {
            warn!("{}", e);
            fallback()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rejecting;

    impl MathBackend for Rejecting {
        fn render(&self, tex: &str, _mode: MathMode) -> Result<String> {
            Err(DocHubError::MathRender {
                span: tex.to_string(),
                message: "unsupported".to_string(),
            })
        }
    }

    struct Echo;

    impl MathBackend for Echo {
        fn render(&self, tex: &str, _mode: MathMode) -> Result<String> {
            Ok(format!("<math>{}</math>", tex))
        }
    }

    #[test]
    fn test_failure_keeps_original_text() {
        assert_eq!(render_span(&Rejecting, "a<b", MathMode::Inline), "$a&lt;b$");
        assert_eq!(render_span(&Rejecting, "x", MathMode::Display), "$$x$$");
    }

    #[test]
    fn test_span_is_normalized_before_rendering() {
        assert_eq!(
            render_span(&Echo, "O(n2)", MathMode::Inline),
            "<math>O(n^{2})</math>"
        );
    }

    #[test]
    fn test_blank_span_is_not_rendered() {
        assert_eq!(render_span(&Echo, "  ", MathMode::Inline), "$  $");
    }

    #[test]
    fn test_mathml_backend() {
        let markup = MathMlBackend.render("x^2", MathMode::Inline).unwrap();
        assert!(markup.starts_with("<math"));
        assert!(markup.contains("msup"));
    }
}
