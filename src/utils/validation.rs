// file: src/utils/validation.rs
// description: document path validation and file naming helpers
// reference: input validation patterns

use crate::error::{DocHubError, Result};
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref MARKDOWN_EXTENSION: Regex =
        Regex::new(r"(?i)\.(md|mdx|markdown)$").expect("MARKDOWN_EXTENSION regex is valid");
    static ref LEADING_ORDER_PREFIX: Regex =
        Regex::new(r"^\d+[._\s]*").expect("LEADING_ORDER_PREFIX regex is valid");
    static ref FENCED_CODE: Regex =
        Regex::new(r"(?s)```.*?```").expect("FENCED_CODE regex is valid");
    static ref INLINE_CODE: Regex = Regex::new(r"`[^`]+`").expect("INLINE_CODE regex is valid");
    static ref HTML_TAG: Regex = Regex::new(r"<[^>]+>").expect("HTML_TAG regex is valid");
    static ref MARKDOWN_LINK: Regex =
        Regex::new(r"\[([^\]]+)\]\([^)]+\)").expect("MARKDOWN_LINK regex is valid");
    static ref FORMATTING: Regex = Regex::new(r"[#*_~`]").expect("FORMATTING regex is valid");
}

const WORDS_PER_MINUTE: usize = 100;

pub struct Validator;

impl Validator {
    /// Rejects empty paths and any `..` segment.
    pub fn validate_document_path(path: &str) -> Result<()> {
        let trimmed = path.trim().trim_matches('/');
        if trimmed.is_empty() {
            return Err(DocHubError::Validation("Document path is empty".to_string()));
        }

        if trimmed.split('/').any(|segment| segment == "..") {
            return Err(DocHubError::Validation(format!(
                "Path traversal detected in {}",
                path
            )));
        }

        Ok(())
    }

    /// Directory paths may be empty (the repository root).
    pub fn validate_directory_path(path: &str) -> Result<()> {
        if path.split('/').any(|segment| segment == "..") {
            return Err(DocHubError::Validation(format!(
                "Path traversal detected in {}",
                path
            )));
        }
        Ok(())
    }

    pub fn validate_url(url: &str) -> Result<()> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(DocHubError::Validation(format!(
                "Invalid URL format: {}",
                url
            )));
        }
        Ok(())
    }
}

pub fn is_markdown_file(filename: &str) -> bool {
    MARKDOWN_EXTENSION.is_match(filename)
}

/// `01-getting_started.md` -> `getting started`.
pub fn file_display_name(filename: &str) -> String {
    let without_extension = MARKDOWN_EXTENSION.replace(filename, "");
    let spaced = without_extension.replace(['-', '_'], " ");
    LEADING_ORDER_PREFIX.replace(&spaced, "").to_string()
}

/// Estimated reading time at 100 words per minute, never less than one.
pub fn reading_time_minutes(markdown: &str) -> usize {
    let text = FENCED_CODE.replace_all(markdown, "");
    let text = INLINE_CODE.replace_all(&text, "");
    let text = HTML_TAG.replace_all(&text, "");
    let text = MARKDOWN_LINK.replace_all(&text, "$1");
    let text = FORMATTING.replace_all(&text, "");

    let words = text.split_whitespace().count();
    words.div_ceil(WORDS_PER_MINUTE).max(1)
}
