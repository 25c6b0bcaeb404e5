// file: src/render/normalizer.rs
// description: Markdown normalization for structural consistency
// reference: https://spec.commonmark.org/0.31.2/#line-ending

use crate::error::Result;

pub struct MarkdownNormalizer;

impl MarkdownNormalizer {
    pub fn new() -> Self {
        Self
    }

    pub fn normalize(&self, content: &str) -> Result<String> {
        let mut normalized = self.strip_bom(content).to_string();

        normalized = self.normalize_line_endings(&normalized);
        normalized = self.normalize_headings(&normalized);
        normalized = self.collapse_blank_lines(&normalized);

        if !normalized.is_empty() && !normalized.ends_with('\n') {
            normalized.push('\n');
        }

        Ok(normalized)
    }

    fn strip_bom<'a>(&self, content: &'a str) -> &'a str {
        content.strip_prefix('\u{feff}').unwrap_or(content)
    }

    fn normalize_line_endings(&self, content: &str) -> String {
        content.replace("\r\n", "\n").replace('\r', "\n")
    }

    /// `#Title` becomes `# Title`. Lines that look like tags (`#rust`)
    /// are left alone; only `#` runs followed by an uppercase letter or
    /// digit are treated as headings missing their space.
    fn normalize_headings(&self, content: &str) -> String {
        let mut result = Vec::new();
        let mut fence = FenceTracker::default();

        for line in content.split('\n') {
            if fence.advance(line) {
                result.push(line.to_string());
                continue;
            }

            let level = line.chars().take_while(|&c| c == '#').count();
            let rest = &line[level..];
            let needs_space = (1..=6).contains(&level)
                && rest
                    .chars()
                    .next()
                    .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit());

            if needs_space {
                result.push(format!("{} {}", "#".repeat(level), rest));
            } else {
                result.push(line.to_string());
            }
        }

        result.join("\n")
    }

    /// Runs of two or more blank lines shrink to one. Fenced code, `$$`
    /// math blocks and indented code keep their blank lines.
    fn collapse_blank_lines(&self, content: &str) -> String {
        let mut result: Vec<&str> = Vec::new();
        let mut blanks: Vec<&str> = Vec::new();
        let mut fence = FenceTracker::default();
        let mut in_math = false;
        let mut in_indented_code = false;

        for line in content.split('\n') {
            let verbatim = fence.is_open() || in_math;
            if !verbatim && line.trim().is_empty() {
                blanks.push(line);
                continue;
            }

            if !blanks.is_empty() {
                if in_indented_code && is_indented(line) {
                    result.append(&mut blanks);
                } else {
                    result.push(blanks[0]);
                    blanks.clear();
                }
            }
            let after_blank = result.last().is_none_or(|l| l.trim().is_empty());

            if in_math {
                in_math = !closes_math_block(line);
            } else if fence.advance(line) {
                in_indented_code = false;
            } else if is_indented(line) && (in_indented_code || after_blank) {
                in_indented_code = true;
            } else {
                in_indented_code = false;
                in_math = opens_math_block(line);
            }
            result.push(line);
        }

        if let Some(&blank) = blanks.first() {
            result.push(blank);
        }

        result.join("\n")
    }
}

/// Tracks fenced code across lines. A fence closes only on a bare run of
/// its own character at least as long as the one that opened it.
#[derive(Debug, Default)]
pub(crate) struct FenceTracker {
    open: Option<(char, usize)>,
}

impl FenceTracker {
    /// Feeds one line. Returns true when the line is a fence delimiter or
    /// lies inside a fence.
    pub(crate) fn advance(&mut self, line: &str) -> bool {
        let marker = fence_marker(line);
        match (self.open, marker) {
            (None, Some((c, len, _))) => {
                self.open = Some((c, len));
                true
            }
            (Some((open_c, open_len)), Some((c, len, true))) if c == open_c && len >= open_len => {
                self.open = None;
                true
            }
            (Some(_), _) => true,
            (None, None) => false,
        }
    }

    pub(crate) fn is_open(&self) -> bool {
        self.open.is_some()
    }
}

/// Fence character, run length and whether nothing follows the run.
fn fence_marker(line: &str) -> Option<(char, usize, bool)> {
    let body = line.trim_start_matches(' ');
    if line.len() - body.len() > 3 {
        return None;
    }

    let c = body.chars().next().filter(|&c| c == '`' || c == '~')?;
    let len = body.chars().take_while(|&x| x == c).count();
    (len >= 3).then(|| (c, len, body[len..].trim().is_empty()))
}

fn is_indented(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

fn opens_math_block(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.starts_with("$$") && !(trimmed.len() > 2 && trimmed.ends_with("$$"))
}

fn closes_math_block(line: &str) -> bool {
    line.trim().ends_with("$$")
}

impl Default for MarkdownNormalizer {
    fn default() -> Self {
        Self::new()
    }
}
