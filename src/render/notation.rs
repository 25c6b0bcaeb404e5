// file: src/render/notation.rs
// description: rewrites shorthand complexity and logarithm notation into TeX
// reference: https://en.wikibooks.org/wiki/LaTeX/Mathematics

use crate::render::normalizer::FenceTracker;
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// `Log{_b}{a}` -> log base b of a
    static ref LOG_SHORTHAND: Regex = Regex::new(r"[Ll]og\{_([A-Za-z0-9]+)\}\{([A-Za-z0-9]+)\}")
        .expect("LOG_SHORTHAND regex is valid");
    /// `O(n2)`, `Θ(n3)`, `Ω(nc)` -> single-letter base raised to a single-digit or `c` exponent
    static ref POWER_SHORTHAND: Regex = Regex::new(r"([OΘΩ])\(([A-Za-z])([2-9]|c)\)")
        .expect("POWER_SHORTHAND regex is valid");
}

const LEADING_DELIMITERS: &[char] = &['(', '[', '{', ',', ';', ':', '*', '_', '"', '\'', '|', '/'];
const TRAILING_DELIMITERS: &[char] = &[
    '.', ',', ';', ':', '!', '?', ')', ']', '}', '*', '_', '"', '\'', '|', '/',
];

/// Rewrites shorthand inside a math span. Only the notation itself is
/// touched; an alphanumeric or `\` right before it blocks the rewrite.
pub fn normalize_math(tex: &str) -> String {
    let logs = rewrite(tex, &LOG_SHORTHAND, math_boundary, |_| true, log_tex);
    rewrite(&logs, &POWER_SHORTHAND, math_boundary, |_| true, power_tex)
}

/// Rewrites shorthand found in prose into inline math. Fenced code, inline
/// code and existing math spans are skipped, and a match is only rewritten
/// when it is framed by whitespace or one of a few punctuation delimiters.
pub fn normalize_notation(markdown: &str) -> String {
    let mut output = String::with_capacity(markdown.len());
    let mut fence = FenceTracker::default();
    let mut in_display_math = false;

    for line in markdown.split_inclusive('\n') {
        let trimmed = line.trim();

        if fence.advance(line) {
            output.push_str(line);
            continue;
        }
        if trimmed == "$$" {
            in_display_math = !in_display_math;
            output.push_str(line);
            continue;
        }
        if in_display_math {
            output.push_str(line);
            continue;
        }

        for (kind, text) in split_inline(line) {
            match kind {
                InlineKind::Prose => output.push_str(&normalize_prose(text)),
                InlineKind::Code | InlineKind::Math => output.push_str(text),
            }
        }
    }

    output
}

fn normalize_prose(text: &str) -> String {
    let wrap = |tex: String| format!("${}$", tex);
    let logs = rewrite(
        text,
        &LOG_SHORTHAND,
        prose_leading,
        prose_trailing,
        |caps| wrap(log_tex(caps)),
    );
    rewrite(
        &logs,
        &POWER_SHORTHAND,
        prose_leading,
        prose_trailing,
        |caps| wrap(power_tex(caps)),
    )
}

fn log_tex(caps: &Captures) -> String {
    format!("\\log_{{{}}}{{{}}}", &caps[1], &caps[2])
}

fn power_tex(caps: &Captures) -> String {
    format!("{}({}^{{{}}})", tex_symbol(&caps[1]), &caps[2], &caps[3])
}

fn tex_symbol(symbol: &str) -> &str {
    match symbol {
        "Θ" => "\\Theta",
        "Ω" => "\\Omega",
        other => other,
    }
}

/// Replaces matches of `pattern` whose surroundings pass both checks.
fn rewrite(
    text: &str,
    pattern: &Regex,
    leading_ok: fn(Option<char>) -> bool,
    trailing_ok: impl Fn(Option<char>) -> bool,
    replacement: impl Fn(&Captures) -> String,
) -> String {
    let mut output = String::with_capacity(text.len());
    let mut last = 0;

    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();

        if leading_ok(before) && trailing_ok(after) {
            output.push_str(&text[last..whole.start()]);
            output.push_str(&replacement(&caps));
            last = whole.end();
        }
    }

    output.push_str(&text[last..]);
    output
}

fn math_boundary(before: Option<char>) -> bool {
    before.is_none_or(|c| !c.is_alphanumeric() && c != '\\')
}

fn prose_leading(before: Option<char>) -> bool {
    before.is_none_or(|c| c.is_whitespace() || LEADING_DELIMITERS.contains(&c))
}

fn prose_trailing(after: Option<char>) -> bool {
    after.is_none_or(|c| c.is_whitespace() || TRAILING_DELIMITERS.contains(&c))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineKind {
    Prose,
    Code,
    Math,
}

/// Splits one line into prose, inline code and `$`/`$$` math runs.
/// Unterminated code or math openers are treated as prose.
fn split_inline(line: &str) -> Vec<(InlineKind, &str)> {
    let bytes = line.as_bytes();
    let mut parts = Vec::new();
    let mut prose_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => {
                let run = count_run(bytes, i, b'`');
                match find_run(bytes, i + run, b'`', run) {
                    Some(close) => {
                        push_prose(&mut parts, line, prose_start, i);
                        parts.push((InlineKind::Code, &line[i..close + run]));
                        i = close + run;
                        prose_start = i;
                    }
                    None => i += run,
                }
            }
            b'$' => {
                let run = count_run(bytes, i, b'$').min(2);
                match find_run(bytes, i + run, b'$', run) {
                    Some(close) if close > i + run => {
                        push_prose(&mut parts, line, prose_start, i);
                        parts.push((InlineKind::Math, &line[i..close + run]));
                        i = close + run;
                        prose_start = i;
                    }
                    _ => i += run,
                }
            }
            _ => i += 1,
        }
    }

    push_prose(&mut parts, line, prose_start, line.len());
    parts
}

fn push_prose<'a>(parts: &mut Vec<(InlineKind, &'a str)>, line: &'a str, start: usize, end: usize) {
    if start < end {
        parts.push((InlineKind::Prose, &line[start..end]));
    }
}

pub(crate) fn count_run(bytes: &[u8], start: usize, byte: u8) -> usize {
    bytes[start..].iter().take_while(|&&b| b == byte).count()
}

/// Next run of exactly `len` copies of `byte` at or after `from`.
pub(crate) fn find_run(bytes: &[u8], from: usize, byte: u8, len: usize) -> Option<usize> {
    let mut i = from;
    while i < bytes.len() {
        if bytes[i] == byte {
            let run = count_run(bytes, i, byte);
            if run == len {
                return Some(i);
            }
            i += run;
        } else {
            i += 1;
        }
    }
    None
}
