// file: src/resolver/images.rs
// description: rewrites relative markdown image references to raw content URLs
// reference: https://docs.github.com/en/repositories/working-with-files/using-files/working-with-non-code-files

use crate::config::RepositoryConfig;
use crate::render::normalizer::FenceTracker;
use crate::render::notation::{count_run, find_run};
use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    static ref IMAGE_REFERENCE: Regex =
        Regex::new(r#"!\[([^\]]*)\]\(\s*([^)\s]+)(\s+"[^"]*")?\s*\)"#)
            .expect("IMAGE_REFERENCE regex is valid");
}

/// Rewrites every relative image reference in `markdown` to an absolute raw
/// URL anchored at the directory of `document_path`. Absolute URLs, data
/// URIs and anything inside fenced code or inline code spans are left
/// untouched.
pub fn process_image_paths(
    markdown: &str,
    repo: &RepositoryConfig,
    raw_base: &str,
    document_path: &str,
) -> String {
    let current_dir = match document_path.trim_start_matches('/').rfind('/') {
        Some(idx) => &document_path.trim_start_matches('/')[..idx],
        None => "",
    };

    let mut output = String::with_capacity(markdown.len());
    let mut fence = FenceTracker::default();

    for line in markdown.split_inclusive('\n') {
        if fence.advance(line) {
            output.push_str(line);
            continue;
        }

        rewrite_outside_code_spans(line, &mut output, |prose| {
            IMAGE_REFERENCE.replace_all(prose, |caps: &Captures| {
                rewrite_reference(caps, repo, raw_base, current_dir)
            })
        });
    }

    output
}

/// Copies `line` into `output`, passing only the text outside inline code
/// spans through `rewrite`. Spans are matched within the line.
fn rewrite_outside_code_spans<'a, F, R>(line: &'a str, output: &mut String, rewrite: F)
where
    F: Fn(&'a str) -> R,
    R: AsRef<str>,
{
    let bytes = line.as_bytes();
    let mut prose_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'`' {
            i += 1;
            continue;
        }
        let run = count_run(bytes, i, b'`');
        match find_run(bytes, i + run, b'`', run) {
            Some(close) => {
                output.push_str(rewrite(&line[prose_start..i]).as_ref());
                output.push_str(&line[i..close + run]);
                i = close + run;
                prose_start = i;
            }
            None => i += run,
        }
    }

    output.push_str(rewrite(&line[prose_start..]).as_ref());
}

fn rewrite_reference(
    caps: &Captures,
    repo: &RepositoryConfig,
    raw_base: &str,
    current_dir: &str,
) -> String {
    let alt = &caps[1];
    let target = &caps[2];
    let title = caps.get(3).map(|m| m.as_str()).unwrap_or("");

    if is_absolute(target) {
        return caps[0].to_string();
    }

    let resolved = resolve_relative(current_dir, target);
    format!("![{}]({}{})", alt, repo.raw_url(raw_base, &resolved), title)
}

fn is_absolute(target: &str) -> bool {
    let lower = target.to_ascii_lowercase();
    lower.starts_with("http://")
        || lower.starts_with("https://")
        || lower.starts_with("//")
        || lower.starts_with("data:")
        || lower.starts_with('#')
}

/// Resolves `target` against `current_dir`, collapsing `.` and `..` with a
/// directory stack. A leading `/` anchors at the repository root. Segments
/// are decoded so the raw URL builder can encode them exactly once.
pub fn resolve_relative(current_dir: &str, target: &str) -> String {
    let mut stack: Vec<String> = if target.starts_with('/') {
        Vec::new()
    } else {
        current_dir
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect()
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => {
                let decoded = urlencoding::decode(other)
                    .map(|s| s.into_owned())
                    .unwrap_or_else(|_| other.to_string());
                stack.push(decoded);
            }
        }
    }

    stack.join("/")
}
