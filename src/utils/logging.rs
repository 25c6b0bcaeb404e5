// file: src/utils/logging.rs
// description: Tracing subscriber initialization and colored terminal output helpers

use colored::*;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// `RUST_LOG` wins over the verbosity flag. Calling this twice is a no-op.
pub fn init_logger(colored_output: bool, verbose: bool) {
    let level = if verbose { "dochub=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    colored::control::set_override(colored_output);

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_file(verbose)
        .with_line_number(verbose)
        .compact()
        .with_writer(std::io::stderr)
        .with_ansi(colored_output);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

pub fn format_success(msg: &str) -> String {
    format!("{} {}", "✓".green().bold(), msg.green())
}

pub fn format_error(msg: &str) -> String {
    format!("{} {}", "✗".red().bold(), msg.red())
}

pub fn format_warning(msg: &str) -> String {
    format!("{} {}", "⚠".yellow().bold(), msg.yellow())
}

pub fn format_info(msg: &str) -> String {
    format!("{} {}", "ℹ".blue().bold(), msg)
}

/// Indented directory entry, directories in bold blue.
pub fn format_tree_entry(name: &str, is_dir: bool, depth: usize) -> String {
    let indent = "  ".repeat(depth);
    if is_dir {
        format!("{}{}/", indent, name.blue().bold())
    } else {
        format!("{}{}", indent, name)
    }
}

pub fn format_heading(level: u32, text: &str, id: &str) -> String {
    let indent = "  ".repeat(level.saturating_sub(1) as usize);
    format!("{}{} {}", indent, text.bold(), format!("#{}", id).dimmed())
}
