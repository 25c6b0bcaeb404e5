// file: src/utils/mod.rs
// description: utility functions module exports
// reference: internal module structure

pub mod logging;
pub mod validation;

pub use validation::{Validator, file_display_name, is_markdown_file, reading_time_minutes};
