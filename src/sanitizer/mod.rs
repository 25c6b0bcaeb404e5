// file: src/sanitizer/mod.rs
// description: HTML sanitizer module exports
// reference: internal module structure

pub mod policy;
pub mod walker;

pub use policy::{SanitizePolicy, is_safe_url};
pub use walker::Sanitizer;
