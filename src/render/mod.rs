// file: src/render/mod.rs
// description: markdown rendering module exports
// reference: internal module structure

pub mod embeds;
pub mod escape;
pub mod markdown;
pub mod math;
pub mod normalizer;
pub mod notation;
pub mod slug;
pub mod toc;

pub use markdown::MarkdownRenderer;
pub use math::{MathBackend, MathMlBackend, MathMode};
pub use normalizer::MarkdownNormalizer;
pub use slug::slugify;
pub use toc::{TableOfContents, TocEntry};
