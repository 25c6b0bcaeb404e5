// file: src/models/mod.rs
// description: data models module exports
// reference: internal module structure

pub mod document;
pub mod file_tree;
pub mod search_result;

pub use document::{EmbedDescriptor, EmbedKind, RenderedDocument, Segment};
pub use file_tree::{FileTreeNode, NodeKind, parse_listing, sort_nodes};
pub use search_result::{FlatFile, SearchResult};
