// file: src/snapshot/mod.rs
// description: local snapshot module exports
// reference: internal module structure

pub mod generator;
pub mod source;

pub use generator::{SnapshotSummary, TreeGenerator};
pub use source::{SnapshotSource, TREE_FILE, tree_file_path};
