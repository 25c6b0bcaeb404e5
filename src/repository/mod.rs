// file: src/repository/mod.rs
// description: Repository operations module exports
// reference: Internal module structure

pub mod registry;

pub use registry::{RepositoryRegistry, encode_path};
