// file: src/exporter/mod.rs
// description: document export module exports
// reference: internal module structure

pub mod json;

pub use json::{DocumentExporter, ExportFormat, ExportedDocument};
