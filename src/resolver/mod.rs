// file: src/resolver/mod.rs
// description: content resolution module exports
// reference: internal module structure

pub mod content;
pub mod images;
pub mod transport;

pub use content::ContentResolver;
pub use images::process_image_paths;
pub use transport::{HttpTransport, Transport, TransportError, TransportResponse};
