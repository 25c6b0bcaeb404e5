// file: src/models/search_result.rs
// description: flattened file listing and search hit models
// reference: used by the cross-repository file search

use serde::{Deserialize, Serialize};

/// A markdown file discovered by flattening a repository tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlatFile {
    pub repository_id: String,
    pub path: String,
    pub name: String,
    pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Repository identifier the file belongs to
    pub repository_id: String,

    /// Human readable repository name
    pub repository_name: String,

    /// Path relative to the documentation root
    pub path: String,

    pub display_name: String,

    /// Higher is better; name matches outrank path-only matches
    pub score: f32,
}

impl SearchResult {
    pub fn from_file(file: &FlatFile, repository_name: &str, score: f32) -> Self {
        Self {
            repository_id: file.repository_id.clone(),
            repository_name: repository_name.to_string(),
            path: file.path.clone(),
            display_name: file.display_name.clone(),
            score,
        }
    }
}
