// file: src/pipeline/search.rs
// description: in-memory file search across every configured repository
// reference: flattened repository trees matched by name and path

use crate::models::{FlatFile, SearchResult};
use crate::resolver::ContentResolver;
use std::cmp::Ordering;
use tracing::{info, warn};

pub const DEFAULT_LIMIT: usize = 20;

/// Result count for an empty query.
const EMPTY_QUERY_LIMIT: usize = 10;

const DISPLAY_NAME_SCORE: f32 = 3.0;
const FILE_NAME_SCORE: f32 = 2.0;
const PATH_SCORE: f32 = 1.0;
const REPOSITORY_SCORE: f32 = 0.5;

#[derive(Debug, Clone)]
struct IndexedFile {
    file: FlatFile,
    repository_name: String,
    display_lower: String,
    name_lower: String,
    path_lower: String,
    repository_lower: String,
}

#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    files: Vec<IndexedFile>,
}

impl SearchIndex {
    /// Flattens every configured repository. A repository that fails to load
    /// is logged and left out.
    pub async fn build(resolver: &ContentResolver) -> Self {
        let mut index = Self::default();

        for repo in resolver.registry().iter() {
            match resolver.flatten_tree(&repo.id).await {
                Ok(files) => {
                    info!("Indexed {} files from {}", files.len(), repo.id);
                    index.extend(&repo.name, files);
                }
                Err(e) => warn!("Skipping repository {} in search index: {}", repo.id, e),
            }
        }

        index
    }

    pub fn from_files(files: impl IntoIterator<Item = (String, FlatFile)>) -> Self {
        let mut index = Self::default();
        for (repository_name, file) in files {
            index.push(&repository_name, file);
        }
        index
    }

    pub fn extend(&mut self, repository_name: &str, files: Vec<FlatFile>) {
        for file in files {
            self.push(repository_name, file);
        }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Case-insensitive substring match. Display name matches rank first,
    /// then file name, path and repository name; ties keep index order.
    pub fn query(&self, text: &str, limit: usize) -> Vec<SearchResult> {
        let needle = text.trim().to_lowercase();

        if needle.is_empty() {
            return self
                .files
                .iter()
                .take(limit.min(EMPTY_QUERY_LIMIT))
                .map(|f| SearchResult::from_file(&f.file, &f.repository_name, 0.0))
                .collect();
        }

        let mut hits: Vec<SearchResult> = self
            .files
            .iter()
            .filter_map(|f| {
                let score = score(f, &needle);
                (score > 0.0).then(|| SearchResult::from_file(&f.file, &f.repository_name, score))
            })
            .collect();

        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        hits.truncate(limit);
        hits
    }

    fn push(&mut self, repository_name: &str, file: FlatFile) {
        self.files.push(IndexedFile {
            display_lower: file.display_name.to_lowercase(),
            name_lower: file.name.to_lowercase(),
            path_lower: file.path.to_lowercase(),
            repository_lower: repository_name.to_lowercase(),
            repository_name: repository_name.to_string(),
            file,
        });
    }
}

fn score(file: &IndexedFile, needle: &str) -> f32 {
    if file.display_lower.contains(needle) {
        DISPLAY_NAME_SCORE
    } else if file.name_lower.contains(needle) {
        FILE_NAME_SCORE
    } else if file.path_lower.contains(needle) {
        PATH_SCORE
    } else if file.repository_lower.contains(needle) {
        REPOSITORY_SCORE
    } else {
        0.0
    }
}
