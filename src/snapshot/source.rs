// file: src/snapshot/source.rs
// description: reads from the pre-published local snapshot of each repository
// reference: static tree.json snapshot layout served next to the viewer

use crate::config::SnapshotLocation;
use crate::models::{FileTreeNode, parse_listing};
use crate::repository::encode_path;
use crate::resolver::transport::Transport;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

pub const TREE_FILE: &str = "tree.json";

/// Where the local snapshot lives. Every read failure is reported as a miss.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SnapshotSource {
    #[default]
    Disabled,
    Directory(PathBuf),
    Http(String),
}

impl SnapshotSource {
    pub fn from_location(location: Option<&SnapshotLocation>) -> Self {
        match location {
            Some(SnapshotLocation::Directory(path)) => SnapshotSource::Directory(path.clone()),
            Some(SnapshotLocation::Url(base)) => {
                SnapshotSource::Http(base.trim_end_matches('/').to_string())
            }
            None => SnapshotSource::Disabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, SnapshotSource::Disabled)
    }

    pub async fn read_markdown(
        &self,
        transport: &dyn Transport,
        repo_id: &str,
        path: &str,
        timeout: Duration,
    ) -> Option<String> {
        let relative = snapshot_path(repo_id, path)?;
        let content = self.read(transport, &relative, timeout).await;
        if content.is_none() {
            debug!("Local file not found: {}, trying cache/API", path);
        }
        content
    }

    pub async fn read_tree(
        &self,
        transport: &dyn Transport,
        repo_id: &str,
        path: &str,
        timeout: Duration,
    ) -> Option<Vec<FileTreeNode>> {
        let tree_path = tree_file_path(path);
        let relative = snapshot_path(repo_id, &tree_path)?;
        let Some(body) = self.read(transport, &relative, timeout).await else {
            debug!(
                "Local file tree not found: {}, trying cache/API",
                if path.is_empty() { "root" } else { path }
            );
            return None;
        };

        match parse_listing(&body) {
            Ok(nodes) => Some(nodes),
            Err(e) => {
                debug!("Ignoring unreadable snapshot tree {}: {}", relative, e);
                None
            }
        }
    }

    async fn read(
        &self,
        transport: &dyn Transport,
        relative: &str,
        timeout: Duration,
    ) -> Option<String> {
        match self {
            SnapshotSource::Disabled => None,
            SnapshotSource::Directory(root) => {
                tokio::fs::read_to_string(root.join(relative)).await.ok()
            }
            SnapshotSource::Http(base) => {
                let url = format!("{}/{}", base, encode_path(relative));
                match transport.get(&url, timeout).await {
                    Ok(response) if response.is_success() => Some(response.body),
                    _ => None,
                }
            }
        }
    }
}

/// `tree.json` for the root, `<dir>/tree.json` for a subdirectory.
pub fn tree_file_path(path: &str) -> String {
    let path = path.trim_matches('/');
    if path.is_empty() {
        TREE_FILE.to_string()
    } else {
        format!("{}/{}", path, TREE_FILE)
    }
}

/// Joins repository id and document path, refusing anything that could
/// escape the snapshot root.
fn snapshot_path(repo_id: &str, path: &str) -> Option<String> {
    let path = path.trim_start_matches('/');
    if path
        .split('/')
        .any(|segment| segment == ".." || segment.contains('\\'))
    {
        debug!("Refusing snapshot path outside repository root: {}", path);
        return None;
    }
    Some(format!("{}/{}", repo_id, path))
}
