// file: src/snapshot/generator.rs
// description: builds tree.json listings and the local snapshot layout from a checkout
// reference: https://docs.rs/walkdir

use crate::error::{DocHubError, Result};
use crate::models::{FileTreeNode, sort_nodes};
use crate::snapshot::source::TREE_FILE;
use crate::utils::validation::is_markdown_file;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

const MAX_DEPTH: usize = 10;
const SKIPPED_NAMES: [&str; 2] = [TREE_FILE, "temp"];

pub struct TreeGenerator {
    max_depth: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub files_copied: usize,
    pub trees_written: usize,
}

impl TreeGenerator {
    pub fn new() -> Self {
        Self {
            max_depth: MAX_DEPTH,
        }
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Listing of `root`: directories (recursively) and markdown files only.
    pub fn generate(&self, root: &Path) -> Result<Vec<FileTreeNode>> {
        if !root.is_dir() {
            return Err(DocHubError::Validation(format!(
                "Directory does not exist: {}",
                root.display()
            )));
        }

        let mut levels: BTreeMap<String, Vec<FileTreeNode>> = BTreeMap::new();

        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(self.max_depth)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !should_skip(e))
            .filter_map(|e| e.ok())
        {
            let relative_path = entry
                .path()
                .strip_prefix(root)
                .unwrap_or(entry.path())
                .to_string_lossy()
                .replace('\\', "/");
            let name = entry.file_name().to_string_lossy().to_string();
            let parent = match relative_path.rfind('/') {
                Some(idx) => relative_path[..idx].to_string(),
                None => String::new(),
            };

            if entry.file_type().is_dir() {
                levels
                    .entry(parent)
                    .or_default()
                    .push(FileTreeNode::directory(&name, &relative_path, None));
            } else if entry.file_type().is_file() && is_markdown_file(&name) {
                let size = entry.metadata().map(|m| m.len()).unwrap_or(0);
                levels
                    .entry(parent)
                    .or_default()
                    .push(FileTreeNode::file(&name, &relative_path, size));
            } else {
                debug!("Skipping non-markdown file: {}", relative_path);
            }
        }

        let mut tree = assemble(&mut levels, "");
        sort_nodes(&mut tree);
        Ok(tree)
    }

    /// Copies markdown files from `root` into `out_dir` and writes a
    /// `tree.json` describing every directory level.
    pub fn write_snapshot(&self, root: &Path, out_dir: &Path) -> Result<SnapshotSummary> {
        info!(
            "Generating snapshot of {} into {}",
            root.display(),
            out_dir.display()
        );
        let tree = self.generate(root)?;
        let mut summary = SnapshotSummary::default();

        write_level(root, out_dir, "", &tree, &mut summary)?;

        info!(
            "Snapshot complete: {} files, {} tree listings",
            summary.files_copied, summary.trees_written
        );
        Ok(summary)
    }
}

impl Default for TreeGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn should_skip(entry: &DirEntry) -> bool {
    let name = entry.file_name().to_string_lossy();
    entry.depth() > 0 && (name.starts_with('.') || SKIPPED_NAMES.contains(&name.as_ref()))
}

fn assemble(levels: &mut BTreeMap<String, Vec<FileTreeNode>>, dir: &str) -> Vec<FileTreeNode> {
    let mut nodes = levels.remove(dir).unwrap_or_default();
    for node in nodes.iter_mut().filter(|n| n.is_dir()) {
        let children = assemble(levels, &node.path);
        node.children = if children.is_empty() {
            None
        } else {
            Some(children)
        };
    }
    nodes
}

fn write_level(
    root: &Path,
    out_dir: &Path,
    dir: &str,
    nodes: &[FileTreeNode],
    summary: &mut SnapshotSummary,
) -> Result<()> {
    let target_dir = out_dir.join(dir);
    fs::create_dir_all(&target_dir)?;
    fs::write(
        target_dir.join(TREE_FILE),
        serde_json::to_string_pretty(nodes)?,
    )?;
    summary.trees_written += 1;

    for node in nodes {
        if node.is_dir() {
            let children = node.children.as_deref().unwrap_or_default();
            write_level(root, out_dir, &node.path, children, summary)?;
        } else {
            fs::copy(root.join(&node.path), out_dir.join(&node.path))?;
            summary.files_copied += 1;
        }
    }

    Ok(())
}
