// file: src/models/file_tree.rs
// description: file tree entries shared by tree.json snapshots and the contents API
// reference: https://docs.github.com/en/rest/repos/contents

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "file")]
    File,
    #[serde(rename = "dir")]
    Directory,
}

/// One entry of a repository listing. `children` is only populated when a
/// snapshot ships nested listings or a directory has been expanded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileTreeNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<FileTreeNode>>,
}

impl FileTreeNode {
    pub fn file(name: &str, path: &str, size: u64) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::File,
            sha: String::new(),
            size: Some(size),
            children: None,
        }
    }

    pub fn directory(name: &str, path: &str, children: Option<Vec<FileTreeNode>>) -> Self {
        Self {
            name: name.to_string(),
            path: path.to_string(),
            kind: NodeKind::Directory,
            sha: String::new(),
            size: None,
            children,
        }
    }

    pub fn is_dir(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }
}

/// Directories first, then lexicographic by name, applied at every level.
pub fn sort_nodes(nodes: &mut [FileTreeNode]) {
    nodes.sort_by(|a, b| match (a.kind, b.kind) {
        (NodeKind::Directory, NodeKind::File) => Ordering::Less,
        (NodeKind::File, NodeKind::Directory) => Ordering::Greater,
        _ => a.name.cmp(&b.name),
    });

    for node in nodes.iter_mut() {
        if let Some(children) = node.children.as_mut() {
            sort_nodes(children);
        }
    }
}

/// Parses a listing body. Both endpoints answer with an array, or with a
/// single object when the path names one file. Entries of other kinds
/// (symlinks, submodules) are skipped.
pub fn parse_listing(body: &str) -> Result<Vec<FileTreeNode>> {
    let value: serde_json::Value = serde_json::from_str(body)?;

    let entries = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };

    let mut nodes: Vec<FileTreeNode> = entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<FileTreeNode>(entry) {
            Ok(node) => Some(node),
            Err(e) => {
                debug!("Skipping unsupported listing entry: {}", e);
                None
            }
        })
        .collect();

    sort_nodes(&mut nodes);
    Ok(nodes)
}

/// Rewrites API paths (which include the configured base path) so they are
/// relative to the documentation root, like snapshot paths.
pub fn strip_base_path(nodes: &mut [FileTreeNode], base: &str) {
    let prefix = format!("{}/", base.trim_matches('/'));
    for node in nodes.iter_mut() {
        if let Some(stripped) = node.path.strip_prefix(&prefix) {
            node.path = stripped.to_string();
        }
        if let Some(children) = node.children.as_mut() {
            strip_base_path(children, base);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directories_sort_before_files() {
        let mut nodes = vec![
            FileTreeNode::file("b.md", "b.md", 10),
            FileTreeNode::directory("zeta", "zeta", None),
            FileTreeNode::file("a.md", "a.md", 10),
            FileTreeNode::directory("alpha", "alpha", None),
        ];
        sort_nodes(&mut nodes);

        let names: Vec<&str> = nodes.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta", "a.md", "b.md"]);
    }

    #[test]
    fn test_parse_listing_accepts_single_object() {
        let body = r#"{"name":"README.md","path":"README.md","type":"file","sha":"abc","size":42}"#;
        let nodes = parse_listing(body).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].size, Some(42));
        assert!(nodes[0].is_file());
    }

    #[test]
    fn test_parse_listing_skips_symlinks() {
        let body = r#"[
            {"name":"link","path":"link","type":"symlink","sha":"1"},
            {"name":"guide","path":"guide","type":"dir","sha":"2"},
            {"name":"intro.md","path":"intro.md","type":"file","sha":"3","size":7,
             "download_url":"https://raw.githubusercontent.com/x/y/main/intro.md"}
        ]"#;
        let nodes = parse_listing(body).unwrap();
        assert_eq!(nodes.len(), 2);
        assert!(nodes[0].is_dir());
        assert_eq!(nodes[1].name, "intro.md");
    }

    #[test]
    fn test_strip_base_path() {
        let mut nodes = vec![FileTreeNode::file("a.md", "docs/a.md", 1)];
        strip_base_path(&mut nodes, "/docs");
        assert_eq!(nodes[0].path, "a.md");
    }

    #[test]
    fn test_tree_json_shape() {
        let node = FileTreeNode::directory(
            "guide",
            "guide",
            Some(vec![FileTreeNode::file("a.md", "guide/a.md", 3)]),
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "dir");
        assert_eq!(json["children"][0]["type"], "file");
        assert!(json.get("size").is_none());
    }
}
