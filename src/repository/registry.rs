// file: src/repository/registry.rs
// description: configured repository lookup and GitHub endpoint construction
// reference: https://docs.github.com/en/rest/repos/contents

use crate::config::RepositoryConfig;
use crate::error::{DocHubError, Result};
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct RepositoryRegistry {
    repositories: Vec<RepositoryConfig>,
}

impl RepositoryRegistry {
    pub fn new(repositories: Vec<RepositoryConfig>) -> Self {
        Self { repositories }
    }

    pub fn get(&self, id: &str) -> Option<&RepositoryConfig> {
        self.repositories.iter().find(|r| r.id == id)
    }

    /// Like [`get`](Self::get) but an unknown id is a configuration error.
    pub fn require(&self, id: &str) -> Result<&RepositoryConfig> {
        self.get(id).ok_or_else(|| {
            debug!("No repository configured with id {}", id);
            DocHubError::NotFound(id.to_string())
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &RepositoryConfig> {
        self.repositories.iter()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.repositories.iter().map(|r| r.id.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.repositories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }
}

impl RepositoryConfig {
    /// Raw document URL: `{raw_base}/{owner}/{repo}/{branch}/{base_path}/{path}`.
    pub fn raw_url(&self, raw_base: &str, path: &str) -> String {
        let mut url = format!(
            "{}/{}/{}/{}",
            raw_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.branch
        );

        if let Some(base) = self.base_segment() {
            url.push('/');
            url.push_str(&encode_path(base));
        }

        url.push('/');
        url.push_str(&encode_path(path.trim_start_matches('/')));
        url
    }

    /// Directory listing URL on the contents API, pinned to the configured branch.
    pub fn contents_url(&self, api_base: &str, path: &str) -> String {
        let mut url = format!(
            "{}/repos/{}/{}/contents",
            api_base.trim_end_matches('/'),
            self.owner,
            self.repo
        );

        if let Some(base) = self.base_segment() {
            url.push('/');
            url.push_str(&encode_path(base));
        }

        let path = path.trim_matches('/');
        if !path.is_empty() {
            url.push('/');
            url.push_str(&encode_path(path));
        }

        url.push_str("?ref=");
        url.push_str(&urlencoding::encode(&self.branch));
        url
    }

    pub fn web_url(&self) -> String {
        format!("https://github.com/{}/{}", self.owner, self.repo)
    }

    /// The configured subdirectory without surrounding slashes, if any.
    pub fn base_segment(&self) -> Option<&str> {
        self.base_path
            .as_deref()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
    }
}

/// Percent-encodes each path segment on its own so `/` separators survive
/// while characters such as `#` or spaces inside file names do not.
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(base_path: Option<&str>) -> RepositoryConfig {
        RepositoryConfig {
            id: "dsa".to_string(),
            name: "Data Structures & Algorithms".to_string(),
            owner: "octo".to_string(),
            repo: "algorithms".to_string(),
            branch: "main".to_string(),
            base_path: base_path.map(str::to_string),
            description: None,
            icon: None,
        }
    }

    #[test]
    fn test_require_unknown_id() {
        let registry = RepositoryRegistry::new(vec![sample(None)]);
        assert!(registry.get("dsa").is_some());
        assert!(matches!(
            registry.require("nope"),
            Err(DocHubError::NotFound(id)) if id == "nope"
        ));
    }

    #[test]
    fn test_raw_url_encodes_segments() {
        let repo = sample(None);
        let url = repo.raw_url(
            "https://raw.githubusercontent.com",
            "/C# Notes/arrays & lists.md",
        );
        assert_eq!(
            url,
            "https://raw.githubusercontent.com/octo/algorithms/main/C%23%20Notes/arrays%20%26%20lists.md"
        );
    }

    #[test]
    fn test_raw_url_with_base_path() {
        let repo = sample(Some("/docs/"));
        let url = repo.raw_url("https://raw.example.com/", "intro.md");
        assert_eq!(url, "https://raw.example.com/octo/algorithms/main/docs/intro.md");
    }

    #[test]
    fn test_contents_url() {
        let repo = sample(Some("docs"));
        assert_eq!(
            repo.contents_url("https://api.github.com", ""),
            "https://api.github.com/repos/octo/algorithms/contents/docs?ref=main"
        );
        assert_eq!(
            repo.contents_url("https://api.github.com", "trees/binary"),
            "https://api.github.com/repos/octo/algorithms/contents/docs/trees/binary?ref=main"
        );
    }
}
