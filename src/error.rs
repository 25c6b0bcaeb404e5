// file: src/error.rs
// description: Custom error types and result type aliases
// reference: https://docs.rs/thiserror

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DocHubError>;

#[derive(Error, Debug)]
pub enum DocHubError {
    #[error("Topic not found: {0}")]
    NotFound(String),

    #[error(
        "GitHub API rate limit exceeded. Please try again later, use cached content, or clear the local cache."
    )]
    RateLimited,

    #[error(
        "Network error: Unable to connect to {source_name}. Please check your internet connection. ({message})"
    )]
    Network {
        source_name: String,
        message: String,
    },

    #[error(
        "Request timeout: Unable to fetch from {source_name}. Please check your internet connection."
    )]
    Timeout { source_name: String },

    #[error("Failed to fetch from {source_name}: {path} ({status})")]
    Upstream {
        source_name: String,
        path: String,
        status: u16,
    },

    #[error(
        "File not found locally and no cache available: {path}. Please ensure the snapshot build completed successfully."
    )]
    SnapshotMissing { path: String },

    #[error("Markdown rendering error: {0}")]
    Render(String),

    #[error("Math rendering error in `{span}`: {message}")]
    MathRender { span: String, message: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl DocHubError {
    /// Transient failures a caller can retry or answer from a cached copy.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DocHubError::RateLimited | DocHubError::Network { .. } | DocHubError::Timeout { .. }
        )
    }
}

impl From<serde_json::Error> for DocHubError {
    fn from(err: serde_json::Error) -> Self {
        DocHubError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_classification() {
        assert!(DocHubError::RateLimited.is_recoverable());
        assert!(
            DocHubError::Timeout {
                source_name: "DSA".to_string()
            }
            .is_recoverable()
        );
        assert!(!DocHubError::NotFound("missing".to_string()).is_recoverable());
        assert!(
            !DocHubError::Upstream {
                source_name: "DSA".to_string(),
                path: "README.md".to_string(),
                status: 500,
            }
            .is_recoverable()
        );
    }

    #[test]
    fn test_upstream_message_names_source_and_path() {
        let err = DocHubError::Upstream {
            source_name: "DevOps Handbook".to_string(),
            path: "ci/intro.md".to_string(),
            status: 404,
        };
        let message = err.to_string();
        assert!(message.contains("DevOps Handbook"));
        assert!(message.contains("ci/intro.md"));
        assert!(message.contains("404"));
    }
}
