// file: src/config.rs
// description: application configuration management with toml support
// reference: https://docs.rs/config

use crate::error::{DocHubError, Result};
use crate::utils::validation::Validator;
use dotenvy::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub repositories: Vec<RepositoryConfig>,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub renderer: RendererConfig,
}

/// One configured documentation source. Immutable after load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RepositoryConfig {
    pub id: String,
    pub name: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    #[serde(default)]
    pub base_path: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    #[default]
    Production,
    Development,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SnapshotLocation {
    Directory(PathBuf),
    Url(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ResolverConfig {
    pub raw_base_url: String,
    pub api_base_url: String,
    #[serde(default)]
    pub snapshot: Option<SnapshotLocation>,
    pub timeout_secs: u64,
    #[serde(default)]
    pub mode: ExecutionMode,
    #[serde(default)]
    pub strict_snapshot: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default)]
    pub directory: Option<PathBuf>,
    pub filetree_ttl_secs: u64,
    pub markdown_ttl_secs: u64,
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RendererConfig {
    pub enhanced: bool,
    pub open_links_in_new_tab: bool,
    #[serde(default)]
    pub allow_inline_style: bool,
    pub allow_data_attributes: bool,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            raw_base_url: "https://raw.githubusercontent.com".to_string(),
            api_base_url: "https://api.github.com".to_string(),
            snapshot: None,
            timeout_secs: 10,
            mode: ExecutionMode::Production,
            strict_snapshot: false,
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: None,
            filetree_ttl_secs: 5 * 60,
            markdown_ttl_secs: 10 * 60,
            quota_bytes: Some(5 * 1024 * 1024),
        }
    }
}

impl CacheConfig {
    pub fn filetree_ttl(&self) -> Duration {
        Duration::from_secs(self.filetree_ttl_secs)
    }

    pub fn markdown_ttl(&self) -> Duration {
        Duration::from_secs(self.markdown_ttl_secs)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            enhanced: true,
            open_links_in_new_tab: true,
            allow_inline_style: false,
            allow_data_attributes: true,
        }
    }
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        dotenv().ok();

        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        } else {
            builder = builder.add_source(config::File::from(Path::new("config/default.toml")));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("DOCHUB")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .map_err(|e| DocHubError::Config(e.to_string()))?;

        let config: Config = settings
            .try_deserialize()
            .map_err(|e| DocHubError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn default_config() -> Self {
        let repository = |id: &str, name: &str, repo: &str, description: &str, icon: &str| {
            RepositoryConfig {
                id: id.to_string(),
                name: name.to_string(),
                owner: "thisiskushal31".to_string(),
                repo: repo.to_string(),
                branch: "main".to_string(),
                base_path: None,
                description: Some(description.to_string()),
                icon: Some(icon.to_string()),
            }
        };

        Self {
            repositories: vec![
                repository(
                    "dsa",
                    "Data Structures & Algorithms",
                    "Datastructures-and-Algorithms",
                    "DSA notes and solutions",
                    "fas fa-book-open",
                ),
                repository(
                    "devops",
                    "DevOps Handbook",
                    "DevOps-Handbook",
                    "CI/CD, IaC, cloud-native, observability, and security best practices",
                    "fas fa-rocket",
                ),
                repository(
                    "system-design",
                    "System Design Concepts",
                    "System-Design-Concepts",
                    "System design patterns, components, and trade-offs by use case",
                    "fas fa-project-diagram",
                ),
            ],
            resolver: ResolverConfig::default(),
            cache: CacheConfig::default(),
            renderer: RendererConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.repositories.is_empty() {
            return Err(DocHubError::Config(
                "at least one repository must be configured".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for repo in &self.repositories {
            // '_' separates key components in cache keys, so ids may not use it
            if repo.id.is_empty()
                || !repo
                    .id
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-')
            {
                return Err(DocHubError::Config(format!(
                    "repository id '{}' must be non-empty and contain only ASCII letters, digits or '-'",
                    repo.id
                )));
            }

            if !seen.insert(repo.id.as_str()) {
                return Err(DocHubError::Config(format!(
                    "duplicate repository id '{}'",
                    repo.id
                )));
            }

            if repo.owner.trim().is_empty()
                || repo.repo.trim().is_empty()
                || repo.branch.trim().is_empty()
            {
                return Err(DocHubError::Config(format!(
                    "repository '{}' needs owner, repo and branch",
                    repo.id
                )));
            }
        }

        for url in [&self.resolver.raw_base_url, &self.resolver.api_base_url] {
            Validator::validate_url(url)
                .map_err(|e| DocHubError::Config(format!("resolver base url: {}", e)))?;
        }
        if let Some(SnapshotLocation::Url(url)) = &self.resolver.snapshot {
            Validator::validate_url(url)
                .map_err(|e| DocHubError::Config(format!("snapshot url: {}", e)))?;
        }

        if self.resolver.timeout_secs == 0 {
            return Err(DocHubError::Config(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
