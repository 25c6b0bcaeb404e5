// file: src/main.rs
// description: commandline application entry point with command handling
// reference: application bootstrap and orchestration

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use dochub::pipeline::{DEFAULT_CONCURRENCY, DEFAULT_LIMIT};
use dochub::utils::logging::{
    format_error, format_heading, format_info, format_success, format_tree_entry, format_warning,
};
use dochub::{
    CacheStore, Config, ContentResolver, DocumentExporter, DocumentPipeline, ExportFormat,
    FileBackend, HttpTransport, MemoryBackend, Prefetcher, SearchIndex, StorageBackend,
    TreeGenerator,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "dochub")]
#[command(author = "cipher")]
#[command(version = "0.1.0")]
#[command(about = "Cached markdown retrieval and sanitized rendering for GitHub-hosted docs", long_about = None)]
struct Cli {
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config/default.toml"
    )]
    config: PathBuf,

    #[arg(long, default_value_t = true, action = ArgAction::Set)]
    color: bool,

    #[arg(short, long, action = ArgAction::SetTrue)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List configured repositories
    Repos,

    /// Print one directory level of a repository
    Tree {
        repository: String,

        #[arg(short, long, default_value = "")]
        path: String,

        #[arg(long)]
        refresh: bool,
    },

    /// Render a document to sanitized HTML
    Render {
        repository: String,

        path: String,

        #[arg(long)]
        refresh: bool,

        /// Emit the JSON form of the rendered document
        #[arg(long)]
        json: bool,

        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Print the table of contents of a document
    Toc { repository: String, path: String },

    /// Search file names and paths across every repository
    Search {
        query: String,

        #[arg(short, long, default_value_t = DEFAULT_LIMIT)]
        limit: usize,

        #[arg(short, long)]
        repository: Option<String>,
    },

    /// Fetch every document of a repository into the cache
    Prefetch {
        repository: String,

        #[arg(long)]
        refresh: bool,

        #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
        concurrency: usize,
    },

    /// Generate the local snapshot layout from a checked-out repository
    Snapshot { repo_dir: PathBuf, out_dir: PathBuf },

    /// Inspect or clear the document cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    Stats,
    Clear { repository: String },
    ClearAll,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    dochub::utils::logging::init_logger(cli.color, cli.verbose);

    debug!("Loading configuration from: {}", cli.config.display());

    let config = if cli.config.exists() {
        Config::load(Some(cli.config.as_path())).context("Failed to load configuration")?
    } else {
        warn!(
            "Config file {} not found, using default configuration",
            cli.config.display()
        );
        Config::default_config()
    };

    match cli.command {
        Commands::Repos => cmd_repos(&config),
        Commands::Tree {
            repository,
            path,
            refresh,
        } => cmd_tree(&config, &repository, &path, refresh).await?,
        Commands::Render {
            repository,
            path,
            refresh,
            json,
            output,
        } => cmd_render(&config, &repository, &path, refresh, json, output.as_deref()).await?,
        Commands::Toc { repository, path } => cmd_toc(&config, &repository, &path).await?,
        Commands::Search {
            query,
            limit,
            repository,
        } => cmd_search(&config, &query, limit, repository.as_deref()).await?,
        Commands::Prefetch {
            repository,
            refresh,
            concurrency,
        } => cmd_prefetch(&config, &repository, refresh, concurrency, cli.color).await?,
        Commands::Snapshot { repo_dir, out_dir } => cmd_snapshot(&repo_dir, &out_dir)?,
        Commands::Cache { action } => cmd_cache(&config, action)?,
    }

    Ok(())
}

fn open_cache(config: &Config) -> Result<CacheStore> {
    let backend: Arc<dyn StorageBackend> = match &config.cache.directory {
        Some(directory) => Arc::new(
            FileBackend::open(directory, config.cache.quota_bytes).with_context(|| {
                format!("Failed to open cache directory {}", directory.display())
            })?,
        ),
        None => Arc::new(match config.cache.quota_bytes {
            Some(quota) => MemoryBackend::with_quota(quota),
            None => MemoryBackend::new(),
        }),
    };

    let cache = CacheStore::new(backend);
    let removed = cache.sweep();
    if removed > 0 {
        debug!("Removed {} expired cache entries", removed);
    }
    Ok(cache)
}

fn build_resolver(config: &Config) -> Result<Arc<ContentResolver>> {
    let cache = open_cache(config)?;
    let transport = Arc::new(HttpTransport::new());
    Ok(Arc::new(ContentResolver::new(config, cache, transport)))
}

fn cmd_repos(config: &Config) {
    for repo in &config.repositories {
        println!(
            "{:<16} {} ({})",
            repo.id,
            repo.name,
            repo.web_url()
        );
        if let Some(description) = &repo.description {
            println!("{:<16} {}", "", description);
        }
    }
}

async fn cmd_tree(config: &Config, repository: &str, path: &str, refresh: bool) -> Result<()> {
    let resolver = build_resolver(config)?;
    let nodes = resolver
        .fetch_file_tree(repository, path, refresh)
        .await
        .with_context(|| format!("Failed to load tree of {}", repository))?;

    if nodes.is_empty() {
        println!("{}", format_warning("Directory is empty"));
    }
    for node in &nodes {
        println!("{}", format_tree_entry(&node.name, node.is_dir(), 0));
    }

    Ok(())
}

async fn cmd_render(
    config: &Config,
    repository: &str,
    path: &str,
    refresh: bool,
    json: bool,
    output: Option<&Path>,
) -> Result<()> {
    let start_time = Instant::now();
    let pipeline = DocumentPipeline::new(build_resolver(config)?, &config.renderer);

    let loaded = match pipeline.load_full(repository, path, refresh).await {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("{}", format_error(&e.to_string()));
            if e.is_recoverable() {
                eprintln!(
                    "{}",
                    format_info("Retry later, or run `dochub cache clear` and try again")
                );
            }
            return Err(e.into());
        }
    };

    let format = if json {
        ExportFormat::Json
    } else {
        ExportFormat::Html
    };
    let exporter = DocumentExporter::new(true);

    match output {
        Some(output) => {
            exporter
                .export(&loaded, format, output)
                .context("Failed to write rendered document")?;
            println!(
                "{}",
                format_success(&format!("Wrote {}", output.display()))
            );
        }
        None => println!("{}", exporter.render(&loaded, format)?),
    }

    info!(
        "Rendered {}/{} in {:.2}s",
        repository,
        path,
        start_time.elapsed().as_secs_f64()
    );
    Ok(())
}

async fn cmd_toc(config: &Config, repository: &str, path: &str) -> Result<()> {
    let pipeline = DocumentPipeline::new(build_resolver(config)?, &config.renderer);
    let toc = pipeline
        .table_of_contents(repository, path, false)
        .await
        .context("Failed to load document")?;

    if toc.is_empty() {
        println!("{}", format_warning("No headings found"));
    }
    for entry in &toc.entries {
        println!("{}", format_heading(entry.level, &entry.text, &entry.id));
    }

    Ok(())
}

async fn cmd_search(
    config: &Config,
    query: &str,
    limit: usize,
    repository_filter: Option<&str>,
) -> Result<()> {
    info!("Searching for: {}", query);

    let resolver = build_resolver(config)?;
    let index = SearchIndex::build(&resolver).await;

    let results: Vec<_> = index
        .query(query, usize::MAX)
        .into_iter()
        .filter(|r| repository_filter.is_none_or(|id| r.repository_id == id))
        .take(limit)
        .collect();

    if results.is_empty() {
        println!("\nNo results found for query: \"{}\"\n", query);
        return Ok(());
    }

    println!("\nFound {} results for \"{}\":\n", results.len(), query);
    for (i, result) in results.iter().enumerate() {
        println!("{}. {}", i + 1, result.display_name);
        println!("   {} / {}", result.repository_name, result.path);
    }
    println!();

    Ok(())
}

async fn cmd_prefetch(
    config: &Config,
    repository: &str,
    refresh: bool,
    concurrency: usize,
    color: bool,
) -> Result<()> {
    let resolver = build_resolver(config)?;
    let stats = Prefetcher::new(resolver)
        .with_concurrency(concurrency)
        .with_progress(color)
        .run(repository, refresh)
        .await
        .with_context(|| format!("Failed to prefetch {}", repository))?;

    println!("{}", format_success(&stats.summary()));
    Ok(())
}

fn cmd_snapshot(repo_dir: &Path, out_dir: &Path) -> Result<()> {
    let summary = TreeGenerator::new()
        .write_snapshot(repo_dir, out_dir)
        .with_context(|| format!("Failed to snapshot {}", repo_dir.display()))?;

    println!(
        "{}",
        format_success(&format!(
            "Copied {} files and wrote {} tree files to {}",
            summary.files_copied,
            summary.trees_written,
            out_dir.display()
        ))
    );
    Ok(())
}

fn cmd_cache(config: &Config, action: CacheAction) -> Result<()> {
    let cache = open_cache(config)?;

    match action {
        CacheAction::Stats => {
            let stats = cache.stats();
            println!(
                "{}",
                format_info(&format!(
                    "{} entries, {} bytes",
                    stats.count, stats.total_bytes
                ))
            );
        }
        CacheAction::Clear { repository } => {
            if !config.repositories.iter().any(|r| r.id == repository) {
                anyhow::bail!("Unknown repository: {}", repository);
            }
            cache.clear(&repository);
            println!(
                "{}",
                format_success(&format!("Cleared cache for {}", repository))
            );
        }
        CacheAction::ClearAll => {
            cache.clear_all();
            println!("{}", format_success("Cleared all cached documents"));
        }
    }

    Ok(())
}
