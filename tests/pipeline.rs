// file: tests/pipeline.rs
// description: end-to-end request, render, sanitize and segment tests against a mock GitHub
// reference: https://docs.rs/wiremock

use dochub::{
    CacheStore, Config, ContentResolver, DocHubError, DocumentPipeline, EmbedKind, HttpTransport,
    MemoryBackend, SearchIndex, Segment,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RAW_PREFIX: &str = "/raw/octo/notes/main";
const CONTENTS_PREFIX: &str = "/api/repos/octo/notes/contents";

const GUIDE: &str = r#"# Sorting Guide

Merge sort runs in O(nlogn) and insertion sort in $O(n^2)$.

![merge](../img/merge.png)

@youtube[dQw4w9WgXcQ]

```rust
let x = "$not math$";
```

<script>alert("xss")</script>

[reference](https://example.com/sorting)
"#;

fn config_for(server: &MockServer) -> Config {
    let mut config = Config::default_config();
    config.repositories.truncate(1);
    config.repositories[0].owner = "octo".to_string();
    config.repositories[0].repo = "notes".to_string();
    config.repositories[0].name = "Notes".to_string();
    config.resolver.raw_base_url = format!("{}/raw", server.uri());
    config.resolver.api_base_url = format!("{}/api", server.uri());
    config.resolver.timeout_secs = 1;
    config
}

fn resolver_for(config: &Config) -> Arc<ContentResolver> {
    let cache = CacheStore::new(Arc::new(MemoryBackend::new()));
    Arc::new(ContentResolver::new(
        config,
        cache,
        Arc::new(HttpTransport::new()),
    ))
}

async fn serve_markdown(server: &MockServer, file: &str, status: u16, body: &str) {
    Mock::given(method("GET"))
        .and(path(format!("{}/{}", RAW_PREFIX, file)))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_remote_document_renders_to_safe_segments() {
    let server = MockServer::start().await;
    serve_markdown(&server, "sorting/guide.md", 200, GUIDE).await;

    let config = config_for(&server);
    let pipeline = DocumentPipeline::new(resolver_for(&config), &config.renderer);
    let doc = pipeline.load("dsa", "sorting/guide.md", false).await.unwrap();

    assert!(doc.html.contains(r#"id="sorting-guide""#));
    assert!(doc.html.contains("<math"));
    assert!(doc.html.contains("$not math$"));
    assert!(doc.html.contains(&format!(
        "{}/raw/octo/notes/main/img/merge.png",
        server.uri()
    )));
    assert!(!doc.html.contains("<script"));
    assert!(doc.html.contains(r#"rel="noopener noreferrer""#));

    assert_eq!(doc.embeds.len(), 1);
    assert_eq!(doc.embeds[0].kind, EmbedKind::Video);
    assert_eq!(doc.embeds[0].token, "__YOUTUBE_EMBED_0__");

    let segments = doc.segments();
    let embed_positions: Vec<usize> = segments
        .iter()
        .enumerate()
        .filter(|(_, s)| matches!(s, Segment::Embed(_)))
        .map(|(i, _)| i)
        .collect();
    assert_eq!(embed_positions.len(), 1);
    assert!(matches!(segments[0], Segment::Html(html) if html.contains("Sorting Guide")));
    assert!(!doc.html_without_embeds().contains("__YOUTUBE_EMBED_"));
}

#[tokio::test]
async fn test_rate_limit_falls_back_to_cached_copy() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/intro.md", RAW_PREFIX)))
        .respond_with(ResponseTemplate::new(200).set_body_string("# Intro"))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    serve_markdown(&server, "intro.md", 403, "rate limited").await;

    let config = config_for(&server);
    let resolver = resolver_for(&config);

    let first = resolver.fetch_markdown("dsa", "intro.md", false).await.unwrap();
    let forced = resolver.fetch_markdown("dsa", "intro.md", true).await.unwrap();

    assert_eq!(first, "# Intro");
    assert_eq!(forced, "# Intro");
}

#[tokio::test]
async fn test_rate_limit_without_fallback_is_reported() {
    let server = MockServer::start().await;
    serve_markdown(&server, "intro.md", 403, "rate limited").await;

    let config = config_for(&server);
    let result = resolver_for(&config)
        .fetch_markdown("dsa", "intro.md", false)
        .await;

    let err = result.unwrap_err();
    assert!(matches!(err, DocHubError::RateLimited));
    assert!(err.is_recoverable());
}

#[tokio::test]
async fn test_missing_document_reports_status() {
    let server = MockServer::start().await;
    serve_markdown(&server, "gone.md", 404, "Not Found").await;

    let config = config_for(&server);
    let result = resolver_for(&config)
        .fetch_markdown("dsa", "gone.md", false)
        .await;

    match result {
        Err(DocHubError::Upstream {
            source_name,
            path,
            status,
        }) => {
            assert_eq!(source_name, "Notes");
            assert_eq!(path, "gone.md");
            assert_eq!(status, 404);
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_slow_remote_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("{}/slow.md", RAW_PREFIX)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string("# Slow")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = config_for(&server);
    let result = resolver_for(&config)
        .fetch_markdown("dsa", "slow.md", false)
        .await;

    assert!(matches!(result, Err(DocHubError::Timeout { .. })));
}

#[tokio::test]
async fn test_search_over_lazily_expanded_tree() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(CONTENTS_PREFIX))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"name":"README.md","path":"README.md","type":"file","sha":"a","size":10},
                {"name":"sorting","path":"sorting","type":"dir","sha":"b"},
                {"name":"logo.png","path":"logo.png","type":"file","sha":"c","size":99}
            ]"#,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("{}/sorting", CONTENTS_PREFIX)))
        .and(query_param("ref", "main"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[
                {"name":"01-merge-sort.md","path":"sorting/01-merge-sort.md","type":"file","sha":"d","size":20},
                {"name":"quick_sort.md","path":"sorting/quick_sort.md","type":"file","sha":"e","size":30}
            ]"#,
        ))
        .mount(&server)
        .await;

    let config = config_for(&server);
    let resolver = resolver_for(&config);

    let files = resolver.flatten_tree("dsa").await.unwrap();
    assert_eq!(files.len(), 3);
    assert!(files.iter().all(|f| f.name.ends_with(".md")));

    let index = SearchIndex::build(&resolver).await;
    let results = index.query("merge", 10);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].display_name, "merge sort");
    assert_eq!(results[0].repository_name, "Notes");
    assert_eq!(results[0].path, "sorting/01-merge-sort.md");
}
