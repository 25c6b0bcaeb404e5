// file: src/resolver/transport.rs
// description: HTTP transport seam used for remote and same-origin snapshot reads
// reference: https://docs.rs/reqwest

use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failures where no HTTP status was received.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("request failed: {0}")]
    Network(String),
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Issues a GET that is aborted once `timeout` elapses.
    async fn get(&self, url: &str, timeout: Duration)
    -> Result<TransportResponse, TransportError>;
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!("dochub/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { client }
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<TransportResponse, TransportError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .header(reqwest::header::CACHE_CONTROL, "no-store")
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(classify)?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_http_transport_returns_status_and_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/octo/notes/main/README.md"))
            .respond_with(ResponseTemplate::new(200).set_body_string("# Notes"))
            .mount(&server)
            .await;

        let transport = HttpTransport::new();
        let response = transport
            .get(
                &format!("{}/octo/notes/main/README.md", server.uri()),
                Duration::from_secs(5),
            )
            .await
            .unwrap();

        assert!(response.is_success());
        assert_eq!(response.body, "# Notes");
    }

    #[tokio::test]
    async fn test_http_transport_classifies_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("slow")
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new();
        let result = transport
            .get(&format!("{}/slow.md", server.uri()), Duration::from_millis(50))
            .await;

        assert_eq!(result, Err(TransportError::Timeout));
    }

    #[tokio::test]
    async fn test_http_transport_classifies_connection_failure() {
        let transport = HttpTransport::new();
        let result = transport
            .get("http://127.0.0.1:9/unreachable.md", Duration::from_secs(2))
            .await;

        assert!(matches!(result, Err(TransportError::Network(_))));
    }
}
