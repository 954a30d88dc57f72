//! HTTP media fetching behind an injectable seam.
//!
//! The dispatcher only ever talks to the [`Fetcher`] trait, so tests can stub
//! the network the same way they stub storage.

use async_trait::async_trait;
use bytes::Bytes;
use std::time::Duration;
use thiserror::Error;

/// Fetch operation errors
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP {0}")]
    Status(u16),

    #[error("{0}")]
    Transport(String),
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// A fetched media body plus the upstream-declared content type, if any.
#[derive(Debug, Clone)]
pub struct FetchedMedia {
    pub bytes: Bytes,
    pub content_type: Option<String>,
}

/// Fetch seam; injected into the dispatcher at construction.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Download a resource. Non-2xx responses are errors; a 2xx response
    /// yields the full body.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedMedia>;
}

/// reqwest-backed fetcher with a bounded per-request timeout.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a fetcher whose requests (connect + body) time out after
    /// `timeout`. Exceeding it surfaces as a per-asset failure, not a crash
    /// of the whole run.
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(HttpFetcher { client })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedMedia> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        tracing::debug!(
            url = %url,
            size_bytes = bytes.len(),
            content_type = content_type.as_deref().unwrap_or("-"),
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Media fetched"
        );

        Ok(FetchedMedia {
            bytes,
            content_type,
        })
    }
}
