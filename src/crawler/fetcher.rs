//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the HTTP client from the request configuration
//! - GET requests returning page markup
//! - Streamed downloads to disk
//! - Bounded retries with linear backoff and a fixed politeness delay
//!
//! Failures never propagate past this module: callers receive `None` or
//! `false` and the cause is logged.

use crate::config::{CrawlConfig, RequestConfig, DEFAULT_USER_AGENT};
use crate::{ConfigError, CrawlerError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use reqwest::{Client, Proxy, Response};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Source of pages and files for the crawl
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a page body, or `None` once every attempt has failed
    async fn get(&self, url: &str) -> Option<String>;

    /// Streams a file to `dest`, returning true when it was written completely
    async fn download(&self, url: &str, dest: &Path) -> bool;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The request configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(CrawlerError)` - Invalid header or proxy, or the client failed to build
///
/// # Example
///
/// ```no_run
/// use forum_crawler::config::RequestConfig;
/// use forum_crawler::crawler::build_http_client;
///
/// let client = build_http_client(&RequestConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &RequestConfig) -> Result<Client, CrawlerError> {
    let mut headers = HeaderMap::new();
    for (name, value) in &config.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::Validation(format!("Invalid header name '{}': {}", name, e))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(header_name, header_value);
    }

    let mut builder = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .danger_accept_invalid_certs(config.accept_invalid_certs)
        .gzip(true)
        .brotli(true);

    if !headers.contains_key(USER_AGENT) {
        builder = builder.user_agent(DEFAULT_USER_AGENT);
    }
    builder = builder.default_headers(headers);

    // Must come before explicit proxies, it clears the proxy list
    if config.bypass_system_proxy {
        builder = builder.no_proxy();
    }

    if let Some(proxy) = &config.http_proxy {
        builder = builder.proxy(Proxy::http(proxy)?);
    }

    if let Some(proxy) = &config.https_proxy {
        builder = builder.proxy(Proxy::https(proxy)?);
    }

    Ok(builder.build()?)
}

/// [`PageFetcher`] backed by reqwest
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    delay: Duration,
    retry_times: u32,
}

impl HttpFetcher {
    pub fn new(client: Client, delay: Duration, retry_times: u32) -> Self {
        Self {
            client,
            delay,
            retry_times: retry_times.max(1),
        }
    }

    pub fn from_config(request: &RequestConfig, crawl: &CrawlConfig) -> Result<Self, CrawlerError> {
        Ok(Self::new(
            build_http_client(request)?,
            Duration::from_millis(request.delay_ms),
            crawl.retry_times,
        ))
    }

    /// Wait before the attempt following failed attempt number `attempt`
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay * 2 * attempt
    }

    /// Runs `op` until it succeeds or the attempts are used up
    async fn with_retries<T, F, Fut>(&self, url: &str, mut op: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, CrawlerError>>,
    {
        for attempt in 1..=self.retry_times {
            match op().await {
                Ok(value) => {
                    tokio::time::sleep(self.delay).await;
                    return Some(value);
                }
                Err(e) if attempt < self.retry_times => {
                    warn!("{} (attempt {}/{}), retrying", e, attempt, self.retry_times);
                    tokio::time::sleep(self.backoff(attempt)).await;
                }
                Err(e) => {
                    warn!(
                        "{}; skipping {} after {} attempts",
                        e, url, self.retry_times
                    );
                }
            }
        }
        None
    }

    async fn send(&self, url: &str) -> Result<Response, CrawlerError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(CrawlerError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response)
    }

    async fn fetch_text(&self, url: &str) -> Result<String, CrawlerError> {
        let response = self.send(url).await?;
        response.text().await.map_err(|e| classify(url, e))
    }

    async fn fetch_to_file(&self, url: &str, dest: &Path) -> Result<u64, CrawlerError> {
        let mut response = self.send(url).await?;
        let mut file = tokio::fs::File::create(dest).await?;

        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await.map_err(|e| classify(url, e))? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(written)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> Option<String> {
        debug!("GET {}", url);
        self.with_retries(url, move || self.fetch_text(url)).await
    }

    async fn download(&self, url: &str, dest: &Path) -> bool {
        debug!("Downloading {} to {}", url, dest.display());
        let written = self
            .with_retries(url, move || async move {
                let result = self.fetch_to_file(url, dest).await;
                if result.is_err() {
                    // Partial files are never left behind
                    let _ = tokio::fs::remove_file(dest).await;
                }
                result
            })
            .await;

        written.is_some()
    }
}

fn classify(url: &str, error: reqwest::Error) -> CrawlerError {
    if error.is_timeout() {
        CrawlerError::Timeout {
            url: url.to_string(),
        }
    } else {
        CrawlerError::Http {
            url: url.to_string(),
            source: error,
        }
    }
}
