use crate::error::FetchError;
use crate::parser::FeedParser;
use crate::traits::FeedFetch;
use crate::types::{FeedSource, FetchConfig, RawEntry};
use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Downloads the feed body, enforcing scheme, status and size limits.
    pub async fn fetch_body(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let url = Url::parse(url)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::UnsupportedScheme(url.scheme().to_string()));
        }
        let max_bytes = (self.config.max_feed_size_mb * 1024 * 1024) as u64;

        let response = self.client.get(url.clone()).send().await.map_err(|e| self.classify(e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        if let Some(content_length) = response.content_length() {
            if content_length > max_bytes {
                return Err(FetchError::TooLarge {
                    size_bytes: content_length,
                    limit_bytes: max_bytes,
                });
            }
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;

        // servers may omit or lie about Content-Length
        if body.len() as u64 > max_bytes {
            return Err(FetchError::TooLarge {
                size_bytes: body.len() as u64,
                limit_bytes: max_bytes,
            });
        }

        debug!("Fetched {} ({} bytes)", url, body.len());
        Ok(body.to_vec())
    }

    fn classify(&self, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout(Duration::from_secs(self.config.timeout_seconds))
        } else {
            FetchError::Http(e)
        }
    }
}

#[async_trait]
impl FeedFetch for Fetcher {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<RawEntry>, FetchError> {
        let start_time = Instant::now();
        debug!("Fetching feed: {} ({})", source.name, source.endpoint);

        let result = async {
            let body = self.fetch_body(&source.endpoint).await?;
            FeedParser::parse_entries(&body, self.config.max_entries)
        }
        .await;

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        match &result {
            Ok(entries) => info!(
                "Fetched feed {}: {} entries in {}ms",
                source.name,
                entries.len(),
                elapsed_ms
            ),
            Err(e) => warn!("Failed to fetch feed {} after {}ms: {}", source.name, elapsed_ms, e),
        }
        result
    }
}
