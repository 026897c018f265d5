//! Feed fetcher.
//!
//! Downloads an RSS document over HTTP and turns it into a [`ParsedFeed`]
//! with HTML entities decoded. Publication dates are passed through as raw
//! strings; normalizing them is the scheduler's job.

use std::time::Duration;

use reqwest::Client;

use crate::config::FetchConfig;
use crate::error::{GatorError, Result};
use crate::rss::html::decode_html_entities;
use crate::rss::types::{ParsedFeed, ParsedItem};
use crate::shutdown::Shutdown;

/// Feed fetcher with timeouts and a response size limit.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: Client,
    max_size: u64,
}

impl FeedFetcher {
    /// Create a new fetcher from the fetch configuration.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .timeout(Duration::from_secs(config.total_timeout_secs))
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(|e| GatorError::Network(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            max_size: config.max_feed_size_bytes,
        })
    }

    /// Fetch and parse the feed at `url`.
    ///
    /// The request is abandoned as soon as `shutdown` fires. Failures are not
    /// retried here; the next tick picks the feed up again.
    pub async fn fetch(&self, url: &str, shutdown: &Shutdown) -> Result<ParsedFeed> {
        tokio::select! {
            biased;
            _ = shutdown.wait() => Err(GatorError::Network(format!("fetch of {url} cancelled"))),
            result = self.fetch_inner(url) => result,
        }
    }

    async fn fetch_inner(&self, url: &str) -> Result<ParsedFeed> {
        validate_url(url)?;

        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatorError::Network(format!("failed to fetch feed: {e}")))?;

        if !response.status().is_success() {
            return Err(GatorError::Network(format!(
                "HTTP error: {}",
                response.status()
            )));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size {
                return Err(self.too_large(content_length));
            }
        }

        // Read in chunks so a missing or lying Content-Length can't blow the limit.
        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| GatorError::Network(format!("failed to read response: {e}")))?
        {
            body.extend_from_slice(&chunk);
            if body.len() as u64 > self.max_size {
                return Err(self.too_large(body.len() as u64));
            }
        }

        tracing::debug!(url, bytes = body.len(), "Fetched feed");
        parse_feed(&body)
    }

    fn too_large(&self, size: u64) -> GatorError {
        GatorError::Network(format!(
            "feed too large: {} bytes (max {} bytes)",
            size, self.max_size
        ))
    }
}

/// Check that a feed URL is an absolute http(s) URL.
pub fn validate_url(url: &str) -> Result<()> {
    let parsed =
        url::Url::parse(url).map_err(|e| GatorError::Validation(format!("invalid URL: {e}")))?;

    match parsed.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(GatorError::Validation(format!(
                "unsupported URL scheme: {scheme}"
            )));
        }
    }

    if parsed.host().is_none() {
        return Err(GatorError::Validation("URL has no host".to_string()));
    }

    Ok(())
}

/// Parse feed bytes into a [`ParsedFeed`].
pub fn parse_feed(bytes: &[u8]) -> Result<ParsedFeed> {
    let channel = ::rss::Channel::read_from(bytes)
        .map_err(|e| GatorError::Parse(format!("failed to parse feed: {e}")))?;

    let items = channel
        .items()
        .iter()
        .map(|item| ParsedItem {
            title: decode_html_entities(item.title().unwrap_or_default()),
            link: item.link().map(str::to_string),
            description: item.description().map(decode_html_entities),
            pub_date: item.pub_date().map(str::to_string),
        })
        .collect();

    Ok(ParsedFeed {
        title: decode_html_entities(channel.title()),
        link: channel.link().to_string(),
        description: decode_html_entities(channel.description()),
        items,
    })
}
