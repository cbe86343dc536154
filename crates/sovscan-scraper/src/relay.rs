//! Content relay: fetches a page's raw markup on our behalf.
//!
//! [`RelayClient`] speaks the AllOrigins-style protocol: a single
//! `GET {base}/get?url=<encoded>` answered with `{"contents": "<html>..."}`.

use std::time::Duration;

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde::Deserialize;

use crate::error::FetchError;

const DEFAULT_BASE_URL: &str = "https://api.allorigins.win";

/// Fetches raw markup for one URL. One call is one attempt; retries are the
/// caller's concern.
#[async_trait]
pub trait ContentRelay: Send + Sync {
    /// # Errors
    ///
    /// Returns [`FetchError`] when the page cannot be retrieved.
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

#[derive(Debug, Deserialize)]
struct RelayResponse {
    contents: Option<String>,
}

/// HTTP client for a JSON content relay.
pub struct RelayClient {
    client: Client,
    base_url: String,
}

impl RelayClient {
    /// Creates a client pointed at the public relay.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, FetchError> {
        Self::with_base_url(timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom relay base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn with_base_url(
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    /// Builds the relay request URL for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] if `target` is not an absolute
    /// http(s) URL.
    fn relay_url(&self, target: &str) -> Result<String, FetchError> {
        let parsed = Url::parse(target).map_err(|e| FetchError::InvalidUrl {
            url: target.to_owned(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: target.to_owned(),
                reason: format!("unsupported scheme \"{}\"", parsed.scheme()),
            });
        }
        let encoded = utf8_percent_encode(target, NON_ALPHANUMERIC).to_string();
        Ok(format!("{}/get?url={encoded}", self.base_url))
    }
}

#[async_trait]
impl ContentRelay for RelayClient {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let relay_url = self.relay_url(url)?;

        let response = self
            .client
            .get(&relay_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_owned(),
            });
        }

        let body = response.text().await?;
        let parsed: RelayResponse =
            serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
                context: format!("relay response for {url}"),
                source: e,
            })?;

        match parsed.contents {
            Some(contents) if !contents.trim().is_empty() => Ok(contents),
            _ => Err(FetchError::EmptyContent {
                url: url.to_owned(),
            }),
        }
    }
}
