//! HTTP client for the Google Custom Search JSON API.
//!
//! Wraps `reqwest` with credential handling, fixed-size pagination, an
//! inter-page delay, and typed response deserialization. Backend rejections
//! surface as [`SearchError::Unavailable`] carrying the API's own message.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use sovscan_core::SearchHit;

use crate::error::SearchError;
use crate::provider::SearchProvider;
use crate::types::{ErrorEnvelope, SearchItem, SearchResponse};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/customsearch/v1";

/// The API never returns more than ten items per request.
pub const PAGE_SIZE: u32 = 10;

/// Upper bound on `max_results` accepted by [`SearchProvider::search`].
pub const MAX_RESULTS: u32 = 50;

/// Client for the Google Custom Search JSON API.
///
/// Use [`GoogleSearchClient::new`] for production or
/// [`GoogleSearchClient::with_base_url`] to point at a mock server in tests.
pub struct GoogleSearchClient {
    client: Client,
    api_key: String,
    engine_id: String,
    base_url: Url,
    page_delay_ms: u64,
}

impl GoogleSearchClient {
    /// Creates a new client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        api_key: &str,
        engine_id: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, SearchError> {
        Self::with_base_url(api_key, engine_id, timeout_secs, user_agent, DEFAULT_BASE_URL)
    }

    /// Creates a new client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`SearchError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        api_key: &str,
        engine_id: &str,
        timeout_secs: u64,
        user_agent: &str,
        base_url: &str,
    ) -> Result<Self, SearchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;

        let base_url = Url::parse(base_url.trim_end_matches('/')).map_err(|e| {
            SearchError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            api_key: api_key.trim().to_owned(),
            engine_id: engine_id.trim().to_owned(),
            base_url,
            page_delay_ms: 100,
        })
    }

    /// Sets the pause between consecutive page requests.
    #[must_use]
    pub fn with_page_delay_ms(mut self, page_delay_ms: u64) -> Self {
        self.page_delay_ms = page_delay_ms;
        self
    }

    /// Fetches one page: up to `num` items starting at the 1-based `start`.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Unavailable`] on any non-2xx status.
    /// - [`SearchError::Http`] on network failure.
    /// - [`SearchError::Deserialize`] if the body does not match the expected shape.
    pub async fn fetch_page(
        &self,
        query: &str,
        start: u32,
        num: u32,
    ) -> Result<Vec<SearchItem>, SearchError> {
        let url = self.build_url(query, start, num);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .map(|e| e.error.message)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| format!("unexpected HTTP status {}", status.as_u16()));
            return Err(SearchError::Unavailable(message));
        }

        let parsed: SearchResponse =
            serde_json::from_str(&body).map_err(|e| SearchError::Deserialize {
                context: format!("search page (q={query}, start={start})"),
                source: e,
            })?;

        Ok(parsed.items)
    }

    /// Builds the request URL with properly percent-encoded query parameters.
    fn build_url(&self, query: &str, start: u32, num: u32) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("key", &self.api_key)
            .append_pair("cx", &self.engine_id)
            .append_pair("q", query)
            .append_pair("start", &start.to_string())
            .append_pair("num", &num.to_string());
        url
    }
}

#[async_trait]
impl SearchProvider for GoogleSearchClient {
    async fn search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<SearchHit>, SearchError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(SearchError::InvalidRequest(
                "keyword must be non-empty".to_string(),
            ));
        }
        if !(1..=MAX_RESULTS).contains(&max_results) {
            return Err(SearchError::InvalidRequest(format!(
                "max results must be between 1 and {MAX_RESULTS} (got {max_results})"
            )));
        }
        if self.api_key.is_empty() || self.engine_id.is_empty() {
            return Err(SearchError::Unavailable(
                "search API key or engine ID not configured".to_string(),
            ));
        }

        let mut items: Vec<SearchItem> = Vec::new();
        let mut is_first_page = true;

        while items.len() < max_results as usize {
            if !is_first_page && self.page_delay_ms > 0 {
                tokio::time::sleep(Duration::from_millis(self.page_delay_ms)).await;
            }
            is_first_page = false;

            #[allow(clippy::cast_possible_truncation)]
            let collected = items.len() as u32;
            let num = PAGE_SIZE.min(max_results - collected);
            let page = self.fetch_page(keyword, collected + 1, num).await?;
            let page_len = page.len();

            tracing::debug!(
                keyword,
                start = collected + 1,
                requested = num,
                received = page_len,
                "fetched search page"
            );

            items.extend(page);

            // A short page means the backend has nothing more to give.
            if page_len < num as usize {
                break;
            }
        }

        items.truncate(max_results as usize);

        if items.is_empty() {
            return Err(SearchError::NoResults {
                keyword: keyword.to_owned(),
            });
        }

        Ok(items.into_iter().enumerate().map(to_hit).collect())
    }
}

fn to_hit((position, item): (usize, SearchItem)) -> SearchHit {
    #[allow(clippy::cast_possible_truncation)]
    let rank = position as u32 + 1;
    let display_domain = item
        .display_link
        .filter(|d| !d.is_empty())
        .or_else(|| {
            Url::parse(&item.link)
                .ok()
                .and_then(|u| u.host_str().map(str::to_owned))
        })
        .unwrap_or_default();

    SearchHit {
        id: format!("result-{rank}"),
        title: item.title,
        url: item.link,
        snippet: item.snippet,
        display_domain,
        rank,
    }
}
