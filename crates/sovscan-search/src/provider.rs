use async_trait::async_trait;
use sovscan_core::SearchHit;

use crate::error::SearchError;

/// Anything that can turn a keyword into ranked candidate pages.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Return at most `max_results` hits (1..=50), ranked 1..=n.
    ///
    /// # Errors
    ///
    /// - [`SearchError::Unavailable`] when credentials are missing or the
    ///   backend rejects the request.
    /// - [`SearchError::NoResults`] when the backend returns zero hits.
    async fn search(
        &self,
        keyword: &str,
        max_results: u32,
    ) -> Result<Vec<SearchHit>, SearchError>;
}
