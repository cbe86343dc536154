use thiserror::Error;

/// Errors returned by a [`crate::SearchProvider`]. Every variant is fatal to
/// an analysis run.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Credentials are missing or the backend rejected the request.
    #[error("search unavailable: {0}")]
    Unavailable(String),

    /// The backend answered but returned zero hits.
    #[error("no search results found for \"{keyword}\"")]
    NoResults { keyword: String },

    #[error("invalid search request: {0}")]
    InvalidRequest(String),

    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}
