use thiserror::Error;

/// Errors from a single fetch attempt. None of these abort a run: after
/// retries are exhausted the error is recorded on the page's `FetchResult`.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("no content received from relay for {url}")]
    EmptyContent { url: String },

    #[error("insufficient content extracted from {url}: {chars} chars (minimum {min})")]
    InsufficientContent { url: String, chars: usize, min: usize },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL \"{url}\": {reason}")]
    InvalidUrl { url: String, reason: String },
}
