use thiserror::Error;

/// Failures talking to the text-inference backend.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No credentials configured; the backend is never contacted.
    #[error("inference backend unavailable: {0}")]
    Unavailable(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("inference API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("inference response contained no message content")]
    EmptyResponse,

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Failures detecting brand mentions on one page. Never fatal to a run.
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("malformed detection response: {source}")]
    MalformedResponse {
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot build match pattern for brand \"{brand}\": {source}")]
    Pattern {
        brand: String,
        #[source]
        source: regex::Error,
    },
}
