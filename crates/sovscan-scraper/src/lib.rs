//! Concurrent page fetching and plain-text extraction.
//!
//! Pages are fetched through a content relay in bounded batches, each URL
//! retried with linear backoff, and the returned markup reduced to plain text.

pub mod error;
pub mod extract;
pub mod fetcher;
pub mod relay;

mod retry;

pub use error::FetchError;
pub use extract::extract_text;
pub use fetcher::{BatchProgress, ContentFetcher, FetchSettings};
pub use relay::{ContentRelay, RelayClient};
