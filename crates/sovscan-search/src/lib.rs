//! Keyword search: resolves a keyword into a ranked list of candidate pages.

pub mod client;
pub mod error;
pub mod provider;
pub mod types;

pub use client::GoogleSearchClient;
pub use error::SearchError;
pub use provider::SearchProvider;
