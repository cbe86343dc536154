//! Batched, retrying page fetcher.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use sovscan_core::{FetchResult, SearchHit};
use tokio_util::sync::CancellationToken;

use crate::error::FetchError;
use crate::extract::extract_text;
use crate::relay::ContentRelay;
use crate::retry::retry_linear;

/// Tuning knobs for [`ContentFetcher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchSettings {
    /// Pages fetched concurrently per batch.
    pub batch_size: usize,
    /// Total attempts per URL, including the first.
    pub max_attempts: u32,
    /// Backoff unit: attempt `n` is followed by a wait of `n * retry_delay_ms`.
    pub retry_delay_ms: u64,
    /// Pause between consecutive batches.
    pub batch_delay_ms: u64,
    /// Extracted text shorter than this counts as a failed attempt.
    pub min_text_chars: usize,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            batch_size: 3,
            max_attempts: 2,
            retry_delay_ms: 1_000,
            batch_delay_ms: 1_000,
            min_text_chars: 100,
        }
    }
}

/// Cumulative progress reported after each batch completes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchProgress {
    pub completed: usize,
    pub total: usize,
}

/// Fetches candidate pages through a [`ContentRelay`] and extracts their text.
pub struct ContentFetcher {
    relay: Arc<dyn ContentRelay>,
    settings: FetchSettings,
}

impl ContentFetcher {
    #[must_use]
    pub fn new(relay: Arc<dyn ContentRelay>, settings: FetchSettings) -> Self {
        Self { relay, settings }
    }

    /// Fetch every hit, `batch_size` at a time.
    ///
    /// Returns one [`FetchResult`] per hit, in input order. A URL that fails
    /// every attempt yields `success = false` with a readable `error_detail`;
    /// it never aborts the batch.
    ///
    /// Batch `n` completes fully before batch `n + 1` starts. `on_batch` is
    /// called after each batch with cumulative counts. `cancel` is checked at
    /// every batch boundary (in-flight requests are allowed to finish); once
    /// it is observed this returns `None` without reporting further progress.
    pub async fn fetch_all<F>(
        &self,
        hits: &[SearchHit],
        cancel: &CancellationToken,
        mut on_batch: F,
    ) -> Option<Vec<FetchResult>>
    where
        F: FnMut(BatchProgress),
    {
        let total = hits.len();
        let batch_size = self.settings.batch_size.max(1);
        let mut results: Vec<FetchResult> = Vec::with_capacity(total);

        for (batch_index, batch) in hits.chunks(batch_size).enumerate() {
            if cancel.is_cancelled() {
                return None;
            }

            if batch_index > 0 && self.settings.batch_delay_ms > 0 {
                let pause = Duration::from_millis(self.settings.batch_delay_ms);
                tokio::select! {
                    () = cancel.cancelled() => return None,
                    () = tokio::time::sleep(pause) => {}
                }
            }

            let batch_results = join_all(batch.iter().map(|hit| self.fetch_page(&hit.url))).await;
            results.extend(batch_results);

            if cancel.is_cancelled() {
                tracing::info!(
                    completed = results.len(),
                    total,
                    "cancellation observed after fetch batch"
                );
                return None;
            }

            on_batch(BatchProgress {
                completed: results.len(),
                total,
            });
        }

        let successful = results.iter().filter(|r| r.success).count();
        tracing::info!(total, successful, "content fetch complete");

        Some(results)
    }

    /// Fetch one URL with retries and turn the outcome into a [`FetchResult`].
    pub async fn fetch_page(&self, url: &str) -> FetchResult {
        let outcome = retry_linear(
            self.settings.max_attempts,
            self.settings.retry_delay_ms,
            url,
            || self.attempt(url),
        )
        .await;

        match outcome {
            Ok(text) => FetchResult::succeeded(url, text),
            Err(e) => {
                tracing::warn!(url, error = %e, "giving up on page after retries");
                FetchResult::failed(url, format!("Failed to fetch {url}: {e}"))
            }
        }
    }

    async fn attempt(&self, url: &str) -> Result<String, FetchError> {
        let markup = self.relay.fetch(url).await?;
        let text = extract_text(&markup);
        let chars = text.chars().count();
        if chars < self.settings.min_text_chars {
            return Err(FetchError::InsufficientContent {
                url: url.to_owned(),
                chars,
                min: self.settings.min_text_chars,
            });
        }
        Ok(text)
    }
}
