//! Retry with linearly increasing backoff for page fetches.
//!
//! Relay failures are usually transient (timeouts, upstream hiccups, pages
//! that render thin on one attempt), so every error except a malformed URL
//! is retried.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Returns `true` if `err` is worth another attempt.
///
/// Only [`FetchError::InvalidUrl`] is final: the same URL will never parse.
fn is_retriable(err: &FetchError) -> bool {
    !matches!(err, FetchError::InvalidUrl { .. })
}

/// Runs `operation` up to `max_attempts` times in total.
///
/// After failed attempt `n` (1-based) the function sleeps `n * delay_ms`
/// before trying again, so with `delay_ms = 1_000` the waits are 1 s, 2 s,
/// 3 s, ... No sleep follows the final attempt. A `max_attempts` of zero is
/// treated as one.
pub(crate) async fn retry_linear<T, F, Fut>(
    max_attempts: u32,
    delay_ms: u64,
    url: &str,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = max_attempts.max(1);
    let mut attempt = 1u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_attempts {
                    return Err(err);
                }
                let wait_ms = delay_ms.saturating_mul(u64::from(attempt));
                tracing::warn!(
                    url,
                    attempt,
                    max_attempts,
                    wait_ms,
                    error = %err,
                    "fetch attempt failed; retrying"
                );
                tokio::time::sleep(Duration::from_millis(wait_ms)).await;
                attempt += 1;
            }
        }
    }
}
