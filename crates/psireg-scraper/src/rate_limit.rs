//! Retry with exponential back-off and jitter for register requests.
//!
//! Transient failures (network errors, 429, 5xx) are retried; anything else
//! is returned to the caller straight away.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Back-off never sleeps longer than this between attempts.
const MAX_DELAY_MS: u64 = 60_000;

fn is_transient(err: &ScraperError) -> bool {
    match err {
        ScraperError::Http(_) | ScraperError::RateLimited { .. } => true,
        ScraperError::UnexpectedStatus { status, .. } => *status >= 500,
        ScraperError::InvalidBaseUrl { .. } => false,
    }
}

/// Delay before retry number `retry` (1-based), before jitter.
///
/// Doubles from `base_ms` each retry. A 429 with a `Retry-After` longer than
/// that raises the floor. Always capped at [`MAX_DELAY_MS`].
fn backoff_ms(retry: u32, base_ms: u64, err: &ScraperError) -> u64 {
    let exponential = base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
    let requested = match err {
        ScraperError::RateLimited {
            retry_after_secs, ..
        } => retry_after_secs.saturating_mul(1000),
        _ => 0,
    };
    exponential.max(requested).min(MAX_DELAY_MS)
}

/// Scales `ms` by a random factor in `[0.75, 1.25)` so concurrent page
/// fetches do not retry in lockstep.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn with_jitter(ms: u64) -> Duration {
    let factor = 0.75 + rand::random::<f64>() * 0.5;
    Duration::from_millis((ms as f64 * factor) as u64)
}

/// Runs `operation`, retrying transient errors up to `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_transient(&err) && retry < max_retries => err,
            Err(err) => return Err(err),
        };
        retry += 1;
        let delay = with_jitter(backoff_ms(retry, backoff_base_ms, &err));
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "register request failed, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
