//! Retry with exponential back-off and jitter for reaching the browser.
//!
//! Only used while establishing the DevTools connection at startup. Once a
//! page session exists nothing in this crate retries on its own.

use std::future::Future;
use std::time::Duration;

use crate::error::BrowserError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network failures, the discovery endpoint answering with a
/// non-success status, and WebSocket handshake failures. A browser that is
/// still starting up produces all three.
///
/// **Not retriable:** everything else. A malformed discovery payload or a
/// protocol error will not fix itself.
pub(crate) fn is_retriable(err: &BrowserError) -> bool {
    matches!(
        err,
        BrowserError::Http(_) | BrowserError::Unavailable { .. } | BrowserError::WebSocket(_)
    )
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 1_000`:
///
/// | Attempt | Sleep before next attempt        |
/// |---------|----------------------------------|
/// | 1       | 1 000 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 1 000 ms × 2¹ ± 25 % jitter     |
/// | 3       | 1 000 ms × 2² ± 25 % jitter     |
///
/// Delay is capped at 30 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, BrowserError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BrowserError>>,
{
    const MAX_DELAY_MS: u64 = 30_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "browser not reachable yet, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
