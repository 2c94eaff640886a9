//! Provider Retry Logic
//!
//! Exponential backoff retry for transient provider failures (network errors,
//! timeouts, rate limiting, 5xx). Non-transient errors fail immediately.

use crate::types::ProviderError;
use std::time::Duration;

/// Initial backoff delay
const INITIAL_BACKOFF_MS: u64 = 200;

/// Backoff ceiling
const MAX_BACKOFF_MS: u64 = 2_000;

/// Retry a provider operation with exponential backoff.
///
/// **Algorithm:**
/// 1. Attempt operation
/// 2. If successful, return result
/// 3. If the error is transient and retries remain: log WARN, backoff, retry
/// 4. Otherwise return the error
///
/// **Backoff Strategy:**
/// - Initial delay: 200ms
/// - Max delay: 2000ms
/// - Multiplier: 2.0 (exponential)
///
/// # Arguments
/// * `operation_name` - Name for logging (e.g., "youtube search page")
/// * `max_retries` - Retries after the first attempt (0 = single attempt)
/// * `operation` - Async closure that performs the request
pub async fn retry_transient<F, Fut, T>(
    operation_name: &str,
    max_retries: u32,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    loop {
        attempt += 1;

        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    tracing::debug!(
                        operation = operation_name,
                        attempt,
                        "Provider operation succeeded after retry"
                    );
                }
                return Ok(result);
            }
            Err(err) if err.is_transient() && attempt <= max_retries => {
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    backoff_ms,
                    error = %err,
                    "Transient provider error, will retry after backoff"
                );
                tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
            }
            Err(err) => {
                if attempt > 1 {
                    tracing::error!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "Provider operation failed after retries"
                    );
                }
                return Err(err);
            }
        }
    }
}
