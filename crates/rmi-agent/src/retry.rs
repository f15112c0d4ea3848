//! Retry with exponential back-off and jitter around a reasoning call.
//!
//! Only transient failures are retried. Jitter changes the wall-clock delay
//! between attempts and nothing else.

use std::future::Future;
use std::time::Duration;

use crate::error::ServiceError;

const MAX_DELAY_MS: u64 = 60_000;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Timeouts, connect failures, 5xx responses and rate limiting are transient.
/// API error bodies, malformed responses and configuration errors are not.
pub(crate) fn is_retriable(err: &ServiceError) -> bool {
    match err {
        ServiceError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ServiceError::RateLimited { .. } => true,
        ServiceError::Api { .. }
        | ServiceError::Malformed(_)
        | ServiceError::InvalidBaseUrl { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The delay before retry `n` is `backoff_base_ms × 2ⁿ⁻¹ ± 25 %`, capped at
/// 60 s. A rate-limit response with a `Retry-After` hint waits for the hint
/// instead.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let delay_ms = match &err {
                    ServiceError::RateLimited {
                        retry_after: Some(hint),
                    } => u64::try_from(hint.as_millis())
                        .unwrap_or(MAX_DELAY_MS)
                        .min(MAX_DELAY_MS),
                    _ => jittered_delay_ms(backoff_base_ms, attempt),
                };
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "reasoning service transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn jittered_delay_ms(backoff_base_ms: u64, attempt: u32) -> u64 {
    let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn malformed() -> ServiceError {
        ServiceError::Malformed("no choices".to_owned())
    }

    #[test]
    fn api_error_is_not_retriable() {
        assert!(!is_retriable(&ServiceError::Api {
            status: 400,
            message: "bad request".to_owned()
        }));
    }

    #[test]
    fn malformed_response_is_not_retriable() {
        assert!(!is_retriable(&malformed()));
    }

    #[test]
    fn rate_limit_is_retriable() {
        assert!(is_retriable(&ServiceError::RateLimited { retry_after: None }));
    }

    #[test]
    fn jitter_stays_within_quarter_of_base() {
        for attempt in 1..=4 {
            let nominal = 1_000u64 << (attempt - 1);
            let delay = jittered_delay_ms(1_000, attempt);
            assert!(delay >= nominal * 3 / 4 && delay <= nominal * 5 / 4, "{delay}");
        }
        assert!(jittered_delay_ms(u64::MAX, 30) <= MAX_DELAY_MS * 5 / 4);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ServiceError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_malformed_response() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(malformed())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ServiceError::Malformed(_))));
    }

    #[tokio::test]
    async fn retries_connect_errors_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    let err = reqwest::Client::new()
                        .get("http://0.0.0.0:1")
                        .send()
                        .await
                        .unwrap_err();
                    Err::<u32, _>(ServiceError::Http(err))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ServiceError::RateLimited {
                    retry_after: Some(Duration::ZERO),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(matches!(result, Err(ServiceError::RateLimited { .. })));
    }
}
