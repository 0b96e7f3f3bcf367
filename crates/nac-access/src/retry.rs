//! Bounded retry with backoff for gateway calls.

use nac_gateway::{GatewayError, GatewayResult};
use std::future::Future;
use std::time::Duration;

/// Retry behavior for gateway operations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts (initial call included).
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt.
    pub base_delay: Duration,
    /// Bounded timeout per individual attempt. A timed-out attempt is a
    /// failure, never a success.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(50),
            attempt_timeout: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries. Used by tests that assert on first-failure
    /// behavior.
    pub fn no_retries() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }
}

/// Runs a gateway operation under the policy.
///
/// Only [`GatewayError::is_retryable`] failures are re-attempted; a rejected
/// rule surfaces immediately. The last error wins once attempts are
/// exhausted.
pub async fn retry_gateway<T, F, Fut>(policy: &RetryPolicy, mut op: F) -> GatewayResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = GatewayResult<T>>,
{
    let mut delay = policy.base_delay;
    let mut last_err: Option<GatewayError> = None;

    for attempt in 1..=policy.max_attempts.max(1) {
        match tokio::time::timeout(policy.attempt_timeout, op()).await {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(err)) if err.is_retryable() => last_err = Some(err),
            Ok(Err(err)) => return Err(err),
            Err(_elapsed) => {
                last_err = Some(GatewayError::timeout(
                    policy.attempt_timeout.as_millis() as u64
                ))
            }
        }

        if attempt < policy.max_attempts {
            tokio::time::sleep(delay).await;
            delay = delay.saturating_mul(2);
        }
    }

    Err(last_err.unwrap_or_else(|| GatewayError::internal("retry exhausted without an error")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_succeeds_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_gateway(&RetryPolicy::default(), || {
            c.fetch_add(1, Ordering::Relaxed);
            async { Ok(42u32) }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_retries_transient_failures() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(1),
        };
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result = retry_gateway(&policy, || {
            let attempt = c.fetch_add(1, Ordering::Relaxed);
            async move {
                if attempt < 2 {
                    Err(GatewayError::unavailable("flaky"))
                } else {
                    Ok(())
                }
            }
        })
        .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_rejection_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: GatewayResult<()> = retry_gateway(&RetryPolicy::default(), || {
            c.fetch_add(1, Ordering::Relaxed);
            async { Err(GatewayError::rejected("bad rule")) }
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Rejected { .. })));
        assert_eq!(calls.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_secs(1),
        };

        let result: GatewayResult<()> = retry_gateway(&policy, || async {
            Err(GatewayError::unavailable("still down"))
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Unavailable { .. })));
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let policy = RetryPolicy {
            max_attempts: 1,
            base_delay: Duration::from_millis(1),
            attempt_timeout: Duration::from_millis(10),
        };

        let result: GatewayResult<()> = retry_gateway(&policy, || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await;

        assert!(matches!(result, Err(GatewayError::Timeout { .. })));
    }
}
