//! Bounded retry with exponential backoff for idempotent read operations.
//!
//! Only the read-only classifier endpoints (model performance, dataset
//! metrics, health) go through here. `analyze` is user-initiated and is never
//! retried silently.

use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;

use crate::errors::AnalysisError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retry attempts after the initial one.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt as i32);
        let delay = self.initial_delay.mul_f64(factor);
        delay.min(self.max_delay)
    }
}

/// Run `operation`, retrying on retryable errors up to `config.max_retries`
/// additional times. Non-retryable errors (schema mismatches, 4xx responses)
/// surface immediately.
pub async fn retry_read<T, F, Fut>(
    config: &RetryConfig,
    what: &str,
    mut operation: F,
) -> Result<T, AnalysisError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AnalysisError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < config.max_retries => {
                let delay = config.delay_for(attempt);
                attempt += 1;
                log::debug!(
                    "{what} failed ({e}), retry {attempt}/{} in {delay:?}",
                    config.max_retries
                );
                sleep(delay).await;
            }
            Err(e) => {
                if attempt > 0 {
                    log::warn!("{what} failed after {attempt} retries: {e}");
                }
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::SchemaError;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config() -> RetryConfig {
        RetryConfig {
            max_retries: 2,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(4),
            backoff_multiplier: 2.0,
        }
    }

    #[tokio::test]
    async fn retries_transient_errors_up_to_limit() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_read(&fast_config(), "read", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AnalysisError::Timeout) }
        })
        .await;
        assert!(matches!(result, Err(AnalysisError::Timeout)));
        // Initial attempt plus two retries.
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn succeeds_after_transient_failure() {
        let calls = AtomicU32::new(0);
        let result = retry_read(&fast_config(), "read", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Err(AnalysisError::Transport {
                        message: "connection reset".into(),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn does_not_retry_contract_mismatches() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = retry_read(&fast_config(), "read", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(AnalysisError::Schema(SchemaError::Shape("bad".into()))) }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_is_capped() {
        let config = fast_config();
        assert_eq!(config.delay_for(0), Duration::from_millis(1));
        assert_eq!(config.delay_for(1), Duration::from_millis(2));
        assert_eq!(config.delay_for(10), Duration::from_millis(4));
    }
}
