//! Retry logic with classification-driven exponential backoff
//!
//! Upstream failures are classified before any retry decision: rate-limit
//! conditions back off from a higher base than overload conditions, and
//! fatal failures are never retried.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Failure classification driving the retry decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Explicit rate-limit status or message pattern - retry, slow base
    RateLimited,

    /// Explicit unavailable status or "overloaded" message - retry, fast base
    Overloaded,

    /// Anything else - propagate immediately
    Fatal,
}

/// Trait for errors that can be classified for retry
pub trait ClassifiedError {
    fn classify(&self) -> FailureClass;
}

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts (0 or 1 means a single attempt, no retry)
    pub max_attempts: u32,

    /// Base delay for rate-limited failures (milliseconds)
    pub rate_limited_base_ms: u64,

    /// Base delay for overloaded failures (milliseconds)
    pub overloaded_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            rate_limited_base_ms: 2000,
            overloaded_base_ms: 1000,
        }
    }
}

impl RetryConfig {
    /// Single attempt, no retry. Used for auxiliary best-effort calls
    /// (illustrations, audio) so a flaky secondary call never delays the
    /// primary response.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            ..Default::default()
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Delay for a given failure class and attempt (0-indexed): `base * 2^attempt`.
    ///
    /// No jitter. With the default 3 attempts the worst cumulative backoff
    /// is 6s (rate limited), which keeps the whole call well inside the
    /// hosting platform's invocation deadline.
    pub fn delay_for(&self, class: FailureClass, attempt: u32) -> Duration {
        let base_ms = match class {
            FailureClass::RateLimited => self.rate_limited_base_ms,
            FailureClass::Overloaded => self.overloaded_base_ms,
            FailureClass::Fatal => return Duration::ZERO,
        };

        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor))
    }
}

/// Execute an async operation with classification-driven retry
pub async fn with_retry<T, E, F, Fut>(
    config: &RetryConfig,
    operation_name: &str,
    mut operation: F,
) -> Result<T, E>
where
    E: ClassifiedError + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => {
                let class = e.classify();

                if class == FailureClass::Fatal {
                    debug!(
                        "{}: fatal error on attempt {}, not retrying: {}",
                        operation_name,
                        attempt + 1,
                        e
                    );
                    return Err(e);
                }

                if attempt + 1 >= attempts {
                    warn!(
                        "{}: max attempts ({}) exhausted: {}",
                        operation_name, attempts, e
                    );
                    return Err(e);
                }

                let delay = config.delay_for(class, attempt);
                warn!(
                    "{}: attempt {} failed ({:?}), retrying in {:?}: {}",
                    operation_name,
                    attempt + 1,
                    class,
                    delay,
                    e
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug)]
    struct TestError(FailureClass);

    impl fmt::Display for TestError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test error ({:?})", self.0)
        }
    }

    impl ClassifiedError for TestError {
        fn classify(&self) -> FailureClass {
            self.0
        }
    }

    #[test]
    fn test_delay_doubles_per_attempt() {
        let config = RetryConfig::default();

        assert_eq!(
            config.delay_for(FailureClass::Overloaded, 0),
            Duration::from_millis(1000)
        );
        assert_eq!(
            config.delay_for(FailureClass::Overloaded, 1),
            Duration::from_millis(2000)
        );
        assert_eq!(
            config.delay_for(FailureClass::RateLimited, 0),
            Duration::from_millis(2000)
        );
        assert_eq!(
            config.delay_for(FailureClass::RateLimited, 1),
            Duration::from_millis(4000)
        );
        assert_eq!(config.delay_for(FailureClass::Fatal, 0), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overloaded_twice_then_success() {
        let config = RetryConfig::default();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = with_retry(&config, "test_op", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError(FailureClass::Overloaded))
                } else {
                    Ok(42)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Exactly two delays: 1000ms then 2000ms
        assert_eq!(started.elapsed(), Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_propagates_immediately() {
        let config = RetryConfig::default();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = with_retry(&config, "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError(FailureClass::Fatal)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_budget_means_single_attempt() {
        let config = RetryConfig::no_retry();
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = with_retry(&config, "aux_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError(FailureClass::Overloaded)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limited_exhausts_attempts() {
        let config = RetryConfig::default();
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = with_retry(&config, "test_op", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(TestError(FailureClass::RateLimited)) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // 2000ms + 4000ms of backoff before giving up
        assert_eq!(started.elapsed(), Duration::from_millis(6000));
    }
}
