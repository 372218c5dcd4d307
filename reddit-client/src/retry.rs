use redscrape_core::{CoreError, RedditApiError};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Configuration for retry behavior
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, including the first one
    pub max_attempts: u32,
    /// Base delay for exponential backoff (in milliseconds)
    pub base_delay_ms: u64,
    /// Maximum delay between retries (in milliseconds)
    pub max_delay_ms: u64,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
    /// Maximum jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.1,
        }
    }
}

impl RetryConfig {
    /// Create retry config tuned for the Reddit API
    pub fn reddit() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 2000,
            max_delay_ms: 60000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.2,
        }
    }

    /// Single attempt, no waiting. Used by tests and callers that want
    /// failures surfaced immediately.
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            base_delay_ms: 0,
            max_delay_ms: 0,
            backoff_multiplier: 1.0,
            jitter_factor: 0.0,
        }
    }
}

/// Retry strategy based on error type
#[derive(Debug, Clone, PartialEq)]
pub enum RetryStrategy {
    /// Retry with exponential backoff
    Retry,
    /// Retry after a server-specified delay (rate limits)
    RetryWithDelay(Duration),
    /// Don't retry (permanent failures)
    NoRetry,
}

/// Determine retry strategy based on error type
pub fn get_retry_strategy(error: &CoreError) -> RetryStrategy {
    match error {
        CoreError::RedditApi(reddit_error) => match reddit_error {
            RedditApiError::RateLimitExceeded { retry_after } => {
                RetryStrategy::RetryWithDelay(Duration::from_secs(*retry_after))
            }
            RedditApiError::ServerError { .. } => RetryStrategy::Retry,
            RedditApiError::RequestTimeout => RetryStrategy::Retry,
            // The cached app token is dropped on 401, so the next attempt
            // fetches a fresh one.
            RedditApiError::InvalidToken => RetryStrategy::Retry,
            RedditApiError::AuthenticationFailed { .. } => RetryStrategy::NoRetry,
            RedditApiError::Forbidden { .. } => RetryStrategy::NoRetry,
            RedditApiError::SubredditNotFound { .. } => RetryStrategy::NoRetry,
            RedditApiError::PostNotFound { .. } => RetryStrategy::NoRetry,
            RedditApiError::InvalidPostUrl { .. } => RetryStrategy::NoRetry,
            RedditApiError::InvalidResponse { .. } => RetryStrategy::NoRetry,
        },
        CoreError::Network(reqwest_error) => {
            if reqwest_error.is_timeout() || reqwest_error.is_connect() {
                RetryStrategy::Retry
            } else {
                RetryStrategy::NoRetry
            }
        }
        _ => RetryStrategy::NoRetry,
    }
}

/// Calculate delay with exponential backoff and jitter
pub fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let max_delay = Duration::from_millis(config.max_delay_ms);

    let multiplier = config.backoff_multiplier.powi(attempt as i32);
    let delay_ms = (config.base_delay_ms as f64 * multiplier) as u64;
    let exponential_delay = Duration::from_millis(delay_ms.min(config.max_delay_ms));

    let jitter_range = (exponential_delay.as_millis() as f64 * config.jitter_factor) as u64;
    let jitter = fastrand::u64(0..=jitter_range);

    (exponential_delay + Duration::from_millis(jitter)).min(max_delay)
}

/// Wraps an operation with retry logic
#[derive(Debug, Clone)]
pub struct RetryExecutor {
    config: RetryConfig,
}

impl RetryExecutor {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Runs `operation` until it succeeds, fails permanently, or runs out of
    /// attempts. The last error is returned unchanged.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, operation: F) -> Result<T, CoreError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, CoreError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut total_delay = Duration::ZERO;
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                debug!("Retry attempt {} for {}", attempt, operation_name);
            }

            let error = match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        info!(
                            "Operation {} succeeded after {} retries (total delay: {:?})",
                            operation_name, attempt, total_delay
                        );
                    }
                    return Ok(result);
                }
                Err(error) => error,
            };

            let attempts_left = attempt + 1 < max_attempts;
            let delay = match get_retry_strategy(&error) {
                RetryStrategy::Retry if attempts_left => calculate_delay(attempt, &self.config),
                RetryStrategy::RetryWithDelay(delay) if attempts_left => delay,
                RetryStrategy::NoRetry => {
                    debug!("Not retrying {} due to error type: {}", operation_name, error);
                    return Err(error);
                }
                _ => {
                    error!(
                        "Operation {} failed after {} attempts: {}",
                        operation_name,
                        attempt + 1,
                        error
                    );
                    return Err(error);
                }
            };

            info!("Retrying {} in {:?} due to: {}", operation_name, delay, error);
            total_delay += delay;
            sleep(delay).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            base_delay_ms: 1,
            max_delay_ms: 5,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
        }
    }

    #[test]
    fn test_retry_config_reddit() {
        let config = RetryConfig::reddit();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.base_delay_ms, 2000);
        assert_eq!(config.jitter_factor, 0.2);
    }

    #[test]
    fn test_retry_strategy_for_errors() {
        let rate_limit_error =
            CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
        assert_eq!(
            get_retry_strategy(&rate_limit_error),
            RetryStrategy::RetryWithDelay(Duration::from_secs(60))
        );

        let not_found = CoreError::RedditApi(RedditApiError::SubredditNotFound {
            subreddit: "nope".to_string(),
        });
        assert_eq!(get_retry_strategy(&not_found), RetryStrategy::NoRetry);

        let server_error = CoreError::RedditApi(RedditApiError::ServerError { status_code: 500 });
        assert_eq!(get_retry_strategy(&server_error), RetryStrategy::Retry);
    }

    #[test]
    fn test_exponential_backoff_calculation() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.0,
            ..Default::default()
        };

        assert_eq!(calculate_delay(0, &config), Duration::from_millis(1000));
        assert_eq!(calculate_delay(1, &config), Duration::from_millis(2000));
        assert_eq!(calculate_delay(3, &config), Duration::from_millis(8000));
        assert_eq!(calculate_delay(10, &config), Duration::from_millis(10000));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        let config = RetryConfig {
            base_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
            jitter_factor: 0.5,
            ..Default::default()
        };

        let delay = calculate_delay(1, &config);
        assert!(delay >= Duration::from_millis(2000));
        assert!(delay <= Duration::from_millis(3000));
    }

    #[tokio::test]
    async fn test_success_after_transient_failure() {
        let executor = RetryExecutor::new(fast_config(3));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = executor
            .execute("flaky", move || async move {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(CoreError::RedditApi(RedditApiError::ServerError {
                        status_code: 503,
                    }))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_permanent_failure_is_not_retried() {
        let executor = RetryExecutor::new(fast_config(3));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), CoreError> = executor
            .execute("missing", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::RedditApi(RedditApiError::SubredditNotFound {
                    subreddit: "nope".to_string(),
                }))
            })
            .await;

        assert!(matches!(
            result,
            Err(CoreError::RedditApi(RedditApiError::SubredditNotFound { .. }))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let executor = RetryExecutor::new(fast_config(2));
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<(), CoreError> = executor
            .execute("down", move || async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(CoreError::RedditApi(RedditApiError::ServerError {
                    status_code: 502,
                }))
            })
            .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
