use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub time_window: Duration,
    pub burst_allowance: u32,
}

impl RateLimitConfig {
    pub fn reddit_oauth() -> Self {
        Self {
            max_requests: 100, // Reddit allows 100 requests per minute for OAuth2 clients
            time_window: Duration::from_secs(60),
            burst_allowance: 10,
        }
    }
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

#[derive(Debug)]
pub struct TokenBucket {
    state: Mutex<BucketState>,
    capacity: f64,
    refill_rate: f64, // tokens per second
}

impl TokenBucket {
    pub fn new(config: &RateLimitConfig) -> Self {
        let capacity = config.burst_allowance as f64;
        let refill_rate = config.max_requests as f64 / config.time_window.as_secs_f64();

        Self {
            state: Mutex::new(BucketState {
                tokens: capacity,
                last_refill: Instant::now(),
            }),
            capacity,
            refill_rate,
        }
    }

    /// Takes `tokens_needed` tokens, or reports how long until they would be
    /// available.
    pub async fn acquire(&self, tokens_needed: f64) -> Result<(), Duration> {
        let mut state = self.state.lock().await;
        self.refill(&mut state);

        if state.tokens >= tokens_needed {
            state.tokens -= tokens_needed;
            Ok(())
        } else {
            let missing = tokens_needed - state.tokens;
            Err(Duration::from_secs_f64(missing / self.refill_rate))
        }
    }

    pub async fn available_tokens(&self) -> f64 {
        let mut state = self.state.lock().await;
        self.refill(&mut state);
        state.tokens
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill);
        state.tokens = (state.tokens + elapsed.as_secs_f64() * self.refill_rate).min(self.capacity);
        state.last_refill = now;
    }
}

#[derive(Debug)]
pub struct RateLimiter {
    token_bucket: TokenBucket,
    semaphore: Arc<Semaphore>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.burst_allowance.max(1) as usize));
        let token_bucket = TokenBucket::new(&config);

        Self {
            token_bucket,
            semaphore,
            config,
        }
    }

    /// Waits for a request slot. Returns `None` only if the limiter's
    /// semaphore has been closed.
    pub async fn acquire_permit(&self) -> Option<RateLimitPermit> {
        let start_time = Instant::now();
        let permit = self.semaphore.clone().acquire_owned().await.ok()?;

        loop {
            match self.token_bucket.acquire(1.0).await {
                Ok(()) => break,
                Err(wait_time) => {
                    tracing::debug!("Rate limit reached, waiting {:?}", wait_time);
                    sleep(wait_time).await;
                }
            }
        }

        Some(RateLimitPermit {
            _permit: permit,
            queue_wait_time: start_time.elapsed(),
        })
    }

    pub async fn get_rate_limit_status(&self) -> RateLimitStatus {
        let available_tokens = self.token_bucket.available_tokens().await;
        let estimated_wait_time = if available_tokens < 1.0 {
            Some(Duration::from_secs_f64(
                self.config.time_window.as_secs_f64() / self.config.max_requests as f64,
            ))
        } else {
            None
        };

        RateLimitStatus {
            available_tokens: available_tokens as u32,
            max_tokens: self.config.burst_allowance,
            available_permits: self.semaphore.available_permits(),
            requests_per_window: self.config.max_requests,
            estimated_wait_time,
        }
    }
}

#[derive(Debug)]
pub struct RateLimitPermit {
    _permit: tokio::sync::OwnedSemaphorePermit,
    pub queue_wait_time: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub available_tokens: u32,
    pub max_tokens: u32,
    pub available_permits: usize,
    pub requests_per_window: u32,
    pub estimated_wait_time: Option<Duration>,
}

impl RateLimitStatus {
    pub fn utilization_percentage(&self) -> f64 {
        let used_tokens = self.max_tokens.saturating_sub(self.available_tokens);
        (used_tokens as f64 / self.max_tokens.max(1) as f64) * 100.0
    }

    pub fn is_near_limit(&self) -> bool {
        self.utilization_percentage() > 80.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, Duration};

    #[tokio::test]
    async fn test_token_bucket_basic() {
        let config = RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(10),
            burst_allowance: 5,
        };

        let bucket = TokenBucket::new(&config);

        for _ in 0..5 {
            assert!(bucket.acquire(1.0).await.is_ok());
        }

        // Burst used up
        assert!(bucket.acquire(1.0).await.is_err());
    }

    #[tokio::test]
    async fn test_token_bucket_refill() {
        let config = RateLimitConfig {
            max_requests: 60, // 1 token per second
            time_window: Duration::from_secs(60),
            burst_allowance: 2,
        };

        let bucket = TokenBucket::new(&config);

        assert!(bucket.acquire(2.0).await.is_ok());
        assert!(bucket.acquire(1.0).await.is_err());

        sleep(Duration::from_millis(1100)).await;

        assert!(bucket.acquire(1.0).await.is_ok());
    }

    #[tokio::test]
    async fn test_rate_limiter_status() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());

        let permit = limiter.acquire_permit().await;
        assert!(permit.is_some());
        drop(permit);

        let status = limiter.get_rate_limit_status().await;
        assert!(status.available_tokens <= status.max_tokens);
        assert_eq!(status.requests_per_window, 100);

        let utilization = status.utilization_percentage();
        assert!((0.0..=100.0).contains(&utilization));
    }

    #[tokio::test]
    async fn test_drained_bucket_is_near_limit() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_requests: 10,
            time_window: Duration::from_secs(60),
            burst_allowance: 5,
        });
        assert!(!limiter.get_rate_limit_status().await.is_near_limit());

        for _ in 0..5 {
            limiter.acquire_permit().await.unwrap();
        }

        let status = limiter.get_rate_limit_status().await;
        assert!(status.is_near_limit());
        assert!(status.estimated_wait_time.is_some());
    }

    #[tokio::test]
    async fn test_permit_wait_time_tracking() {
        let limiter = RateLimiter::new(RateLimitConfig::reddit_oauth());
        let permit = limiter.acquire_permit().await.unwrap();
        assert!(permit.queue_wait_time >= Duration::from_secs(0));
    }
}
