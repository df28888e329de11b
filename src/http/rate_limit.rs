//! Client-side request throttling
//!
//! Uses the governor crate for token bucket rate limiting. The throttle
//! stage sits innermost in the chain so that retried attempts draw from the
//! same bucket as first attempts.

use super::transport::{SharedTransport, Transport};
use crate::error::Result;
use async_trait::async_trait;
use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as Governor};
use reqwest::{Request, Response};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for rate limiting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterConfig {
    /// Maximum number of requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in bucket)
    pub burst_size: u32,
}

impl RateLimiterConfig {
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }

    /// Steady rate with a burst of the same size
    pub fn per_second(requests_per_second: u32) -> Self {
        Self::new(requests_per_second, requests_per_second)
    }
}

/// Token bucket rate limiter
#[derive(Clone)]
pub struct RateLimiter {
    config: RateLimiterConfig,
    limiter: Arc<Governor<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl RateLimiter {
    /// Zero values are raised to one
    pub fn new(config: &RateLimiterConfig) -> Self {
        let rate = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_second(rate).allow_burst(burst);

        Self {
            config: *config,
            limiter: Arc::new(Governor::direct(quota)),
        }
    }

    /// Wait until a request can be made
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }
}

impl std::fmt::Debug for RateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiter")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Transport stage that waits for a token before every attempt
#[derive(Debug)]
pub struct ThrottleTransport {
    limiter: RateLimiter,
    inner: SharedTransport,
}

impl ThrottleTransport {
    pub fn new(limiter: RateLimiter, inner: SharedTransport) -> Self {
        Self { limiter, inner }
    }
}

#[async_trait]
impl Transport for ThrottleTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        self.limiter.wait().await;
        self.inner.send(request).await
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::*;
    use std::time::Duration;

    async fn ready_within(limiter: &RateLimiter, millis: u64) -> bool {
        tokio::time::timeout(Duration::from_millis(millis), limiter.wait())
            .await
            .is_ok()
    }

    #[test]
    fn test_rate_limiter_config_per_second() {
        let config = RateLimiterConfig::per_second(5);
        assert_eq!(config.requests_per_second, 5);
        assert_eq!(config.burst_size, 5);
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(1, 5));

        for _ in 0..5 {
            assert!(ready_within(&limiter, 50).await);
        }
        assert!(!ready_within(&limiter, 50).await);
    }

    #[tokio::test]
    async fn test_rate_limiter_zero_is_one() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(0, 0));
        assert!(ready_within(&limiter, 50).await);
        assert!(!ready_within(&limiter, 50).await);
    }

    #[tokio::test]
    async fn test_rate_limiter_wait_within_burst() {
        let limiter = RateLimiter::new(&RateLimiterConfig::new(100, 10));
        assert!(ready_within(&limiter, 100).await);
    }
}
