//! Backoff strategies
//!
//! The rate-limit aware strategy trusts the server's `RateLimit-Reset`
//! timestamp when a 429 carries one, but keeps it inside the configured
//! maximum and never returns a non-positive wait: a reset in the past
//! (client/server clock skew) falls back to plain exponential backoff.

use crate::events::{self, ClientEvent, EventSink, SharedSink};
use chrono::Utc;
use reqwest::header::HeaderMap;
use reqwest::{Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// Response header carrying the Unix time at which the quota replenishes
pub const RATE_LIMIT_RESET_HEADER: &str = "ratelimit-reset";

/// Status and headers of the response that triggered a retry
#[derive(Debug, Clone, Copy)]
pub struct PreviousResponse<'a> {
    pub status: StatusCode,
    pub headers: &'a HeaderMap,
}

impl<'a> PreviousResponse<'a> {
    pub fn new(status: StatusCode, headers: &'a HeaderMap) -> Self {
        Self { status, headers }
    }
}

impl<'a> From<&'a Response> for PreviousResponse<'a> {
    fn from(response: &'a Response) -> Self {
        Self::new(response.status(), response.headers())
    }
}

/// Context handed to a [`Backoff`] before each retry
#[derive(Debug, Clone, Copy)]
pub struct RetryAttempt<'a> {
    /// Lower bound of the wait
    pub min: Duration,
    /// Upper bound of the wait
    pub max: Duration,
    /// Zero for the first retry
    pub attempt: u32,
    /// Absent when the attempt failed without a response
    pub previous: Option<PreviousResponse<'a>>,
}

/// Decides how long to wait before the next attempt
pub trait Backoff: Send + Sync {
    fn wait(&self, attempt: &RetryAttempt<'_>) -> Duration;
}

/// Source of the current Unix time in seconds
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

/// Wall clock
pub fn system_clock() -> Clock {
    Arc::new(|| Utc::now().timestamp())
}

/// `min * 2^attempt`, capped at `max`. Overflow yields `max`.
pub fn default_backoff(min: Duration, max: Duration, attempt: u32) -> Duration {
    let wait = 2u32
        .checked_pow(attempt)
        .and_then(|factor| min.checked_mul(factor))
        .unwrap_or(max);
    std::cmp::min(wait, max)
}

/// Rate-limit aware backoff.
///
/// A 429 with a parseable `RateLimit-Reset` waits until the reset, capped at
/// `max`. Everything else, including a reset at or before `now_unix`, uses
/// [`default_backoff`].
pub fn rate_limit_backoff(
    min: Duration,
    max: Duration,
    attempt: u32,
    previous: Option<PreviousResponse<'_>>,
    now_unix: i64,
    sink: &dyn EventSink,
) -> Duration {
    if let Some(reset) = previous
        .filter(|p| p.status == StatusCode::TOO_MANY_REQUESTS)
        .and_then(|p| parse_reset(p.headers))
    {
        let sleep_secs = reset.saturating_sub(now_unix);
        sink.record(ClientEvent::RateLimitWait { sleep_secs });

        if sleep_secs > 0 {
            return std::cmp::min(Duration::from_secs(sleep_secs as u64), max);
        }
    }

    let wait = default_backoff(min, max, attempt);
    sink.record(ClientEvent::BackoffWait { wait });
    wait
}

fn parse_reset(headers: &HeaderMap) -> Option<i64> {
    headers
        .get(RATE_LIMIT_RESET_HEADER)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Plain exponential backoff, ignoring the response
#[derive(Debug, Clone, Copy, Default)]
pub struct ExponentialBackoff;

impl Backoff for ExponentialBackoff {
    fn wait(&self, attempt: &RetryAttempt<'_>) -> Duration {
        default_backoff(attempt.min, attempt.max, attempt.attempt)
    }
}

/// [`rate_limit_backoff`] bound to a sink and a clock
#[derive(Clone)]
pub struct RateLimitBackoff {
    sink: SharedSink,
    clock: Clock,
}

impl RateLimitBackoff {
    pub fn new(sink: SharedSink) -> Self {
        Self {
            sink,
            clock: system_clock(),
        }
    }

    /// Replace the wall clock
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }
}

impl Default for RateLimitBackoff {
    fn default() -> Self {
        Self::new(events::noop())
    }
}

impl Backoff for RateLimitBackoff {
    fn wait(&self, attempt: &RetryAttempt<'_>) -> Duration {
        rate_limit_backoff(
            attempt.min,
            attempt.max,
            attempt.attempt,
            attempt.previous,
            (self.clock)(),
            self.sink.as_ref(),
        )
    }
}

impl std::fmt::Debug for RateLimitBackoff {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimitBackoff").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{NoopSink, RecordingSink};
    use pretty_assertions::assert_eq;
    use reqwest::header::HeaderValue;
    use test_case::test_case;

    const NOW: i64 = 1_700_000_000;
    const MIN: Duration = Duration::from_secs(1);
    const MAX: Duration = Duration::from_secs(60);

    fn headers_with_reset(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RATE_LIMIT_RESET_HEADER, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn backoff_for(status: u16, headers: &HeaderMap, attempt: u32) -> Duration {
        let previous = PreviousResponse::new(StatusCode::from_u16(status).unwrap(), headers);
        rate_limit_backoff(MIN, MAX, attempt, Some(previous), NOW, &NoopSink)
    }

    #[test_case(0, 1 ; "first retry")]
    #[test_case(1, 2 ; "second retry")]
    #[test_case(2, 4 ; "third retry")]
    #[test_case(5, 32 ; "sixth retry")]
    #[test_case(6, 60 ; "capped at max")]
    #[test_case(40, 60 ; "overflow capped at max")]
    fn test_default_backoff(attempt: u32, expected_secs: u64) {
        assert_eq!(
            default_backoff(MIN, MAX, attempt),
            Duration::from_secs(expected_secs)
        );
    }

    #[test]
    fn test_default_backoff_stays_in_bounds() {
        let min = Duration::from_millis(250);
        let max = Duration::from_secs(5);
        for attempt in 0..64 {
            let wait = default_backoff(min, max, attempt);
            assert!(wait >= min && wait <= max, "attempt {attempt}: {wait:?}");
        }
    }

    #[test]
    fn test_no_response_uses_default() {
        for attempt in 0..10 {
            let wait = rate_limit_backoff(MIN, MAX, attempt, None, NOW, &NoopSink);
            assert_eq!(wait, default_backoff(MIN, MAX, attempt));
        }
    }

    #[test]
    fn test_reset_within_max_is_honored() {
        let headers = headers_with_reset(&(NOW + 10).to_string());
        assert_eq!(backoff_for(429, &headers, 1), Duration::from_secs(10));
    }

    #[test]
    fn test_reset_at_max_is_honored() {
        let headers = headers_with_reset(&(NOW + 60).to_string());
        assert_eq!(backoff_for(429, &headers, 0), MAX);
    }

    #[test]
    fn test_reset_beyond_max_is_clamped() {
        let headers = headers_with_reset(&(NOW + 500).to_string());
        assert_eq!(backoff_for(429, &headers, 1), MAX);
    }

    #[test_case(-5 ; "reset in the past")]
    #[test_case(0 ; "reset is now")]
    #[test_case(-86_400 ; "reset a day ago")]
    fn test_clock_skew_falls_back(offset: i64) {
        let headers = headers_with_reset(&(NOW + offset).to_string());
        let wait = backoff_for(429, &headers, 1);
        assert_eq!(wait, Duration::from_secs(2));
        assert!(wait > Duration::ZERO);
    }

    #[test_case("" ; "empty")]
    #[test_case("soon" ; "not a number")]
    #[test_case("1.7e9" ; "float")]
    fn test_malformed_reset_falls_back(value: &str) {
        let headers = headers_with_reset(value);
        assert_eq!(backoff_for(429, &headers, 2), Duration::from_secs(4));
    }

    #[test]
    fn test_missing_reset_falls_back() {
        let headers = HeaderMap::new();
        assert_eq!(backoff_for(429, &headers, 0), MIN);
    }

    #[test]
    fn test_reset_ignored_without_429() {
        let headers = headers_with_reset(&(NOW + 10).to_string());
        assert_eq!(backoff_for(503, &headers, 0), MIN);
    }

    #[test]
    fn test_events_for_rate_limit() {
        let sink = RecordingSink::new();
        let headers = headers_with_reset(&(NOW + 500).to_string());
        let previous = PreviousResponse::new(StatusCode::TOO_MANY_REQUESTS, &headers);

        rate_limit_backoff(MIN, MAX, 0, Some(previous), NOW, &sink);

        // logged before the clamp
        assert_eq!(sink.events(), vec![ClientEvent::RateLimitWait { sleep_secs: 500 }]);
    }

    #[test]
    fn test_events_for_skew_fallback() {
        let sink = RecordingSink::new();
        let headers = headers_with_reset(&(NOW - 5).to_string());
        let previous = PreviousResponse::new(StatusCode::TOO_MANY_REQUESTS, &headers);

        rate_limit_backoff(MIN, MAX, 1, Some(previous), NOW, &sink);

        assert_eq!(
            sink.events(),
            vec![
                ClientEvent::RateLimitWait { sleep_secs: -5 },
                ClientEvent::BackoffWait {
                    wait: Duration::from_secs(2)
                },
            ]
        );
    }

    #[test]
    fn test_rate_limit_backoff_uses_clock() {
        let headers = headers_with_reset(&(NOW + 7).to_string());
        let backoff = RateLimitBackoff::default().with_clock(Arc::new(|| NOW));
        let attempt = RetryAttempt {
            min: MIN,
            max: MAX,
            attempt: 0,
            previous: Some(PreviousResponse::new(StatusCode::TOO_MANY_REQUESTS, &headers)),
        };
        assert_eq!(backoff.wait(&attempt), Duration::from_secs(7));
    }

    #[test]
    fn test_exponential_backoff_ignores_response() {
        let headers = headers_with_reset(&(NOW + 7).to_string());
        let attempt = RetryAttempt {
            min: MIN,
            max: MAX,
            attempt: 3,
            previous: Some(PreviousResponse::new(StatusCode::TOO_MANY_REQUESTS, &headers)),
        };
        assert_eq!(ExponentialBackoff.wait(&attempt), Duration::from_secs(8));
    }
}
