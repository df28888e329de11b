//! Rate-limit headers reported by the API

use crate::http::RATE_LIMIT_RESET_HEADER;
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;

const RATE_LIMIT_LIMIT_HEADER: &str = "ratelimit-limit";
const RATE_LIMIT_REMAINING_HEADER: &str = "ratelimit-remaining";

/// Request quota as of the last response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rate {
    /// Requests allowed per window
    pub limit: u32,
    /// Requests left in the current window
    pub remaining: u32,
    /// When the window resets
    pub reset: Option<DateTime<Utc>>,
}

impl Rate {
    /// None when the response carries no `RateLimit-Limit`
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let limit = header_number(headers, RATE_LIMIT_LIMIT_HEADER)?;
        let remaining = header_number(headers, RATE_LIMIT_REMAINING_HEADER).unwrap_or(0);
        let reset = header_number::<i64>(headers, RATE_LIMIT_RESET_HEADER)
            .and_then(|secs| DateTime::from_timestamp(secs, 0));
        Some(Self {
            limit,
            remaining,
            reset,
        })
    }
}

fn header_number<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    #[test]
    fn test_from_headers() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-limit", HeaderValue::from_static("5000"));
        headers.insert("ratelimit-remaining", HeaderValue::from_static("4816"));
        headers.insert("ratelimit-reset", HeaderValue::from_static("1444931833"));

        let rate = Rate::from_headers(&headers).unwrap();
        assert_eq!(rate.limit, 5000);
        assert_eq!(rate.remaining, 4816);
        assert_eq!(rate.reset.unwrap().timestamp(), 1_444_931_833);
    }

    #[test]
    fn test_missing_limit() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-remaining", HeaderValue::from_static("10"));
        assert!(Rate::from_headers(&headers).is_none());
    }

    #[test]
    fn test_bad_reset_is_dropped() {
        let mut headers = HeaderMap::new();
        headers.insert("ratelimit-limit", HeaderValue::from_static("250"));
        headers.insert("ratelimit-reset", HeaderValue::from_static("later"));

        let rate = Rate::from_headers(&headers).unwrap();
        assert_eq!(rate.remaining, 0);
        assert!(rate.reset.is_none());
    }
}
