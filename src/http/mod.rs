//! HTTP transport chain
//!
//! Provides the layered transport the API client sends through.
//!
//! # Features
//!
//! - **Rate-Limit Aware Backoff**: waits until `RateLimit-Reset` on 429s,
//!   bounded by the configured maximum
//! - **Automatic Retries**: transport errors, 429 and 5xx are replayed
//! - **Authentication**: bearer header stamped once, outside the retries
//! - **Diagnostic Logging**: request/response metadata with secrets masked
//! - **Throttling**: optional token bucket using governor

pub mod backoff;
mod chain;
mod logging;
mod rate_limit;
mod retry;
mod transport;

pub use backoff::{
    default_backoff, rate_limit_backoff, Backoff, Clock, ExponentialBackoff, PreviousResponse,
    RateLimitBackoff, RetryAttempt, RATE_LIMIT_RESET_HEADER,
};
pub use chain::{Capability, LayeredTransport, Stage, TransportChain};
pub use logging::{redact_headers, LoggingTransport};
pub use rate_limit::{RateLimiter, RateLimiterConfig, ThrottleTransport};
pub use retry::{should_retry, RetryConfig, RetryTransport};
pub use transport::{ReqwestTransport, SharedTransport, Transport};
