//! Retrying transport
//!
//! Replays a request on transport errors, 429 and 5xx (except 501), asking a
//! [`Backoff`] how long to sleep in between. When retries run out the last
//! outcome goes back to the caller unchanged.

use super::backoff::{Backoff, PreviousResponse, RetryAttempt};
use super::transport::{SharedTransport, Transport};
use crate::error::{is_retryable_status, Result};
use async_trait::async_trait;
use reqwest::{Request, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Lower bound handed to the backoff
    pub wait_min: Duration,
    /// Upper bound handed to the backoff
    pub wait_max: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 4,
            wait_min: Duration::from_secs(1),
            wait_max: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    pub fn new(max_retries: u32, wait_min: Duration, wait_max: Duration) -> Self {
        Self {
            max_retries,
            wait_min,
            wait_max,
        }
    }
}

/// Transport stage that retries qualifying failures
pub struct RetryTransport {
    inner: SharedTransport,
    config: RetryConfig,
    backoff: Arc<dyn Backoff>,
}

impl RetryTransport {
    pub fn new(inner: SharedTransport, config: RetryConfig, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            inner,
            config,
            backoff,
        }
    }
}

/// Whether an attempt's outcome is worth another try
pub fn should_retry(outcome: &Result<Response>) -> bool {
    match outcome {
        Ok(response) => is_retryable_status(response.status().as_u16()),
        Err(e) => e.is_retryable(),
    }
}

#[async_trait]
impl Transport for RetryTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let max_retries = self.config.max_retries;
        let mut attempt = 0;

        loop {
            let Some(replay) = request.try_clone() else {
                debug!(
                    "Request body for {} {} cannot be replayed, sending once",
                    request.method(),
                    request.url()
                );
                return self.inner.send(request).await;
            };

            let outcome = self.inner.send(replay).await;
            if !should_retry(&outcome) {
                return outcome;
            }

            if attempt >= max_retries {
                warn!(
                    "{} {} giving up after {} attempt(s)",
                    request.method(),
                    request.url(),
                    attempt + 1
                );
                return outcome;
            }

            let wait = self.backoff.wait(&RetryAttempt {
                min: self.config.wait_min,
                max: self.config.wait_max,
                attempt,
                previous: outcome.as_ref().ok().map(PreviousResponse::from),
            });

            match &outcome {
                Ok(response) => debug!(
                    "{} {} returned {}, attempt {}/{}, retrying in {:?}",
                    request.method(),
                    request.url(),
                    response.status().as_u16(),
                    attempt + 1,
                    max_retries + 1,
                    wait
                ),
                Err(e) => debug!(
                    "{} {} failed: {}, attempt {}/{}, retrying in {:?}",
                    request.method(),
                    request.url(),
                    e,
                    attempt + 1,
                    max_retries + 1,
                    wait
                ),
            }

            drop(outcome);
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

impl std::fmt::Debug for RetryTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryTransport")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
