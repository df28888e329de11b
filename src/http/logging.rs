//! Diagnostic logging transport
//!
//! Logs request and response metadata at DEBUG. Bodies are never read, so
//! payloads reach the caller untouched, and credential headers are masked.

use super::transport::{SharedTransport, Transport};
use crate::error::Result;
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, AUTHORIZATION, COOKIE, PROXY_AUTHORIZATION, SET_COOKIE};
use reqwest::{Request, Response};
use std::time::Instant;
use tracing::debug;

const REDACTED: &str = "<redacted>";

/// Transport stage that records what goes over the wire
pub struct LoggingTransport {
    service: String,
    inner: SharedTransport,
}

impl LoggingTransport {
    /// `service` prefixes every log line, e.g. `DigitalOcean`
    pub fn new(service: impl Into<String>, inner: SharedTransport) -> Self {
        Self {
            service: service.into(),
            inner,
        }
    }
}

#[async_trait]
impl Transport for LoggingTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let url = request.url().clone();

        debug!(
            "{} API Request Details: {} {} headers={:?}",
            self.service,
            method,
            url,
            redact_headers(request.headers())
        );

        let started = Instant::now();
        let outcome = self.inner.send(request).await;
        let elapsed = started.elapsed();

        match &outcome {
            Ok(response) => debug!(
                "{} API Response Details: {} {} -> {} in {:?} headers={:?}",
                self.service,
                method,
                url,
                response.status().as_u16(),
                elapsed,
                redact_headers(response.headers())
            ),
            Err(e) => debug!(
                "{} API Request Failed: {} {} after {:?}: {}",
                self.service, method, url, elapsed, e
            ),
        }

        outcome
    }
}

impl std::fmt::Debug for LoggingTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoggingTransport")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

fn is_secret(name: &HeaderName) -> bool {
    [AUTHORIZATION, PROXY_AUTHORIZATION, COOKIE, SET_COOKIE].contains(name)
}

/// Header names and printable values, with credentials masked
pub fn redact_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let shown = if is_secret(name) || value.is_sensitive() {
                REDACTED.to_string()
            } else {
                value.to_str().unwrap_or("<binary>").to_string()
            };
            (name.as_str().to_string(), shown)
        })
        .collect()
}
