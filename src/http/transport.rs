//! Transport abstraction
//!
//! Every stage of the chain (throttle, retry, auth, logging) is a
//! [`Transport`] wrapping another one; the innermost is a plain reqwest
//! client.

use super::chain::Capability;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Request, Response};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

/// Sends a fully built request and returns the raw response.
///
/// Implementations must not treat non-2xx statuses as errors; that is the
/// API client's job.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request
    async fn send(&self, request: Request) -> Result<Response>;

    /// Capabilities of the stages in this transport, innermost first
    fn capabilities(&self) -> Vec<Capability> {
        Vec::new()
    }
}

/// Shared handle to a transport
pub type SharedTransport = Arc<dyn Transport>;

impl std::fmt::Debug for dyn Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transport")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}

/// Base transport backed by a pooled reqwest client
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a client with an optional per-attempt timeout
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(Error::Http)?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        trace!("Sending {} {}", request.method(), request.url());
        self.client.execute(request).await.map_err(Error::Http)
    }
}
